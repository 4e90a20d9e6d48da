use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Activity, AdminAccount, AdminForm, Company, CompanyId, CompanyStatus, ModerationDecision,
    PlatformStats, Posting, PostingId, UserId, UserRecord, UserStatus,
};
use crate::service::ModerationService;
use crate::store::track;
use crate::validate;

/// Administrator console state. Mutations go to the backend first, then
/// the matching local entry is patched in place.
pub struct ModerationStore {
    service: Arc<dyn ModerationService>,
    stats: PlatformStats,
    activities: Vec<Activity>,
    users: Vec<UserRecord>,
    postings: Vec<Posting>,
    companies: Vec<Company>,
    admins: Vec<AdminAccount>,
    error: Option<String>,
}

impl ModerationStore {
    pub fn new(service: Arc<dyn ModerationService>) -> Self {
        Self {
            service,
            stats: PlatformStats::default(),
            activities: Vec::new(),
            users: Vec::new(),
            postings: Vec::new(),
            companies: Vec::new(),
            admins: Vec::new(),
            error: None,
        }
    }

    /// Loads the counters and the recent activity feed together.
    pub async fn get_stats(&mut self, token: &str) -> Result<&PlatformStats> {
        let result = self.service.stats(token).await;
        self.stats = track(&mut self.error, result)?;
        let result = self.service.recent_activity(token).await;
        self.activities = track(&mut self.error, result)?;
        Ok(&self.stats)
    }

    // --- Users ---

    pub async fn list_users(&mut self, token: &str) -> Result<&[UserRecord]> {
        let result = self.service.list_users(token).await;
        self.users = track(&mut self.error, result)?;
        Ok(&self.users)
    }

    pub async fn set_user_status(&mut self, token: &str, id: UserId, status: UserStatus) -> Result<()> {
        let result = self.service.set_user_status(token, id, status).await;
        track(&mut self.error, result)?;
        if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
            user.status = status;
        }
        Ok(())
    }

    pub async fn delete_user(&mut self, token: &str, id: UserId) -> Result<()> {
        let result = self.service.delete_user(token, id).await;
        track(&mut self.error, result)?;
        self.users.retain(|u| u.id != id);
        Ok(())
    }

    // --- Postings ---

    pub async fn list_postings(&mut self, token: &str) -> Result<&[Posting]> {
        let result = self.service.list_all_postings(token).await;
        self.postings = track(&mut self.error, result)?;
        Ok(&self.postings)
    }

    pub async fn set_posting_status(
        &mut self,
        token: &str,
        id: PostingId,
        decision: ModerationDecision,
    ) -> Result<Posting> {
        let result = self.service.set_posting_status(token, id, decision).await;
        let posting = track(&mut self.error, result)?;
        if let Some(held) = self.postings.iter_mut().find(|p| p.id == id) {
            held.status = posting.status;
        }
        Ok(posting)
    }

    pub async fn delete_posting(&mut self, token: &str, id: PostingId) -> Result<()> {
        let result = self.service.delete_posting(token, id).await;
        track(&mut self.error, result)?;
        self.postings.retain(|p| p.id != id);
        Ok(())
    }

    // --- Companies ---

    pub async fn list_companies(&mut self, token: &str) -> Result<&[Company]> {
        let result = self.service.list_companies(token).await;
        self.companies = track(&mut self.error, result)?;
        Ok(&self.companies)
    }

    pub async fn verify_company(&mut self, token: &str, id: CompanyId) -> Result<Company> {
        self.set_company_status(token, id, CompanyStatus::Verified).await
    }

    pub async fn suspend_company(&mut self, token: &str, id: CompanyId) -> Result<Company> {
        self.set_company_status(token, id, CompanyStatus::Suspended).await
    }

    async fn set_company_status(
        &mut self,
        token: &str,
        id: CompanyId,
        status: CompanyStatus,
    ) -> Result<Company> {
        let result = self.service.set_company_status(token, id, status).await;
        let company = track(&mut self.error, result)?;
        if let Some(held) = self.companies.iter_mut().find(|c| c.id == id) {
            held.status = company.status;
        }
        Ok(company)
    }

    // --- Administrators ---

    pub async fn add_admin(&mut self, token: &str, form: &AdminForm) -> Result<AdminAccount> {
        let result = match validate::admin(form) {
            Ok(()) => self.service.add_admin(token, form).await,
            Err(e) => Err(e),
        };
        let admin = track(&mut self.error, result)?;
        self.admins.push(admin.clone());
        Ok(admin)
    }

    pub async fn list_admins(&mut self, token: &str) -> Result<&[AdminAccount]> {
        let result = self.service.list_admins(token).await;
        self.admins = track(&mut self.error, result)?;
        Ok(&self.admins)
    }

    // --- Selectors ---

    pub fn stats(&self) -> &PlatformStats {
        &self.stats
    }

    pub fn recent_activity(&self) -> &[Activity] {
        &self.activities
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn admins(&self) -> &[AdminAccount] {
        &self.admins
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::{admin, backend};
    use crate::error::ServiceError;
    use crate::models::PostingStatus;
    use crate::service::MockModerationService;

    #[tokio::test]
    async fn user_actions_patch_the_local_list() {
        let backend = Arc::new(backend());
        let token = admin(&backend).await;
        let mut store = ModerationStore::new(backend);
        store.list_users(&token).await.unwrap();
        let total = store.users().len();

        store.set_user_status(&token, 3, UserStatus::Suspended).await.unwrap();
        let user = store.users().iter().find(|u| u.id == 3).unwrap();
        assert_eq!(user.status, UserStatus::Suspended);

        store.delete_user(&token, 3).await.unwrap();
        assert_eq!(store.users().len(), total - 1);
        assert!(store.delete_user(&token, 3).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn approving_a_pending_posting_makes_it_active() {
        let backend = Arc::new(backend());
        let token = admin(&backend).await;
        let mut store = ModerationStore::new(backend);
        store.list_postings(&token).await.unwrap();

        let pending = store
            .postings()
            .iter()
            .find(|p| p.status == PostingStatus::Pending)
            .map(|p| p.id)
            .unwrap();
        store
            .set_posting_status(&token, pending, ModerationDecision::Approved)
            .await
            .unwrap();
        let held = store.postings().iter().find(|p| p.id == pending).unwrap();
        assert_eq!(held.status, PostingStatus::Active);

        store.delete_posting(&token, pending).await.unwrap();
        assert!(store.postings().iter().all(|p| p.id != pending));
    }

    #[tokio::test]
    async fn company_verification_and_suspension() {
        let backend = Arc::new(backend());
        let token = admin(&backend).await;
        let mut store = ModerationStore::new(backend);
        store.list_companies(&token).await.unwrap();

        store.verify_company(&token, 2).await.unwrap();
        store.suspend_company(&token, 1).await.unwrap();
        let status = |id| store.companies().iter().find(|c| c.id == id).unwrap().status;
        assert_eq!(status(2), CompanyStatus::Verified);
        assert_eq!(status(1), CompanyStatus::Suspended);
    }

    #[tokio::test]
    async fn stats_load_with_activity_feed() {
        let backend = Arc::new(backend());
        let token = admin(&backend).await;
        let mut store = ModerationStore::new(backend);
        let stats = store.get_stats(&token).await.unwrap().clone();
        assert!(stats.total_users > 0);
        assert!(!store.recent_activity().is_empty());
    }

    #[tokio::test]
    async fn bad_admin_form_never_reaches_the_service() {
        let mut store = ModerationStore::new(Arc::new(MockModerationService::new()));
        let form = AdminForm {
            name: "Ops".to_string(),
            email: "ops@stagehub.fr".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        assert!(matches!(
            store.add_admin("tok", &form).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(store.error(), Some("Passwords do not match"));
        assert!(store.admins().is_empty());
    }

    #[tokio::test]
    async fn local_list_ignores_ids_it_does_not_hold() {
        let mut service = MockModerationService::new();
        service.expect_set_user_status().returning(|_, _, _| Ok(()));
        let mut store = ModerationStore::new(Arc::new(service));
        store
            .set_user_status("tok", 404, UserStatus::Suspended)
            .await
            .unwrap();
        assert!(store.users().is_empty());
    }
}
