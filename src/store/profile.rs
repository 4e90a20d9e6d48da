use chrono::Utc;
use std::sync::Arc;

use crate::error::{Result, ServiceError};
use crate::models::{
    Application, ApplicationId, CompanyOnboarding, Document, PostingId, ProfileUpdate,
    StudentOnboarding, UserId, UserProfile,
};
use crate::persist::Persisted;
use crate::service::ProfileService;
use crate::store::track;
use crate::validate;

pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Signed-in user's profile, application history and favorites.
pub struct ProfileStore {
    service: Arc<dyn ProfileService>,
    persisted: Persisted,
    profile: Option<UserProfile>,
    applications: Vec<Application>,
    favorites: Vec<PostingId>,
    error: Option<String>,
}

impl ProfileStore {
    /// Favorites are rehydrated from local storage here.
    pub fn new(service: Arc<dyn ProfileService>, persisted: Persisted) -> Result<Self> {
        let favorites = persisted.load_favorites()?;
        Ok(Self {
            service,
            persisted,
            profile: None,
            applications: Vec::new(),
            favorites,
            error: None,
        })
    }

    pub async fn get_profile(&mut self, token: &str) -> Result<&UserProfile> {
        let result = self.service.get_profile(token).await;
        let profile = track(&mut self.error, result)?;
        Ok(self.profile.insert(profile))
    }

    /// Shallow merge of `update` onto the stored profile; the merged result
    /// also becomes the persisted identity snapshot.
    pub async fn update_profile(&mut self, token: &str, update: ProfileUpdate) -> Result<UserProfile> {
        let result = self.service.update_profile(token, update).await;
        let updated = track(&mut self.error, result)?;
        self.persisted.save_identity(&updated.identity)?;
        self.profile = Some(updated.clone());
        Ok(updated)
    }

    pub async fn complete_student_profile(
        &mut self,
        token: &str,
        form: StudentOnboarding,
    ) -> Result<UserProfile> {
        track(&mut self.error, validate::student_onboarding(&form))?;
        let update = ProfileUpdate {
            bio: Some(form.bio.trim().to_string()),
            education: Some(form.education.trim().to_string()),
            field: Some(form.field.trim().to_string()),
            skills: Some(validate::clean_list(&form.skills)),
            location: Some(form.location.trim().to_string()),
            profile_completed: Some(true),
            ..ProfileUpdate::default()
        };
        self.update_profile(token, update).await
    }

    pub async fn complete_company_profile(
        &mut self,
        token: &str,
        form: CompanyOnboarding,
    ) -> Result<UserProfile> {
        track(&mut self.error, validate::company_onboarding(&form))?;
        let update = ProfileUpdate {
            website: Some(form.website.trim().to_string()),
            sectors: Some(validate::clean_list(&form.sectors)),
            bio: Some(form.description.trim().to_string()),
            profile_completed: Some(true),
            ..ProfileUpdate::default()
        };
        self.update_profile(token, update).await
    }

    pub async fn list_applications(&mut self, token: &str) -> Result<&[Application]> {
        let result = self.service.list_applications(token).await;
        self.applications = track(&mut self.error, result)?;
        Ok(&self.applications)
    }

    pub async fn withdraw_application(
        &mut self,
        token: &str,
        id: ApplicationId,
    ) -> Result<Application> {
        let result = self.service.withdraw_application(token, id).await;
        let withdrawn = track(&mut self.error, result)?;
        if let Some(held) = self.applications.iter_mut().find(|a| a.id == id) {
            *held = withdrawn.clone();
        }
        Ok(withdrawn)
    }

    // --- Favorites (local only) ---

    pub fn add_favorite(&mut self, id: PostingId) -> Result<()> {
        if self.favorites.contains(&id) {
            return Ok(());
        }
        self.favorites.push(id);
        self.persisted.save_favorites(&self.favorites)
    }

    pub fn remove_favorite(&mut self, id: PostingId) -> Result<()> {
        let before = self.favorites.len();
        self.favorites.retain(|f| *f != id);
        if self.favorites.len() == before {
            return Ok(());
        }
        self.persisted.save_favorites(&self.favorites)
    }

    pub fn toggle_favorite(&mut self, id: PostingId) -> Result<bool> {
        if self.is_favorite(id) {
            self.remove_favorite(id)?;
            Ok(false)
        } else {
            self.add_favorite(id)?;
            Ok(true)
        }
    }

    pub fn clear_favorites(&mut self) -> Result<()> {
        self.favorites.clear();
        self.persisted.save_favorites(&self.favorites)
    }

    // --- Uploaded document (local only) ---

    pub fn upload_document(
        &mut self,
        user_id: UserId,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Document> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::validation("A file name is required"));
        }
        if data.is_empty() {
            return Err(ServiceError::validation("The document is empty"));
        }
        if data.len() > MAX_DOCUMENT_BYTES {
            return Err(ServiceError::validation(format!(
                "The document exceeds {} MB",
                MAX_DOCUMENT_BYTES / (1024 * 1024)
            )));
        }
        let doc = Document {
            user_id,
            file_name: file_name.trim().to_string(),
            data,
            uploaded_at: Utc::now(),
        };
        self.persisted.save_document(&doc)?;
        Ok(doc)
    }

    pub fn document(&self, user_id: UserId) -> Result<Option<Document>> {
        self.persisted.load_document(user_id)
    }

    // --- Selectors ---

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn favorites(&self) -> &[PostingId] {
        &self.favorites
    }

    pub fn is_favorite(&self, id: PostingId) -> bool {
        self.favorites.contains(&id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::{backend, company, student};
    use crate::models::ApplicationStatus;
    use crate::service::MockProfileService;
    use crate::storage::Storage;

    fn persisted() -> Persisted {
        Persisted::new(Arc::new(Storage::open_in_memory().unwrap()))
    }

    fn offline_store(persisted: Persisted) -> ProfileStore {
        ProfileStore::new(Arc::new(MockProfileService::new()), persisted).unwrap()
    }

    #[test]
    fn favorites_round_trip_and_are_idempotent() {
        let mut store = offline_store(persisted());
        store.add_favorite(1).unwrap();
        let before = store.favorites().to_vec();

        store.add_favorite(3).unwrap();
        store.add_favorite(3).unwrap();
        assert_eq!(store.favorites(), &[1, 3]);

        store.remove_favorite(3).unwrap();
        assert_eq!(store.favorites(), before.as_slice());

        store.remove_favorite(99).unwrap();
        assert_eq!(store.favorites(), before.as_slice());
    }

    #[test]
    fn favorites_are_rehydrated_by_a_new_store() {
        let persisted = persisted();
        {
            let mut store = offline_store(persisted.clone());
            store.add_favorite(2).unwrap();
            assert!(store.toggle_favorite(4).unwrap());
        }
        let mut store = offline_store(persisted);
        assert_eq!(store.favorites(), &[2, 4]);
        assert!(!store.toggle_favorite(4).unwrap());
        store.clear_favorites().unwrap();
        assert!(store.favorites().is_empty());
    }

    #[tokio::test]
    async fn update_preserves_untouched_fields() {
        let backend = Arc::new(backend());
        let token = student(&backend).await;
        let mut store = ProfileStore::new(backend, persisted()).unwrap();

        let before = store.get_profile(&token).await.unwrap().clone();
        let after = store
            .update_profile(
                &token,
                ProfileUpdate {
                    field: Some("Data Science".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(after.profile.field.as_deref(), Some("Data Science"));
        assert_eq!(after.identity, before.identity);
        assert_eq!(after.profile.bio, before.profile.bio);
        assert_eq!(after.profile.skills, before.profile.skills);
        assert_eq!(after.profile.education, before.profile.education);
        assert_eq!(store.profile(), Some(&after));
    }

    #[tokio::test]
    async fn onboarding_validates_before_calling_the_backend() {
        let mut store = offline_store(persisted());
        let err = store
            .complete_company_profile(
                "tok",
                CompanyOnboarding {
                    website: "www.acme.fr".to_string(),
                    sectors: vec!["Industrie".to_string()],
                    description: "Short".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn company_onboarding_marks_profile_complete() {
        let backend = Arc::new(backend());
        let token = company(&backend).await;
        let mut store = ProfileStore::new(backend, persisted()).unwrap();
        let profile = store
            .complete_company_profile(
                &token,
                CompanyOnboarding {
                    website: "https://techcorp.fr".to_string(),
                    sectors: vec!["Technologie".to_string(), "Services".to_string()],
                    description: "We build logistics software for mid-sized retailers across France."
                        .to_string(),
                },
            )
            .await
            .unwrap();
        assert!(profile.profile.profile_completed);
        assert_eq!(profile.profile.sectors.len(), 2);
    }

    #[tokio::test]
    async fn withdrawing_updates_the_held_history() {
        let backend = Arc::new(backend());
        let token = student(&backend).await;
        let mut store = ProfileStore::new(backend, persisted()).unwrap();

        let pending = store
            .list_applications(&token)
            .await
            .unwrap()
            .iter()
            .find(|a| a.status == ApplicationStatus::Pending)
            .map(|a| a.id)
            .unwrap();
        store.withdraw_application(&token, pending).await.unwrap();
        let held = store.applications().iter().find(|a| a.id == pending).unwrap();
        assert_eq!(held.status, ApplicationStatus::Withdrawn);

        // A decided application cannot be withdrawn.
        let rejected = store
            .applications()
            .iter()
            .find(|a| a.status == ApplicationStatus::Rejected)
            .map(|a| a.id)
            .unwrap();
        assert!(matches!(
            store.withdraw_application(&token, rejected).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn documents_are_stored_per_user() {
        let mut store = offline_store(persisted());
        assert!(store.upload_document(1, "cv.pdf", Vec::new()).is_err());
        store.upload_document(1, "cv.pdf", b"%PDF-1.4".to_vec()).unwrap();

        let doc = store.document(1).unwrap().unwrap();
        assert_eq!(doc.file_name, "cv.pdf");
        assert!(store.document(2).unwrap().is_none());
    }
}
