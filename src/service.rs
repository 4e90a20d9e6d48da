//! Backend seam: one trait per store, one method per store operation.
//!
//! `MockBackend` implements all of them in-process. User-scoped calls take
//! the session token issued at sign-in.

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::PostingFilter;
use crate::models::*;

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub identity: Identity,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionGrant>;
    async fn sign_up(&self, form: &SignUpForm) -> Result<SessionGrant>;
    async fn sign_out(&self, token: &str) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_postings(&self, filter: &PostingFilter) -> Result<Vec<Posting>>;
    async fn get_posting(&self, id: PostingId) -> Result<Posting>;
    async fn apply(
        &self,
        token: &str,
        posting_id: PostingId,
        form: &ApplicationForm,
    ) -> Result<Application>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn get_profile(&self, token: &str) -> Result<UserProfile>;
    async fn update_profile(&self, token: &str, update: ProfileUpdate) -> Result<UserProfile>;
    async fn list_applications(&self, token: &str) -> Result<Vec<Application>>;
    async fn withdraw_application(&self, token: &str, id: ApplicationId) -> Result<Application>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationService: Send + Sync {
    async fn list_own_postings(&self, token: &str) -> Result<Vec<Posting>>;
    async fn create_posting(
        &self,
        token: &str,
        fields: &NewPosting,
        mode: PublishMode,
    ) -> Result<Posting>;
    async fn close_posting(&self, token: &str, id: PostingId) -> Result<Posting>;
    async fn list_received_applications(&self, token: &str) -> Result<Vec<Application>>;
    async fn set_application_status(
        &self,
        token: &str,
        id: ApplicationId,
        decision: ApplicationDecision,
        reason: Option<String>,
    ) -> Result<Application>;
    async fn list_company_conversations(&self, token: &str) -> Result<Vec<Conversation>>;
    async fn reply(&self, token: &str, conversation_id: ConversationId, text: &str)
    -> Result<Message>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationService: Send + Sync {
    async fn stats(&self, token: &str) -> Result<PlatformStats>;
    async fn recent_activity(&self, token: &str) -> Result<Vec<Activity>>;
    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>>;
    async fn set_user_status(&self, token: &str, id: UserId, status: UserStatus) -> Result<()>;
    async fn delete_user(&self, token: &str, id: UserId) -> Result<()>;
    async fn list_all_postings(&self, token: &str) -> Result<Vec<Posting>>;
    async fn set_posting_status(
        &self,
        token: &str,
        id: PostingId,
        decision: ModerationDecision,
    ) -> Result<Posting>;
    async fn delete_posting(&self, token: &str, id: PostingId) -> Result<()>;
    async fn list_companies(&self, token: &str) -> Result<Vec<Company>>;
    async fn set_company_status(
        &self,
        token: &str,
        id: CompanyId,
        status: CompanyStatus,
    ) -> Result<Company>;
    async fn add_admin(&self, token: &str, form: &AdminForm) -> Result<AdminAccount>;
    async fn list_admins(&self, token: &str) -> Result<Vec<AdminAccount>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn list_student_conversations(&self, token: &str) -> Result<Vec<Conversation>>;
    async fn send_to_company(
        &self,
        token: &str,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<Message>;
    async fn start_conversation(
        &self,
        token: &str,
        company_name: &str,
        posting_title: &str,
        text: &str,
    ) -> Result<Conversation>;
}
