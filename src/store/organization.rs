use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Application, ApplicationDecision, ApplicationId, ApplicationStatus, Conversation,
    ConversationId, NewPosting, Posting, PostingId, PublishMode,
};
use crate::service::OrganizationService;
use crate::store::track;

/// Dashboard counters derived from the held lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizationStats {
    pub total_postings: usize,
    pub active_postings: usize,
    pub total_applications: usize,
    pub pending_applications: usize,
}

/// A company's own postings, received applications and message threads.
pub struct OrganizationStore {
    service: Arc<dyn OrganizationService>,
    postings: Vec<Posting>,
    applications: Vec<Application>,
    conversations: Vec<Conversation>,
    error: Option<String>,
}

impl OrganizationStore {
    pub fn new(service: Arc<dyn OrganizationService>) -> Self {
        Self {
            service,
            postings: Vec::new(),
            applications: Vec::new(),
            conversations: Vec::new(),
            error: None,
        }
    }

    pub async fn list_own_postings(&mut self, token: &str) -> Result<&[Posting]> {
        let result = self.service.list_own_postings(token).await;
        self.postings = track(&mut self.error, result)?;
        Ok(&self.postings)
    }

    /// New postings go to the front of the list.
    pub async fn create_posting(
        &mut self,
        token: &str,
        fields: &NewPosting,
        mode: PublishMode,
    ) -> Result<Posting> {
        let result = self.service.create_posting(token, fields, mode).await;
        let posting = track(&mut self.error, result)?;
        self.postings.insert(0, posting.clone());
        Ok(posting)
    }

    pub async fn close_posting(&mut self, token: &str, id: PostingId) -> Result<Posting> {
        let result = self.service.close_posting(token, id).await;
        let closed = track(&mut self.error, result)?;
        if let Some(held) = self.postings.iter_mut().find(|p| p.id == id) {
            *held = closed.clone();
        }
        Ok(closed)
    }

    pub async fn list_applications(&mut self, token: &str) -> Result<&[Application]> {
        let result = self.service.list_received_applications(token).await;
        self.applications = track(&mut self.error, result)?;
        Ok(&self.applications)
    }

    pub async fn set_application_status(
        &mut self,
        token: &str,
        id: ApplicationId,
        decision: ApplicationDecision,
        reason: Option<String>,
    ) -> Result<Application> {
        let result = self
            .service
            .set_application_status(token, id, decision, reason)
            .await;
        let decided = track(&mut self.error, result)?;
        if let Some(held) = self.applications.iter_mut().find(|a| a.id == id) {
            *held = decided.clone();
        }
        Ok(decided)
    }

    pub async fn list_conversations(&mut self, token: &str) -> Result<&[Conversation]> {
        let result = self.service.list_company_conversations(token).await;
        self.conversations = track(&mut self.error, result)?;
        Ok(&self.conversations)
    }

    pub async fn send_message(
        &mut self,
        token: &str,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<()> {
        let result = self.service.reply(token, conversation_id, text).await;
        let message = track(&mut self.error, result)?;
        if let Some(thread) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            thread.push(message);
        }
        Ok(())
    }

    // --- Selectors ---

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn stats(&self) -> OrganizationStats {
        OrganizationStats {
            total_postings: self.postings.len(),
            active_postings: self
                .postings
                .iter()
                .filter(|p| p.status == crate::models::PostingStatus::Active)
                .count(),
            total_applications: self.applications.len(),
            pending_applications: self
                .applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Pending)
                .count(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
