use std::sync::Arc;

use crate::error::Result;
use crate::models::{Conversation, ConversationId};
use crate::service::MessagingService;
use crate::store::track;

/// Student-side message threads.
pub struct ConversationStore {
    service: Arc<dyn MessagingService>,
    conversations: Vec<Conversation>,
    error: Option<String>,
}

impl ConversationStore {
    pub fn new(service: Arc<dyn MessagingService>) -> Self {
        Self {
            service,
            conversations: Vec::new(),
            error: None,
        }
    }

    pub async fn list_conversations(&mut self, token: &str) -> Result<&[Conversation]> {
        let result = self.service.list_student_conversations(token).await;
        self.conversations = track(&mut self.error, result)?;
        Ok(&self.conversations)
    }

    pub async fn send_message(
        &mut self,
        token: &str,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<()> {
        let result = self.service.send_to_company(token, conversation_id, text).await;
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

    pub async fn start_conversation(
        &mut self,
        token: &str,
        counterpart: &str,
        posting_title: &str,
        initial_text: &str,
    ) -> Result<&Conversation> {
        let result = self
            .service
            .start_conversation(token, counterpart, posting_title, initial_text)
            .await;
        let conversation = track(&mut self.error, result)?;
        self.conversations.insert(0, conversation);
        Ok(&self.conversations[0])
    }

    pub fn mark_as_read(&mut self, conversation_id: ConversationId) {
        if let Some(thread) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            thread.unread_count = 0;
        }
    }

    // --- Selectors ---

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn unread_total(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
