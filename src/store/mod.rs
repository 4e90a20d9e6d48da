//! Client-side stores. Each one owns its state, reaches the backend only
//! through its service trait and exposes side-effect-free selectors.

pub mod catalog;
pub mod conversation;
pub mod moderation;
pub mod organization;
pub mod profile;
pub mod session;

use std::sync::Arc;

use crate::backend::MockBackend;
use crate::error::Result;
use crate::models::{ProfileUpdate, UserProfile};
use crate::persist::Persisted;

pub use catalog::CatalogStore;
pub use conversation::ConversationStore;
pub use moderation::ModerationStore;
pub use organization::OrganizationStore;
pub use profile::ProfileStore;
pub use session::SessionStore;

/// Remembers the outcome of the last call: cleared on success, the
/// message of the failure otherwise.
pub(crate) fn track<T>(slot: &mut Option<String>, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => *slot = None,
        Err(e) => *slot = Some(e.to_string()),
    }
    result
}

pub struct Stores {
    pub session: SessionStore,
    pub catalog: CatalogStore,
    pub profile: ProfileStore,
    pub organization: OrganizationStore,
    pub moderation: ModerationStore,
    pub conversations: ConversationStore,
}

impl Stores {
    pub fn new(backend: Arc<MockBackend>, persisted: Persisted) -> Result<Self> {
        Ok(Self {
            session: SessionStore::new(backend.clone(), persisted.clone()),
            catalog: CatalogStore::new(backend.clone()),
            profile: ProfileStore::new(backend.clone(), persisted)?,
            organization: OrganizationStore::new(backend.clone()),
            moderation: ModerationStore::new(backend.clone()),
            conversations: ConversationStore::new(backend),
        })
    }

    /// Profile update followed by a refresh of the session identity, the
    /// only state shared between two stores.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<UserProfile> {
        let token = self.session.require_token()?.to_string();
        let updated = self.profile.update_profile(&token, update).await?;
        self.session.set_identity(updated.identity.clone());
        Ok(updated)
    }

    /// The store holding a recorded failure, with its message.
    pub fn last_error(&self) -> Option<(&'static str, &str)> {
        [
            ("session", self.session.error()),
            ("catalog", self.catalog.error()),
            ("profile", self.profile.error()),
            ("organization", self.organization.error()),
            ("moderation", self.moderation.error()),
            ("conversations", self.conversations.error()),
        ]
        .into_iter()
        .find_map(|(store, error)| error.map(|message| (store, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::backend;
    use crate::storage::Storage;

    #[tokio::test]
    async fn profile_update_refreshes_session_identity() {
        let persisted = Persisted::new(Arc::new(Storage::open_in_memory().unwrap()));
        let mut stores = Stores::new(Arc::new(backend()), persisted.clone()).unwrap();
        stores
            .session
            .sign_in("jean.dupont@email.com", "student123")
            .await
            .unwrap();

        stores
            .update_profile(ProfileUpdate {
                name: Some("Jean D.".to_string()),
                ..ProfileUpdate::default()
            })
            .await
            .unwrap();

        assert_eq!(stores.session.identity().unwrap().name, "Jean D.");
        let snapshot = persisted.load_session().unwrap();
        assert_eq!(snapshot.identity.unwrap().name, "Jean D.");
    }

    #[test]
    fn track_records_and_clears() {
        let mut slot = None;
        let _ = track::<()>(&mut slot, Err(crate::error::ServiceError::Forbidden));
        assert!(slot.is_some());
        let _ = track(&mut slot, Ok(1));
        assert!(slot.is_none());
    }

    #[tokio::test]
    async fn last_error_names_the_failing_store() {
        let persisted = Persisted::new(Arc::new(Storage::open_in_memory().unwrap()));
        let mut stores = Stores::new(Arc::new(backend()), persisted).unwrap();
        assert!(stores.last_error().is_none());

        assert!(stores.catalog.get_posting(404).await.is_err());
        let (store, message) = stores.last_error().unwrap();
        assert_eq!(store, "catalog");
        assert!(message.contains("404"));

        stores.catalog.get_posting(1).await.unwrap();
        assert!(stores.last_error().is_none());
    }
}
