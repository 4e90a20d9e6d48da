//! The persist/rehydrate boundary. Only the slices listed in [`keys`]
//! survive a restart; everything else is rebuilt from the backend seed.

use std::sync::Arc;

use crate::backend::StoredAccount;
use crate::error::Result;
use crate::models::{AdminAccount, Company, Document, Identity, PostingId, UserId};
use crate::storage::Storage;

pub mod keys {
    pub const SESSION_TOKEN: &str = "session.token";
    pub const SESSION_IDENTITY: &str = "session.identity";
    pub const FAVORITES: &str = "favorites";
    pub const ADMINS: &str = "admins";
    pub const ACCOUNTS: &str = "accounts";
    pub const COMPANIES: &str = "companies";
}

/// What a fresh process needs to restore a session.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub identity: Option<Identity>,
}

/// Typed access to persisted keys, shared by the stores and the backend.
#[derive(Clone)]
pub struct Persisted {
    storage: Arc<Storage>,
}

impl Persisted {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // --- Session ---

    /// Reads the token and identity snapshot. An unreadable identity is
    /// reported as `None` rather than an error so the caller can decide to
    /// clear the session.
    pub fn load_session(&self) -> Result<SessionSnapshot> {
        let token = self.storage.get_raw(keys::SESSION_TOKEN)?;
        let identity = match self.storage.get_json::<Identity>(keys::SESSION_IDENTITY) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable identity snapshot");
                None
            }
        };
        Ok(SessionSnapshot { token, identity })
    }

    pub fn save_session(&self, token: &str, identity: &Identity) -> Result<()> {
        self.storage.set_raw(keys::SESSION_TOKEN, token)?;
        self.save_identity(identity)
    }

    pub fn save_identity(&self, identity: &Identity) -> Result<()> {
        self.storage.set_json(keys::SESSION_IDENTITY, identity)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.storage.remove(keys::SESSION_TOKEN)?;
        self.storage.remove(keys::SESSION_IDENTITY)
    }

    // --- Favorites ---

    pub fn load_favorites(&self) -> Result<Vec<PostingId>> {
        Ok(self
            .storage
            .get_json::<Vec<PostingId>>(keys::FAVORITES)?
            .unwrap_or_default())
    }

    pub fn save_favorites(&self, favorites: &[PostingId]) -> Result<()> {
        if favorites.is_empty() {
            return self.storage.remove(keys::FAVORITES);
        }
        self.storage.set_json(keys::FAVORITES, favorites)
    }

    // --- Accounts ---

    pub fn load_admins(&self) -> Result<Vec<AdminAccount>> {
        Ok(self
            .storage
            .get_json::<Vec<AdminAccount>>(keys::ADMINS)?
            .unwrap_or_default())
    }

    pub fn save_admins(&self, admins: &[AdminAccount]) -> Result<()> {
        self.storage.set_json(keys::ADMINS, admins)
    }

    pub fn load_accounts(&self) -> Result<Vec<StoredAccount>> {
        Ok(self
            .storage
            .get_json::<Vec<StoredAccount>>(keys::ACCOUNTS)?
            .unwrap_or_default())
    }

    pub fn save_accounts(&self, accounts: &[StoredAccount]) -> Result<()> {
        self.storage.set_json(keys::ACCOUNTS, accounts)
    }

    /// Company rows created by self-registration.
    pub fn load_companies(&self) -> Result<Vec<Company>> {
        Ok(self
            .storage
            .get_json::<Vec<Company>>(keys::COMPANIES)?
            .unwrap_or_default())
    }

    pub fn save_companies(&self, companies: &[Company]) -> Result<()> {
        self.storage.set_json(keys::COMPANIES, companies)
    }

    // --- Documents ---

    pub fn save_document(&self, doc: &Document) -> Result<()> {
        self.storage.put_document(doc)
    }

    pub fn load_document(&self, user_id: UserId) -> Result<Option<Document>> {
        self.storage.get_document(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn persisted() -> Persisted {
        Persisted::new(Arc::new(Storage::open_in_memory().unwrap()))
    }

    #[test]
    fn session_round_trip_and_clear() {
        let p = persisted();
        let identity = Identity {
            id: 3,
            name: "Marie Martin".to_string(),
            email: "marie.martin@email.com".to_string(),
            role: Role::Student,
        };
        p.save_session("tok", &identity).unwrap();

        let snap = p.load_session().unwrap();
        assert_eq!(snap.token.as_deref(), Some("tok"));
        assert_eq!(snap.identity, Some(identity));

        p.clear_session().unwrap();
        let snap = p.load_session().unwrap();
        assert!(snap.token.is_none());
        assert!(snap.identity.is_none());
    }

    #[test]
    fn unreadable_identity_loads_as_none() {
        let p = persisted();
        p.storage().set_raw(keys::SESSION_TOKEN, "tok").unwrap();
        p.storage().set_raw(keys::SESSION_IDENTITY, "[]").unwrap();
        let snap = p.load_session().unwrap();
        assert_eq!(snap.token.as_deref(), Some("tok"));
        assert!(snap.identity.is_none());
    }

    #[test]
    fn empty_favorites_remove_the_key() {
        let p = persisted();
        p.save_favorites(&[4, 2]).unwrap();
        assert_eq!(p.load_favorites().unwrap(), vec![4, 2]);
        p.save_favorites(&[]).unwrap();
        assert_eq!(p.storage().get_raw(keys::FAVORITES).unwrap(), None);
        assert!(p.load_favorites().unwrap().is_empty());
    }
}
