use std::sync::Arc;

use crate::error::{Result, ServiceError};
use crate::models::{Identity, Role, SignUpForm};
use crate::persist::Persisted;
use crate::service::{AuthService, SessionGrant};
use crate::store::track;
use crate::validate;

/// Authenticated identity plus the token that proves it.
pub struct SessionStore {
    service: Arc<dyn AuthService>,
    persisted: Persisted,
    identity: Option<Identity>,
    token: Option<String>,
    error: Option<String>,
}

impl SessionStore {
    pub fn new(service: Arc<dyn AuthService>, persisted: Persisted) -> Self {
        Self {
            service,
            persisted,
            identity: None,
            token: None,
            error: None,
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity> {
        let result = match validate::credentials(email, password) {
            Ok(()) => self.service.sign_in(email.trim(), password).await,
            Err(e) => Err(e),
        };
        let grant = track(&mut self.error, result)?;
        self.commit(grant)
    }

    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<Identity> {
        let result = match validate::sign_up(form) {
            Ok(()) => self.service.sign_up(form).await,
            Err(e) => Err(e),
        };
        let grant = track(&mut self.error, result)?;
        self.commit(grant)
    }

    fn commit(&mut self, grant: SessionGrant) -> Result<Identity> {
        self.persisted.save_session(&grant.token, &grant.identity)?;
        self.token = Some(grant.token);
        self.identity = Some(grant.identity.clone());
        Ok(grant.identity)
    }

    /// Local state and storage are cleared even when the backend call fails.
    pub async fn sign_out(&mut self) -> Result<()> {
        let remote = match self.token.take() {
            Some(token) => self.service.sign_out(&token).await,
            None => Ok(()),
        };
        self.identity = None;
        self.persisted.clear_session()?;
        if let Err(e) = &remote {
            tracing::warn!(error = %e, "sign-out call failed; local session cleared anyway");
        }
        track(&mut self.error, remote)
    }

    /// Rehydrates from local storage only. A token without a readable
    /// identity snapshot wipes both keys.
    pub fn restore_session(&mut self) -> Result<Identity> {
        let snapshot = self.persisted.load_session()?;
        match (snapshot.token, snapshot.identity) {
            (Some(token), Some(identity)) => {
                self.token = Some(token);
                self.identity = Some(identity.clone());
                Ok(identity)
            }
            (Some(_), None) => {
                tracing::warn!("session token without identity snapshot; clearing session");
                self.persisted.clear_session()?;
                self.token = None;
                self.identity = None;
                Err(ServiceError::Unauthenticated)
            }
            (None, _) => {
                self.token = None;
                self.identity = None;
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    /// Replaces the held identity, e.g. after a profile update.
    pub fn set_identity(&mut self, identity: Identity) {
        if let Err(e) = self.persisted.save_identity(&identity) {
            tracing::warn!(error = %e, "failed to persist identity snapshot");
        }
        self.identity = Some(identity);
    }

    // --- Selectors ---

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.identity.is_some()
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token().ok_or(ServiceError::Unauthenticated)
    }

    /// Token of a signed-in user holding `role`.
    pub fn require_role(&self, role: Role) -> Result<&str> {
        let token = self.require_token()?;
        if self.role() != Some(role) {
            return Err(ServiceError::Forbidden);
        }
        Ok(token)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::backend;
    use crate::persist::keys;
    use crate::service::MockAuthService;
    use crate::storage::Storage;

    fn persisted() -> Persisted {
        Persisted::new(Arc::new(Storage::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn sign_in_persists_and_sign_out_clears() {
        let persisted = persisted();
        let mut store = SessionStore::new(Arc::new(backend()), persisted.clone());

        let identity = store.sign_in("contact@techcorp.fr", "company123").await.unwrap();
        assert_eq!(identity.role, Role::Company);
        assert!(store.is_authenticated());
        assert!(persisted.storage().get_raw(keys::SESSION_TOKEN).unwrap().is_some());

        store.sign_out().await.unwrap();
        assert!(!store.is_authenticated());
        assert!(store.identity().is_none());
        assert!(persisted.storage().get_raw(keys::SESSION_TOKEN).unwrap().is_none());
        assert!(persisted.storage().get_raw(keys::SESSION_IDENTITY).unwrap().is_none());
    }

    #[tokio::test]
    async fn session_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stagehub.db");
        {
            let persisted = Persisted::new(Arc::new(Storage::open(&path).unwrap()));
            let mut store = SessionStore::new(Arc::new(backend()), persisted);
            store.sign_in("admin@stagehub.fr", "adminadmin").await.unwrap();
        }

        let persisted = Persisted::new(Arc::new(Storage::open(&path).unwrap()));
        let mut store = SessionStore::new(Arc::new(backend()), persisted);
        let identity = store.restore_session().unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert!(store.require_role(Role::Admin).is_ok());
        assert!(matches!(
            store.require_role(Role::Student),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn restore_without_token_is_unauthenticated() {
        let mut store = SessionStore::new(Arc::new(MockAuthService::new()), persisted());
        assert!(matches!(
            store.restore_session(),
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[test]
    fn restore_with_corrupt_snapshot_clears_storage() {
        let persisted = persisted();
        persisted.storage().set_raw(keys::SESSION_TOKEN, "tok").unwrap();
        persisted.storage().set_raw(keys::SESSION_IDENTITY, "{").unwrap();

        let mut store = SessionStore::new(Arc::new(MockAuthService::new()), persisted.clone());
        assert!(store.restore_session().is_err());
        assert!(persisted.storage().get_raw(keys::SESSION_TOKEN).unwrap().is_none());
    }

    #[tokio::test]
    async fn validation_fails_before_the_service_is_called() {
        // No expectations: any call into the mock would panic.
        let mut store = SessionStore::new(Arc::new(MockAuthService::new()), persisted());
        let form = SignUpForm {
            name: "Ana".to_string(),
            email: "ana@email.com".to_string(),
            password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            role: None,
        };
        assert!(matches!(
            store.sign_up(&form).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(store.error().unwrap().contains("at least 6"));
    }

    #[tokio::test]
    async fn failed_sign_in_records_error_and_stays_signed_out() {
        let mut service = MockAuthService::new();
        service
            .expect_sign_in()
            .returning(|_, _| Err(ServiceError::InvalidCredentials));
        let mut store = SessionStore::new(Arc::new(service), persisted());

        assert!(store.sign_in("a@b.fr", "whatever").await.is_err());
        assert!(!store.is_authenticated());
        assert_eq!(store.error(), Some("Invalid email or password"));
    }
}
