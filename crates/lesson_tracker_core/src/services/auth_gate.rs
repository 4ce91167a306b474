//! crates/lesson_tracker_core/src/services/auth_gate.rs
//!
//! Issues, validates and revokes session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::domain::{AuthSession, Identity, User};
use crate::ports::{CredentialStore, PortError, SessionStore};

/// Hashes a password into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ServiceError::Port(PortError::Unexpected("password hashing failed".to_string()))
        })
}

fn verify_password(password: &str, hashed_password: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ServiceError::Port(PortError::Unexpected("stored password hash is malformed".to_string()))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// The single gate every item operation passes through.
pub struct AuthGate {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
}

impl AuthGate {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            sessions,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Checks the credentials and, on success, stores and returns a new session.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<AuthSession> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let Some(creds) = self.credentials.find_by_username(username).await? else {
            warn!("Login rejected: unknown username");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &creds.hashed_password)? {
            warn!(user_id = %creds.user_id, "Login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let issued_at = Utc::now();
        let expires_at = issued_at.checked_add_signed(self.session_ttl).ok_or_else(|| {
            error!("Session TTL {} overflows the expiry timestamp", self.session_ttl);
            ServiceError::Port(PortError::Unexpected("session expiry out of range".to_string()))
        })?;
        let session = AuthSession {
            token: Uuid::new_v4().simple().to_string(),
            user_id: creds.user_id,
            issued_at,
            expires_at,
        };
        self.sessions.put(session.clone()).await?;

        info!(user_id = %session.user_id, "User logged in");
        Ok(session)
    }

    /// Resolves a token to the identity it was issued for. Read-only.
    pub async fn validate(&self, token: Option<&str>) -> ServiceResult<Identity> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ServiceError::Unauthenticated),
        };

        match self.sessions.get(token).await? {
            Some(session) if !session.is_expired_at(Utc::now()) => Ok(Identity {
                user_id: session.user_id,
            }),
            _ => Err(ServiceError::Unauthenticated),
        }
    }

    /// Revokes a session. Unknown or already expired tokens are accepted silently.
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        self.sessions.remove(token).await?;
        info!("Session revoked");
        Ok(())
    }

    /// Creates a new account. Used by out-of-band provisioning, never by the request path.
    pub async fn provision(&self, username: &str, password: &str) -> ServiceResult<User> {
        if username.trim().is_empty() {
            return Err(ServiceError::InvalidInput("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(ServiceError::InvalidInput("password must not be empty".to_string()));
        }

        let hashed_password = hash_password(password)?;
        let user = self
            .credentials
            .create_user(username, &hashed_password)
            .await
            .map_err(|e| match e {
                PortError::Conflict(msg) => ServiceError::Conflict(msg),
                other => ServiceError::Port(other),
            })?;

        info!(user_id = %user.user_id, "Provisioned user");
        Ok(user)
    }

    /// Deletes an account and revokes all of its sessions. The caller owns
    /// cleanup of the account's items.
    pub async fn deprovision(&self, username: &str) -> ServiceResult<User> {
        let creds = self
            .credentials
            .find_by_username(username)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !self.credentials.delete_user(creds.user_id).await? {
            return Err(ServiceError::NotFound);
        }
        let revoked = self.sessions.remove_by_user(creds.user_id).await?;

        info!(user_id = %creds.user_id, revoked, "Deprovisioned user");
        Ok(User {
            user_id: creds.user_id,
            username: creds.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryCredentialStore, InMemorySessionStore};

    struct Fixture {
        gate: AuthGate,
        sessions: Arc<InMemorySessionStore>,
    }

    async fn fixture_with_ttl(ttl: Duration) -> Fixture {
        let sessions = Arc::new(InMemorySessionStore::new());
        let gate = AuthGate::new(
            Arc::new(InMemoryCredentialStore::new()),
            sessions.clone(),
            ttl,
        );
        gate.provision("alice", "pw1").await.unwrap();
        gate.provision("bob", "pw2").await.unwrap();
        Fixture { gate, sessions }
    }

    async fn fixture() -> Fixture {
        fixture_with_ttl(Duration::hours(1)).await
    }

    #[tokio::test]
    async fn login_then_validate_returns_same_identity() {
        let f = fixture().await;

        let session = f.gate.login("alice", "pw1").await.unwrap();
        let identity = f.gate.validate(Some(&session.token)).await.unwrap();

        assert_eq!(identity.user_id, session.user_id);
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(1));
    }

    #[tokio::test]
    async fn each_login_issues_a_distinct_token() {
        let f = fixture().await;

        let first = f.gate.login("alice", "pw1").await.unwrap();
        let second = f.gate.login("alice", "pw1").await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_the_same_way() {
        let f = fixture().await;

        let wrong_password = f.gate.login("alice", "nope").await.unwrap_err();
        let unknown_user = f.gate.login("mallory", "pw1").await.unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, ServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(f.sessions.len(), 0);
    }

    #[tokio::test]
    async fn empty_fields_are_rejected_as_invalid_credentials() {
        let f = fixture().await;

        assert!(matches!(
            f.gate.login("", "pw1").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            f.gate.login("alice", "").await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn validate_rejects_missing_and_unknown_tokens() {
        let f = fixture().await;

        assert!(matches!(
            f.gate.validate(None).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            f.gate.validate(Some("")).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            f.gate.validate(Some("never-issued")).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn logout_revokes_an_unexpired_token() {
        let f = fixture().await;
        let session = f.gate.login("alice", "pw1").await.unwrap();

        f.gate.logout(&session.token).await.unwrap();

        assert!(matches!(
            f.gate.validate(Some(&session.token)).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let f = fixture().await;
        let session = f.gate.login("alice", "pw1").await.unwrap();

        f.gate.logout(&session.token).await.unwrap();
        f.gate.logout(&session.token).await.unwrap();
        f.gate.logout("never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn logout_leaves_other_sessions_alone() {
        let f = fixture().await;
        let alice = f.gate.login("alice", "pw1").await.unwrap();
        let bob = f.gate.login("bob", "pw2").await.unwrap();

        f.gate.logout(&alice.token).await.unwrap();

        let identity = f.gate.validate(Some(&bob.token)).await.unwrap();
        assert_eq!(identity.user_id, bob.user_id);
    }

    #[tokio::test]
    async fn expired_session_is_unauthenticated() {
        let f = fixture_with_ttl(Duration::zero()).await;
        let session = f.gate.login("alice", "pw1").await.unwrap();

        assert!(matches!(
            f.gate.validate(Some(&session.token)).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn provision_rejects_duplicates_and_empty_fields() {
        let f = fixture().await;

        assert!(matches!(
            f.gate.provision("alice", "other").await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            f.gate.provision("  ", "pw").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            f.gate.provision("carol", "").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn deprovisioned_user_can_no_longer_log_in() {
        let f = fixture().await;
        let session = f.gate.login("alice", "pw1").await.unwrap();
        let bob = f.gate.login("bob", "pw2").await.unwrap();

        let removed = f.gate.deprovision("alice").await.unwrap();

        assert_eq!(removed.user_id, session.user_id);
        assert!(matches!(
            f.gate.login("alice", "pw1").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            f.gate.validate(Some(&session.token)).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(f.gate.validate(Some(&bob.token)).await.is_ok());
        assert!(matches!(
            f.gate.deprovision("alice").await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn overflowing_ttl_fails_login_without_storing_a_session() {
        let f = fixture_with_ttl(Duration::days(100_000_000_000)).await;

        assert!(matches!(
            f.gate.login("alice", "pw1").await,
            Err(ServiceError::Port(_))
        ));
        assert!(f.sessions.is_empty());
    }

    #[test]
    fn stored_hash_is_not_the_plaintext() {
        let hash = hash_password("pw1").unwrap();

        assert_ne!(hash, "pw1");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw1", &hash).unwrap());
        assert!(!verify_password("pw2", &hash).unwrap());
    }
}
