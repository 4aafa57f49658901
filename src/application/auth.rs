//! Mock authentication against the static user directory.
//!
//! Passwords are compared in plain text and the token is a constant. The
//! session lives in the local store so consecutive runs share it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::clock::{Clock, IdSequence, SystemClock};
use crate::application::local::{LocalCollections, SESSION_TOKEN_KEY, SESSION_USER_KEY};
use crate::application::repos::{AccountDirectory, SourceError, StoreError};
use crate::domain::entities::UserRecord;
use crate::domain::posts::avatar_url;
use crate::domain::types::UserRole;

pub const MOCK_TOKEN: &str = "mock-jwt-token";
const USER_ID_PREFIX: &str = "user-";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("no active session")]
    NotAuthenticated,
    #[error("user directory unavailable: {0}")]
    Directory(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountDirectory>,
    local: LocalCollections,
    clock: Arc<dyn Clock>,
    ids: Arc<IdSequence>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountDirectory>, local: LocalCollections) -> Self {
        Self {
            accounts,
            local,
            clock: Arc::new(SystemClock),
            ids: Arc::new(IdSequence::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, AuthError> {
        let email = credentials.email.trim();
        let account = self
            .accounts
            .list_accounts()
            .await?
            .into_iter()
            .find(|account| {
                account.user.email.eq_ignore_ascii_case(email)
                    && account.password == credentials.password
            })
            .ok_or(AuthError::InvalidCredentials)?;

        let session = self.open_session(account.user).await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        if request.password != request.confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }
        let name = request.name.trim();
        let email = request.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AuthError::Validation(
                "Name and email are required".to_string(),
            ));
        }

        let accounts = self.accounts.list_accounts().await?;
        if accounts
            .iter()
            .any(|account| account.user.email.eq_ignore_ascii_case(email))
        {
            return Err(AuthError::Validation("Email already exists".to_string()));
        }

        let now = self.clock.now();
        let user = UserRecord {
            id: self.ids.next_id(USER_ID_PREFIX, now, |candidate| {
                accounts.iter().any(|account| account.user.id == candidate)
            }),
            email: email.to_string(),
            name: name.to_string(),
            avatar: avatar_url(name),
            bio: String::new(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };

        let session = self.open_session(user).await?;
        info!(user_id = %session.user.id, "Registered new user");
        Ok(session)
    }

    pub async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let user = self.local.load_value::<UserRecord>(SESSION_USER_KEY).await?;
        let token = self.local.get_raw(SESSION_TOKEN_KEY).await?;
        Ok(match (user, token) {
            (Some(user), Some(token)) => Some(AuthSession { user, token }),
            _ => None,
        })
    }

    pub async fn require_session(&self) -> Result<AuthSession, AuthError> {
        self.current_session()
            .await?
            .ok_or(AuthError::NotAuthenticated)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.local.remove(SESSION_TOKEN_KEY).await?;
        self.local.remove(SESSION_USER_KEY).await?;
        info!("Signed out");
        Ok(())
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<UserRecord, AuthError> {
        let mut session = self.require_session().await?;
        let user = &mut session.user;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(bio) = patch.bio {
            user.bio = bio;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = avatar;
        }
        user.updated_at = self.clock.now();

        self.local.save_value(SESSION_USER_KEY, &session.user).await?;
        Ok(session.user)
    }

    async fn open_session(&self, user: UserRecord) -> Result<AuthSession, AuthError> {
        self.local.save_value(SESSION_USER_KEY, &user).await?;
        self.local.put_raw(SESSION_TOKEN_KEY, MOCK_TOKEN).await?;
        Ok(AuthSession {
            user,
            token: MOCK_TOKEN.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::application::clock::ManualClock;
    use crate::application::repos::StoredAccount;
    use crate::infra::storage::MemoryStore;

    struct StaticDirectory;

    #[async_trait]
    impl AccountDirectory for StaticDirectory {
        async fn list_accounts(&self) -> Result<Vec<StoredAccount>, SourceError> {
            Ok(vec![StoredAccount {
                user: UserRecord {
                    id: "1".to_string(),
                    email: "ada@example.com".to_string(),
                    name: "Ada".to_string(),
                    avatar: String::new(),
                    bio: String::new(),
                    role: UserRole::Admin,
                    created_at: datetime!(2024-01-01 0:00 UTC),
                    updated_at: datetime!(2024-01-01 0:00 UTC),
                },
                password: "engine".to_string(),
            }])
        }
    }

    fn service() -> AuthService {
        let local = LocalCollections::new(Arc::new(MemoryStore::new()));
        AuthService::new(Arc::new(StaticDirectory), local)
            .with_clock(Arc::new(ManualClock::new(datetime!(2024-05-01 9:00 UTC))))
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials {
            email: "ada@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_opens_a_persisted_session() {
        let service = service();
        let session = service.login(credentials("engine")).await.expect("login");
        assert_eq!(session.token, MOCK_TOKEN);
        assert_eq!(session.user.id, "1");

        let current = service.current_session().await.expect("read");
        assert_eq!(current, Some(session));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let err = service()
            .login(credentials("wrong"))
            .await
            .expect_err("bad password");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_validates_confirmation_and_duplicates() {
        let service = service();
        let mismatch = service
            .register(RegisterRequest {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                password: "a".to_string(),
                confirm_password: "b".to_string(),
            })
            .await
            .expect_err("mismatch");
        assert!(matches!(mismatch, AuthError::Validation(message) if message.contains("match")));

        let duplicate = service
            .register(RegisterRequest {
                name: "Ada".to_string(),
                email: "ADA@example.com".to_string(),
                password: "a".to_string(),
                confirm_password: "a".to_string(),
            })
            .await
            .expect_err("duplicate");
        assert!(matches!(duplicate, AuthError::Validation(message) if message.contains("exists")));
    }

    #[tokio::test]
    async fn register_creates_user_session() {
        let session = service()
            .register(RegisterRequest {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                password: "cobol".to_string(),
                confirm_password: "cobol".to_string(),
            })
            .await
            .expect("register");
        assert_eq!(session.user.id, "user-1714554000000");
        assert_eq!(session.user.role, UserRole::User);
    }

    #[tokio::test]
    async fn logout_clears_session_and_profile_requires_one() {
        let service = service();
        service.login(credentials("engine")).await.expect("login");
        service.logout().await.expect("logout");

        assert!(service.current_session().await.expect("read").is_none());
        let err = service
            .update_profile(ProfilePatch::default())
            .await
            .expect_err("no session");
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn update_profile_persists_changes() {
        let service = service();
        service.login(credentials("engine")).await.expect("login");
        let user = service
            .update_profile(ProfilePatch {
                bio: Some("Analyst".to_string()),
                ..Default::default()
            })
            .await
            .expect("update");
        assert_eq!(user.bio, "Analyst");

        let session = service.require_session().await.expect("session");
        assert_eq!(session.user.bio, "Analyst");
    }
}
