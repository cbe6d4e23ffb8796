use super::{SessionStorage, StorageError, UserStorage};
use crate::types::{ConnectionInfo, EmailRecord, NewUser, Session, User};
use accounts_kernel::safe_nanoid;
use async_trait::async_trait;
use chrono::Utc;
use fxhash::FxHashMap;
use parking_lot::RwLock;

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: Option<String>,
}

/// Process-local storage. Data lives as long as the value and is never persisted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    users: RwLock<FxHashMap<String, StoredUser>>,
    sessions: RwLock<FxHashMap<String, Session>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().values().find(|stored| predicate(&stored.user)).map(|s| s.user.clone())
    }

    fn with_session(
        &self,
        id: &str,
        update: impl FnOnce(&mut Session),
    ) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(id).ok_or_else(|| StorageError::Query {
            message: format!("Session '{id}' does not exist").into(),
            context: None,
        })?;
        update(session);
        session.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> Result<String, StorageError> {
        let email = user.email.map(|e| e.to_lowercase());
        let mut users = self.users.write();

        let taken = users.values().any(|stored| {
            let same_name = user.username.is_some() && stored.user.username == user.username;
            let same_email = email.as_ref().is_some_and(|email| {
                stored.user.emails.iter().any(|record| &record.address == email)
            });
            same_name || same_email
        });
        if taken {
            return Err(StorageError::Duplicate {
                message: "Username or email already exists".into(),
                context: None,
            });
        }

        let id = safe_nanoid!();
        let emails = email.map(|address| EmailRecord { address, verified: false });
        users.insert(
            id.clone(),
            StoredUser {
                user: User {
                    id: id.clone(),
                    username: user.username,
                    emails: emails.into_iter().collect(),
                    deactivated: false,
                    created_at: Utc::now(),
                },
                password_hash: user.password_hash,
            },
        );
        Ok(id)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.read().get(id).map(|stored| stored.user.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.find_user(|user| user.username.as_deref() == Some(username)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let email = email.to_lowercase();
        Ok(self.find_user(|user| user.emails.iter().any(|record| record.address == email)))
    }

    async fn find_password_hash(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.users.read().get(user_id).and_then(|stored| stored.password_hash.clone()))
    }

    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StorageError> {
        let mut users = self.users.write();
        let stored = users.get_mut(user_id).ok_or_else(|| StorageError::Query {
            message: format!("User '{user_id}' does not exist").into(),
            context: None,
        })?;
        stored.password_hash = Some(hash.to_owned());
        Ok(())
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn create_session(
        &self,
        user_id: &str,
        token: &str,
        info: &ConnectionInfo,
    ) -> Result<String, StorageError> {
        let mut sessions = self.sessions.write();
        if sessions.values().any(|session| session.token == token) {
            return Err(StorageError::Duplicate {
                message: "Session token already exists".into(),
                context: None,
            });
        }

        let id = safe_nanoid!();
        let now = Utc::now();
        sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                user_id: user_id.to_owned(),
                token: token.to_owned(),
                valid: true,
                user_agent: info.user_agent.clone(),
                ip: info.ip.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.read().values().find(|session| session.token == token).cloned())
    }

    async fn update_session(&self, id: &str, info: &ConnectionInfo) -> Result<(), StorageError> {
        self.with_session(id, |session| {
            session.user_agent.clone_from(&info.user_agent);
            session.ip.clone_from(&info.ip);
        })
    }

    async fn invalidate_session(&self, id: &str) -> Result<(), StorageError> {
        self.with_session(id, |session| session.valid = false)
    }

    async fn invalidate_all_sessions(&self, user_id: &str) -> Result<(), StorageError> {
        let now = Utc::now();
        for session in self.sessions.write().values_mut().filter(|s| s.user_id == user_id) {
            session.valid = false;
            session.updated_at = now;
        }
        Ok(())
    }
}
