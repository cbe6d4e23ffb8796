use crate::MongoStorage;
use crate::documents::{PasswordRecord, SessionDocument, UserDocument, UserServices};
use crate::error::MongoErrorExt;
use accounts_kernel::safe_nanoid;
use accounts_server::storage::{SessionStorage, StorageError, UserStorage};
use accounts_server::{ConnectionInfo, EmailRecord, NewUser, Session, User};
use async_trait::async_trait;
use mongodb::bson::{self, Document, doc};
use mongodb::results::UpdateResult;

fn require_match(result: UpdateResult, what: &str, id: &str) -> Result<(), StorageError> {
    if result.matched_count == 0 {
        return Err(StorageError::Query {
            message: format!("{what} '{id}' does not exist").into(),
            context: None,
        });
    }
    Ok(())
}

impl MongoStorage {
    async fn find_user(&self, filter: Document) -> Result<Option<User>, StorageError> {
        let found = self.inner.users.find_one(filter).await.context("Finding user")?;
        Ok(found.map(User::from))
    }

    async fn find_session(&self, filter: Document) -> Result<Option<Session>, StorageError> {
        let found = self.inner.sessions.find_one(filter).await.context("Finding session")?;
        Ok(found.map(Session::from))
    }

    async fn update_session_doc(&self, id: &str, mut set: Document) -> Result<(), StorageError> {
        set.insert("updatedAt", bson::DateTime::now());
        let result = self
            .inner
            .sessions
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await
            .context("Updating session")?;
        require_match(result, "Session", id)
    }
}

#[async_trait]
impl UserStorage for MongoStorage {
    async fn create_user(&self, user: NewUser) -> Result<String, StorageError> {
        let id = safe_nanoid!();
        let document = UserDocument {
            id: id.clone(),
            username: user.username,
            emails: user
                .email
                .map(|address| EmailRecord { address: address.to_lowercase(), verified: false })
                .into_iter()
                .collect(),
            deactivated: false,
            created_at: bson::DateTime::now(),
            services: UserServices { password: user.password_hash.map(|hash| PasswordRecord { hash }) },
        };

        self.inner.users.insert_one(document).await.context("Inserting user")?;
        Ok(id)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        self.find_user(doc! { "_id": id }).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.find_user(doc! { "username": username }).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.find_user(doc! { "emails.address": email.to_lowercase() }).await
    }

    async fn find_password_hash(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        let found =
            self.inner.users.find_one(doc! { "_id": user_id }).await.context("Finding user")?;
        Ok(found.and_then(|doc| doc.services.password).map(|p| p.hash))
    }

    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StorageError> {
        let result = self
            .inner
            .users
            .update_one(doc! { "_id": user_id }, doc! { "$set": { "services.password.hash": hash } })
            .await
            .context("Storing password hash")?;
        require_match(result, "User", user_id)
    }
}

#[async_trait]
impl SessionStorage for MongoStorage {
    async fn create_session(
        &self,
        user_id: &str,
        token: &str,
        info: &ConnectionInfo,
    ) -> Result<String, StorageError> {
        let id = safe_nanoid!();
        let now = bson::DateTime::now();
        let document = SessionDocument {
            id: id.clone(),
            user_id: user_id.to_owned(),
            token: token.to_owned(),
            valid: true,
            user_agent: info.user_agent.clone(),
            ip: info.ip.clone(),
            created_at: now,
            updated_at: now,
        };

        self.inner.sessions.insert_one(document).await.context("Inserting session")?;
        Ok(id)
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>, StorageError> {
        self.find_session(doc! { "_id": id }).await
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        self.find_session(doc! { "token": token }).await
    }

    async fn update_session(&self, id: &str, info: &ConnectionInfo) -> Result<(), StorageError> {
        self.update_session_doc(
            id,
            doc! { "userAgent": info.user_agent.clone(), "ip": info.ip.clone() },
        )
        .await
    }

    async fn invalidate_session(&self, id: &str) -> Result<(), StorageError> {
        self.update_session_doc(id, doc! { "valid": false }).await
    }

    async fn invalidate_all_sessions(&self, user_id: &str) -> Result<(), StorageError> {
        self.inner
            .sessions
            .update_many(
                doc! { "userId": user_id },
                doc! { "$set": { "valid": false, "updatedAt": bson::DateTime::now() } },
            )
            .await
            .context("Invalidating sessions")?;
        Ok(())
    }
}
