use accounts_server::{EmailRecord, Session, User};
use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};

pub(crate) const USERS: &str = "users";
pub(crate) const SESSIONS: &str = "sessions";

/// Stored shape of a user. Optional identifiers are omitted rather than stored as null so the
/// sparse unique indexes skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDocument {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) emails: Vec<EmailRecord>,
    #[serde(default)]
    pub(crate) deactivated: bool,
    pub(crate) created_at: bson::DateTime,
    #[serde(default)]
    pub(crate) services: UserServices,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserServices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) password: Option<PasswordRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PasswordRecord {
    pub(crate) hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDocument {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) token: String,
    pub(crate) valid: bool,
    pub(crate) user_agent: Option<String>,
    pub(crate) ip: Option<String>,
    pub(crate) created_at: bson::DateTime,
    pub(crate) updated_at: bson::DateTime,
}

fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            username: doc.username,
            emails: doc.emails,
            deactivated: doc.deactivated,
            created_at: to_chrono(doc.created_at),
        }
    }
}

impl From<SessionDocument> for Session {
    fn from(doc: SessionDocument) -> Self {
        Self {
            id: doc.id,
            user_id: doc.user_id,
            token: doc.token,
            valid: doc.valid,
            user_agent: doc.user_agent,
            ip: doc.ip,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}
