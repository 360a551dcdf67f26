use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Entity, Locator, UpdateRequest};
use crate::database::store::Filter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub created: String,
    #[serde(alias = "firstname")]
    pub first_name: String,
    #[serde(alias = "lastname")]
    pub last_name: String,
    pub role: String,
    pub username: String,
    /// Salted digest once stored; never present in API responses.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub email: String,
    pub phone: String,
    #[serde(alias = "timeZone")]
    pub timezone: String,
    #[serde(alias = "darkmode")]
    pub dark_mode: bool,
}

/// Profile fields a user update may change. Password and identity are not among them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    #[serde(alias = "firstname")]
    pub first_name: String,
    #[serde(alias = "lastname")]
    pub last_name: String,
    pub role: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(alias = "timeZone")]
    pub timezone: String,
    #[serde(alias = "darkmode")]
    pub dark_mode: bool,
}

/// Hex SHA-256 of `source` followed by `salt`.
pub fn hash_password(source: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl User {
    pub fn verify_password(&self, candidate: &str) -> bool {
        !self.password.is_empty() && self.password == hash_password(candidate, &self.id)
    }
}

impl Entity for User {
    const KIND: &'static str = "User";
    const COLLECTION: &'static str = "users";
    const KEY_FIELD: Option<&'static str> = Some("username");

    type Update = UpdateUserRequest;

    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> &str {
        &self.created
    }

    fn assign_identity(&mut self, id: String, created: String) {
        self.id = id;
        self.created = created;
    }

    fn natural_key(&self) -> Vec<Filter> {
        vec![Filter::eq("username", self.username.as_str())]
    }

    fn label(&self) -> String {
        self.username.clone()
    }

    fn prepare_new(&mut self) {
        if !self.password.is_empty() {
            self.password = hash_password(&self.password, &self.id);
        }
    }

    fn redacted(mut self) -> Self {
        self.password.clear();
        self
    }
}

impl UpdateRequest<User> for UpdateUserRequest {
    fn locator(&self) -> Locator {
        Locator::Key(vec![Filter::eq("username", self.username.as_str())])
    }

    fn apply(self, current: User) -> User {
        User {
            id: current.id,
            created: current.created,
            password: current.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            username: self.username,
            email: self.email,
            phone: self.phone,
            timezone: self.timezone,
            dark_mode: self.dark_mode,
        }
    }
}
