use serde::{Deserialize, Serialize};

use super::{Entity, Locator, UpdateRequest};
use crate::database::store::Filter;

/// A non-user contact, identified by name within a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub id: String,
    pub created: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub timezone: String,
    pub favorite: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateContactRequest {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub timezone: String,
    pub favorite: bool,
    pub deleted: bool,
}

impl Entity for Contact {
    const KIND: &'static str = "Contact";
    const COLLECTION: &'static str = "contacts";

    type Update = UpdateContactRequest;

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
        vec![
            Filter::eq("firstName", self.first_name.as_str()),
            Filter::eq("lastName", self.last_name.as_str()),
            Filter::eq("company", self.company.as_str()),
        ]
    }

    fn label(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl UpdateRequest<Contact> for UpdateContactRequest {
    fn locator(&self) -> Locator {
        Locator::Id(self.id.clone())
    }

    fn apply(self, current: Contact) -> Contact {
        Contact {
            id: current.id,
            created: current.created,
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            email: self.email,
            phone: self.phone,
            timezone: self.timezone,
            favorite: self.favorite,
            deleted: self.deleted,
        }
    }
}
