use serde::{Deserialize, Serialize};

use super::{Entity, Locator, UpdateRequest};
use crate::database::store::Filter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub id: String,
    pub created: String,
    pub name: String,
    /// Contact id of the main point of contact.
    pub primary_contact: String,
    /// Contact ids.
    pub contacts: Vec<String>,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: i32,
    pub favorite: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCompanyRequest {
    pub id: String,
    pub name: String,
    pub primary_contact: String,
    pub contacts: Vec<String>,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: i32,
    pub favorite: bool,
    pub deleted: bool,
}

impl Entity for Company {
    const KIND: &'static str = "Company";
    const COLLECTION: &'static str = "company";
    const KEY_FIELD: Option<&'static str> = Some("name");

    type Update = UpdateCompanyRequest;

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
        vec![Filter::eq("name", self.name.as_str())]
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl UpdateRequest<Company> for UpdateCompanyRequest {
    fn locator(&self) -> Locator {
        Locator::Id(self.id.clone())
    }

    fn apply(self, current: Company) -> Company {
        Company {
            id: current.id,
            created: current.created,
            name: self.name,
            primary_contact: self.primary_contact,
            contacts: self.contacts,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            zip: self.zip,
            favorite: self.favorite,
            deleted: self.deleted,
        }
    }
}
