//! Entity records persisted one collection per kind.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use crate::database::store::Filter;

pub mod company;
pub mod contact;
pub mod inspection;
pub mod inventory;
pub mod project;
pub mod user;

pub use company::{Company, UpdateCompanyRequest};
pub use contact::{Contact, UpdateContactRequest};
pub use inspection::{Inspection, UpdateInspectionRequest};
pub use inventory::{Inventory, Stage, UpdateInventoryRequest};
pub use project::{Project, UpdateProjectRequest};
pub use user::{UpdateUserRequest, User};

/// How an update or delete request finds the record it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    Id(String),
    Key(Vec<Filter>),
}

/// A record type with server-assigned `id`/`created` and an optional natural key.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync + 'static
{
    /// Display name used in logs and messages.
    const KIND: &'static str;
    const COLLECTION: &'static str;
    /// Stored field (and query parameter) of a single-field natural key.
    const KEY_FIELD: Option<&'static str> = None;

    type Update: DeserializeOwned + Clone + Debug + Send + Sync + 'static + UpdateRequest<Self>;

    fn id(&self) -> &str;
    fn created(&self) -> &str;
    fn assign_identity(&mut self, id: String, created: String);

    /// Conditions that must not match any existing record at creation.
    fn natural_key(&self) -> Vec<Filter> {
        Vec::new()
    }

    /// Short human label, e.g. the username.
    fn label(&self) -> String {
        self.id().to_string()
    }

    fn is_deleted(&self) -> bool {
        false
    }

    /// Runs once on a new record after its identity is assigned.
    fn prepare_new(&mut self) {}

    /// Strip fields that must never leave the service.
    fn redacted(self) -> Self {
        self
    }

    /// Target of a delete request: the id when present, else the natural key.
    fn locator(&self) -> Locator {
        let key = self.natural_key();
        if self.id().is_empty() && !key.is_empty() {
            Locator::Key(key)
        } else {
            Locator::Id(self.id().to_string())
        }
    }
}

/// Mutable fields of an entity, merged onto the stored record.
pub trait UpdateRequest<E> {
    fn locator(&self) -> Locator;

    /// Returns `current` with every mutable field replaced. Immutable
    /// fields (`id`, `created`, and anything else the entity guards) are kept.
    fn apply(self, current: E) -> E;
}
