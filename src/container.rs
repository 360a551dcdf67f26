//! Lazily built store client and entity providers.
//!
//! Every slot is an async initialise-once cell: the first caller builds,
//! concurrent callers wait for that build, later callers get the cached
//! value. A failed build leaves the slot empty so the next call retries.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::database::manager::{self, DatabaseError};
use crate::database::models::{Company, Contact, Entity, Inspection, Inventory, Project, User};
use crate::database::store::DocumentStore;
use crate::services::provider::{Provider, ReadPolicy};

#[derive(Default)]
pub struct ProviderSlots {
    user: OnceCell<Provider<User>>,
    contact: OnceCell<Provider<Contact>>,
    company: OnceCell<Provider<Company>>,
    project: OnceCell<Provider<Project>>,
    inventory: OnceCell<Provider<Inventory>>,
    inspection: OnceCell<Provider<Inspection>>,
}

/// An entity kind with a provider slot in the container.
pub trait Managed: Entity {
    fn slot(slots: &ProviderSlots) -> &OnceCell<Provider<Self>>;
}

macro_rules! managed {
    ($($entity:ty => $field:ident),* $(,)?) => {
        $(
            impl Managed for $entity {
                fn slot(slots: &ProviderSlots) -> &OnceCell<Provider<Self>> {
                    &slots.$field
                }
            }
        )*
    };
}

managed! {
    User => user,
    Contact => contact,
    Company => company,
    Project => project,
    Inventory => inventory,
    Inspection => inspection,
}

pub struct Container {
    config: Arc<AppConfig>,
    store: OnceCell<Arc<dyn DocumentStore>>,
    slots: ProviderSlots,
}

impl Container {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            store: OnceCell::new(),
            slots: ProviderSlots::default(),
        }
    }

    /// Container around an already connected store.
    pub fn with_store(config: Arc<AppConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store: OnceCell::new_with(Some(store)),
            slots: ProviderSlots::default(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The shared store client, connecting on first use.
    pub async fn store(&self) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        let store = self
            .store
            .get_or_try_init(|| manager::connect(&self.config.database))
            .await?;
        Ok(Arc::clone(store))
    }

    pub async fn provider<E: Managed>(&self) -> Result<&Provider<E>, DatabaseError> {
        E::slot(&self.slots)
            .get_or_try_init(|| async {
                let store = self.store().await?;
                info!("Initialised {} provider", E::KIND);
                Ok::<_, DatabaseError>(Provider::new(store, ReadPolicy::from(&self.config.store)))
            })
            .await
    }

    pub async fn user_provider(&self) -> Result<&Provider<User>, DatabaseError> {
        self.provider().await
    }

    pub async fn contact_provider(&self) -> Result<&Provider<Contact>, DatabaseError> {
        self.provider().await
    }

    pub async fn company_provider(&self) -> Result<&Provider<Company>, DatabaseError> {
        self.provider().await
    }

    pub async fn project_provider(&self) -> Result<&Provider<Project>, DatabaseError> {
        self.provider().await
    }

    pub async fn inventory_provider(&self) -> Result<&Provider<Inventory>, DatabaseError> {
        self.provider().await
    }

    pub async fn inspection_provider(&self) -> Result<&Provider<Inspection>, DatabaseError> {
        self.provider().await
    }
}
