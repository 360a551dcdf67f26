use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::{Company, Entity, Locator, Project, UpdateRequest, User};
use crate::database::repository::Repository;
use crate::database::store::{describe_key, DocumentStore, Filter};

/// Whether soft-deleted records are visible to reads.
///
/// Only `get_all`, `get_by_id` and `get_by_key` consult the policy. Update,
/// delete and the uniqueness check at creation always see every record, so a
/// soft-deleted record can be restored with an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadPolicy {
    pub include_deleted: bool,
}

impl ReadPolicy {
    pub fn visible<E: Entity>(&self, record: &E) -> bool {
        self.include_deleted || !record.is_deleted()
    }
}

impl From<&StoreConfig> for ReadPolicy {
    fn from(config: &StoreConfig) -> Self {
        Self {
            include_deleted: config.include_deleted,
        }
    }
}

/// Get/add/update/delete for one entity kind.
#[derive(Debug)]
pub struct Provider<E: Entity> {
    repository: Repository<E>,
    policy: ReadPolicy,
}

impl<E: Entity> Provider<E> {
    pub fn new(store: Arc<dyn DocumentStore>, policy: ReadPolicy) -> Self {
        Self {
            repository: Repository::new(E::COLLECTION, store),
            policy,
        }
    }

    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    pub async fn get_all(&self) -> Result<Vec<E>, DatabaseError> {
        let records = self.repository.get_all().await?;
        Ok(records
            .into_iter()
            .filter(|record| self.policy.visible(record))
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<E, DatabaseError> {
        let record = self.repository.get_by_id(id).await?;
        self.visible_or_not_found(record, || format!("{} with id {}", E::COLLECTION, id))
    }

    /// Lookup by the entity's single-field natural key.
    pub async fn get_by_key(&self, value: &str) -> Result<E, DatabaseError> {
        let field = E::KEY_FIELD.ok_or_else(|| {
            DatabaseError::InvalidInput(format!("{} has no lookup key", E::KIND))
        })?;
        let key = [Filter::eq(field, value)];
        self.repository
            .find(&key)
            .await?
            .into_iter()
            .find(|record| self.policy.visible(record))
            .ok_or_else(|| DatabaseError::NotFound(describe_key(E::COLLECTION, &key)))
    }

    /// Store a new record under a fresh id and creation time.
    ///
    /// Fails with `AlreadyExists` when the natural key is taken; nothing is
    /// written in that case.
    pub async fn add(&self, mut record: E) -> Result<E, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        record.assign_identity(id.clone(), Utc::now().to_rfc3339());
        record.prepare_new();

        self.repository
            .create(&id, &record, &record.natural_key())
            .await?;
        info!("Created {} {} ({})", E::KIND, record.label(), id);

        self.repository.get_by_id(&id).await
    }

    /// Merge the request onto the current record and write it back whole.
    /// Last write wins.
    pub async fn update(&self, request: E::Update) -> Result<E, DatabaseError> {
        let current = self.locate(&request.locator()).await?;
        let id = current.id().to_string();
        let updated = request.apply(current);

        self.repository.set(&id, &updated).await?;
        info!("Updated {} {} ({})", E::KIND, updated.label(), id);

        self.repository.get_by_id(&id).await
    }

    /// Remove the record addressed by `record`'s id, or by its natural key
    /// when the id is empty. Returns what was removed.
    pub async fn delete(&self, record: &E) -> Result<E, DatabaseError> {
        let current = self.locate(&record.locator()).await?;
        self.repository.delete(current.id()).await?;
        info!("Deleted {} {} ({})", E::KIND, current.label(), current.id());
        Ok(current)
    }

    async fn locate(&self, locator: &Locator) -> Result<E, DatabaseError> {
        match locator {
            Locator::Id(id) => self.repository.get_by_id(id).await,
            Locator::Key(filters) => self
                .repository
                .find(filters)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| DatabaseError::NotFound(describe_key(E::COLLECTION, filters))),
        }
    }

    fn visible_or_not_found(
        &self,
        record: E,
        describe: impl FnOnce() -> String,
    ) -> Result<E, DatabaseError> {
        if self.policy.visible(&record) {
            Ok(record)
        } else {
            Err(DatabaseError::NotFound(describe()))
        }
    }
}

impl Provider<User> {
    pub async fn get_by_username(&self, username: &str) -> Result<User, DatabaseError> {
        self.get_by_key(username).await
    }
}

impl Provider<Company> {
    pub async fn get_by_name(&self, name: &str) -> Result<Company, DatabaseError> {
        self.get_by_key(name).await
    }
}

impl Provider<Project> {
    pub async fn get_by_name(&self, name: &str) -> Result<Project, DatabaseError> {
        self.get_by_key(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::ErrorKind;
    use crate::database::memory::MemoryDocumentStore;
    use crate::database::models::{
        Contact, Inspection, Inventory, Stage, UpdateCompanyRequest, UpdateContactRequest,
        UpdateInspectionRequest, UpdateInventoryRequest, UpdateProjectRequest, UpdateUserRequest,
    };

    fn provider<E: Entity>(store: &MemoryDocumentStore) -> Provider<E> {
        Provider::new(Arc::new(store.clone()), ReadPolicy::default())
    }

    fn ada() -> User {
        User {
            username: "alovelace".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password: "engine".into(),
            ..User::default()
        }
    }

    fn acme() -> Company {
        Company {
            name: "Acme Steel".into(),
            city: "Pittsburgh".into(),
            zip: 15222,
            contacts: vec!["c-1".into(), "c-2".into()],
            ..Company::default()
        }
    }

    fn bridge() -> Project {
        Project {
            name: "Harbor Bridge".into(),
            start_date: "2024-03-01".into(),
            square_footage: 12000,
            weight_in_tons: 340,
            ..Project::default()
        }
    }

    #[tokio::test]
    async fn add_assigns_identity_and_reads_back() {
        let store = MemoryDocumentStore::new();
        let users = provider::<User>(&store);

        let created = users.add(ada()).await.unwrap();
        assert!(!created.id.is_empty());
        assert!(!created.created.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&created.created).is_ok());
        assert_eq!(created.username, "alovelace");
        assert!(created.verify_password("engine"));

        assert_eq!(users.get_by_id(&created.id).await.unwrap(), created);
        assert_eq!(users.get_by_username("alovelace").await.unwrap(), created);
    }

    #[tokio::test]
    async fn add_for_every_entity_round_trips() {
        let store = MemoryDocumentStore::new();

        let company = provider::<Company>(&store).add(acme()).await.unwrap();
        assert_eq!(provider::<Company>(&store).get_by_name("Acme Steel").await.unwrap(), company);
        assert_eq!(company.contacts, vec!["c-1".to_string(), "c-2".to_string()]);

        let project = provider::<Project>(&store).add(bridge()).await.unwrap();
        assert_eq!(provider::<Project>(&store).get_by_name("Harbor Bridge").await.unwrap(), project);

        let contact = provider::<Contact>(&store)
            .add(Contact {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                company: "Acme Steel".into(),
                ..Contact::default()
            })
            .await
            .unwrap();
        assert_eq!(provider::<Contact>(&store).get_by_id(&contact.id).await.unwrap(), contact);

        let item = provider::<Inventory>(&store)
            .add(Inventory {
                project_id: project.id.clone(),
                stage: Stage { raw: true, ..Stage::default() },
                shape: "W12x26".into(),
                length: 240,
                ..Inventory::default()
            })
            .await
            .unwrap();
        assert_eq!(provider::<Inventory>(&store).get_by_id(&item.id).await.unwrap(), item);

        let inspection = provider::<Inspection>(&store)
            .add(Inspection {
                project_id: project.id.clone(),
                username: "alovelace".into(),
                inspected_parts: item.id.clone(),
                ..Inspection::default()
            })
            .await
            .unwrap();
        assert_eq!(
            provider::<Inspection>(&store).get_by_id(&inspection.id).await.unwrap(),
            inspection
        );
    }

    #[tokio::test]
    async fn duplicate_natural_key_is_rejected_without_writing() {
        let store = MemoryDocumentStore::new();
        let users = provider::<User>(&store);

        users.add(ada()).await.unwrap();
        let err = users.add(ada()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.len("users").await, 1);

        let companies = provider::<Company>(&store);
        companies.add(acme()).await.unwrap();
        assert_eq!(companies.add(acme()).await.unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.len("company").await, 1);
    }

    #[tokio::test]
    async fn contact_key_spans_name_and_company() {
        let store = MemoryDocumentStore::new();
        let contacts = provider::<Contact>(&store);
        let grace = |company: &str| Contact {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            company: company.into(),
            ..Contact::default()
        };

        contacts.add(grace("Acme Steel")).await.unwrap();
        contacts.add(grace("Bolt Works")).await.unwrap();
        let err = contacts.add(grace("Acme Steel")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.len("contacts").await, 2);
    }

    #[tokio::test]
    async fn entities_without_key_accept_identical_records() {
        let store = MemoryDocumentStore::new();
        let inventory = provider::<Inventory>(&store);
        let beam = Inventory {
            shape: "W12x26".into(),
            ..Inventory::default()
        };

        let a = inventory.add(beam.clone()).await.unwrap();
        let b = inventory.add(beam).await.unwrap();
        assert_ne!(a.id, b.id);

        let err = inventory.get_by_key("W12x26").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn update_preserves_identity_and_password() {
        let store = MemoryDocumentStore::new();
        let users = provider::<User>(&store);
        let created = users.add(ada()).await.unwrap();

        let updated = users
            .update(UpdateUserRequest {
                username: "alovelace".into(),
                first_name: "Augusta Ada".into(),
                email: "ada@example.com".into(),
                dark_mode: true,
                ..UpdateUserRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert_eq!(updated.password, created.password);
        assert_eq!(updated.first_name, "Augusta Ada");
        assert!(updated.dark_mode);
        assert_eq!(users.get_by_id(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_by_id_for_keyless_entities() {
        let store = MemoryDocumentStore::new();
        let inspections = provider::<Inspection>(&store);
        let created = inspections
            .add(Inspection {
                username: "alovelace".into(),
                ..Inspection::default()
            })
            .await
            .unwrap();

        let updated = inspections
            .update(UpdateInspectionRequest {
                id: created.id.clone(),
                username: "ghopper".into(),
                end_time: "2024-03-01T17:00:00Z".into(),
                ..UpdateInspectionRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert_eq!(updated.username, "ghopper");

        let items = provider::<Inventory>(&store);
        let beam = items.add(Inventory::default()).await.unwrap();
        let moved = items
            .update(UpdateInventoryRequest {
                id: beam.id.clone(),
                stage: Stage { finished: true, ..Stage::default() },
                passed: true,
                ..UpdateInventoryRequest::default()
            })
            .await
            .unwrap();
        assert!(moved.stage.finished);
        assert_eq!(moved.created, beam.created);
    }

    #[tokio::test]
    async fn project_update_by_name_or_id() {
        let store = MemoryDocumentStore::new();
        let projects = provider::<Project>(&store);
        let created = projects.add(bridge()).await.unwrap();

        let by_name = projects
            .update(UpdateProjectRequest {
                name: "Harbor Bridge".into(),
                weight_in_tons: 360,
                ..UpdateProjectRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.weight_in_tons, 360);

        let renamed = projects
            .update(UpdateProjectRequest {
                id: created.id.clone(),
                name: "Harbor Bridge East".into(),
                ..UpdateProjectRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(renamed.created, created.created);
        assert!(projects.get_by_name("Harbor Bridge East").await.is_ok());
        assert!(projects.get_by_name("Harbor Bridge").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = provider::<Contact>(&store)
            .update(UpdateContactRequest {
                id: "missing".into(),
                ..UpdateContactRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.len("contacts").await, 0);
    }

    #[tokio::test]
    async fn delete_by_id_or_natural_key() {
        let store = MemoryDocumentStore::new();
        let users = provider::<User>(&store);
        let created = users.add(ada()).await.unwrap();

        let removed = users
            .delete(&User {
                username: "alovelace".into(),
                ..User::default()
            })
            .await
            .unwrap();
        assert_eq!(removed.id, created.id);
        assert_eq!(store.len("users").await, 0);

        let companies = provider::<Company>(&store);
        let company = companies.add(acme()).await.unwrap();
        companies.delete(&company).await.unwrap();
        assert!(companies.get_by_id(&company.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_of_missing_record_leaves_store_unchanged() {
        let store = MemoryDocumentStore::new();
        let projects = provider::<Project>(&store);
        projects.add(bridge()).await.unwrap();

        let err = projects
            .delete(&Project {
                id: "missing".into(),
                ..Project::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.len("projects").await, 1);
    }

    #[tokio::test]
    async fn soft_deleted_records_are_hidden_by_default() {
        let store = MemoryDocumentStore::new();
        let hidden = provider::<Company>(&store);
        let visible: Provider<Company> =
            Provider::new(Arc::new(store.clone()), ReadPolicy { include_deleted: true });

        let company = hidden.add(acme()).await.unwrap();
        hidden
            .update(UpdateCompanyRequest {
                id: company.id.clone(),
                name: company.name.clone(),
                deleted: true,
                ..UpdateCompanyRequest::default()
            })
            .await
            .unwrap();

        assert!(hidden.get_all().await.unwrap().is_empty());
        assert!(hidden.get_by_id(&company.id).await.unwrap_err().is_not_found());
        assert!(hidden.get_by_name("Acme Steel").await.unwrap_err().is_not_found());

        assert_eq!(visible.get_all().await.unwrap().len(), 1);
        assert!(visible.get_by_id(&company.id).await.unwrap().deleted);

        // The soft-deleted record still holds its name.
        assert_eq!(hidden.add(acme()).await.unwrap_err().kind(), ErrorKind::AlreadyExists);

        let restored = hidden
            .update(UpdateCompanyRequest {
                id: company.id.clone(),
                name: company.name.clone(),
                ..UpdateCompanyRequest::default()
            })
            .await
            .unwrap();
        assert!(!restored.deleted);
        assert_eq!(hidden.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn key_lookup_skips_hidden_records_sharing_the_key() {
        let store = MemoryDocumentStore::new();
        let companies = provider::<Company>(&store);

        let retired = Company {
            id: "c-1".into(),
            deleted: true,
            city: "Cleveland".into(),
            ..acme()
        };
        let current = Company {
            id: "c-2".into(),
            ..acme()
        };
        for company in [&retired, &current] {
            store
                .set(Company::COLLECTION, &company.id, serde_json::to_value(company).unwrap())
                .await
                .unwrap();
        }

        let found = companies.get_by_name("Acme Steel").await.unwrap();
        assert_eq!(found.id, "c-2");
        assert_eq!(found.city, "Pittsburgh");

        companies.delete(&current).await.unwrap();
        assert!(companies.get_by_name("Acme Steel").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn get_all_returns_every_visible_record() {
        let store = MemoryDocumentStore::new();
        let projects = provider::<Project>(&store);
        assert!(projects.get_all().await.unwrap().is_empty());

        projects.add(bridge()).await.unwrap();
        projects
            .add(Project {
                name: "Tower Annex".into(),
                deleted: true,
                ..Project::default()
            })
            .await
            .unwrap();

        let all = projects.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Harbor Bridge");
    }

    #[tokio::test]
    async fn concurrent_adds_with_same_key_admit_one() {
        let store = MemoryDocumentStore::new();
        let users = Arc::new(provider::<User>(&store));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let users = Arc::clone(&users);
                tokio::spawn(async move { users.add(ada()).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!((created, conflicts), (1, 7));
        assert_eq!(store.len("users").await, 1);
    }
}
