use serde::{Deserialize, Serialize};

use super::{Entity, Locator, UpdateRequest};
use crate::database::store::Filter;

/// A construction project. Contact details are copied in, not referenced,
/// so the project keeps its historical data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub created: String,
    pub name: String,
    pub start_date: String,
    pub due_date: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: i32,
    pub project_manager: String,
    pub client_name: String,
    #[serde(alias = "EORName")]
    pub eor_name: String,
    pub detailer_name: String,
    pub inspection_lab: String,
    pub steel_erector_name: String,
    pub steel_fabricator_name: String,
    pub general_contractor: String,
    pub primary_contact_name: String,
    pub primary_contact_phone: String,
    pub primary_contact_email: String,
    pub square_footage: i32,
    pub weight_in_tons: i32,
    pub favorite: bool,
    pub deleted: bool,
}

/// Mutable project fields. With an empty `id` the project is found by `name`,
/// so renaming requires the id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProjectRequest {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub due_date: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: i32,
    pub project_manager: String,
    pub client_name: String,
    #[serde(alias = "EORName")]
    pub eor_name: String,
    pub detailer_name: String,
    pub inspection_lab: String,
    pub steel_erector_name: String,
    pub steel_fabricator_name: String,
    pub general_contractor: String,
    pub primary_contact_name: String,
    pub primary_contact_phone: String,
    pub primary_contact_email: String,
    pub square_footage: i32,
    pub weight_in_tons: i32,
    pub favorite: bool,
    pub deleted: bool,
}

impl Entity for Project {
    const KIND: &'static str = "Project";
    const COLLECTION: &'static str = "projects";
    const KEY_FIELD: Option<&'static str> = Some("name");

    type Update = UpdateProjectRequest;

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

impl UpdateRequest<Project> for UpdateProjectRequest {
    fn locator(&self) -> Locator {
        if self.id.is_empty() {
            Locator::Key(vec![Filter::eq("name", self.name.as_str())])
        } else {
            Locator::Id(self.id.clone())
        }
    }

    fn apply(self, current: Project) -> Project {
        Project {
            id: current.id,
            created: current.created,
            name: self.name,
            start_date: self.start_date,
            due_date: self.due_date,
            address: self.address,
            city: self.city,
            state: self.state,
            zip: self.zip,
            project_manager: self.project_manager,
            client_name: self.client_name,
            eor_name: self.eor_name,
            detailer_name: self.detailer_name,
            inspection_lab: self.inspection_lab,
            steel_erector_name: self.steel_erector_name,
            steel_fabricator_name: self.steel_fabricator_name,
            general_contractor: self.general_contractor,
            primary_contact_name: self.primary_contact_name,
            primary_contact_phone: self.primary_contact_phone,
            primary_contact_email: self.primary_contact_email,
            square_footage: self.square_footage,
            weight_in_tons: self.weight_in_tons,
            favorite: self.favorite,
            deleted: self.deleted,
        }
    }
}
