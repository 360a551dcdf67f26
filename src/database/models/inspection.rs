use serde::{Deserialize, Serialize};

use super::{Entity, Locator, UpdateRequest};

/// An inspection report for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inspection {
    pub id: String,
    pub created: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub username: String,
    pub start_time: String,
    pub end_time: String,
    pub inspected_parts: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateInspectionRequest {
    pub id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub username: String,
    pub start_time: String,
    pub end_time: String,
    pub inspected_parts: String,
}

impl Entity for Inspection {
    const KIND: &'static str = "Inspection";
    const COLLECTION: &'static str = "inspections";

    type Update = UpdateInspectionRequest;

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
}

impl UpdateRequest<Inspection> for UpdateInspectionRequest {
    fn locator(&self) -> Locator {
        Locator::Id(self.id.clone())
    }

    fn apply(self, current: Inspection) -> Inspection {
        Inspection {
            id: current.id,
            created: current.created,
            project_id: self.project_id,
            username: self.username,
            start_time: self.start_time,
            end_time: self.end_time,
            inspected_parts: self.inspected_parts,
        }
    }
}
