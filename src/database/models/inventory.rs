use serde::{Deserialize, Serialize};

use super::{Entity, Locator, UpdateRequest};

/// A steel member tracked through fabrication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inventory {
    #[serde(alias = "iD")]
    pub id: String,
    pub created: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub stage: Stage,
    pub size: i32,
    pub length: i32,
    pub grade: i32,
    pub shape: String,
    pub passed: bool,
    pub sequence: i32,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stage {
    pub raw: bool,
    pub in_process: bool,
    pub on_hold: bool,
    pub finished: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateInventoryRequest {
    #[serde(alias = "iD")]
    pub id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub stage: Stage,
    pub size: i32,
    pub length: i32,
    pub grade: i32,
    pub shape: String,
    pub passed: bool,
    pub sequence: i32,
    pub priority: i32,
}

impl Entity for Inventory {
    const KIND: &'static str = "Inventory item";
    const COLLECTION: &'static str = "inventory";

    type Update = UpdateInventoryRequest;

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

impl UpdateRequest<Inventory> for UpdateInventoryRequest {
    fn locator(&self) -> Locator {
        Locator::Id(self.id.clone())
    }

    fn apply(self, current: Inventory) -> Inventory {
        Inventory {
            id: current.id,
            created: current.created,
            project_id: self.project_id,
            stage: self.stage,
            size: self.size,
            length: self.length,
            grade: self.grade,
            shape: self.shape,
            passed: self.passed,
            sequence: self.sequence,
            priority: self.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_legacy_id_spelling() {
        let item: Inventory = serde_json::from_value(json!({
            "iD": "inv-1",
            "projectID": "p-1",
            "stage": {"inProcess": true}
        }))
        .unwrap();
        assert_eq!(item.id, "inv-1");
        assert_eq!(item.project_id, "p-1");
        assert!(item.stage.in_process);
        assert!(!item.stage.finished);

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["id"], "inv-1");
        assert_eq!(out["projectID"], "p-1");
    }
}
