use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Action,
    Process,
    QualityCheck,
    Note,
    #[serde(other)]
    Other,
}

/// One step of a technology card. Only `action` and `process` steps can
/// draw power from equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStep {
    pub step_id: Option<String>,
    pub kind: StepKind,
    pub description: Option<String>,
    pub equipment_id: Option<String>,
    pub duration_minutes: Option<f64>,
    /// Share of the equipment's rated power drawn while the step runs (0-100).
    pub power_usage_percentage: Option<f64>,
}

impl TechStep {
    pub fn draws_power(&self) -> bool {
        matches!(self.kind, StepKind::Action | StepKind::Process)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_id: String,
    pub quantity_per_unit: f64,
    pub unit: String,
}

/// The ordered process needed to produce one unit of `produced_item_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyCard {
    pub card_id: String,
    pub produced_item_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<TechStep>,
    /// Bill of materials per produced unit.
    #[serde(default)]
    pub materials: Vec<MaterialRequirement>,
}
