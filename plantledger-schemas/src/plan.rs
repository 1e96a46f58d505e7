//! The nested, on-disk form of a strategic plan. `plantledger-core` loads it
//! into an arena for editing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicPlan {
    pub plan_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}
