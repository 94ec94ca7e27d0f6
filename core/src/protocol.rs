//! Wire format shared with the solver process.
//!
//! Outbound: one JSON command envelope per message,
//! `{"command": "<Name>", "payload": {...}}`.
//! Inbound: `TAG:<json>` lines. Only `SKETCH_STATUS` is interpreted here;
//! every other tag is decoded to raw JSON for the surrounding UI.

use crate::sketch::types::Sketch;
use crate::topo::naming::TopoId;
use crate::topo::{EntityId, SelectionFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Parameter key a sketch feature stores its sketch under.
pub const SKETCH_DATA_KEY: &str = "sketch_data";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Inbound message has no tag separator: {0}")]
    MissingSeparator(String),

    #[error("Unknown inbound tag: {0}")]
    UnknownTag(String),

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    String(String),
    Bool(bool),
    Sketch(Sketch),
    Reference(TopoId),
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Sketch,
    Extrude,
    Revolve,
    Cut,
    Plane,
    Axis,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectModifier {
    #[default]
    Replace,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload")]
pub enum Command {
    CreateFeature {
        #[serde(rename = "type")]
        feature_type: FeatureType,
        name: String,
        #[serde(default)]
        dependencies: Vec<EntityId>,
    },
    UpdateFeature {
        id: EntityId,
        params: HashMap<String, ParameterValue>,
    },
    DeleteFeature {
        id: EntityId,
    },
    Select {
        id: TopoId,
        #[serde(default)]
        modifier: SelectModifier,
    },
    ClearSelection,
    SetFilter {
        filter: SelectionFilter,
    },
    VariableAdd {
        name: String,
        expression: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    VariableUpdate {
        id: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    VariableDelete {
        id: EntityId,
    },
    VariableReorder {
        id: EntityId,
        new_index: usize,
    },
    GetRegions {
        id: EntityId,
    },
    SelectionGroupCreate {
        name: String,
    },
    SelectionGroupRestore {
        name: String,
    },
    SelectionGroupDelete {
        name: String,
    },
}

impl Command {
    /// Send the committed part of `sketch` as the feature's `sketch_data`.
    /// Preview entities never leave the client.
    pub fn update_sketch(feature_id: EntityId, sketch: &Sketch) -> Self {
        let mut params = HashMap::new();
        params.insert(SKETCH_DATA_KEY.to_string(), ParameterValue::Sketch(sketch.committed()));
        Command::UpdateFeature { id: feature_id, params }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateFeature { .. } => "CreateFeature",
            Command::UpdateFeature { .. } => "UpdateFeature",
            Command::DeleteFeature { .. } => "DeleteFeature",
            Command::Select { .. } => "Select",
            Command::ClearSelection => "ClearSelection",
            Command::SetFilter { .. } => "SetFilter",
            Command::VariableAdd { .. } => "VariableAdd",
            Command::VariableUpdate { .. } => "VariableUpdate",
            Command::VariableDelete { .. } => "VariableDelete",
            Command::VariableReorder { .. } => "VariableReorder",
            Command::GetRegions { .. } => "GetRegions",
            Command::SelectionGroupCreate { .. } => "SelectionGroupCreate",
            Command::SelectionGroupRestore { .. } => "SelectionGroupRestore",
            Command::SelectionGroupDelete { .. } => "SelectionGroupDelete",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

// =============================================================================
// Inbound
// =============================================================================

/// Per-entity solver report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatus {
    pub id: EntityId,
    #[serde(default)]
    pub total_dof: i32,
    #[serde(default)]
    pub constrained_dof: i32,
    #[serde(default)]
    pub remaining_dof: i32,
    #[serde(default)]
    pub is_fully_constrained: bool,
    #[serde(default)]
    pub is_over_constrained: bool,
    #[serde(default)]
    pub involved_in_conflict: bool,
}

/// How an entity should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintState {
    Free,
    FullyConstrained,
    OverConstrained,
    Unknown,
}

impl EntityStatus {
    pub fn state(&self) -> ConstraintState {
        if self.is_over_constrained || self.involved_in_conflict {
            ConstraintState::OverConstrained
        } else if self.is_fully_constrained {
            ConstraintState::FullyConstrained
        } else {
            ConstraintState::Free
        }
    }
}

/// Solver convergence and DOF for one sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchStatus {
    pub converged: bool,
    #[serde(default)]
    pub iterations: usize,
    #[serde(default)]
    pub max_error: f64,
    /// Negative = over-constrained, 0 = fully constrained.
    pub dof: i32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub entity_statuses: Vec<EntityStatus>,
}

impl SketchStatus {
    pub fn is_fully_constrained(&self) -> bool {
        self.converged && self.dof == 0
    }

    pub fn entity_state(&self, id: EntityId) -> ConstraintState {
        self.entity_statuses
            .iter()
            .find(|s| s.id == id)
            .map_or(ConstraintState::Unknown, EntityStatus::state)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    GraphUpdate(Value),
    RenderUpdate(Value),
    SelectionUpdate(Value),
    ZombieUpdate(Value),
    SketchStatus(SketchStatus),
    RegionsUpdate(Value),
    SelectionGroupsUpdate(Value),
    ErrorUpdate(ErrorReport),
}

pub fn parse_inbound(line: &str) -> Result<InboundMessage, ProtocolError> {
    let (tag, payload) = line
        .trim_end()
        .split_once(':')
        .ok_or_else(|| ProtocolError::MissingSeparator(line.chars().take(32).collect()))?;
    Ok(match tag {
        "GRAPH_UPDATE" => InboundMessage::GraphUpdate(serde_json::from_str(payload)?),
        "RENDER_UPDATE" => InboundMessage::RenderUpdate(serde_json::from_str(payload)?),
        "SELECTION_UPDATE" => InboundMessage::SelectionUpdate(serde_json::from_str(payload)?),
        "ZOMBIE_UPDATE" => InboundMessage::ZombieUpdate(serde_json::from_str(payload)?),
        "SKETCH_STATUS" => InboundMessage::SketchStatus(serde_json::from_str(payload)?),
        "REGIONS_UPDATE" => InboundMessage::RegionsUpdate(serde_json::from_str(payload)?),
        "SELECTION_GROUPS_UPDATE" => InboundMessage::SelectionGroupsUpdate(serde_json::from_str(payload)?),
        "ERROR_UPDATE" => InboundMessage::ErrorUpdate(serde_json::from_str(payload)?),
        other => return Err(ProtocolError::UnknownTag(other.to_string())),
    })
}

/// The sketch stored on feature `feature_id` of a `GRAPH_UPDATE` payload.
pub fn extract_sketch(graph: &Value, feature_id: EntityId) -> Option<Sketch> {
    let data = graph
        .get("nodes")?
        .get(feature_id.to_string())?
        .get("parameters")?
        .get(SKETCH_DATA_KEY)?;
    match serde_json::from_value::<ParameterValue>(data.clone()).ok()? {
        ParameterValue::Sketch(mut sketch) => {
            sketch.ensure_history();
            Some(sketch)
        }
        _ => None,
    }
}
