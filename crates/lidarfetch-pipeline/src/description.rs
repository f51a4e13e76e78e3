//! Bound pipeline descriptions.

use crate::{Result, StageRole};
use lidarfetch_geo::Crs;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One configured engine stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    role: StageRole,
    options: Map<String, Value>,
}

impl Stage {
    pub(crate) fn new(role: StageRole, options: Map<String, Value>) -> Self {
        Self { role, options }
    }

    /// Role this stage plays.
    pub fn role(&self) -> StageRole {
        self.role
    }

    /// Engine options for the stage.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// A single option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// A single option as a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// An ordered list of stages ready for the engine.
///
/// Serializes as the flat array of stage objects PDAL expects.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDescription {
    stages: Vec<Stage>,
    output_crs: Crs,
}

impl PipelineDescription {
    pub(crate) fn new(stages: Vec<Stage>, output_crs: Crs) -> Self {
        Self { stages, output_crs }
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The stage playing `role`, if present.
    pub fn stage(&self, role: StageRole) -> Option<&Stage> {
        self.stages.iter().find(|s| s.role == role)
    }

    /// Roles in execution order.
    pub fn roles(&self) -> Vec<StageRole> {
        self.stages.iter().map(|s| s.role).collect()
    }

    /// CRS the reprojection stage was bound to.
    pub fn output_crs(&self) -> Crs {
        self.output_crs
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stage array as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.stages
                .iter()
                .map(|s| Value::Object(s.options.clone()))
                .collect(),
        )
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for PipelineDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.stages.iter().map(|s| &s.options))
    }
}
