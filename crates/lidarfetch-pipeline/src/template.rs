//! Role-keyed pipeline templates.

use crate::{PipelineError, Result, StageRole};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Default USGS template shipped with the crate.
const BUILTIN_TEMPLATE: &str = include_str!("../templates/usgs_pipeline.json");

/// Stage fragments keyed by role, in the order the document declared them.
///
/// A template is read-only after loading. Binding copies fragments out of it,
/// so one template can back any number of requests.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineTemplate {
    fragments: Vec<(StageRole, Map<String, Value>)>,
}

impl PipelineTemplate {
    /// Load a template from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let template = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            stages = template.fragments.len(),
            "Loaded pipeline template"
        );
        Ok(template)
    }

    /// Parse a template from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// The template embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_TEMPLATE)
    }

    /// Build a template from an already parsed document.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(document) = value else {
            return Err(PipelineError::Template(
                "template must be a JSON object keyed by stage role".to_string(),
            ));
        };

        if matches!(document.get("pipeline"), Some(Value::Array(_))) {
            return Err(PipelineError::Template(
                "positional 'pipeline' arrays are not supported; key each stage by its role"
                    .to_string(),
            ));
        }

        let mut fragments: Vec<(StageRole, Map<String, Value>)> = Vec::new();
        for (key, fragment) in document {
            let Some(role) = StageRole::from_key(&key) else {
                return Err(PipelineError::Template(format!(
                    "unrecognized stage role '{}'; expected one of {}",
                    key,
                    StageRole::ALL
                        .iter()
                        .map(StageRole::key)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            };

            if fragments.iter().any(|(existing, _)| *existing == role) {
                return Err(PipelineError::Template(format!(
                    "stage '{}' is declared more than once",
                    role
                )));
            }

            let Value::Object(options) = fragment else {
                return Err(PipelineError::Template(format!(
                    "stage '{}' must be a JSON object",
                    key
                )));
            };

            fragments.push((role, options));
        }

        Ok(Self { fragments })
    }

    /// Fragment for a role, if the template has one.
    pub fn fragment(&self, role: StageRole) -> Option<&Map<String, Value>> {
        self.fragments
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, options)| options)
    }

    /// Whether the template declares a role.
    pub fn has_role(&self, role: StageRole) -> bool {
        self.fragment(role).is_some()
    }

    /// Roles in declaration order.
    pub fn declared_roles(&self) -> Vec<StageRole> {
        self.fragments.iter().map(|(role, _)| *role).collect()
    }
}
