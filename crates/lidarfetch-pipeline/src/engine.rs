//! Point-cloud engine abstraction.
//!
//! The engine is the external component that actually reads the archive and
//! runs the bound stages. [`crate::PdalCommand`] drives the PDAL executable;
//! tests substitute an in-memory implementation.

use crate::{EngineError, PipelineDescription, PipelineError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Runs a bound pipeline.
pub trait PointCloudEngine {
    /// Execute `description` and return the resulting point views.
    ///
    /// Implementations run the pipeline once; failures are not retried.
    fn execute(&self, description: &PipelineDescription) -> std::result::Result<EngineOutput, EngineError>;
}

impl<E: PointCloudEngine + ?Sized> PointCloudEngine for &E {
    fn execute(&self, description: &PipelineDescription) -> std::result::Result<EngineOutput, EngineError> {
        (**self).execute(description)
    }
}

impl<E: PointCloudEngine + ?Sized> PointCloudEngine for Box<E> {
    fn execute(&self, description: &PipelineDescription) -> std::result::Result<EngineOutput, EngineError> {
        (**self).execute(description)
    }
}

/// Everything an engine run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// One view per point array the pipeline returned.
    pub views: Vec<PointView>,
    /// Engine metadata, kept opaque.
    pub metadata: Value,
    /// Engine log text.
    pub log: String,
}

impl EngineOutput {
    /// Output holding only point views.
    pub fn from_views(views: Vec<PointView>) -> Self {
        Self {
            views,
            metadata: Value::Null,
            log: String::new(),
        }
    }

    /// Total points across all views.
    pub fn point_count(&self) -> usize {
        self.views.iter().map(PointView::len).sum()
    }
}

/// Column-oriented point data keyed by dimension name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointView {
    columns: BTreeMap<String, Vec<f64>>,
    len: usize,
}

impl PointView {
    /// An empty view with no dimensions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a view from named columns, which must all have the same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut len = None;

        for (name, values) in columns {
            let name = name.into();
            match len {
                None => len = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(PipelineError::RaggedView {
                        dimension: name,
                        expected,
                        actual: values.len(),
                    });
                }
                Some(_) => {}
            }
            map.insert(name, values);
        }

        Ok(Self {
            columns: map,
            len: len.unwrap_or(0),
        })
    }

    /// Build a view from row records laid out as `dimensions`.
    pub fn from_rows<S, R>(dimensions: &[S], rows: R) -> Result<Self>
    where
        S: AsRef<str>,
        R: IntoIterator<Item = Vec<f64>>,
    {
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); dimensions.len()];

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != dimensions.len() {
                return Err(PipelineError::RaggedView {
                    dimension: format!("row {}", index),
                    expected: dimensions.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Self::from_columns(
            dimensions
                .iter()
                .map(|d| d.as_ref().to_string())
                .zip(columns),
        )
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Values of one dimension.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Dimension names, sorted.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
