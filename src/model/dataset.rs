//! Active-context types: the dataset and configuration the user is viewing.

use serde::{Deserialize, Serialize};

use super::annotation::AnnotationLocation;

/// Unique identifier for a dataset.
pub type DatasetId = String;

/// A multi-dimensional microscopy dataset, as far as the store cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
}

impl Dataset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A view configuration shared by the datasets of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfiguration {
    pub id: String,
    pub name: String,
}

impl DatasetConfiguration {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The currently active viewing context, updated by the application shell.
///
/// A `None` dataset or configuration means "nothing to operate on": mutating
/// operations become no-ops and fetches clear local state instead of calling
/// the server.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub dataset: Option<Dataset>,
    pub configuration: Option<DatasetConfiguration>,
    /// Currently viewed XY tile.
    pub xy: i32,
    /// Currently viewed focal plane.
    pub z: i32,
    /// Currently viewed time point.
    pub time: i32,
    /// Whether the user is authenticated against the annotation service.
    pub logged_in: bool,
}

impl ViewContext {
    /// The slice the viewer is currently showing, as an annotation location.
    pub fn current_location(&self) -> AnnotationLocation {
        AnnotationLocation::new(self.xy, self.z, self.time)
    }
}
