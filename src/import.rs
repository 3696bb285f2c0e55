//! Bulk import/export of serialized annotation data.
//!
//! Import runs in stages: create the annotations, remap the serialized IDs to
//! the server-assigned ones, create the connections against the remapped IDs,
//! then attach property values. A failure in any stage triggers a best-effort
//! rollback of the annotations created so far, and the store is refetched
//! from the server either way so local state reflects what actually landed.
//!
//! This is the one flow that propagates transport errors to the caller
//! instead of swallowing them; the caller surfaces them to the user alongside
//! the rollback outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::{AnnotationClient, PropertyValueUpdate};
use crate::error::StoreError;
use crate::model::{
    Annotation, AnnotationConnection, AnnotationConnectionBase, AnnotationId,
};
use crate::store::AnnotationStore;

/// On-disk exchange format for annotations and their related data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedData {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub annotation_connections: Vec<AnnotationConnection>,
    /// Property values keyed by serialized annotation ID, then property ID.
    #[serde(default)]
    pub annotation_property_values:
        HashMap<AnnotationId, HashMap<String, serde_json::Value>>,
}

/// Which parts of a [`SerializedData`] to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub import_annotations: bool,
    /// Requires `import_annotations`; connections reference the freshly
    /// created annotations.
    pub import_connections: bool,
    pub import_values: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            import_annotations: true,
            import_connections: true,
            import_values: true,
        }
    }
}

/// Counts of what one import call created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub annotations_created: usize,
    pub connections_created: usize,
    pub property_values_set: usize,
}

impl<A: AnnotationClient> AnnotationStore<A> {
    /// Import serialized data into the active dataset.
    ///
    /// Fails with [`StoreError::NoDataset`] when no dataset is active. On a
    /// stage failure, annotations created by earlier stages are deleted again
    /// (best effort; a failing rollback is logged, not propagated) and the
    /// original error is returned. The store refetches from the server in
    /// both the success and the failure path.
    pub async fn import_serialized(
        &mut self,
        data: &SerializedData,
        options: &ImportOptions,
    ) -> Result<ImportSummary, StoreError> {
        let dataset_id = self
            .context()
            .dataset
            .as_ref()
            .map(|dataset| dataset.id.clone())
            .ok_or(StoreError::NoDataset)?;

        let mut created_ids = Vec::new();
        let result = self
            .run_import(&dataset_id, data, options, &mut created_ids)
            .await;
        if result.is_err() && !created_ids.is_empty() {
            if let Err(cleanup) = self.client().delete_annotations(&created_ids).await {
                log::error!(
                    "failed to roll back {} imported annotations: {cleanup}",
                    created_ids.len()
                );
            }
        }
        self.fetch_annotations().await;
        result
    }

    async fn run_import(
        &self,
        dataset_id: &str,
        data: &SerializedData,
        options: &ImportOptions,
        created_ids: &mut Vec<AnnotationId>,
    ) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();
        // Serialized ID to server-assigned ID, filled by the creation stage.
        let mut id_map: HashMap<&str, AnnotationId> = HashMap::new();

        if options.import_annotations && !data.annotations.is_empty() {
            let bases: Vec<_> = data
                .annotations
                .iter()
                .map(|annotation| annotation.to_base_at(annotation.location, dataset_id))
                .collect();
            let created = self.client().create_annotations(&bases).await?;
            // The server returns created annotations in request order.
            for (original, created) in data.annotations.iter().zip(&created) {
                id_map.insert(original.id.as_str(), created.id.clone());
            }
            created_ids.extend(created.iter().map(|annotation| annotation.id.clone()));
            summary.annotations_created = created.len();
        }

        if options.import_connections && !data.annotation_connections.is_empty() {
            let mut bases = Vec::with_capacity(data.annotation_connections.len());
            for connection in &data.annotation_connections {
                let parent_id = remap(&id_map, &connection.parent_id)?;
                let child_id = remap(&id_map, &connection.child_id)?;
                bases.push(AnnotationConnectionBase {
                    label: connection.label.clone(),
                    tags: connection.tags.clone(),
                    parent_id,
                    child_id,
                    dataset_id: dataset_id.to_owned(),
                });
            }
            let created = self.client().create_connections(&bases).await?;
            summary.connections_created = created.len();
        }

        if options.import_values && !data.annotation_property_values.is_empty() {
            let mut updates = Vec::with_capacity(data.annotation_property_values.len());
            for (original_id, values) in &data.annotation_property_values {
                // Values for annotations that were not imported are dropped.
                let Some(annotation_id) = id_map.get(original_id.as_str()).cloned() else {
                    continue;
                };
                updates.push(PropertyValueUpdate {
                    dataset_id: dataset_id.to_owned(),
                    annotation_id,
                    values: values.clone(),
                });
            }
            if !updates.is_empty() {
                self.client().set_property_values(&updates).await?;
            }
            summary.property_values_set = updates.len();
        }

        Ok(summary)
    }

    /// Export the store's annotations and connections for later re-import.
    ///
    /// Property values are not resident in the store and are exported by the
    /// property subsystem; the field is left empty here.
    pub fn to_serialized(&self) -> SerializedData {
        SerializedData {
            annotations: self.annotations().to_vec(),
            annotation_connections: self.connections().to_vec(),
            annotation_property_values: HashMap::new(),
        }
    }
}

fn remap(
    id_map: &HashMap<&str, AnnotationId>,
    original_id: &str,
) -> Result<AnnotationId, StoreError> {
    id_map
        .get(original_id)
        .cloned()
        .ok_or_else(|| StoreError::UnknownConnectionEndpoint {
            id: original_id.to_owned(),
        })
}
