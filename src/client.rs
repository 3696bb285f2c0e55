//! External collaborator interfaces.
//!
//! The store never performs HTTP itself: it talks to the annotation service
//! through [`AnnotationClient`], reports long-running work through
//! [`ProgressSink`] and surfaces its busy state through [`StatusSink`]. The
//! application's composition root injects concrete implementations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    Annotation, AnnotationBase, AnnotationConnection, AnnotationConnectionBase, AnnotationId,
    AnnotationLocation, ConnectionId,
};

/// Errors surfaced by the remote annotation service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never reached the server or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the call.
    #[error("remote call rejected: {0}")]
    Rejected(String),
}

/// Parameters for one worker-based computation on a dataset.
///
/// `worker_interface` carries the worker's free-form parameter values; its
/// schema is owned by the worker image, not by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub tool_id: String,
    pub tool_name: String,
    /// Docker image of the worker to run.
    pub image: String,
    /// Tags assigned to generated annotations.
    pub tags: Vec<String>,
    pub channel: i32,
    pub location: AnnotationLocation,
    #[serde(default)]
    pub worker_interface: serde_json::Value,
}

/// One annotation's property values, attached after a bulk import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValueUpdate {
    pub dataset_id: String,
    pub annotation_id: AnnotationId,
    pub values: HashMap<String, serde_json::Value>,
}

/// Remote annotation service.
///
/// Failures surface as `Err`; the store converts them into logged no-ops at
/// the coordinator boundary, except for the import flow which propagates them
/// to run compensating cleanup.
#[allow(async_fn_in_trait)]
pub trait AnnotationClient {
    async fn create_annotation(&self, base: &AnnotationBase) -> Result<Annotation, ClientError>;

    async fn create_annotations(
        &self,
        bases: &[AnnotationBase],
    ) -> Result<Vec<Annotation>, ClientError>;

    async fn update_annotations(&self, annotations: &[Annotation]) -> Result<(), ClientError>;

    async fn delete_annotations(&self, ids: &[AnnotationId]) -> Result<(), ClientError>;

    async fn annotations_for_dataset(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<Annotation>, ClientError>;

    async fn create_connections(
        &self,
        bases: &[AnnotationConnectionBase],
    ) -> Result<Vec<AnnotationConnection>, ClientError>;

    async fn delete_connections(&self, ids: &[ConnectionId]) -> Result<(), ClientError>;

    async fn connections_for_dataset(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<AnnotationConnection>, ClientError>;

    /// Run a worker computation for one dataset and wait for its job to
    /// settle. Polling details live behind the implementation.
    async fn compute_annotations(
        &self,
        dataset_id: &str,
        request: &ComputeRequest,
    ) -> Result<(), ClientError>;

    async fn undo(&self, dataset_id: &str) -> Result<(), ClientError>;

    async fn redo(&self, dataset_id: &str) -> Result<(), ClientError>;

    async fn set_property_values(&self, values: &[PropertyValueUpdate]) -> Result<(), ClientError>;
}

/// Opaque handle for a progress item.
pub type ProgressId = String;

/// Progress/notification collaborator for long-running operations.
pub trait ProgressSink {
    /// Open a new progress item and return its handle.
    fn create(&self, title: &str) -> ProgressId;
    /// Report partial progress on an item.
    fn update(&self, id: &ProgressId, progress: usize, total: usize);
    /// Close an item, whether the operation succeeded or failed.
    fn complete(&self, id: &ProgressId);
}

/// Progress sink that drops everything. Default collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn create(&self, _title: &str) -> ProgressId {
        ProgressId::new()
    }

    fn update(&self, _id: &ProgressId, _progress: usize, _total: usize) {}

    fn complete(&self, _id: &ProgressId) {}
}

/// Saving-flag collaborator, consumed by UI to show spinners.
pub trait StatusSink {
    fn set_saving(&self, saving: bool);
}

/// Status sink that drops everything. Default collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn set_saving(&self, _saving: bool) {}
}
