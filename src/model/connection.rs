//! Annotation connection data model.
//!
//! A connection is a labeled directed link between two annotations
//! (parent and child). Connections are independent entities with their own
//! lifecycle; the server guarantees that `parent_id` and `child_id` refer to
//! annotations of the same dataset.

use serde::{Deserialize, Serialize};

use super::annotation::AnnotationId;

/// Unique identifier for a connection, assigned by the server.
pub type ConnectionId = String;

/// A labeled directed link between two annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationConnection {
    pub id: ConnectionId,
    pub label: String,
    pub tags: Vec<String>,
    pub parent_id: AnnotationId,
    pub child_id: AnnotationId,
    pub dataset_id: String,
}

/// Payload for creating a new connection. Identity is assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationConnectionBase {
    pub label: String,
    pub tags: Vec<String>,
    pub parent_id: AnnotationId,
    pub child_id: AnnotationId,
    pub dataset_id: String,
}
