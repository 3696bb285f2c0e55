//! MDAS - Microscopy Dataset Annotation Store
//!
//! Client-side annotation store for multi-dimensional microscopy datasets:
//! the canonical in-memory collection of annotations and connections, the
//! selection/activation/clipboard state around them, and the coordinator for
//! create/update/delete traffic against a remote annotation service.
//!
//! The store is transport-agnostic; applications implement
//! [`client::AnnotationClient`] and inject it into
//! [`store::AnnotationStore`].

pub mod batch;
pub mod client;
pub mod error;
pub mod geometry;
pub mod import;
pub mod model;
pub mod store;
pub mod tags;

pub use client::{AnnotationClient, ClientError, ComputeRequest, ProgressSink, StatusSink};
pub use error::StoreError;
pub use model::{Annotation, AnnotationConnection, Dataset, ViewContext};
pub use store::AnnotationStore;

#[cfg(test)]
mod testing;
