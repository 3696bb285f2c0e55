//! Data models for the annotation store.

mod annotation;
mod connection;
mod dataset;

pub use annotation::{
    Annotation, AnnotationBase, AnnotationId, AnnotationLocation, AnnotationRef, AnnotationShape,
    AnnotationStub, AsAnnotationId, Position,
};
pub use connection::{AnnotationConnection, AnnotationConnectionBase, ConnectionId};
pub use dataset::{Dataset, DatasetConfiguration, DatasetId, ViewContext};
