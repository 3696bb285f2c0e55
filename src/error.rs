//! Store-level error types.

use thiserror::Error;

use crate::client::ClientError;
use crate::model::AnnotationId;

/// Errors propagated to callers that need to run compensating cleanup,
/// notably the multi-stage import flow. Ordinary CRUD operations do not
/// return these; they swallow transport failures at the coordinator boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No dataset is selected, so there is nothing to operate on.
    #[error("no dataset selected")]
    NoDataset,

    /// The remote annotation service failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A connection to import references an annotation that is not part of
    /// the imported data.
    #[error("connection references an unknown annotation: {id}")]
    UnknownConnectionEndpoint { id: AnnotationId },
}
