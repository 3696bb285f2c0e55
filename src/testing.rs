//! Shared test doubles and object mothers.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::client::{
    AnnotationClient, ClientError, ComputeRequest, ProgressId, ProgressSink, PropertyValueUpdate,
    StatusSink,
};
use crate::model::{
    Annotation, AnnotationBase, AnnotationConnection, AnnotationConnectionBase, AnnotationId,
    AnnotationLocation, AnnotationShape, ConnectionId, Dataset, DatasetConfiguration, Position,
    ViewContext,
};
use crate::store::AnnotationStore;

/// In-memory stand-in for the annotation service.
///
/// Records every batch it receives and materializes created entities with
/// predictable `created-N` IDs. Failure modes are opt-in through the `fail_*`
/// flags; fetch results can be primed through the `*_result` slots (consumed
/// once, then back to empty success).
#[derive(Default)]
pub struct MockClient {
    pub created_annotation_batches: RefCell<Vec<Vec<AnnotationBase>>>,
    pub updated_annotation_batches: RefCell<Vec<Vec<Annotation>>>,
    pub deleted_annotation_batches: RefCell<Vec<Vec<AnnotationId>>>,
    pub created_connection_batches: RefCell<Vec<Vec<AnnotationConnectionBase>>>,
    pub property_value_batches: RefCell<Vec<Vec<PropertyValueUpdate>>>,
    pub computed_dataset_ids: RefCell<Vec<String>>,
    pub undo_calls: Cell<usize>,
    pub redo_calls: Cell<usize>,
    pub fetch_annotation_calls: Cell<usize>,

    pub annotations_result: RefCell<Option<Result<Vec<Annotation>, ClientError>>>,
    pub connections_result: RefCell<Option<Result<Vec<AnnotationConnection>, ClientError>>>,

    pub fail_creates: Cell<bool>,
    pub fail_updates: Cell<bool>,
    pub fail_deletes: Cell<bool>,
    pub fail_connection_creates: Cell<bool>,
    pub fail_property_values: Cell<bool>,
    pub fail_history: Cell<bool>,
    pub failing_compute_datasets: RefCell<HashSet<String>>,

    next_id: Cell<usize>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> usize {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn rejected() -> ClientError {
        ClientError::Rejected("mock failure".to_owned())
    }
}

impl AnnotationClient for MockClient {
    async fn create_annotation(&self, base: &AnnotationBase) -> Result<Annotation, ClientError> {
        self.create_annotations(std::slice::from_ref(base))
            .await
            .map(|mut created| created.remove(0))
    }

    async fn create_annotations(
        &self,
        bases: &[AnnotationBase],
    ) -> Result<Vec<Annotation>, ClientError> {
        self.created_annotation_batches
            .borrow_mut()
            .push(bases.to_vec());
        if self.fail_creates.get() {
            return Err(Self::rejected());
        }
        Ok(bases
            .iter()
            .map(|base| Annotation {
                id: format!("created-{}", self.next_id()),
                name: None,
                tags: base.tags.clone(),
                shape: base.shape,
                channel: base.channel,
                location: base.location,
                coordinates: base.coordinates.clone(),
                dataset_id: base.dataset_id.clone(),
                color: base.color.clone(),
            })
            .collect())
    }

    async fn update_annotations(&self, annotations: &[Annotation]) -> Result<(), ClientError> {
        self.updated_annotation_batches
            .borrow_mut()
            .push(annotations.to_vec());
        if self.fail_updates.get() {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn delete_annotations(&self, ids: &[AnnotationId]) -> Result<(), ClientError> {
        self.deleted_annotation_batches
            .borrow_mut()
            .push(ids.to_vec());
        if self.fail_deletes.get() {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn annotations_for_dataset(
        &self,
        _dataset_id: &str,
    ) -> Result<Vec<Annotation>, ClientError> {
        self.fetch_annotation_calls
            .set(self.fetch_annotation_calls.get() + 1);
        self.annotations_result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_connections(
        &self,
        bases: &[AnnotationConnectionBase],
    ) -> Result<Vec<AnnotationConnection>, ClientError> {
        self.created_connection_batches
            .borrow_mut()
            .push(bases.to_vec());
        if self.fail_connection_creates.get() {
            return Err(Self::rejected());
        }
        Ok(bases
            .iter()
            .map(|base| AnnotationConnection {
                id: format!("connection-created-{}", self.next_id()),
                label: base.label.clone(),
                tags: base.tags.clone(),
                parent_id: base.parent_id.clone(),
                child_id: base.child_id.clone(),
                dataset_id: base.dataset_id.clone(),
            })
            .collect())
    }

    async fn delete_connections(&self, _ids: &[ConnectionId]) -> Result<(), ClientError> {
        Ok(())
    }

    async fn connections_for_dataset(
        &self,
        _dataset_id: &str,
    ) -> Result<Vec<AnnotationConnection>, ClientError> {
        self.connections_result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn compute_annotations(
        &self,
        dataset_id: &str,
        _request: &ComputeRequest,
    ) -> Result<(), ClientError> {
        self.computed_dataset_ids
            .borrow_mut()
            .push(dataset_id.to_owned());
        if self.failing_compute_datasets.borrow().contains(dataset_id) {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn undo(&self, _dataset_id: &str) -> Result<(), ClientError> {
        self.undo_calls.set(self.undo_calls.get() + 1);
        if self.fail_history.get() {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn redo(&self, _dataset_id: &str) -> Result<(), ClientError> {
        self.redo_calls.set(self.redo_calls.get() + 1);
        if self.fail_history.get() {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn set_property_values(&self, values: &[PropertyValueUpdate]) -> Result<(), ClientError> {
        self.property_value_batches
            .borrow_mut()
            .push(values.to_vec());
        if self.fail_property_values.get() {
            return Err(Self::rejected());
        }
        Ok(())
    }
}

/// Status sink recording every saving-flag transition.
#[derive(Debug, Clone, Default)]
pub struct RecordingStatus {
    pub transitions: Rc<RefCell<Vec<bool>>>,
}

impl StatusSink for RecordingStatus {
    fn set_saving(&self, saving: bool) {
        self.transitions.borrow_mut().push(saving);
    }
}

/// Progress sink recording created and completed items.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    pub created: Rc<RefCell<Vec<String>>>,
    pub completed: Rc<RefCell<Vec<ProgressId>>>,
}

impl ProgressSink for RecordingProgress {
    fn create(&self, title: &str) -> ProgressId {
        let mut created = self.created.borrow_mut();
        created.push(title.to_owned());
        format!("progress-{}", created.len())
    }

    fn update(&self, _id: &ProgressId, _progress: usize, _total: usize) {}

    fn complete(&self, id: &ProgressId) {
        self.completed.borrow_mut().push(id.clone());
    }
}

pub fn make_annotation(id: impl Into<String>) -> Annotation {
    Annotation {
        id: id.into(),
        name: None,
        tags: vec!["test-tag".to_owned()],
        shape: AnnotationShape::Point,
        channel: 0,
        location: AnnotationLocation::default(),
        coordinates: vec![Position::new(100.0, 100.0)],
        dataset_id: "test-dataset-id".to_owned(),
        color: None,
    }
}

pub fn make_annotations(count: usize) -> Vec<Annotation> {
    (1..=count)
        .map(|index| make_annotation(format!("annotation-{index}")))
        .collect()
}

pub fn make_base() -> AnnotationBase {
    AnnotationBase {
        tags: vec!["test-tag".to_owned()],
        shape: AnnotationShape::Point,
        channel: 0,
        location: AnnotationLocation::default(),
        coordinates: vec![Position::new(100.0, 100.0)],
        dataset_id: "test-dataset-id".to_owned(),
        color: None,
    }
}

pub fn make_connection(
    id: impl Into<String>,
    parent_id: impl Into<String>,
    child_id: impl Into<String>,
) -> AnnotationConnection {
    AnnotationConnection {
        id: id.into(),
        label: "link".to_owned(),
        tags: Vec::new(),
        parent_id: parent_id.into(),
        child_id: child_id.into(),
        dataset_id: "test-dataset-id".to_owned(),
    }
}

pub fn logged_in_context() -> ViewContext {
    ViewContext {
        dataset: Some(Dataset::new("test-dataset-id", "Test dataset")),
        configuration: Some(DatasetConfiguration::new(
            "test-configuration-id",
            "Test configuration",
        )),
        xy: 0,
        z: 0,
        time: 0,
        logged_in: true,
    }
}

/// Store wired to a [`MockClient`] with a logged-in context.
pub fn make_store() -> AnnotationStore<MockClient> {
    let mut store = AnnotationStore::new(MockClient::new());
    *store.context_mut() = logged_in_context();
    store
}
