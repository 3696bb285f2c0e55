//! Canonical in-memory store for annotations and connections.
//!
//! The store owns every annotation and inter-annotation connection of the
//! currently open dataset, the derived ID indices, the hydration partition,
//! the selection/activation/hover state and the copy/paste buffer, and it
//! coordinates create/update/delete calls against the remote annotation
//! service.
//!
//! Concurrency model: single-threaded, cooperative. Between `await` points
//! every mutation is atomic from the caller's point of view; callers that
//! need strict ordering across remote calls sequence them by awaiting.
//! Consumers must treat read accessors as snapshots superseded by the next
//! mutation.

mod hydration;
mod selection;

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::client::{
    AnnotationClient, NoopProgress, NoopStatus, ProgressSink, StatusSink,
};
use crate::geometry::simple_centroid;
use crate::model::{
    Annotation, AnnotationBase, AnnotationConnection, AnnotationConnectionBase, AnnotationId,
    AnnotationRef, AnnotationStub, AsAnnotationId, Position, ViewContext,
};
use crate::tags;

pub use hydration::{HydrationPolicy, LeadingFractionPolicy, MemoryStats};
pub use selection::IdSet;

/// Annotation/connection store and CRUD coordinator.
///
/// Owned by the application's composition root, constructed with the injected
/// transport client and optional progress/status collaborators. All state is
/// private; the methods below are the only write paths.
pub struct AnnotationStore<A: AnnotationClient> {
    client: A,
    progress: Box<dyn ProgressSink>,
    status: Box<dyn StatusSink>,
    context: ViewContext,

    annotations: Vec<Annotation>,
    connections: Vec<AnnotationConnection>,
    id_to_index: HashMap<AnnotationId, usize>,
    centroids: HashMap<AnnotationId, Position>,
    stubs: HashMap<AnnotationId, AnnotationStub>,
    hydrated: HashSet<AnnotationId>,
    hydration_policy: Box<dyn HydrationPolicy>,

    selected: IdSet,
    active: IdSet,
    hovered: Option<AnnotationId>,
    clipboard: Vec<Annotation>,
    deleting_annotations: bool,
}

impl<A: AnnotationClient> AnnotationStore<A> {
    /// Create a store with no-op progress/status collaborators and the
    /// default hydration policy.
    pub fn new(client: A) -> Self {
        Self::with_collaborators(client, Box::new(NoopProgress), Box::new(NoopStatus))
    }

    /// Create a store with explicit progress and status collaborators.
    pub fn with_collaborators(
        client: A,
        progress: Box<dyn ProgressSink>,
        status: Box<dyn StatusSink>,
    ) -> Self {
        Self {
            client,
            progress,
            status,
            context: ViewContext::default(),
            annotations: Vec::new(),
            connections: Vec::new(),
            id_to_index: HashMap::new(),
            centroids: HashMap::new(),
            stubs: HashMap::new(),
            hydrated: HashSet::new(),
            hydration_policy: Box::new(LeadingFractionPolicy::default()),
            selected: IdSet::new(),
            active: IdSet::new(),
            hovered: None,
            clipboard: Vec::new(),
            deleting_annotations: false,
        }
    }

    /// The injected transport client.
    pub fn client(&self) -> &A {
        &self.client
    }

    /// The active viewing context.
    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    /// Mutable access for the application shell to update dataset,
    /// configuration, slice indices and the authentication flag.
    pub fn context_mut(&mut self) -> &mut ViewContext {
        &mut self.context
    }

    /// Replace the hydration policy and re-partition immediately.
    pub fn set_hydration_policy(&mut self, policy: Box<dyn HydrationPolicy>) {
        self.hydration_policy = policy;
        self.hydrated = self.hydration_policy.select_hydrated(&self.annotations);
    }

    // ========================================================================
    // Repository
    // ========================================================================

    /// All annotations, in server order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// All connections.
    pub fn connections(&self) -> &[AnnotationConnection] {
        &self.connections
    }

    /// Replace the canonical annotation list.
    ///
    /// If the incoming list has the exact same IDs in the exact same order as
    /// the current one, nothing happens: downstream consumers keep their
    /// references and no index is rebuilt. Otherwise all derived indices are
    /// rebuilt and the hydration tiers are re-partitioned.
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        let unchanged = annotations.len() == self.annotations.len()
            && annotations
                .iter()
                .zip(&self.annotations)
                .all(|(new, old)| new.id == old.id);
        if unchanged {
            return;
        }
        self.annotations = annotations;
        self.rebuild_indices();
    }

    fn rebuild_indices(&mut self) {
        self.id_to_index = self
            .annotations
            .iter()
            .enumerate()
            .map(|(index, annotation)| (annotation.id.clone(), index))
            .collect();
        self.centroids = self
            .annotations
            .iter()
            .map(|annotation| (annotation.id.clone(), simple_centroid(&annotation.coordinates)))
            .collect();
        self.stubs = self
            .annotations
            .iter()
            .map(|annotation| (annotation.id.clone(), AnnotationStub::from_annotation(annotation)))
            .collect();
        self.hydrated = self.hydration_policy.select_hydrated(&self.annotations);
    }

    /// Look up a full annotation by ID.
    pub fn get_annotation_from_id(&self, id: &str) -> Option<&Annotation> {
        self.id_to_index.get(id).map(|&index| &self.annotations[index])
    }

    /// Look up an annotation's stub by ID. Present for every known ID.
    pub fn get_stub(&self, id: &str) -> Option<&AnnotationStub> {
        self.stubs.get(id)
    }

    /// Look up an annotation's centroid by ID.
    pub fn get_centroid(&self, id: &str) -> Option<Position> {
        self.centroids.get(id).copied()
    }

    /// Whether this annotation's full geometry is resident.
    pub fn is_hydrated(&self, id: &str) -> bool {
        self.hydrated.contains(id)
    }

    /// Whichever representation of the annotation is resident. `Some` for
    /// every ID present in the store.
    pub fn get_annotation_or_stub(&self, id: &str) -> Option<AnnotationRef<'_>> {
        if self.hydrated.contains(id) {
            if let Some(annotation) = self.get_annotation_from_id(id) {
                return Some(AnnotationRef::Hydrated(annotation));
            }
        }
        self.stubs.get(id).map(AnnotationRef::Stub)
    }

    /// Union of all tags across all annotations.
    pub fn annotation_tags(&self) -> BTreeSet<String> {
        self.annotations
            .iter()
            .flat_map(|annotation| annotation.tags.iter().cloned())
            .collect()
    }

    /// Memory accounting for the hydration strategy. Diagnostic only.
    pub fn memory_stats(&self) -> MemoryStats {
        MemoryStats::compute(&self.annotations, &self.hydrated)
    }

    /// Replace the connection list.
    pub fn set_connections(&mut self, connections: Vec<AnnotationConnection>) {
        self.connections = connections;
    }

    /// Append connections. Does not deduplicate by ID; that is the caller's
    /// responsibility.
    pub fn add_connections(&mut self, connections: Vec<AnnotationConnection>) {
        self.connections.extend(connections);
    }

    /// Register a newly created annotation. Joins the stub tier; hydration is
    /// only re-partitioned when the full list is replaced.
    fn insert_annotation(&mut self, annotation: Annotation) {
        self.id_to_index
            .insert(annotation.id.clone(), self.annotations.len());
        self.centroids
            .insert(annotation.id.clone(), simple_centroid(&annotation.coordinates));
        self.stubs
            .insert(annotation.id.clone(), AnnotationStub::from_annotation(&annotation));
        self.annotations.push(annotation);
    }

    /// Overwrite one annotation in place after a successful remote update.
    fn replace_annotation(&mut self, annotation: Annotation) {
        let Some(&index) = self.id_to_index.get(&annotation.id) else {
            return;
        };
        self.centroids
            .insert(annotation.id.clone(), simple_centroid(&annotation.coordinates));
        self.stubs
            .insert(annotation.id.clone(), AnnotationStub::from_annotation(&annotation));
        self.annotations[index] = annotation;
    }

    /// Drop annotations from the repository and from the selection, active
    /// and hover state.
    fn remove_annotations(&mut self, ids: &[AnnotationId]) {
        let removing: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.annotations
            .retain(|annotation| !removing.contains(annotation.id.as_str()));
        // Indices shift after removal.
        self.id_to_index = self
            .annotations
            .iter()
            .enumerate()
            .map(|(index, annotation)| (annotation.id.clone(), index))
            .collect();
        for id in ids {
            self.centroids.remove(id);
            self.stubs.remove(id);
            self.hydrated.remove(id);
            self.selected.remove(id);
            self.active.remove(id);
        }
        if let Some(hovered) = &self.hovered {
            if removing.contains(hovered.as_str()) {
                self.hovered = None;
            }
        }
    }

    // ========================================================================
    // Selection and activation
    // ========================================================================

    /// Replace the selection wholesale. An empty iterator clears it.
    pub fn set_selected<T: AsAnnotationId>(&mut self, targets: impl IntoIterator<Item = T>) {
        self.selected.replace(
            targets
                .into_iter()
                .map(|target| target.as_annotation_id().to_owned()),
        );
    }

    /// Add one annotation to the selection. Idempotent.
    pub fn select_annotation(&mut self, target: impl AsAnnotationId) {
        self.selected.insert(target.as_annotation_id().to_owned());
    }

    /// Add several annotations to the selection, without duplicates.
    pub fn select_annotations<T: AsAnnotationId>(&mut self, targets: impl IntoIterator<Item = T>) {
        for target in targets {
            self.selected.insert(target.as_annotation_id().to_owned());
        }
    }

    /// Remove one annotation from the selection. Absent IDs are a no-op.
    pub fn unselect_annotation(&mut self, target: impl AsAnnotationId) {
        self.selected.remove(target.as_annotation_id());
    }

    /// Remove several annotations from the selection.
    pub fn unselect_annotations<T: AsAnnotationId>(&mut self, targets: impl IntoIterator<Item = T>) {
        for target in targets {
            self.selected.remove(target.as_annotation_id());
        }
    }

    /// Flip membership independently for each item: present targets are
    /// removed, absent ones added.
    pub fn toggle_selected<T: AsAnnotationId>(&mut self, targets: impl IntoIterator<Item = T>) {
        for target in targets {
            self.selected.toggle(target.as_annotation_id().to_owned());
        }
    }

    /// Clear the selection.
    pub fn clear_selected(&mut self) {
        self.selected.clear();
    }

    /// O(1) membership test.
    pub fn is_annotation_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected IDs in selection order.
    pub fn selected_annotation_ids(&self) -> &[AnnotationId] {
        self.selected.ids()
    }

    /// Selected annotations resolved to full objects, in selection order.
    /// IDs whose annotation no longer exists are silently excluded.
    pub fn selected_annotations(&self) -> Vec<&Annotation> {
        self.selected
            .ids()
            .iter()
            .filter_map(|id| self.get_annotation_from_id(id))
            .collect()
    }

    /// Mark annotations as active for a multi-step tool workflow (e.g.
    /// picking the parent then the child of a connection). Independent of
    /// selection.
    pub fn activate_annotations<T: AsAnnotationId>(&mut self, targets: impl IntoIterator<Item = T>) {
        for target in targets {
            self.active.insert(target.as_annotation_id().to_owned());
        }
    }

    /// Remove annotations from the active set.
    pub fn deactivate_annotations<T: AsAnnotationId>(
        &mut self,
        targets: impl IntoIterator<Item = T>,
    ) {
        for target in targets {
            self.active.remove(target.as_annotation_id());
        }
    }

    /// Flip active membership independently for each item.
    pub fn toggle_active_annotations<T: AsAnnotationId>(
        &mut self,
        targets: impl IntoIterator<Item = T>,
    ) {
        for target in targets {
            self.active.toggle(target.as_annotation_id().to_owned());
        }
    }

    /// Active IDs in activation order.
    pub fn active_annotation_ids(&self) -> &[AnnotationId] {
        self.active.ids()
    }

    /// Complement of the active set with respect to all known annotations.
    pub fn inactive_annotation_ids(&self) -> Vec<AnnotationId> {
        self.annotations
            .iter()
            .filter(|annotation| !self.active.contains(&annotation.id))
            .map(|annotation| annotation.id.clone())
            .collect()
    }

    /// The annotation currently under the cursor, if any.
    pub fn hovered_annotation_id(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn set_hovered_annotation_id(&mut self, id: Option<AnnotationId>) {
        self.hovered = id;
    }

    // ========================================================================
    // CRUD coordination
    // ========================================================================

    /// Whether a bulk delete is in flight. Distinct from the saving flag.
    pub fn is_deleting_annotations(&self) -> bool {
        self.deleting_annotations
    }

    /// Create one annotation remotely and add it to the repository.
    pub async fn create_annotation(&mut self, base: &AnnotationBase) -> Option<Annotation> {
        self.create_annotations(std::slice::from_ref(base))
            .await
            .pop()
    }

    /// Create a batch of annotations remotely and append the results.
    ///
    /// No-op (empty result, no remote call) when unauthenticated or the input
    /// is empty. On remote failure the error is logged and nothing is added;
    /// an empty result is the failure signal.
    pub async fn create_annotations(&mut self, bases: &[AnnotationBase]) -> Vec<Annotation> {
        if !self.context.logged_in || bases.is_empty() {
            return Vec::new();
        }
        self.status.set_saving(true);
        let result = self.client.create_annotations(bases).await;
        self.status.set_saving(false);
        match result {
            Ok(created) => {
                for annotation in &created {
                    self.insert_annotation(annotation.clone());
                }
                created
            }
            Err(err) => {
                log::error!("failed to create {} annotations: {err}", bases.len());
                Vec::new()
            }
        }
    }

    /// Delete a batch of annotations remotely, then drop them from the
    /// repository, the selection set and the active set.
    ///
    /// The deleting flag is cleared whether the remote call succeeds or
    /// fails; on failure local state is left unchanged.
    pub async fn delete_annotations(&mut self, ids: &[AnnotationId]) {
        if !self.context.logged_in || ids.is_empty() {
            return;
        }
        self.deleting_annotations = true;
        self.status.set_saving(true);
        let progress = self
            .progress
            .create(&format!("Deleting {} annotations", ids.len()));
        let result = self.client.delete_annotations(ids).await;
        self.deleting_annotations = false;
        self.status.set_saving(false);
        self.progress.complete(&progress);
        match result {
            Ok(()) => self.remove_annotations(ids),
            Err(err) => log::error!("failed to delete {} annotations: {err}", ids.len()),
        }
    }

    /// Delete every selected annotation, then clear the selection.
    pub async fn delete_selected_annotations(&mut self) {
        let ids = self.selected.ids().to_vec();
        self.delete_annotations(&ids).await;
        self.clear_selected();
    }

    /// Delete every annotation that is not selected.
    pub async fn delete_unselected_annotations(&mut self) {
        let ids: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|annotation| !self.selected.contains(&annotation.id))
            .map(|annotation| annotation.id.clone())
            .collect();
        self.delete_annotations(&ids).await;
    }

    /// Set (or with `None`, clear) the color of the given annotations in a
    /// single batched update call.
    pub async fn color_annotation_ids(&mut self, ids: &[AnnotationId], color: Option<&str>) {
        let color = color.map(str::to_owned);
        self.update_annotation_batch(ids, |annotation| annotation.color = color.clone())
            .await;
    }

    /// Color every selected annotation.
    pub async fn color_selected_annotations(&mut self, color: Option<&str>) {
        let ids = self.selected.ids().to_vec();
        self.color_annotation_ids(&ids, color).await;
    }

    /// Add tags to the given annotations, duplicate-free.
    pub async fn add_tags_by_annotation_ids(&mut self, ids: &[AnnotationId], new_tags: &[String]) {
        self.update_annotation_batch(ids, |annotation| {
            annotation.tags = tags::add_tags(&annotation.tags, new_tags);
        })
        .await;
    }

    /// Remove tags from the given annotations.
    pub async fn remove_tags_by_annotation_ids(&mut self, ids: &[AnnotationId], remove: &[String]) {
        self.update_annotation_batch(ids, |annotation| {
            annotation.tags = tags::remove_tags(&annotation.tags, remove);
        })
        .await;
    }

    /// Overwrite the tag list of the given annotations.
    pub async fn replace_tags_by_annotation_ids(
        &mut self,
        ids: &[AnnotationId],
        new_tags: &[String],
    ) {
        self.update_annotation_batch(ids, |annotation| annotation.tags = new_tags.to_vec())
            .await;
    }

    /// Tag every selected annotation; `replace` switches between union-add
    /// and overwrite.
    pub async fn tag_selected_annotations(&mut self, new_tags: &[String], replace: bool) {
        let ids = self.selected.ids().to_vec();
        if replace {
            self.replace_tags_by_annotation_ids(&ids, new_tags).await;
        } else {
            self.add_tags_by_annotation_ids(&ids, new_tags).await;
        }
    }

    /// Remove tags from every selected annotation.
    pub async fn remove_tags_from_selected_annotations(&mut self, remove: &[String]) {
        let ids = self.selected.ids().to_vec();
        self.remove_tags_by_annotation_ids(&ids, remove).await;
    }

    /// Apply `mutate` to each targeted annotation, send the batch in one
    /// update call, and apply it locally on success. Dangling IDs are
    /// silently skipped.
    async fn update_annotation_batch(
        &mut self,
        ids: &[AnnotationId],
        mutate: impl Fn(&mut Annotation),
    ) {
        if !self.context.logged_in || ids.is_empty() {
            return;
        }
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(annotation) = self.get_annotation_from_id(id) {
                let mut annotation = annotation.clone();
                mutate(&mut annotation);
                updated.push(annotation);
            }
        }
        if updated.is_empty() {
            return;
        }
        self.status.set_saving(true);
        let result = self.client.update_annotations(&updated).await;
        self.status.set_saving(false);
        match result {
            Ok(()) => {
                for annotation in updated {
                    self.replace_annotation(annotation);
                }
            }
            Err(err) => log::error!("failed to update {} annotations: {err}", updated.len()),
        }
    }

    /// Create a batch of connections remotely and append the results.
    pub async fn create_connections(
        &mut self,
        bases: &[AnnotationConnectionBase],
    ) -> Vec<AnnotationConnection> {
        if !self.context.logged_in || bases.is_empty() {
            return Vec::new();
        }
        self.status.set_saving(true);
        let result = self.client.create_connections(bases).await;
        self.status.set_saving(false);
        match result {
            Ok(created) => {
                self.add_connections(created.clone());
                created
            }
            Err(err) => {
                log::error!("failed to create {} connections: {err}", bases.len());
                Vec::new()
            }
        }
    }

    /// Fetch annotations and connections for the active dataset, replacing
    /// local state.
    ///
    /// With no active dataset or configuration, local state is cleared and
    /// the server is never called. Any fetch failure also clears local state:
    /// fail-safe-empty, never fail-safe-stale.
    pub async fn fetch_annotations(&mut self) {
        let dataset_id = match (&self.context.dataset, &self.context.configuration) {
            (Some(dataset), Some(_)) => dataset.id.clone(),
            _ => {
                self.set_annotations(Vec::new());
                self.set_connections(Vec::new());
                return;
            }
        };
        let annotations = self.client.annotations_for_dataset(&dataset_id).await;
        let connections = self.client.connections_for_dataset(&dataset_id).await;
        match (annotations, connections) {
            (Ok(annotations), Ok(connections)) => {
                self.set_annotations(annotations);
                self.set_connections(connections);
            }
            (Err(err), _) | (_, Err(err)) => {
                log::error!("failed to fetch annotations for dataset {dataset_id}: {err}");
                self.set_annotations(Vec::new());
                self.set_connections(Vec::new());
            }
        }
    }

    /// Undo the last annotation operation on the server, then refetch.
    pub async fn undo(&mut self) {
        let Some(dataset_id) = self.history_target() else {
            return;
        };
        match self.client.undo(&dataset_id).await {
            Ok(()) => self.fetch_annotations().await,
            Err(err) => log::error!("undo failed for dataset {dataset_id}: {err}"),
        }
    }

    /// Redo the last undone annotation operation on the server, then refetch.
    pub async fn redo(&mut self) {
        let Some(dataset_id) = self.history_target() else {
            return;
        };
        match self.client.redo(&dataset_id).await {
            Ok(()) => self.fetch_annotations().await,
            Err(err) => log::error!("redo failed for dataset {dataset_id}: {err}"),
        }
    }

    fn history_target(&self) -> Option<String> {
        if !self.context.logged_in {
            return None;
        }
        self.context.dataset.as_ref().map(|dataset| dataset.id.clone())
    }

    // ========================================================================
    // Copy/paste buffer
    // ========================================================================

    /// The clipboard contents, in copy order.
    pub fn copied_annotations(&self) -> &[Annotation] {
        &self.clipboard
    }

    /// Overwrite the clipboard directly.
    pub fn set_copied_annotations(&mut self, annotations: Vec<Annotation>) {
        self.clipboard = annotations;
    }

    /// Snapshot the current selection (by value) into the clipboard,
    /// overwriting any previous contents.
    pub fn copy_selected_annotations(&mut self) {
        self.clipboard = self
            .selected_annotations()
            .into_iter()
            .cloned()
            .collect();
    }

    /// Re-materialize the clipboard at the dataset's current slice.
    ///
    /// Each pasted annotation keeps its shape, tags, coordinates and color
    /// but is placed at the current `{XY, Z, Time}` of the active dataset,
    /// not at its copy-time location. No-op when the clipboard is empty or no
    /// dataset is active.
    pub async fn paste_annotations(&mut self) -> Vec<Annotation> {
        let Some(dataset) = &self.context.dataset else {
            return Vec::new();
        };
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let dataset_id = dataset.id.clone();
        let location = self.context.current_location();
        let bases: Vec<AnnotationBase> = self
            .clipboard
            .iter()
            .map(|annotation| annotation.to_base_at(location, &dataset_id))
            .collect();
        self.create_annotations(&bases).await
    }
}
