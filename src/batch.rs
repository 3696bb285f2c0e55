//! Batch worker computation across the datasets of a collection.
//!
//! Runs one worker computation per dataset, strictly sequentially, with
//! cooperative cancellation between datasets and per-dataset failure
//! isolation. Gating keeps accidental fan-out in check: batch mode is only
//! offered for collections of at most [`MAX_BATCH_DATASETS`] datasets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{AnnotationClient, ComputeRequest};
use crate::model::Dataset;
use crate::store::AnnotationStore;

/// Largest collection batch mode will run against.
pub const MAX_BATCH_DATASETS: usize = 10;

/// Whether batch computation may run for a collection.
///
/// Requires a dataset configuration and between 2 and
/// [`MAX_BATCH_DATASETS`] datasets. A single dataset is handled by the
/// ordinary per-dataset compute path.
pub fn can_apply_to_all_datasets(dataset_count: usize, has_configuration: bool) -> bool {
    has_configuration && dataset_count > 1 && dataset_count <= MAX_BATCH_DATASETS
}

/// Human-readable reason batch mode is disabled, if any.
///
/// Only the over-limit case gets a message; a missing configuration or a
/// too-small collection disables the control silently.
pub fn batch_disabled_reason(dataset_count: usize, has_configuration: bool) -> Option<String> {
    if has_configuration && dataset_count > MAX_BATCH_DATASETS {
        Some(format!(
            "Collection has more than {MAX_BATCH_DATASETS} datasets"
        ))
    } else {
        None
    }
}

/// Cooperative cancellation handle, shared between the batch loop and
/// whatever UI owns the cancel button.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The running dataset finishes; remaining ones
    /// are skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Running tally of a batch computation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Name of the dataset currently being computed, if any.
    pub current_dataset_name: Option<String>,
}

impl BatchProgress {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Share of datasets that have reached a terminal state, rounded to the
    /// nearest whole percent.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let settled = self.completed + self.failed + self.cancelled;
        (settled as f64 / self.total as f64 * 100.0).round() as u32
    }

    /// True once every dataset is completed, failed or cancelled.
    pub fn is_done(&self) -> bool {
        self.completed + self.failed + self.cancelled >= self.total
    }
}

impl<A: AnnotationClient> AnnotationStore<A> {
    /// Run one worker computation per dataset, sequentially.
    ///
    /// A failing dataset is counted and the batch moves on; one bad dataset
    /// never aborts the rest. Cancellation is checked between datasets, never
    /// mid-dataset, and skipped datasets are counted as cancelled. The
    /// observer is called after every state change, final state included.
    pub async fn compute_batch(
        &self,
        datasets: &[Dataset],
        request: &ComputeRequest,
        token: &CancelToken,
        mut on_progress: impl FnMut(&BatchProgress),
    ) -> BatchProgress {
        let mut progress = BatchProgress::new(datasets.len());
        for dataset in datasets {
            if token.is_cancelled() {
                progress.cancelled = progress.total - progress.completed - progress.failed;
                progress.current_dataset_name = None;
                on_progress(&progress);
                return progress;
            }
            progress.current_dataset_name = Some(dataset.name.clone());
            on_progress(&progress);
            match self.client().compute_annotations(&dataset.id, request).await {
                Ok(()) => progress.completed += 1,
                Err(err) => {
                    log::warn!("batch compute failed for dataset {}: {err}", dataset.id);
                    progress.failed += 1;
                }
            }
            progress.current_dataset_name = None;
            on_progress(&progress);
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gating_requires_configuration_and_bounds() {
        assert!(can_apply_to_all_datasets(2, true));
        assert!(can_apply_to_all_datasets(10, true));
        assert!(!can_apply_to_all_datasets(1, true));
        assert!(!can_apply_to_all_datasets(11, true));
        assert!(!can_apply_to_all_datasets(5, false));
        assert!(!can_apply_to_all_datasets(0, true));
    }

    #[test]
    fn test_disabled_reason_only_for_over_limit() {
        assert_eq!(
            batch_disabled_reason(11, true).as_deref(),
            Some("Collection has more than 10 datasets")
        );
        assert_eq!(batch_disabled_reason(11, false), None);
        assert_eq!(batch_disabled_reason(10, true), None);
        assert_eq!(batch_disabled_reason(1, true), None);
    }

    #[test]
    fn test_percent_rounds_to_nearest() {
        let mut progress = BatchProgress::new(3);
        assert_eq!(progress.percent(), 0);
        progress.completed = 1;
        assert_eq!(progress.percent(), 33);
        progress.failed = 1;
        assert_eq!(progress.percent(), 67);
        progress.cancelled = 1;
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_done());
    }

    #[test]
    fn test_percent_of_empty_batch_is_zero() {
        assert_eq!(BatchProgress::new(0).percent(), 0);
    }

    #[test]
    fn test_cancel_token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }

    use crate::model::AnnotationLocation;
    use crate::testing::make_store;

    fn request() -> ComputeRequest {
        ComputeRequest {
            tool_id: "tool-1".to_owned(),
            tool_name: "Blob detection".to_owned(),
            image: "workers/blob:latest".to_owned(),
            tags: vec!["computed".to_owned()],
            channel: 0,
            location: AnnotationLocation::default(),
            worker_interface: serde_json::Value::Null,
        }
    }

    fn datasets(count: usize) -> Vec<Dataset> {
        (1..=count)
            .map(|index| Dataset::new(format!("ds-{index}"), format!("Dataset {index}")))
            .collect()
    }

    #[tokio::test]
    async fn test_batch_runs_sequentially_and_isolates_failures() {
        let store = make_store();
        store
            .client()
            .failing_compute_datasets
            .borrow_mut()
            .insert("ds-2".to_owned());

        let progress = store
            .compute_batch(&datasets(3), &request(), &CancelToken::new(), |_| {})
            .await;

        assert_eq!(progress.completed, 2);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.cancelled, 0);
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_done());
        assert_eq!(
            *store.client().computed_dataset_ids.borrow(),
            ["ds-1".to_owned(), "ds-2".to_owned(), "ds-3".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_batch_cancellation_skips_remaining_datasets() {
        let store = make_store();
        let token = CancelToken::new();
        let cancel_after_first = token.clone();

        let progress = store
            .compute_batch(&datasets(3), &request(), &token, move |progress| {
                if progress.completed == 1 {
                    cancel_after_first.cancel();
                }
            })
            .await;

        assert_eq!(progress.completed, 1);
        assert_eq!(progress.cancelled, 2);
        assert_eq!(progress.failed, 0);
        assert_eq!(progress.percent(), 100);
        assert_eq!(*store.client().computed_dataset_ids.borrow(), ["ds-1".to_owned()]);
    }

    #[tokio::test]
    async fn test_batch_reports_current_dataset_name() {
        let store = make_store();
        let mut names = Vec::new();

        store
            .compute_batch(&datasets(2), &request(), &CancelToken::new(), |progress| {
                names.push(progress.current_dataset_name.clone());
            })
            .await;

        assert_eq!(
            names,
            [
                Some("Dataset 1".to_owned()),
                None,
                Some("Dataset 2".to_owned()),
                None
            ]
        );
    }
}
