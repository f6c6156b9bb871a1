//! Message passing from the listing filters to the job listing binding.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::backend::JobBoardBackend;
use super::domain::JobRecord;
use super::filter::{FilterCriteria, FilterState};
use super::operations::ListJobs;
use crate::request::{AsyncAction, RequestState};

/// Re-runs the listing each time the filter criteria change.
///
/// The feed triggers once for the criteria current at spawn time and then once per
/// published transition. Each trigger is spawned, so overlapping fetches are possible and
/// resolved by the binding's settlement policy. When the [`FilterState`] is dropped the
/// feed stops and disposes the binding.
pub struct ListingFeed<B: JobBoardBackend> {
    action: AsyncAction<ListJobs<B>>,
    task: JoinHandle<()>,
}

impl<B: JobBoardBackend> ListingFeed<B> {
    /// Must be called from within a tokio runtime.
    pub fn spawn(action: AsyncAction<ListJobs<B>>, filters: &FilterState) -> Self {
        let criteria = filters.subscribe();
        let task = tokio::spawn(forward(action.clone(), criteria));
        Self { action, task }
    }

    pub fn action(&self) -> &AsyncAction<ListJobs<B>> {
        &self.action
    }

    pub fn snapshot(&self) -> RequestState<Vec<JobRecord>> {
        self.action.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<Vec<JobRecord>>> {
        self.action.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops forwarding and detaches the binding so in-flight fetches are ignored.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl<B: JobBoardBackend> Drop for ListingFeed<B> {
    fn drop(&mut self) {
        self.task.abort();
        self.action.dispose();
    }
}

async fn forward<B: JobBoardBackend>(
    action: AsyncAction<ListJobs<B>>,
    mut criteria: watch::Receiver<FilterCriteria>,
) {
    let initial = criteria.borrow_and_update().clone();
    dispatch(&action, initial);

    while criteria.changed().await.is_ok() {
        let next = criteria.borrow_and_update().clone();
        dispatch(&action, next);
    }

    debug!("filter state dropped, stopping listing feed");
    action.dispose();
}

fn dispatch<B: JobBoardBackend>(action: &AsyncAction<ListJobs<B>>, criteria: FilterCriteria) {
    debug!(predicates = criteria.active_count(), "filters changed");
    let pending = action.trigger(criteria);
    tokio::spawn(async move {
        pending.await;
    });
}
