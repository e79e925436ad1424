//! # Search Tasks
//!
//! A search runs on a worker thread that owns a reference to the handle's
//! shared state for the duration of the search. The result is delivered
//! through a oneshot channel.

use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use cpu_time::ProcessTime;
use tokio::sync::oneshot;

use super::{handle::Shared, Engine, SearchPhase, SolverError, SolverResult};
use crate::types::Lit;

type Outcome = Result<SolverResult, SolverError>;

/// The pending result of a search started with [`Solver::solve`](super::Solver::solve).
///
/// Resolves exactly once, either by awaiting it or with [`SearchTask::wait`].
/// Dropping the task does not cancel the search; use
/// [`Solver::interrupt`](super::Solver::interrupt) for that.
#[derive(Debug)]
#[must_use = "a search keeps the solver busy until it completes"]
pub struct SearchTask {
    rx: oneshot::Receiver<Outcome>,
}

impl SearchTask {
    /// Blocks the current thread until the search completes.
    ///
    /// # Panics
    ///
    /// If called from within an asynchronous execution context, await the
    /// task there instead.
    ///
    /// # Errors
    ///
    /// [`SolverError::Execution`] if the search failed
    pub fn wait(self) -> Outcome {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(lost()))
    }
}

impl Future for SearchTask {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| Err(lost())))
    }
}

fn lost() -> SolverError {
    SolverError::Execution(String::from(
        "search worker terminated without delivering a result",
    ))
}

/// Keeps the shared state alive while a search is outstanding and releases
/// the handle when dropped, also when the engine panics
struct SearchPin<E> {
    shared: Arc<Shared<E>>,
}

impl<E: Engine> SearchPin<E> {
    fn search(&self, assumps: &[Lit]) -> Outcome {
        let mut inner = self
            .shared
            .inner
            .lock()
            .map_err(|_| SolverError::Faulted)?;
        self.shared.set_phase(SearchPhase::Running);
        log::debug!("search started");
        let start = ProcessTime::now();
        let res = inner.engine.solve_limited(assumps);
        let cpu_time = start.elapsed();
        inner.stats.record_result(res, cpu_time);
        inner.state = res.into();
        log::info!("search finished: {res} after {cpu_time:?} of cpu time");
        Ok(res)
    }
}

impl<E> Drop for SearchPin<E> {
    fn drop(&mut self) {
        self.shared.set_phase(SearchPhase::Idle);
    }
}

/// Starts a search on a fresh worker thread. The handle has to be in
/// [`SearchPhase::Queued`] already.
pub(super) fn spawn<E: Engine>(shared: Arc<Shared<E>>, assumps: Vec<Lit>) -> SearchTask {
    let (tx, rx) = oneshot::channel();
    let builder = shared.config.thread_builder();
    let pin = SearchPin { shared };
    // the closure only runs if the thread was spawned, so on failure `pin` is
    // dropped with it and the handle returns to idle
    let spawned = builder.spawn(move || {
        let res = panic::catch_unwind(AssertUnwindSafe(|| pin.search(&assumps)))
            .unwrap_or_else(|payload| {
                let msg = panic_message(payload.as_ref());
                log::warn!("engine panicked during search: {msg}");
                Err(SolverError::Execution(msg))
            });
        // release the handle before the result becomes observable
        drop(pin);
        if tx.send(res).is_err() {
            log::warn!("search task dropped before the search finished, discarding result");
        }
    });
    match spawned {
        Ok(_) => SearchTask { rx },
        Err(err) => {
            log::warn!("could not spawn search worker: {err}");
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(Err(SolverError::Execution(format!(
                "could not spawn search worker: {err}"
            ))));
            SearchTask { rx }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("engine panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("engine panicked: {msg}")
    } else {
        String::from("engine panicked")
    }
}
