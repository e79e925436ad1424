//! # Asynchronous Solver Handles
//!
//! This module holds the [`Solver`] handle, the [`SearchTask`] a search
//! resolves through, and the [`Engine`] trait that external incremental SAT
//! engines implement to be driven by a handle.
//!
//! ## Threading Model
//!
//! An engine is not re-entrant. The handle owns it behind a lock and only
//! ever lets one party use it at a time:
//!
//! - Incremental-build operations ([`Solver::new_var`],
//!   [`Solver::add_clause`], [`Solver::simplify`], queries) run synchronously
//!   on the calling thread.
//! - [`Solver::solve`] moves the search to a dedicated worker thread and
//!   immediately returns a [`SearchTask`]. While the task is pending, every
//!   other operation except [`Solver::interrupt`] is rejected with
//!   [`SolverError::SearchInProgress`].
//! - [`Solver::interrupt`] raises a flag the engine polls cooperatively. The
//!   search ends with [`SolverResult::Interrupted`] at the engine's next poll
//!   point, not immediately. The flag is cleared whenever a new search is
//!   queued, so a stale interrupt never cuts a later search short.
//!
//! The worker keeps the handle's state alive until it is done, so dropping
//! the [`Solver`] during a search defers destruction of the engine until the
//! search has finished.

use core::time::Duration;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use thiserror::Error;

use crate::types::{Lit, TernaryVal, TypeError, Var};

mod handle;
mod task;

pub use handle::Solver;
pub use task::SearchTask;

/// Trait for incremental SAT engines that can be driven by a [`Solver`].
///
/// All methods are called with exclusive access. Implementations do not need
/// to be thread safe beyond being [`Send`], since a search moves the engine's
/// use to a worker thread.
pub trait Engine: Send + 'static {
    /// Gets a signature of the engine implementation
    fn signature(&self) -> &'static str;
    /// Gets the interrupt flag that [`Engine::solve_limited`] polls. The
    /// handle raises and clears this flag, so it has to be the same flag
    /// across calls.
    fn interrupter(&self) -> Interrupter;
    /// Allocates the next variable. Variables are allocated densely from 0.
    fn new_var(&mut self) -> Var;
    /// Gets the number of variables allocated so far
    fn n_vars(&self) -> u32;
    /// Gets the number of (original, non-learnt) clauses in the engine
    fn n_clauses(&self) -> u64;
    /// Adds a clause over allocated variables. Returns `false` if the engine
    /// found the clause set unsatisfiable.
    fn add_clause(&mut self, clause: &[Lit]) -> bool;
    /// Performs cheap simplification of the clause set. Returns the
    /// post-simplification [`Engine::is_ok`] status.
    fn simplify(&mut self) -> bool;
    /// Whether the clause set has not yet been proven unsatisfiable
    fn is_ok(&self) -> bool;
    /// Searches for a model under the given assumptions, polling the flag
    /// returned by [`Engine::interrupter`] and returning
    /// [`SolverResult::Interrupted`] once it is observed set.
    fn solve_limited(&mut self, assumps: &[Lit]) -> SolverResult;
    /// Gets the value of a literal in the last model.
    /// Only called after [`Engine::solve_limited`] returned [`SolverResult::Sat`].
    fn lit_val(&self, lit: Lit) -> TernaryVal;
    /// Gets the failed assumptions of the last query, as a clause over negated assumptions.
    /// Only called after [`Engine::solve_limited`] returned [`SolverResult::Unsat`].
    fn core(&self) -> Vec<Lit>;
    /// Gets the engine's search counters
    fn search_stats(&self) -> SearchStats;
    /// Writes the engine's own human-readable diagnostics to its output channel
    fn print_diagnostics(&self);
}

/// A thread safe interrupt flag shared between a [`Solver`] and its engine.
///
/// Cloning gives another handle to the same flag, so an interrupter can be
/// moved to other threads or tasks and used to stop a running search.
#[derive(Debug, Clone, Default)]
pub struct Interrupter(Arc<AtomicBool>);

impl Interrupter {
    /// Creates a new, lowered flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupts the search currently running, if any. Idempotent.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Checks whether an interrupt has been requested since the last search was queued
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Snapshot of an engine's search counters. All counters are non-decreasing
/// over the lifetime of a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// The number of restarts
    pub restarts: u64,
    /// The number of conflicts
    pub conflicts: u64,
    /// The number of decisions
    pub decisions: u64,
    /// The number of propagations
    pub propagations: u64,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restarts: {}, conflicts: {}, decisions: {}, propagations: {}",
            self.restarts, self.conflicts, self.decisions, self.propagations
        )
    }
}

/// Solver statistics tracked by the handle, together with the engine's
/// search counters
#[derive(Clone, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverStats {
    /// The number of satisfiable queries executed
    pub n_sat: usize,
    /// The number of unsatisfiable queries executed
    pub n_unsat: usize,
    /// The number of interrupted queries executed
    pub n_terminated: usize,
    /// The number of clauses added through the handle
    pub n_clauses: usize,
    /// The highest variable in the solver
    #[cfg_attr(feature = "serde", serde(skip))]
    pub max_var: Option<Var>,
    /// The average length of the clauses added to the solver
    pub avg_clause_len: f32,
    /// The total CPU time spent solving
    pub cpu_solve_time: Duration,
    /// The engine's search counters
    pub search: SearchStats,
}

impl SolverStats {
    /// Gets the total number of queries executed.
    #[must_use]
    pub fn n_solves(&self) -> usize {
        self.n_sat + self.n_unsat + self.n_terminated
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn record_clause(&mut self, len: usize) {
        self.n_clauses += 1;
        self.avg_clause_len = (self.avg_clause_len * ((self.n_clauses - 1) as f32) + len as f32)
            / self.n_clauses as f32;
    }

    pub(crate) fn record_result(&mut self, res: SolverResult, cpu_time: Duration) {
        self.cpu_solve_time += cpu_time;
        match res {
            SolverResult::Sat => self.n_sat += 1,
            SolverResult::Unsat => self.n_unsat += 1,
            SolverResult::Interrupted => self.n_terminated += 1,
        }
    }
}

/// States that the solver can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Input state, while adding clauses.
    Input,
    /// The last query was found satisfiable.
    Sat,
    /// The last query was found unsatisfiable.
    Unsat,
    /// The last query was interrupted.
    Interrupted,
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverState::Input => write!(f, "INPUT"),
            SolverState::Sat => write!(f, "SAT"),
            SolverState::Unsat => write!(f, "UNSAT"),
            SolverState::Interrupted => write!(f, "INTERRUPTED"),
        }
    }
}

impl From<SolverResult> for SolverState {
    fn from(value: SolverResult) -> Self {
        match value {
            SolverResult::Sat => SolverState::Sat,
            SolverResult::Unsat => SolverState::Unsat,
            SolverResult::Interrupted => SolverState::Interrupted,
        }
    }
}

/// Phases of the search on a [`Solver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SearchPhase {
    /// No search is outstanding, the engine is available
    Idle = 0,
    /// A search was requested but the worker has not acquired the engine yet
    Queued = 1,
    /// The worker is searching
    Running = 2,
}

impl SearchPhase {
    pub(crate) fn from_u8(val: u8) -> Self {
        match val {
            1 => SearchPhase::Queued,
            2 => SearchPhase::Running,
            _ => SearchPhase::Idle,
        }
    }
}

/// Return value for solving queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverResult {
    /// The query was found satisfiable.
    Sat,
    /// The query was found unsatisfiable.
    Unsat,
    /// The query was prematurely interrupted.
    Interrupted,
}

impl SolverResult {
    /// Converts to the tri-state boolean form: `Some(true)` for satisfiable,
    /// `Some(false)` for unsatisfiable and `None` if the search was interrupted
    #[must_use]
    pub fn to_bool(self) -> Option<bool> {
        match self {
            SolverResult::Sat => Some(true),
            SolverResult::Unsat => Some(false),
            SolverResult::Interrupted => None,
        }
    }
}

impl From<SolverResult> for Option<bool> {
    fn from(value: SolverResult) -> Self {
        value.to_bool()
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverResult::Sat => write!(f, "SAT"),
            SolverResult::Unsat => write!(f, "UNSAT"),
            SolverResult::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Type representing solver errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// A literal could not be decoded
    #[error(transparent)]
    Type(#[from] TypeError),
    /// A variable that was not allocated in the solver was referenced
    #[error("variable {var} is out of range (solver has {n_vars} variables)")]
    InvalidVariable {
        /// The referenced variable index
        var: u32,
        /// The number of variables in the solver
        n_vars: u32,
    },
    /// A search is queued or running on this solver
    #[error("a search is already in progress on this solver")]
    SearchInProgress,
    /// The solver was expected to be in the second [`SolverState`], but it is in the first.
    #[error("solvers needs to be in state {1} but was in state {0}")]
    State(SolverState, SolverState),
    /// The worker running a search failed for reasons unrelated to satisfiability
    #[error("search execution failed: {0}")]
    Execution(String),
    /// The engine failed during an earlier search and can no longer be used
    #[error("the engine failed during an earlier search and is unusable")]
    Faulted,
}

#[cfg(test)]
mod tests {
    use super::{Interrupter, SearchPhase, SolverResult, SolverStats};
    use core::time::Duration;

    #[test]
    fn interrupter_shared_between_clones() {
        let int = Interrupter::new();
        let other = int.clone();
        assert!(!int.is_interrupted());
        other.interrupt();
        assert!(int.is_interrupted());
        int.reset();
        assert!(!other.is_interrupted());
    }

    #[test]
    fn result_tri_state() {
        assert_eq!(SolverResult::Sat.to_bool(), Some(true));
        assert_eq!(SolverResult::Unsat.to_bool(), Some(false));
        assert_eq!(Option::<bool>::from(SolverResult::Interrupted), None);
    }

    #[test]
    fn phase_repr() {
        for phase in [SearchPhase::Idle, SearchPhase::Queued, SearchPhase::Running] {
            assert_eq!(SearchPhase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn stats_bookkeeping() {
        let mut stats = SolverStats::default();
        stats.record_clause(2);
        stats.record_clause(4);
        assert_eq!(stats.n_clauses, 2);
        assert!((stats.avg_clause_len - 3.).abs() < f32::EPSILON);
        stats.record_result(SolverResult::Sat, Duration::from_millis(2));
        stats.record_result(SolverResult::Interrupted, Duration::from_millis(3));
        assert_eq!(stats.n_solves(), 2);
        assert_eq!(stats.n_terminated, 1);
        assert_eq!(stats.cpu_solve_time, Duration::from_millis(5));
    }
}
