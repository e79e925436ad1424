//! # The Solver Handle

use core::ffi::c_int;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use super::{
    task, Engine, Interrupter, SearchPhase, SearchStats, SearchTask, SolverError, SolverState,
    SolverStats,
};
use crate::{
    config::SolverConfig,
    types::{Assignment, Lit, TernaryVal, TypeError, Var},
};

/// State shared between a [`Solver`] and the worker of its pending search
pub(super) struct Shared<E> {
    pub(super) inner: Mutex<Inner<E>>,
    phase: AtomicU8,
    pub(super) interrupter: Interrupter,
    pub(super) config: SolverConfig,
}

impl<E> Shared<E> {
    pub(super) fn phase(&self) -> SearchPhase {
        SearchPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(super) fn set_phase(&self, phase: SearchPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn try_queue(&self) -> bool {
        self.phase
            .compare_exchange(
                SearchPhase::Idle as u8,
                SearchPhase::Queued as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// The engine together with the handle's bookkeeping
pub(super) struct Inner<E> {
    pub(super) engine: E,
    pub(super) state: SolverState,
    pub(super) stats: SolverStats,
}

impl<E: Engine> Inner<E> {
    fn check_var(&self, var: Var) -> Result<(), SolverError> {
        let n_vars = self.engine.n_vars();
        if var.idx32() >= n_vars {
            return Err(SolverError::InvalidVariable {
                var: var.idx32(),
                n_vars,
            });
        }
        Ok(())
    }

    fn check_lits(&self, lits: &[Lit]) -> Result<(), SolverError> {
        lits.iter().try_for_each(|l| self.check_var(l.var()))
    }

    /// Decodes IPASIR literals. Indices beyond what any variable can have are
    /// reported as unallocated variables, like any other out-of-range index.
    fn decode(&self, lits: &[c_int]) -> Result<Vec<Lit>, SolverError> {
        lits.iter()
            .map(|&l| {
                Lit::from_ipasir(l).map_err(|err| match err {
                    TypeError::IdxTooHigh(var, _) => SolverError::InvalidVariable {
                        var,
                        n_vars: self.engine.n_vars(),
                    },
                    TypeError::IpasirZero => SolverError::Type(err),
                })
            })
            .collect()
    }

    fn add_clause(&mut self, clause: &[Lit]) -> Result<(), SolverError> {
        self.check_lits(clause)?;
        log::trace!("adding clause {clause:?}");
        self.stats.record_clause(clause.len());
        self.state = SolverState::Input;
        if !self.engine.add_clause(clause) {
            log::debug!("clause set became unsatisfiable");
        }
        Ok(())
    }

    fn lit_val(&self, lit: Lit) -> TernaryVal {
        match self.state {
            SolverState::Sat => self.engine.lit_val(lit),
            _ => TernaryVal::DontCare,
        }
    }
}

/// An asynchronous, cancellable handle around a single incremental SAT engine.
///
/// Literals at the boundary are IPASIR integers: `v > 0` is variable `v - 1`,
/// `v < 0` is the negation of variable `-v - 1`, and `0` is rejected.
///
/// # Examples
///
/// ```no_run
/// use satbridge::solvers::{Solver, SolverResult};
/// use satbridge_batsat::Batsat;
///
/// # async fn run() -> Result<(), satbridge::solvers::SolverError> {
/// let solver = Solver::<Batsat>::default();
/// let x = solver.new_var()?;
/// solver.add_clause(&[x.to_ipasir()])?;
/// let task = solver.solve()?;
/// // the handle rejects other work until the search is done, except interrupts
/// solver.interrupt();
/// match task.await? {
///     SolverResult::Sat => assert!(solver.value(x.idx32())?.to_bool_with_def(false)),
///     SolverResult::Unsat => unreachable!(),
///     SolverResult::Interrupted => (),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Solver<E: Engine> {
    shared: Arc<Shared<E>>,
}

impl<E: Engine + Default> Default for Solver<E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

impl<E: Engine> fmt::Debug for Solver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("phase", &self.shared.phase())
            .field("interrupted", &self.shared.interrupter.is_interrupted())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Solver<E> {
    /// Wraps an engine in a handle with the default configuration
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SolverConfig::default())
    }

    /// Wraps an engine in a handle
    pub fn with_config(engine: E, config: SolverConfig) -> Self {
        log::debug!("creating solver handle around {}", engine.signature());
        let interrupter = engine.interrupter();
        interrupter.reset();
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    engine,
                    state: SolverState::Input,
                    stats: SolverStats::default(),
                }),
                phase: AtomicU8::new(SearchPhase::Idle as u8),
                interrupter,
                config,
            }),
        }
    }

    /// Gets exclusive access to the engine, provided no search is outstanding
    fn idle(&self) -> Result<MutexGuard<'_, Inner<E>>, SolverError> {
        if self.shared.phase() != SearchPhase::Idle {
            return Err(SolverError::SearchInProgress);
        }
        self.shared.inner.lock().map_err(|_| SolverError::Faulted)
    }

    /// Gets a signature of the wrapped engine
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn signature(&self) -> Result<&'static str, SolverError> {
        Ok(self.idle()?.engine.signature())
    }

    /// Gets the current phase of the search on this handle
    #[must_use]
    pub fn search_phase(&self) -> SearchPhase {
        self.shared.phase()
    }

    /// Gets the configuration of this handle
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.shared.config
    }

    /// Allocates a new variable. Variables are numbered from 0 in the order of allocation.
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn new_var(&self) -> Result<Var, SolverError> {
        Ok(self.idle()?.engine.new_var())
    }

    /// Gets the number of allocated variables
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn n_vars(&self) -> Result<u32, SolverError> {
        Ok(self.idle()?.engine.n_vars())
    }

    /// Gets the number of clauses in the engine
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn n_clauses(&self) -> Result<u64, SolverError> {
        Ok(self.idle()?.engine.n_clauses())
    }

    /// Adds a clause of IPASIR literals. If the clause makes the problem
    /// unsatisfiable, this is not an error but reflected by [`Solver::is_ok`].
    ///
    /// # Errors
    ///
    /// - [`SolverError::Type`] if a literal is zero
    /// - [`SolverError::InvalidVariable`] if a literal references a variable
    ///   that has not been allocated with [`Solver::new_var`], including
    ///   `c_int::MIN`
    /// - [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn add_clause(&self, clause: &[c_int]) -> Result<(), SolverError> {
        let mut inner = self.idle()?;
        let clause = inner.decode(clause)?;
        inner.add_clause(&clause)
    }

    /// Same as [`Solver::add_clause`] but for typed literals
    ///
    /// # Errors
    ///
    /// As [`Solver::add_clause`], except for decoding errors
    pub fn add_clause_lits(&self, clause: &[Lit]) -> Result<(), SolverError> {
        self.idle()?.add_clause(clause)
    }

    /// Like [`Solver::add_clause_lits`] but for unit clauses
    ///
    /// # Errors
    ///
    /// As [`Solver::add_clause_lits`]
    pub fn add_unit(&self, lit: Lit) -> Result<(), SolverError> {
        self.add_clause_lits(&[lit])
    }

    /// Like [`Solver::add_clause_lits`] but for clauses with two literals
    ///
    /// # Errors
    ///
    /// As [`Solver::add_clause_lits`]
    pub fn add_binary(&self, lit1: Lit, lit2: Lit) -> Result<(), SolverError> {
        self.add_clause_lits(&[lit1, lit2])
    }

    /// Simplifies the clause set and returns whether the problem is still
    /// not known to be unsatisfiable
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn simplify(&self) -> Result<bool, SolverError> {
        let mut inner = self.idle()?;
        let ok = inner.engine.simplify();
        log::debug!("simplified, okay: {ok}");
        Ok(ok)
    }

    /// Checks whether the problem has not been proven unsatisfiable yet
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn is_ok(&self) -> Result<bool, SolverError> {
        Ok(self.idle()?.engine.is_ok())
    }

    /// Requests the running search, if any, to stop at its next poll point.
    /// Without a running search this has no effect, since the request is
    /// cleared when the next search is queued.
    pub fn interrupt(&self) {
        log::debug!("interrupt requested");
        self.shared.interrupter.interrupt();
    }

    /// Gets a thread safe interrupter for this handle's engine
    #[must_use]
    pub fn interrupter(&self) -> Interrupter {
        self.shared.interrupter.clone()
    }

    /// Gets the value of variable `var` (0-based) in the model of the last
    /// search. [`TernaryVal::DontCare`] if the last search did not return a model.
    ///
    /// # Errors
    ///
    /// - [`SolverError::InvalidVariable`] if the variable is not allocated
    /// - [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn value(&self, var: u32) -> Result<TernaryVal, SolverError> {
        let inner = self.idle()?;
        let n_vars = inner.engine.n_vars();
        if var >= n_vars {
            return Err(SolverError::InvalidVariable { var, n_vars });
        }
        Ok(inner.lit_val(Lit::positive(var)))
    }

    /// Same as [`Solver::value`], but for literals
    ///
    /// # Errors
    ///
    /// As [`Solver::value`]
    pub fn lit_val(&self, lit: Lit) -> Result<TernaryVal, SolverError> {
        let inner = self.idle()?;
        inner.check_var(lit.var())?;
        Ok(inner.lit_val(lit))
    }

    /// Gets the full model of the last search
    ///
    /// # Errors
    ///
    /// - [`SolverError::State`] if the last search was not satisfiable
    /// - [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn model(&self) -> Result<Assignment, SolverError> {
        let inner = self.idle()?;
        if inner.state != SolverState::Sat {
            return Err(SolverError::State(inner.state, SolverState::Sat));
        }
        Ok((0..inner.engine.n_vars())
            .map(|idx| inner.engine.lit_val(Lit::positive(idx)))
            .collect::<Vec<_>>()
            .into())
    }

    /// Gets the core of the last search under assumptions: a clause of
    /// negated assumptions that is entailed by the formula
    ///
    /// # Errors
    ///
    /// - [`SolverError::State`] if the last search was not unsatisfiable
    /// - [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn core(&self) -> Result<Vec<Lit>, SolverError> {
        let inner = self.idle()?;
        if inner.state != SolverState::Unsat {
            return Err(SolverError::State(inner.state, SolverState::Unsat));
        }
        Ok(inner.engine.core())
    }

    /// Gets the state the last search left the solver in
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn state(&self) -> Result<SolverState, SolverError> {
        Ok(self.idle()?.state)
    }

    /// Gets a snapshot of the engine's search counters
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn stats(&self) -> Result<SearchStats, SolverError> {
        Ok(self.idle()?.engine.search_stats())
    }

    /// Gets the statistics tracked by the handle, including the engine's counters
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn solve_stats(&self) -> Result<SolverStats, SolverError> {
        let inner = self.idle()?;
        let n_vars = inner.engine.n_vars();
        Ok(SolverStats {
            max_var: n_vars.checked_sub(1).map(Var::new),
            search: inner.engine.search_stats(),
            ..inner.stats.clone()
        })
    }

    /// Makes the engine print its diagnostics
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] or [`SolverError::Faulted`]
    pub fn print_diagnostics(&self) -> Result<(), SolverError> {
        let inner = self.idle()?;
        log::info!(
            "{} after {} solves: {}",
            inner.engine.signature(),
            inner.stats.n_solves(),
            inner.engine.search_stats()
        );
        inner.engine.print_diagnostics();
        Ok(())
    }

    /// Starts a search on a worker thread and returns the task it resolves through.
    ///
    /// # Errors
    ///
    /// [`SolverError::SearchInProgress`] if a search is already outstanding on
    /// this handle, [`SolverError::Faulted`] after an engine failure
    pub fn solve(&self) -> Result<SearchTask, SolverError> {
        self.solve_assumps_lits(&[])
    }

    /// Starts a search under IPASIR literal assumptions
    ///
    /// # Errors
    ///
    /// As [`Solver::solve`], and as [`Solver::add_clause`] for invalid assumptions
    pub fn solve_assumps(&self, assumps: &[c_int]) -> Result<SearchTask, SolverError> {
        let assumps = self.idle()?.decode(assumps)?;
        self.solve_assumps_lits(&assumps)
    }

    /// Starts a search under assumptions
    ///
    /// # Errors
    ///
    /// As [`Solver::solve_assumps`]
    pub fn solve_assumps_lits(&self, assumps: &[Lit]) -> Result<SearchTask, SolverError> {
        self.idle()?.check_lits(assumps)?;
        if !self.shared.try_queue() {
            return Err(SolverError::SearchInProgress);
        }
        self.shared.interrupter.reset();
        log::debug!("queueing search under {} assumptions", assumps.len());
        Ok(task::spawn(Arc::clone(&self.shared), assumps.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use core::ffi::c_int;
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    use super::Solver;
    use crate::{
        lit,
        solvers::{
            Engine, Interrupter, SearchPhase, SearchStats, SolverError, SolverResult, SolverState,
        },
        types::{Lit, TernaryVal, TypeError, Var},
    };

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Search,
        Hang,
        Panic,
    }

    /// Exhaustive-search engine for exercising the handle
    struct Scripted {
        mode: Mode,
        interrupter: Interrupter,
        n_vars: u32,
        clauses: Vec<Vec<Lit>>,
        ok: bool,
        model: Vec<bool>,
        core: Vec<Lit>,
        stats: SearchStats,
        dropped: Arc<AtomicBool>,
    }

    impl Scripted {
        fn new(mode: Mode) -> Self {
            Self {
                mode,
                interrupter: Interrupter::new(),
                n_vars: 0,
                clauses: vec![],
                ok: true,
                model: vec![],
                core: vec![],
                stats: SearchStats::default(),
                dropped: Arc::new(AtomicBool::new(false)),
            }
        }

        fn lit_true(assignment: u64, lit: Lit) -> bool {
            (assignment >> lit.vidx() & 1 == 1) == lit.is_pos()
        }
    }

    impl Default for Scripted {
        fn default() -> Self {
            Scripted::new(Mode::Search)
        }
    }

    impl Drop for Scripted {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl Engine for Scripted {
        fn signature(&self) -> &'static str {
            "scripted"
        }

        fn interrupter(&self) -> Interrupter {
            self.interrupter.clone()
        }

        fn new_var(&mut self) -> Var {
            self.n_vars += 1;
            Var::new(self.n_vars - 1)
        }

        fn n_vars(&self) -> u32 {
            self.n_vars
        }

        fn n_clauses(&self) -> u64 {
            self.clauses.len() as u64
        }

        fn add_clause(&mut self, clause: &[Lit]) -> bool {
            if clause.is_empty()
                || (clause.len() == 1 && self.clauses.iter().any(|cl| cl[..] == [!clause[0]]))
            {
                self.ok = false;
            }
            self.clauses.push(clause.to_vec());
            self.ok
        }

        fn simplify(&mut self) -> bool {
            self.ok
        }

        fn is_ok(&self) -> bool {
            self.ok
        }

        fn solve_limited(&mut self, assumps: &[Lit]) -> SolverResult {
            self.stats.restarts += 1;
            match self.mode {
                Mode::Panic => panic!("scripted engine failure"),
                Mode::Hang => {
                    while !self.interrupter.is_interrupted() {
                        thread::sleep(Duration::from_millis(1));
                    }
                    return SolverResult::Interrupted;
                }
                Mode::Search => (),
            }
            if !self.ok {
                return SolverResult::Unsat;
            }
            for assignment in 0..(1u64 << self.n_vars) {
                if self.interrupter.is_interrupted() {
                    return SolverResult::Interrupted;
                }
                self.stats.decisions += u64::from(self.n_vars);
                self.stats.propagations += self.clauses.len() as u64;
                let sat = self
                    .clauses
                    .iter()
                    .all(|cl| cl.iter().any(|&l| Scripted::lit_true(assignment, l)));
                if !sat {
                    self.stats.conflicts += 1;
                    continue;
                }
                if let Some(&failed) = assumps
                    .iter()
                    .find(|&&a| !Scripted::lit_true(assignment, a))
                {
                    self.core = vec![!failed];
                    continue;
                }
                self.model = (0..self.n_vars)
                    .map(|idx| assignment >> idx & 1 == 1)
                    .collect();
                return SolverResult::Sat;
            }
            SolverResult::Unsat
        }

        fn lit_val(&self, lit: Lit) -> TernaryVal {
            match self.model.get(lit.vidx()) {
                Some(&val) => TernaryVal::from(val == lit.is_pos()),
                None => TernaryVal::DontCare,
            }
        }

        fn core(&self) -> Vec<Lit> {
            self.core.clone()
        }

        fn search_stats(&self) -> SearchStats {
            self.stats
        }

        fn print_diagnostics(&self) {}
    }

    fn vars(solver: &Solver<Scripted>, n: usize) {
        for _ in 0..n {
            solver.new_var().unwrap();
        }
    }

    #[test]
    fn fresh_handle() {
        let solver = Solver::<Scripted>::default();
        assert!(solver.is_ok().unwrap());
        assert_eq!(solver.stats().unwrap(), SearchStats::default());
        assert_eq!(solver.n_vars().unwrap(), 0);
        assert_eq!(solver.search_phase(), SearchPhase::Idle);
        assert_eq!(solver.state().unwrap(), SolverState::Input);
    }

    #[test]
    fn vars_monotonic() {
        let solver = Solver::<Scripted>::default();
        assert_eq!(solver.new_var().unwrap(), Var::new(0));
        assert_eq!(solver.new_var().unwrap(), Var::new(1));
        assert_eq!(solver.n_vars().unwrap(), 2);
    }

    #[test]
    fn zero_literal_rejected() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 1);
        assert_eq!(
            solver.add_clause(&[1, 0]),
            Err(SolverError::Type(TypeError::IpasirZero))
        );
        assert_eq!(solver.n_clauses().unwrap(), 0);
        assert!(solver.is_ok().unwrap());
    }

    #[test]
    fn unallocated_variable_rejected() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 2);
        assert_eq!(
            solver.add_clause(&[1, -3]),
            Err(SolverError::InvalidVariable { var: 2, n_vars: 2 })
        );
        assert_eq!(
            solver.value(2),
            Err(SolverError::InvalidVariable { var: 2, n_vars: 2 })
        );
        assert!(matches!(
            solver.solve_assumps(&[3]),
            Err(SolverError::InvalidVariable { .. })
        ));
        assert_eq!(solver.search_phase(), SearchPhase::Idle);
    }

    #[test]
    fn extreme_indices_are_unallocated() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 1);
        assert_eq!(
            solver.value(u32::MAX),
            Err(SolverError::InvalidVariable {
                var: u32::MAX,
                n_vars: 1
            })
        );
        assert!(matches!(
            solver.add_clause(&[c_int::MIN]),
            Err(SolverError::InvalidVariable { n_vars: 1, .. })
        ));
        assert!(matches!(
            solver.solve_assumps(&[1, c_int::MIN]),
            Err(SolverError::InvalidVariable { n_vars: 1, .. })
        ));
        assert_eq!(solver.n_clauses().unwrap(), 0);
        assert_eq!(solver.search_phase(), SearchPhase::Idle);
    }

    #[test]
    fn contradicting_units() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 1);
        solver.add_clause(&[1]).unwrap();
        assert!(solver.is_ok().unwrap());
        solver.add_clause(&[-1]).unwrap();
        assert!(!solver.is_ok().unwrap());
        assert!(!solver.simplify().unwrap());
    }

    #[test]
    fn no_model_before_search() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 1);
        assert_eq!(solver.value(0).unwrap(), TernaryVal::DontCare);
        assert_eq!(
            solver.model(),
            Err(SolverError::State(SolverState::Input, SolverState::Sat))
        );
        assert_eq!(
            solver.core(),
            Err(SolverError::State(SolverState::Input, SolverState::Unsat))
        );
    }

    #[test]
    fn blocking_wait() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 2);
        solver.add_clause(&[1, 2]).unwrap();
        solver.add_clause(&[-1, -2]).unwrap();
        let res = solver.solve().unwrap().wait().unwrap();
        assert_eq!(res, SolverResult::Sat);
        let model = solver.model().unwrap();
        assert_ne!(model.var_value(Var::new(0)), model.var_value(Var::new(1)));
        assert_eq!(solver.value(0).unwrap(), model.var_value(Var::new(0)));
        // adding a clause invalidates the model
        solver.add_clause(&[1, 2]).unwrap();
        assert_eq!(solver.value(0).unwrap(), TernaryVal::DontCare);
    }

    #[tokio::test]
    async fn assumption_core() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 2);
        solver.add_clause(&[-1, 2]).unwrap();
        let res = solver.solve_assumps(&[1, -2]).unwrap().await.unwrap();
        assert_eq!(res, SolverResult::Unsat);
        assert!(solver.is_ok().unwrap());
        assert!(!solver.core().unwrap().is_empty());
        let res = solver.solve().unwrap().await.unwrap();
        assert_eq!(res, SolverResult::Sat);
    }

    #[tokio::test]
    async fn single_outstanding_search() {
        let solver = Solver::new(Scripted::new(Mode::Hang));
        vars(&solver, 1);
        let task = solver.solve().unwrap();
        assert_ne!(solver.search_phase(), SearchPhase::Idle);
        assert!(matches!(solver.solve(), Err(SolverError::SearchInProgress)));
        assert_eq!(solver.add_clause(&[1]), Err(SolverError::SearchInProgress));
        assert_eq!(solver.is_ok(), Err(SolverError::SearchInProgress));
        assert_eq!(solver.stats(), Err(SolverError::SearchInProgress));
        solver.interrupt();
        assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
        assert_eq!(solver.search_phase(), SearchPhase::Idle);
        assert_eq!(solver.state().unwrap(), SolverState::Interrupted);
        assert_eq!(solver.value(0).unwrap(), TernaryVal::DontCare);
        solver.add_clause(&[1]).unwrap();
        assert!(solver.is_ok().unwrap());
        assert_eq!(solver.solve_stats().unwrap().n_terminated, 1);
    }

    #[tokio::test]
    async fn stale_interrupt_is_cleared() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 2);
        solver.add_clause(&[1, 2]).unwrap();
        solver.interrupt();
        assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Sat);
    }

    #[tokio::test]
    async fn interrupter_from_other_thread() {
        let solver = Solver::new(Scripted::new(Mode::Hang));
        let interrupter = solver.interrupter();
        let task = solver.solve().unwrap();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            interrupter.interrupt();
        });
        assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
    }

    #[tokio::test]
    async fn engine_panic_is_delivered() {
        let solver = Solver::new(Scripted::new(Mode::Panic));
        let res = solver.solve().unwrap().await;
        assert!(matches!(res, Err(SolverError::Execution(msg)) if msg.contains("scripted")));
        assert_eq!(solver.search_phase(), SearchPhase::Idle);
        assert_eq!(solver.is_ok(), Err(SolverError::Faulted));
        assert!(matches!(solver.solve(), Err(SolverError::Faulted)));
    }

    #[tokio::test]
    async fn drop_during_search_is_deferred() {
        let engine = Scripted::new(Mode::Hang);
        let dropped = Arc::clone(&engine.dropped);
        let solver = Solver::new(engine);
        let interrupter = solver.interrupter();
        let task = solver.solve().unwrap();
        drop(solver);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!dropped.load(Ordering::SeqCst));
        interrupter.interrupt();
        assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unawaited_task_releases_handle() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 1);
        drop(solver.solve().unwrap());
        while solver.search_phase() != SearchPhase::Idle {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(solver.state().unwrap(), SolverState::Sat);
        assert!(solver.lit_val(lit![0]).unwrap().to_option().is_some());
    }

    #[tokio::test]
    async fn stats_non_decreasing() {
        let solver = Solver::<Scripted>::default();
        vars(&solver, 3);
        solver.add_clause(&[1, 2, 3]).unwrap();
        solver.add_clause(&[-1, -2]).unwrap();
        let mut last = solver.stats().unwrap();
        for _ in 0..3 {
            solver.solve().unwrap().await.unwrap();
            let now = solver.stats().unwrap();
            assert!(now.restarts > last.restarts);
            assert!(now.conflicts >= last.conflicts);
            assert!(now.decisions >= last.decisions);
            assert!(now.propagations >= last.propagations);
            last = now;
        }
        assert_eq!(solver.solve_stats().unwrap().n_sat, 3);
    }
}
