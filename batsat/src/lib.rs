//! # satbridge-batsat - BatSat Engine for satbridge
//!
//! [`Engine`] implementation over the [BatSat](https://github.com/c-cube/batsat)
//! incremental SAT solver, to be driven by a [`satbridge::solvers::Solver`] handle.
//!
//! BatSat is fully implemented in Rust which has advantages in restricted compilation scenarios like WebAssembly.
//!
//! ```no_run
//! use satbridge::solvers::SolverResult;
//! use satbridge_batsat::BatsatSolver;
//!
//! # async fn run() -> Result<(), satbridge::solvers::SolverError> {
//! let solver = BatsatSolver::default();
//! solver.new_var()?;
//! solver.add_clause(&[1])?;
//! assert_eq!(solver.solve()?.await?, SolverResult::Sat);
//! # Ok(())
//! # }
//! ```
//!
//! # BatSat Version
//!
//! The version of BatSat in this crate is Version 0.6.0.

#![warn(clippy::pedantic)]
#![warn(missing_docs)]

use batsat::{intmap::AsIndex, lbool, Callbacks, SolverInterface, SolverOpts};
use satbridge::{
    solvers::{Engine, Interrupter, SearchStats, SolverResult},
    types::{Lit, TernaryVal, Var},
};
use thiserror::Error;

/// Handle around a [`Batsat`] engine
pub type BatsatSolver = satbridge::solvers::Solver<Batsat>;

/// Callbacks that stop the search once the interrupt flag is raised
struct InterruptCallbacks {
    flag: Interrupter,
}

impl Callbacks for InterruptCallbacks {
    fn stop(&self) -> bool {
        self.flag.is_interrupted()
    }
}

/// Search options of the BatSat engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    /// Variable activity decay factor, in `(0, 1)`
    pub var_decay: f64,
    /// Clause activity decay factor, in `(0, 1)`
    pub clause_decay: f64,
    /// Frequency of random decisions, in `[0, 1]`
    pub random_var_freq: f64,
    /// Seed for random decisions, positive
    pub random_seed: f64,
    /// Whether to use the Luby restart sequence instead of geometric restarts
    pub luby_restart: bool,
    /// Number of conflicts before the first restart, at least 1
    pub restart_first: i32,
    /// Restart interval increase factor, greater than 1
    pub restart_inc: f64,
    /// Fraction of wasted clause memory that triggers garbage collection, positive
    pub garbage_frac: f64,
}

impl Default for Options {
    fn default() -> Self {
        let def = SolverOpts::default();
        Self {
            var_decay: def.var_decay,
            clause_decay: def.clause_decay,
            random_var_freq: def.random_var_freq,
            random_seed: def.random_seed,
            luby_restart: def.luby_restart,
            restart_first: def.restart_first,
            restart_inc: def.restart_inc,
            garbage_frac: def.garbage_frac,
        }
    }
}

impl Options {
    /// Checks that all options are within their valid ranges
    ///
    /// # Errors
    ///
    /// [`OptionsError`] naming the first invalid option
    pub fn check(&self) -> Result<(), OptionsError> {
        fn open_unit(val: f64) -> bool {
            0. < val && val < 1.
        }
        fn positive(val: f64) -> bool {
            0. < val && val < f64::INFINITY
        }
        if !open_unit(self.var_decay) {
            return Err(OptionsError::OutOfRange("var_decay", self.var_decay));
        }
        if !open_unit(self.clause_decay) {
            return Err(OptionsError::OutOfRange("clause_decay", self.clause_decay));
        }
        if !(0. ..=1.).contains(&self.random_var_freq) {
            return Err(OptionsError::OutOfRange(
                "random_var_freq",
                self.random_var_freq,
            ));
        }
        if !positive(self.random_seed) {
            return Err(OptionsError::OutOfRange("random_seed", self.random_seed));
        }
        if self.restart_first < 1 {
            return Err(OptionsError::OutOfRange(
                "restart_first",
                f64::from(self.restart_first),
            ));
        }
        if !positive(self.restart_inc - 1.) {
            return Err(OptionsError::OutOfRange("restart_inc", self.restart_inc));
        }
        if !positive(self.garbage_frac) {
            return Err(OptionsError::OutOfRange("garbage_frac", self.garbage_frac));
        }
        Ok(())
    }

    fn to_batsat(self) -> SolverOpts {
        SolverOpts {
            var_decay: self.var_decay,
            clause_decay: self.clause_decay,
            random_var_freq: self.random_var_freq,
            random_seed: self.random_seed,
            luby_restart: self.luby_restart,
            restart_first: self.restart_first,
            restart_inc: self.restart_inc,
            garbage_frac: self.garbage_frac,
            ..SolverOpts::default()
        }
    }
}

/// Errors in the configuration of the BatSat engine
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum OptionsError {
    /// An option is outside of its valid range
    #[error("option `{0}` is out of range: {1}")]
    OutOfRange(&'static str, f64),
}

/// The BatSat engine
///
/// Variable `i` of the handle is BatSat variable `i + 1`, BatSat's variable 0
/// is never referenced.
pub struct Batsat {
    internal: batsat::Solver<InterruptCallbacks>,
    interrupter: Interrupter,
    n_vars: u32,
}

impl Default for Batsat {
    fn default() -> Self {
        Self::build(Options::default())
    }
}

impl Batsat {
    /// Creates an engine with the given options
    ///
    /// # Errors
    ///
    /// [`OptionsError`] if the options are invalid
    pub fn with_options(opts: Options) -> Result<Self, OptionsError> {
        opts.check()?;
        log::debug!("creating batsat engine with {opts:?}");
        Ok(Self::build(opts))
    }

    fn build(opts: Options) -> Self {
        let interrupter = Interrupter::new();
        let cb = InterruptCallbacks {
            flag: interrupter.clone(),
        };
        Self {
            internal: batsat::Solver::new(opts.to_batsat(), cb),
            interrupter,
            n_vars: 0,
        }
    }

    fn to_batsat(lit: Lit) -> batsat::Lit {
        batsat::Lit::new(batsat::Var::from_index(lit.vidx() + 1), lit.is_pos())
    }

    fn to_ternary(val: lbool) -> TernaryVal {
        if val == lbool::TRUE {
            TernaryVal::True
        } else if val == lbool::FALSE {
            TernaryVal::False
        } else {
            TernaryVal::DontCare
        }
    }
}

impl Engine for Batsat {
    fn signature(&self) -> &'static str {
        "BatSat 0.6.0"
    }

    fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    fn new_var(&mut self) -> Var {
        self.internal.var_of_int(self.n_vars + 1);
        self.n_vars += 1;
        Var::new(self.n_vars - 1)
    }

    fn n_vars(&self) -> u32 {
        self.n_vars
    }

    fn n_clauses(&self) -> u64 {
        self.internal.num_clauses()
    }

    fn add_clause(&mut self, clause: &[Lit]) -> bool {
        let mut c: Vec<_> = clause.iter().map(|&l| Batsat::to_batsat(l)).collect();
        self.internal.add_clause_reuse(&mut c)
    }

    fn simplify(&mut self) -> bool {
        self.internal.simplify()
    }

    fn is_ok(&self) -> bool {
        self.internal.is_ok()
    }

    fn solve_limited(&mut self, assumps: &[Lit]) -> SolverResult {
        let a: Vec<_> = assumps.iter().map(|&l| Batsat::to_batsat(l)).collect();
        let res = self.internal.solve_limited(&a);
        if res == lbool::TRUE {
            SolverResult::Sat
        } else if res == lbool::FALSE {
            SolverResult::Unsat
        } else {
            SolverResult::Interrupted
        }
    }

    fn lit_val(&self, lit: Lit) -> TernaryVal {
        Batsat::to_ternary(self.internal.value_lit(Batsat::to_batsat(lit)))
    }

    fn core(&self) -> Vec<Lit> {
        self.internal
            .unsat_core()
            .iter()
            .filter_map(|l| Some(Lit::new(l.var().idx().checked_sub(1)?, !l.sign())))
            .collect()
    }

    fn search_stats(&self) -> SearchStats {
        SearchStats {
            restarts: self.internal.num_restarts(),
            conflicts: self.internal.num_conflicts(),
            decisions: self.internal.num_decisions(),
            propagations: self.internal.num_propagations(),
        }
    }

    fn print_diagnostics(&self) {
        self.internal.print_stats();
    }
}
