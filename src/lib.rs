//! # satbridge - Asynchronous Handles for Incremental SAT Engines
//!
//! `satbridge` makes the blocking, single-threaded API of an incremental SAT
//! engine usable from asynchronous code. A [`solvers::Solver`] owns exactly
//! one engine. Clauses and variables are added synchronously; a search is
//! started with [`solvers::Solver::solve`], runs on a dedicated worker thread
//! and is awaited as a [`solvers::SearchTask`]. Searches can be interrupted
//! cooperatively at any time, after which the handle keeps working.
//!
//! Engines are plugged in through the [`solvers::Engine`] trait. The
//! `satbridge-batsat` crate provides one over the pure-Rust
//! [BatSat](https://github.com/c-cube/batsat) solver.
//!
//! ## Example
//!
//! ```no_run
//! use satbridge::solvers::{Solver, SolverResult};
//! use satbridge_batsat::Batsat;
//!
//! # async fn run() -> Result<(), satbridge::solvers::SolverError> {
//! let solver = Solver::<Batsat>::default();
//! solver.new_var()?;
//! solver.new_var()?;
//! solver.add_clause(&[1, 2])?;
//! solver.add_clause(&[-1, -2])?;
//! assert_eq!(solver.solve()?.await?, SolverResult::Sat);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature name | Description |
//! | --- | --- |
//! | `serde` | Implement `Serialize`/`Deserialize` for the configuration and statistics types. |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! Currently, the MSRV is 1.76.0, the plan is to always support an MSRV that is at least a year
//! old.

#![warn(clippy::pedantic)]
#![warn(missing_docs)]

pub mod config;
pub mod solvers;
pub mod types;

pub use config::SolverConfig;
