//! # Handle Configuration
//!
//! Settings of the [`Solver`](crate::solvers::Solver) handle itself, as
//! opposed to settings of the engine it wraps.

/// Configuration of a solver handle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Name given to the worker threads that run searches
    pub worker_name: String,
    /// Stack size of the worker threads in bytes, the platform default if
    /// `None`. Deep conflict analysis on large instances can need more than
    /// the default.
    pub worker_stack_size: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            worker_name: String::from("satbridge-search"),
            worker_stack_size: None,
        }
    }
}

impl SolverConfig {
    /// Sets the name of the search worker threads
    #[must_use]
    pub fn with_worker_name<S: Into<String>>(mut self, name: S) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Sets the stack size of the search worker threads
    #[must_use]
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    pub(crate) fn thread_builder(&self) -> std::thread::Builder {
        let builder = std::thread::Builder::new().name(self.worker_name.clone());
        match self.worker_stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}
