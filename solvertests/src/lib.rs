//! # Shared Tests for satbridge Engines
//!
//! Procedural macros generating the test-suite every [`Engine`] has to pass
//! when driven by a `satbridge::solvers::Solver` handle. The generated tests
//! are `#[tokio::test]`s, so crates using these macros need `tokio` with the
//! `macros` and `rt` features, and `env_logger`, as dev-dependencies.
//!
//! ```ignore
//! #[cfg(test)]
//! mod test {
//!     satbridge_solvertests::basic_unittests!(super::MyEngine);
//!     satbridge_solvertests::interrupt_unittests!(super::MyEngine);
//! }
//! ```
//!
//! [`Engine`]: https://docs.rs/satbridge/latest/satbridge/solvers/trait.Engine.html

extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{parse_macro_input, Type};

mod unit;

/// Generates the basic handle tests for an engine type implementing `Default`
#[proc_macro]
pub fn basic_unittests(tokens: TokenStream) -> TokenStream {
    let engine = parse_macro_input!(tokens as Type);
    unit::basic(&engine).into()
}

/// Generates tests for interrupting long-running searches. The engine must
/// not solve a pigeonhole instance with 12 pigeons and 11 holes within a
/// fraction of a second.
#[proc_macro]
pub fn interrupt_unittests(tokens: TokenStream) -> TokenStream {
    let engine = parse_macro_input!(tokens as Type);
    unit::interrupt(&engine).into()
}
