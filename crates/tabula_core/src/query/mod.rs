//! Predicate queries.
//!
//! A [`Where`] is a conjunction of per-field clauses. It compiles into an
//! [`Expr`] tree evaluated by a small interpreter, and [`QueryPlan`] decides
//! whether a declared index can answer it directly.

mod clause;
mod engine;
mod expr;

pub use clause::{Clause, Predicate, Where};
pub use engine::{scan, QueryPlan};
pub use expr::Expr;
