//! Name resolution, scoping, and sort inference for Tarn programs.
//!
//! [`resolve`] must run over a freshly parsed [`tarn_syntax::Program`]
//! before translation: it validates names and sorts, fills in omitted
//! bound-variable sorts, and rewrites `old(...)` in two-state contexts
//! into the internal new-state marking. [`Scope`] is the shared name
//! resolution environment the translator binds values against.

pub mod error;
pub mod resolve;
pub mod scope;

pub use error::{ResolveError, ResolveResult};
pub use resolve::resolve;
pub use scope::{NameRef, SavedStack, Scope, StateRef};
