//! Expression-to-formula translation for resolved Tarn programs:
//! multi-state encoding over a tuple of state keys, symbol
//! memoization, automatic frame-condition synthesis, and the
//! quantifier-alternation graph used for decidability screening.

pub mod qa;
pub mod translator;

pub use qa::{decls_quantifier_alternation_graph, quantifier_alternation_graph, QaGraph};
pub use translator::{TranslateError, TranslateResult, Translator};
