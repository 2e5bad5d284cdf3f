//! Alpha-vector policies: storage, file parsing, evaluation, action
//! selection and the thread-safe handle that serves them.

mod evaluator;
mod export;
mod handle;
mod info;
mod parser;
mod selector;
mod store;

pub use evaluator::{check_dimension, utilities, utility_of};
pub use export::PolicyExport;
pub use handle::{PolicyHandle, ACTION_INDEX_OFFSET};
pub use info::{sha256_hex, PolicyInfo};
pub use selector::{select, select_observed, Selection};
pub use store::{AlphaVector, AlphaVectorRef, AlphaVectorSet};
