//! Cleaning transformations for extracted record sets
//!
//! [`Cleaner`] applies, in order: exact-duplicate row removal,
//! column-name normalization, and missing-value substitution.

mod cleaner;
mod column_names;

pub use cleaner::{Cleaner, MISSING_SENTINEL};
pub use column_names::{CollisionPolicy, normalize_column_name, normalize_columns};
