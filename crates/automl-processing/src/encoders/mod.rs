//! Categorical encoders.
//!
//! Both encoders order categories with plain string ordering, so encodings
//! are reproducible across runs regardless of row order.

mod label;
mod one_hot;

pub use label::LabelEncoder;
pub use one_hot::OneHotEncoder;
