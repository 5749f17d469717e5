pub mod access;
pub mod comparison;
pub mod deep_clone;
pub mod error;
pub mod flat;
pub mod path;
pub mod performance;
pub mod shadow_tree;
pub mod value;

pub(crate) mod walk;
