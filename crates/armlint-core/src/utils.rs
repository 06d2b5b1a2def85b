//! Utility functions for rule implementations.

pub mod arm;
pub mod paths;

// Re-export commonly used utilities for rule implementations
#[doc(inline)]
pub use arm::{
    collection_path_of, hierarchy_depth, is_extension_path, is_item_path, normalize_api_path,
    provider_namespace, resource_type,
};
#[doc(inline)]
pub use paths::normalize_path;
