//! Shared helpers used across the crate.

pub mod string_utils;

pub use string_utils::{safe_truncate_chars, truncate_with_ellipsis};
