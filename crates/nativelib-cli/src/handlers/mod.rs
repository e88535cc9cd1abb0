//! Command handlers.
//!
//! Handlers are thin wrappers that:
//! 1. Turn CLI arguments into a loader configuration
//! 2. Call into `nativelib-core`
//! 3. Format the result as text or JSON
//!
//! Formatting lives in `render` functions so it can be tested without
//! capturing stdout.

pub mod extract;
pub mod load;
pub mod platform;
pub mod tree;
