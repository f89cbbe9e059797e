//! Utility functions and supporting infrastructure.
//!
//! Provides error handling and the fixed-capacity window used by the synchronizer.

pub mod errors;
pub mod window;
