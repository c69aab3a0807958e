//! Provider error types.
//!
//! The enum itself is defined in `studycoach-core` so hosts can downcast
//! provider failures without depending on this crate.

pub use studycoach_core::error::ProviderError;
