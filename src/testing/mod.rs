//! Testing infrastructure for taskstream.
//!
//! This module provides mocks and fixtures for testing the store, the
//! offline queue and the capture flow without real external services.
//!
//! # Architecture
//!
//! - **Mocks**: Test doubles for [`RemoteTaskStore`](crate::store::RemoteTaskStore),
//!   [`ExtractionService`](crate::capture::ExtractionService) and
//!   [`IdeaAnalysisService`](crate::capture::IdeaAnalysisService)
//! - **Fixtures**: Stores wired to mocks and sample data (test-only)
//!
//! # Example
//!
//! ```rust,ignore
//! use taskstream::testing::{MockRemoteStore, RemoteOp};
//!
//! let remote = MockRemoteStore::new()
//!     .with_failure(RemoteOp::Delete, RemoteError::Network("timeout".into()));
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
