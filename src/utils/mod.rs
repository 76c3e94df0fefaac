//! The `utils` module collects the pieces shared across `popsub-core`:
//! the error types and the tracing setup used by embedding applications.

pub mod error;
pub mod logging;
