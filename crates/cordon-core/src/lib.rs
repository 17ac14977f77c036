//! CORDON Core — Domain models, error taxonomy, and the Credential
//! Store trait surface shared across all crates.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{CordonError, CordonResult};
