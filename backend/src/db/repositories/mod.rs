//! Repository implementations.
//!
//! - [`local`]: in-memory backend for tests and development
//! - [`oda`]: Observation Data Archive REST backend (feature `oda-repo`)

pub mod local;
#[cfg(feature = "oda-repo")]
pub mod oda;

pub use local::LocalRepository;
#[cfg(feature = "oda-repo")]
pub use oda::OdaRepository;
