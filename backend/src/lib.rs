//! # PHT Services
//!
//! Backend services for the Proposal Handling Tool: proposal storage and
//! normalization, submission checks, astronomical name resolution with
//! coordinate conversion, attachment URL signing and OSD lookups.
//!
//! ## Architecture
//!
//! - [`services`]: coordinate conversions, the catalog resolver, the
//!   proposal normalizer and submission validation
//! - [`clients`]: SIMBAD/NED catalogs, the S3 presigner and the OSD client
//! - [`db`]: the proposal archive behind the repository pattern
//! - [`models`]: proposal and coordinate types
//! - [`config`]: `pht.toml` plus environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// PhtError carries a rich ErrorContext
#![allow(clippy::result_large_err)]

pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ErrorContext, PhtError, PhtResult};
