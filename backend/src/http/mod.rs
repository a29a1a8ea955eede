//! HTTP server module for the PHT services.
//!
//! Exposes proposal storage, validation, name resolution, attachment URLs
//! and OSD lookups as a REST API under [`crate::config::API_PREFIX`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing                                        │
//! │  - PhtError → status code mapping                         │
//! │  - CORS, compression, tracing                             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Services (normalizer, resolver, validation, db/services) │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Collaborators                                            │
//! │  - ProposalRepository (local / ODA)                       │
//! │  - CatalogClient (SIMBAD / NED), ObjectStore, OsdClient   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
