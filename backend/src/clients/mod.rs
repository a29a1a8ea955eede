//! Clients for the services the PHT depends on: name-resolution catalogs,
//! the object store and the OSD. The ODA client lives with the other
//! repositories in [`crate::db`].

pub mod catalog;
pub mod http;
pub mod object_store;
pub mod osd;

pub use catalog::{CatalogClient, NedClient, SimbadClient};
pub use http::HttpClient;
pub use object_store::{ObjectStore, PresignedUrl, S3Presigner, S3Settings, SignedMethod};
pub use osd::OsdClient;
