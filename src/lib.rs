//! Salesforce metadata navigation core and local helper server.
//!
//! - **metadata**: path-shape classification of workspace files into
//!   metadata types and API names
//! - **bundle**: enumeration of a component bundle's files with semantic
//!   roles and sort priorities
//! - **picker**: presentation transform from enumerated files to the host's
//!   selection list
//! - **provenance**: last-modified records, the external-edit staleness
//!   check and the debounced refresh state machine
//! - **api**: remote metadata operations (Tooling/REST client, debug logs)
//! - **server**: the local HTTP surface consumed by the host's panel UI
//! - **host**: seams the host editor implements (open documents, bridge)
//! - **config** / **logging** / **clock** / **error**: ambient plumbing

pub mod api;
pub mod bundle;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod metadata;
pub mod picker;
pub mod provenance;
pub mod server;

pub use error::Error;
