//! The `services` module is the data-access API of the crate. It wraps all
//! query and mutation logic for the hosting panel entities so the outer
//! layers (web handlers, provisioning workers) never touch the schema or SQL
//! directly.
//!
//! One sub-module per entity. Container writes carry the per-server capacity
//! invariant; everything else is plain CRUD plus a few filtered queries.

pub mod container_service;
pub mod customer_service;
pub mod distro_service;
pub mod domain_service;
pub mod server_service;

pub use container_service::*;
pub use customer_service::*;
pub use distro_service::*;
pub use domain_service::*;
pub use server_service::*;
