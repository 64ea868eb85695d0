//! SeaORM entities for the hosting panel schema.
//!
//! Every entity carries a sequential primary key, explicit creation and
//! modification timestamps, and a random `uuid` assigned once at creation.
//! The `uuid` is the externally stable reference; the sequential `id` is an
//! internal engine detail and must not be exposed as the primary external key.

pub mod container;
pub mod customer;
pub mod distro;
pub mod domain;
pub mod server;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::customer::Entity as Customer;
    pub use super::customer::Model as CustomerModel;
    pub use super::customer::ActiveModel as CustomerActiveModel;
    pub use super::customer::Column as CustomerColumn;

    pub use super::server::Entity as Server;
    pub use super::server::Model as ServerModel;
    pub use super::server::ActiveModel as ServerActiveModel;
    pub use super::server::Column as ServerColumn;

    pub use super::distro::Entity as Distro;
    pub use super::distro::Model as DistroModel;
    pub use super::distro::ActiveModel as DistroActiveModel;
    pub use super::distro::Column as DistroColumn;

    pub use super::container::Entity as Container;
    pub use super::container::Model as ContainerModel;
    pub use super::container::ActiveModel as ContainerActiveModel;
    pub use super::container::Column as ContainerColumn;

    pub use super::domain::Entity as Domain;
    pub use super::domain::Model as DomainModel;
    pub use super::domain::ActiveModel as DomainActiveModel;
    pub use super::domain::Column as DomainColumn;
}
