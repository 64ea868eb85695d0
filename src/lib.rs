//! Backend data layer for the container hosting panel.
//!
//! Customers lease containers (lightweight VMs) placed on physical servers and
//! initialized from a distro image template. This crate owns the persistent
//! entities (customers, servers, distros, containers, domains), their derived
//! read-only views (capacity usage, hostnames, addresses, byte quotas) and the
//! per-server capacity invariant enforced on container writes.
//!
//! Container lifecycle (start/stop/migrate), SSH key deployment, DNS and the
//! web front-end live in other components and talk to this crate through the
//! `db::services` API.

pub mod config;
pub mod db;
