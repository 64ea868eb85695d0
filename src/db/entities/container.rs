use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Base for the unix uid handed to a container: uid = 30000 + container id.
const UID_BASE: i32 = 30000;

const BYTES_PER_MB: i64 = 1024 * 1024;

/// A leased, resource-limited unit of compute and storage. Owned by exactly
/// one customer, placed on exactly one server and initialized from exactly
/// one distro. `memory` and `storage` are the container's own allocation in
/// MB, counted against the server's capacity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Raw multi-line blob of authorized SSH public keys, one per line.
    #[sea_orm(column_type = "Text")]
    pub ssh_keys_raw: String,
    pub distro_id: i32,
    pub server_id: i32,
    pub customer_id: i32,
    /// Memory allocation in MB.
    pub memory: i32,
    /// Storage allocation in MB.
    pub storage: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    #[sea_orm(unique)]
    pub uuid: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Customer,

    #[sea_orm(
        belongs_to = "super::server::Entity",
        from = "Column::ServerId",
        to = "super::server::Column::Id",
        on_delete = "Restrict",
        on_update = "Cascade"
    )]
    Server,

    #[sea_orm(
        belongs_to = "super::distro::Entity",
        from = "Column::DistroId",
        to = "super::distro::Column::Id",
        on_delete = "Restrict",
        on_update = "Cascade"
    )]
    Distro,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::server::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Server.def()
    }
}

impl Related<super::distro::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Distro.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unix uid the container runs under on its host.
    pub fn uid(&self) -> i32 {
        UID_BASE + self.id
    }

    /// The container name with every character outside `[A-Za-z0-9.-]`
    /// replaced by `-`. Character count is preserved; applying it twice
    /// changes nothing.
    pub fn hostname(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// IPv4 address inside 10.0.0.0/8, derived from the container id.
    /// The host part is (id + 1) masked to 24 bits; the +1 keeps 10.0.0.1
    /// free for the gateway, which holds as long as ids start at 1.
    pub fn ip(&self) -> Ipv4Addr {
        let host = (self.id as u32).wrapping_add(1) & 0x00ff_ffff;
        Ipv4Addr::from(0x0a00_0000 | host)
    }

    /// Authorized SSH keys, one entry per line of the raw blob. The lines
    /// are returned verbatim: no trimming, no carriage-return handling, no
    /// blank-line removal.
    pub fn ssh_keys(&self) -> Vec<String> {
        self.ssh_keys_raw.split('\n').map(str::to_owned).collect()
    }

    /// Storage quota in bytes.
    pub fn quota(&self) -> i64 {
        self.storage as i64 * BYTES_PER_MB
    }

    /// Memory limit in bytes, as consumed by the host's cgroup configuration.
    pub fn memory_limit_in_bytes(&self) -> i64 {
        self.memory as i64 * BYTES_PER_MB
    }

    /// Modification time as unix seconds. Provisioning compares this against
    /// the applied-config timestamp to detect stale containers.
    pub fn munix(&self) -> i64 {
        self.updated_at.timestamp()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uid(), self.name)
    }
}
