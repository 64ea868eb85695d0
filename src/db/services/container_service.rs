use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::db::entities::{container, server};

#[derive(Debug, thiserror::Error)]
pub enum ContainerServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Server with id {0} not found")]
    ServerNotFound(i32),
    #[error("Container with id {0} not found")]
    ContainerNotFound(i32),
    #[error("the requested storage size is not available on the specified server")]
    InsufficientStorage,
    #[error("the requested memory size is not available on the specified server")]
    InsufficientMemory,
    #[error("allocations must not be negative: memory {memory} MB, storage {storage} MB")]
    NegativeAllocation { memory: i32, storage: i32 },
}

/// Allocations are unsigned quantities; a negative value would read as freed
/// capacity in the server sums and corrupt the accounting.
fn check_allocation_signs(memory: i32, storage: i32) -> Result<(), ContainerServiceError> {
    if memory < 0 || storage < 0 {
        return Err(ContainerServiceError::NegativeAllocation { memory, storage });
    }
    Ok(())
}

/// Fields required to create a container.
#[derive(Debug, Clone)]
pub struct NewContainer {
    pub name: String,
    pub customer_id: i32,
    pub server_id: i32,
    pub distro_id: i32,
    /// Memory allocation in MB.
    pub memory: i32,
    /// Storage allocation in MB.
    pub storage: i32,
    pub ssh_keys_raw: String,
}

/// Partial update of a container. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ContainerUpdate {
    pub name: Option<String>,
    pub server_id: Option<i32>,
    pub distro_id: Option<i32>,
    pub memory: Option<i32>,
    pub storage: Option<i32>,
    pub ssh_keys_raw: Option<String>,
}

#[derive(FromQueryResult)]
struct AllocationSums {
    storage: Option<i64>,
    memory: Option<i64>,
}

/// Sums the storage and memory allocations of all containers placed on the
/// given server, in MB. Returns (storage, memory), zero for an empty server.
pub(crate) async fn sum_allocations<C: ConnectionTrait>(
    conn: &C,
    server_id: i32,
) -> Result<(i64, i64), DbErr> {
    let sums = container::Entity::find()
        .select_only()
        .column_as(container::Column::Storage.sum(), "storage")
        .column_as(container::Column::Memory.sum(), "memory")
        .filter(container::Column::ServerId.eq(server_id))
        .into_model::<AllocationSums>()
        .one(conn)
        .await?;

    // SUM over an empty set is NULL, which must read as zero usage.
    match sums {
        Some(row) => Ok((row.storage.unwrap_or(0), row.memory.unwrap_or(0))),
        None => Ok((0, 0)),
    }
}

/// Verifies that the server can fit the requested allocation on top of what
/// its containers already hold. When re-checking an existing container that
/// stays on the same server, its prior allocation is excluded first so it is
/// not counted against itself.
async fn check_capacity<C: ConnectionTrait>(
    conn: &C,
    target: &server::Model,
    requested_storage: i32,
    requested_memory: i32,
    existing: Option<&container::Model>,
) -> Result<(), ContainerServiceError> {
    let (mut current_storage, mut current_memory) = sum_allocations(conn, target.id).await?;

    if let Some(orig) = existing {
        if orig.server_id == target.id {
            current_storage -= orig.storage as i64;
            current_memory -= orig.memory as i64;
        }
    }

    debug!(
        server_id = target.id,
        current_storage, current_memory, requested_storage, requested_memory,
        "Checking server capacity"
    );

    if current_storage + requested_storage as i64 > target.storage as i64 {
        return Err(ContainerServiceError::InsufficientStorage);
    }
    if current_memory + requested_memory as i64 > target.memory as i64 {
        return Err(ContainerServiceError::InsufficientMemory);
    }
    Ok(())
}

/// Creates a container, enforcing the server capacity invariant.
///
/// The target server row is read with an exclusive lock inside the
/// transaction, so concurrent writers against the same server serialize and
/// cannot both pass the check and over-allocate it.
pub async fn create_container(
    db: &DatabaseConnection,
    params: NewContainer,
) -> Result<container::Model, ContainerServiceError> {
    check_allocation_signs(params.memory, params.storage)?;

    let txn = db.begin().await?;

    let target = server::Entity::find_by_id(params.server_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(ContainerServiceError::ServerNotFound(params.server_id))?;

    check_capacity(&txn, &target, params.storage, params.memory, None).await?;

    let now = Utc::now();
    let new_container = container::ActiveModel {
        name: Set(params.name),
        ssh_keys_raw: Set(params.ssh_keys_raw),
        distro_id: Set(params.distro_id),
        server_id: Set(params.server_id),
        customer_id: Set(params.customer_id),
        memory: Set(params.memory),
        storage: Set(params.storage),
        created_at: Set(now),
        updated_at: Set(now),
        uuid: Set(Uuid::new_v4()),
        ..Default::default() // id is assigned by the database
    };

    let created = new_container.insert(&txn).await?;
    txn.commit().await?;
    Ok(created)
}

/// Applies a partial update, re-running the capacity check against the target
/// server. Moving to another server checks the full allocation against the
/// new server; staying put only checks the delta.
pub async fn update_container(
    db: &DatabaseConnection,
    container_id: i32,
    update: ContainerUpdate,
) -> Result<container::Model, ContainerServiceError> {
    let txn = db.begin().await?;

    let existing = container::Entity::find_by_id(container_id)
        .one(&txn)
        .await?
        .ok_or(ContainerServiceError::ContainerNotFound(container_id))?;

    let target_server_id = update.server_id.unwrap_or(existing.server_id);
    let target = server::Entity::find_by_id(target_server_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(ContainerServiceError::ServerNotFound(target_server_id))?;

    let requested_storage = update.storage.unwrap_or(existing.storage);
    let requested_memory = update.memory.unwrap_or(existing.memory);
    check_allocation_signs(requested_memory, requested_storage)?;
    check_capacity(&txn, &target, requested_storage, requested_memory, Some(&existing)).await?;

    let mut active_model = existing.into_active_model();
    if let Some(name) = update.name {
        active_model.name = Set(name);
    }
    if let Some(distro_id) = update.distro_id {
        active_model.distro_id = Set(distro_id);
    }
    if let Some(ssh_keys_raw) = update.ssh_keys_raw {
        active_model.ssh_keys_raw = Set(ssh_keys_raw);
    }
    active_model.server_id = Set(target_server_id);
    active_model.memory = Set(requested_memory);
    active_model.storage = Set(requested_storage);
    active_model.updated_at = Set(Utc::now());

    let updated = active_model.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

pub async fn get_container_by_id(
    db: &DatabaseConnection,
    container_id: i32,
) -> Result<Option<container::Model>, DbErr> {
    container::Entity::find_by_id(container_id).one(db).await
}

/// Looks a container up by its external token.
pub async fn get_container_by_uuid(
    db: &DatabaseConnection,
    uuid: Uuid,
) -> Result<Option<container::Model>, DbErr> {
    container::Entity::find()
        .filter(container::Column::Uuid.eq(uuid))
        .one(db)
        .await
}

pub async fn list_containers(db: &DatabaseConnection) -> Result<Vec<container::Model>, DbErr> {
    container::Entity::find()
        .order_by_asc(container::Column::Id)
        .all(db)
        .await
}

/// All containers placed on the given server.
pub async fn get_containers_by_server_id(
    db: &DatabaseConnection,
    server_id: i32,
) -> Result<Vec<container::Model>, DbErr> {
    container::Entity::find()
        .filter(container::Column::ServerId.eq(server_id))
        .order_by_asc(container::Column::Id)
        .all(db)
        .await
}

/// All containers owned by the given customer.
pub async fn get_containers_by_customer_id(
    db: &DatabaseConnection,
    customer_id: i32,
) -> Result<Vec<container::Model>, DbErr> {
    container::Entity::find()
        .filter(container::Column::CustomerId.eq(customer_id))
        .order_by_asc(container::Column::Id)
        .all(db)
        .await
}

pub async fn delete_container(db: &DatabaseConnection, container_id: i32) -> Result<u64, DbErr> {
    let result = container::Entity::delete_by_id(container_id).exec(db).await?;
    Ok(result.rows_affected)
}
