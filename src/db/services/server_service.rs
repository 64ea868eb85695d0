use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::entities::server;
use crate::db::services::container_service;

#[derive(Debug, thiserror::Error)]
pub enum ServerServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("server capacities must not be negative: memory {memory} MB, storage {storage} MB")]
    NegativeCapacity { memory: i32, storage: i32 },
}

/// Capacity accounting for one server, all values in MB. `used` is the sum
/// over the containers placed on the server and is zero when there are none;
/// `free` is total minus used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerResourceUsage {
    pub used_memory: i64,
    pub used_storage: i64,
    pub free_memory: i64,
    pub free_storage: i64,
}

pub async fn create_server(
    db: &DatabaseConnection,
    name: &str,
    address: &str,
    hd: &str,
    memory: i32,
    storage: i32,
) -> Result<server::Model, ServerServiceError> {
    if memory < 0 || storage < 0 {
        return Err(ServerServiceError::NegativeCapacity { memory, storage });
    }

    let now = Utc::now();

    let new_server = server::ActiveModel {
        name: Set(name.to_owned()),
        address: Set(address.to_owned()),
        hd: Set(hd.to_owned()),
        memory: Set(memory),
        storage: Set(storage),
        created_at: Set(now),
        updated_at: Set(now),
        uuid: Set(Uuid::new_v4()),
        ..Default::default() // id is assigned by the database
    };
    Ok(new_server.insert(db).await?)
}

pub async fn get_server_by_id(
    db: &DatabaseConnection,
    server_id: i32,
) -> Result<Option<server::Model>, DbErr> {
    server::Entity::find_by_id(server_id).one(db).await
}

/// Looks a server up by its external token.
pub async fn get_server_by_uuid(
    db: &DatabaseConnection,
    uuid: Uuid,
) -> Result<Option<server::Model>, DbErr> {
    server::Entity::find()
        .filter(server::Column::Uuid.eq(uuid))
        .one(db)
        .await
}

pub async fn list_servers(db: &DatabaseConnection) -> Result<Vec<server::Model>, DbErr> {
    server::Entity::find()
        .order_by_asc(server::Column::Id)
        .all(db)
        .await
}

/// Updates a server's address and capacity. Shrinking capacity below the
/// current allocation is not rejected here; new container writes simply fail
/// the capacity check until usage drops back under the new limits.
pub async fn update_server(
    db: &DatabaseConnection,
    server_id: i32,
    address: Option<String>,
    memory: Option<i32>,
    storage: Option<i32>,
) -> Result<server::Model, ServerServiceError> {
    if memory.is_some_and(|m| m < 0) || storage.is_some_and(|s| s < 0) {
        return Err(ServerServiceError::NegativeCapacity {
            memory: memory.unwrap_or(0),
            storage: storage.unwrap_or(0),
        });
    }

    let server_model = server::Entity::find_by_id(server_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Server with id {server_id} not found")))?;

    let mut active_model = server_model.into_active_model();
    if let Some(address) = address {
        active_model.address = Set(address);
    }
    if let Some(memory) = memory {
        active_model.memory = Set(memory);
    }
    if let Some(storage) = storage {
        active_model.storage = Set(storage);
    }
    active_model.updated_at = Set(Utc::now());
    Ok(active_model.update(db).await?)
}

pub async fn delete_server(db: &DatabaseConnection, server_id: i32) -> Result<u64, DbErr> {
    let result = server::Entity::delete_by_id(server_id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Computes the server's used and free memory/storage from its containers'
/// allocations.
pub async fn get_resource_usage(
    db: &DatabaseConnection,
    server_id: i32,
) -> Result<ServerResourceUsage, DbErr> {
    let server_model = server::Entity::find_by_id(server_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Server with id {server_id} not found")))?;

    let (used_storage, used_memory) = container_service::sum_allocations(db, server_id).await?;

    Ok(ServerResourceUsage {
        used_memory,
        used_storage,
        free_memory: server_model.memory as i64 - used_memory,
        free_storage: server_model.storage as i64 - used_storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::{container_service, customer_service, distro_service};
    use crate::db::test_utils::setup_database;

    #[tokio::test]
    async fn test_usage_is_zero_for_empty_server() {
        let db = setup_database().await;
        let created = create_server(&db, "node1", "192.168.1.10", "hd-0001", 8192, 500_000)
            .await
            .unwrap();

        let usage = get_resource_usage(&db, created.id).await.unwrap();
        assert_eq!(
            usage,
            ServerResourceUsage {
                used_memory: 0,
                used_storage: 0,
                free_memory: 8192,
                free_storage: 500_000,
            }
        );
    }

    #[tokio::test]
    async fn test_usage_tracks_container_allocations() {
        let db = setup_database().await;
        let server = create_server(&db, "node1", "192.168.1.10", "hd-0001", 8192, 500_000)
            .await
            .unwrap();
        let customer = customer_service::create_customer(&db, 1, "VAT").await.unwrap();
        let distro = distro_service::create_distro(&db, "debian-12", "/srv/images/debian-12")
            .await
            .unwrap();

        for storage in [10_000, 20_000] {
            container_service::create_container(
                &db,
                container_service::NewContainer {
                    name: "c".to_owned(),
                    customer_id: customer.id,
                    server_id: server.id,
                    distro_id: distro.id,
                    memory: 1024,
                    storage,
                    ssh_keys_raw: String::new(),
                },
            )
            .await
            .unwrap();
        }

        let usage = get_resource_usage(&db, server.id).await.unwrap();
        assert_eq!(usage.used_memory, 2048);
        assert_eq!(usage.used_storage, 30_000);
        assert_eq!(usage.free_memory, 8192 - 2048);
        assert_eq!(usage.free_storage, 500_000 - 30_000);
    }

    #[tokio::test]
    async fn test_usage_for_unknown_server() {
        let db = setup_database().await;
        assert!(get_resource_usage(&db, 999).await.is_err());
    }

    #[tokio::test]
    async fn test_unique_name_address_and_hd() {
        let db = setup_database().await;
        create_server(&db, "node1", "192.168.1.10", "hd-0001", 1024, 1000)
            .await
            .unwrap();

        // Same name
        assert!(create_server(&db, "node1", "192.168.1.11", "hd-0002", 1024, 1000)
            .await
            .is_err());
        // Same address
        assert!(create_server(&db, "node2", "192.168.1.10", "hd-0002", 1024, 1000)
            .await
            .is_err());
        // Same hardware id
        assert!(create_server(&db, "node2", "192.168.1.11", "hd-0001", 1024, 1000)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rejects_negative_capacities() {
        let db = setup_database().await;

        let err = create_server(&db, "node1", "192.168.1.10", "hd-0001", -1, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerServiceError::NegativeCapacity { .. }));
        assert!(list_servers(&db).await.unwrap().is_empty());

        let created = create_server(&db, "node1", "192.168.1.10", "hd-0001", 1024, 1000)
            .await
            .unwrap();
        let err = update_server(&db, created.id, None, None, Some(-5)).await.unwrap_err();
        assert!(matches!(err, ServerServiceError::NegativeCapacity { .. }));

        let unchanged = get_server_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(unchanged.storage, 1000);
    }

    #[tokio::test]
    async fn test_update_server_capacity() {
        let db = setup_database().await;
        let created = create_server(&db, "node1", "192.168.1.10", "hd-0001", 1024, 1000)
            .await
            .unwrap();

        let updated = update_server(&db, created.id, None, Some(2048), None).await.unwrap();
        assert_eq!(updated.memory, 2048);
        assert_eq!(updated.storage, 1000);
        assert_eq!(updated.uuid, created.uuid);
    }

    #[tokio::test]
    async fn test_display_renders_name_and_address() {
        let db = setup_database().await;
        let created = create_server(&db, "node1", "192.168.1.10", "hd-0001", 1024, 1000)
            .await
            .unwrap();
        assert_eq!(created.to_string(), "node1 - 192.168.1.10");
    }
}
