use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::customer;

/// Creates a new customer tied to the given user account. The account link is
/// unique; a second customer for the same user is rejected by the store.
pub async fn create_customer(
    db: &DatabaseConnection,
    user_id: i32,
    vat: &str,
) -> Result<customer::Model, DbErr> {
    let now = Utc::now();

    let new_customer = customer::ActiveModel {
        user_id: Set(user_id),
        vat: Set(vat.to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        uuid: Set(Uuid::new_v4()),
        ..Default::default() // id is assigned by the database
    };
    new_customer.insert(db).await
}

pub async fn get_customer_by_id(
    db: &DatabaseConnection,
    customer_id: i32,
) -> Result<Option<customer::Model>, DbErr> {
    customer::Entity::find_by_id(customer_id).one(db).await
}

/// Looks a customer up by its external token.
pub async fn get_customer_by_uuid(
    db: &DatabaseConnection,
    uuid: Uuid,
) -> Result<Option<customer::Model>, DbErr> {
    customer::Entity::find()
        .filter(customer::Column::Uuid.eq(uuid))
        .one(db)
        .await
}

pub async fn get_customer_by_user_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<customer::Model>, DbErr> {
    customer::Entity::find()
        .filter(customer::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>, DbErr> {
    customer::Entity::find()
        .order_by_asc(customer::Column::Id)
        .all(db)
        .await
}

/// Updates the customer's tax identifier. The uuid and creation timestamp are
/// never touched by updates.
pub async fn update_customer_vat(
    db: &DatabaseConnection,
    customer_id: i32,
    vat: &str,
) -> Result<customer::Model, DbErr> {
    let customer_model = customer::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Customer with id {customer_id} not found")))?;

    let mut active_model = customer_model.into_active_model();
    active_model.vat = Set(vat.to_owned());
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await
}

pub async fn delete_customer(db: &DatabaseConnection, customer_id: i32) -> Result<u64, DbErr> {
    let result = customer::Entity::delete_by_id(customer_id).exec(db).await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::setup_database;

    #[tokio::test]
    async fn test_create_and_fetch_customer() {
        let db = setup_database().await;

        let created = create_customer(&db, 42, "DE123456789").await.unwrap();
        assert_eq!(created.user_id, 42);
        assert_eq!(created.vat, "DE123456789");

        let by_id = get_customer_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);

        let by_uuid = get_customer_by_uuid(&db, created.uuid).await.unwrap().unwrap();
        assert_eq!(by_uuid.id, created.id);

        let by_user = get_customer_by_user_id(&db, 42).await.unwrap().unwrap();
        assert_eq!(by_user.id, created.id);
    }

    #[tokio::test]
    async fn test_one_customer_per_user_account() {
        let db = setup_database().await;

        create_customer(&db, 7, "VAT-A").await.unwrap();
        let duplicate = create_customer(&db, 7, "VAT-B").await;
        assert!(duplicate.is_err());

        // The failed insert must not have left a second row behind.
        assert_eq!(list_customers(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_uuid_and_created_at() {
        let db = setup_database().await;

        let created = create_customer(&db, 1, "VAT-OLD").await.unwrap();
        let updated = update_customer_vat(&db, created.id, "VAT-NEW").await.unwrap();

        assert_eq!(updated.vat, "VAT-NEW");
        assert_eq!(updated.uuid, created.uuid);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_customer() {
        let db = setup_database().await;

        let created = create_customer(&db, 1, "VAT").await.unwrap();
        assert_eq!(delete_customer(&db, created.id).await.unwrap(), 1);
        assert!(get_customer_by_id(&db, created.id).await.unwrap().is_none());
        assert_eq!(delete_customer(&db, created.id).await.unwrap(), 0);
    }
}
