use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::domain;

pub async fn create_domain(
    db: &DatabaseConnection,
    customer_id: i32,
    name: &str,
) -> Result<domain::Model, DbErr> {
    let now = Utc::now();

    let new_domain = domain::ActiveModel {
        name: Set(name.to_owned()),
        customer_id: Set(customer_id),
        created_at: Set(now),
        updated_at: Set(now),
        uuid: Set(Uuid::new_v4()),
        ..Default::default() // id is assigned by the database
    };
    new_domain.insert(db).await
}

pub async fn get_domain_by_id(
    db: &DatabaseConnection,
    domain_id: i32,
) -> Result<Option<domain::Model>, DbErr> {
    domain::Entity::find_by_id(domain_id).one(db).await
}

/// All domains owned by the given customer.
pub async fn get_domains_by_customer_id(
    db: &DatabaseConnection,
    customer_id: i32,
) -> Result<Vec<domain::Model>, DbErr> {
    domain::Entity::find()
        .filter(domain::Column::CustomerId.eq(customer_id))
        .order_by_asc(domain::Column::Name)
        .all(db)
        .await
}

pub async fn rename_domain(
    db: &DatabaseConnection,
    domain_id: i32,
    name: &str,
) -> Result<domain::Model, DbErr> {
    let domain_model = domain::Entity::find_by_id(domain_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Domain with id {domain_id} not found")))?;

    let mut active_model = domain_model.into_active_model();
    active_model.name = Set(name.to_owned());
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await
}

pub async fn delete_domain(db: &DatabaseConnection, domain_id: i32) -> Result<u64, DbErr> {
    let result = domain::Entity::delete_by_id(domain_id).exec(db).await?;
    Ok(result.rows_affected)
}
