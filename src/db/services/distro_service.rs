use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::distro;

pub async fn create_distro(
    db: &DatabaseConnection,
    name: &str,
    path: &str,
) -> Result<distro::Model, DbErr> {
    let now = Utc::now();

    let new_distro = distro::ActiveModel {
        name: Set(name.to_owned()),
        path: Set(path.to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        uuid: Set(Uuid::new_v4()),
        ..Default::default() // id is assigned by the database
    };
    new_distro.insert(db).await
}

pub async fn get_distro_by_id(
    db: &DatabaseConnection,
    distro_id: i32,
) -> Result<Option<distro::Model>, DbErr> {
    distro::Entity::find_by_id(distro_id).one(db).await
}

/// Looks a distro up by its external token.
pub async fn get_distro_by_uuid(
    db: &DatabaseConnection,
    uuid: Uuid,
) -> Result<Option<distro::Model>, DbErr> {
    distro::Entity::find()
        .filter(distro::Column::Uuid.eq(uuid))
        .one(db)
        .await
}

pub async fn list_distros(db: &DatabaseConnection) -> Result<Vec<distro::Model>, DbErr> {
    distro::Entity::find()
        .order_by_asc(distro::Column::Name)
        .all(db)
        .await
}

pub async fn update_distro(
    db: &DatabaseConnection,
    distro_id: i32,
    name: Option<String>,
    path: Option<String>,
) -> Result<distro::Model, DbErr> {
    let distro_model = distro::Entity::find_by_id(distro_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Distro with id {distro_id} not found")))?;

    let mut active_model = distro_model.into_active_model();
    if let Some(name) = name {
        active_model.name = Set(name);
    }
    if let Some(path) = path {
        active_model.path = Set(path);
    }
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await
}

pub async fn delete_distro(db: &DatabaseConnection, distro_id: i32) -> Result<u64, DbErr> {
    let result = distro::Entity::delete_by_id(distro_id).exec(db).await?;
    Ok(result.rows_affected)
}
