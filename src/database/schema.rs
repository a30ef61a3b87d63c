//! Table creation straight from the entity definitions.
//!
//! Tables are listed parents first so foreign keys always point at an existing
//! table; dropping walks the same list backwards.

use sea_orm::{
    ConnectionTrait, DbErr, EntityName, EntityTrait, QueryFilter, Schema,
    sea_query::{Expr, Table},
};
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;

use super::models::{
    chosen_material, chosen_service, client, executor, invoice, material_pl, materials_photo,
    payment_order, request, service_pl, user, work_group,
};

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    log::debug!("ensured table {}", entity.table_name());
    Ok(())
}

async fn drop_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let stmt = Table::drop().table(entity).if_exists().to_owned();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    log::info!("dropped table {}", entity.table_name());
    Ok(())
}

/// Creates every table that does not exist yet.
pub async fn create_all<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, client::Entity).await?;
    create_table(db, &schema, service_pl::Entity).await?;
    create_table(db, &schema, material_pl::Entity).await?;
    create_table(db, &schema, executor::Entity).await?;
    create_table(db, &schema, request::Entity).await?;
    create_table(db, &schema, chosen_service::Entity).await?;
    create_table(db, &schema, chosen_material::Entity).await?;
    create_table(db, &schema, work_group::Entity).await?;
    create_table(db, &schema, invoice::Entity).await?;
    create_table(db, &schema, payment_order::Entity).await?;
    create_table(db, &schema, materials_photo::Entity).await?;

    Ok(())
}

/// Drops every table, dependents first.
pub async fn drop_all<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    drop_table(db, materials_photo::Entity).await?;
    drop_table(db, payment_order::Entity).await?;
    drop_table(db, invoice::Entity).await?;
    drop_table(db, work_group::Entity).await?;
    drop_table(db, chosen_material::Entity).await?;
    drop_table(db, chosen_service::Entity).await?;
    drop_table(db, request::Entity).await?;
    drop_table(db, executor::Entity).await?;
    drop_table(db, material_pl::Entity).await?;
    drop_table(db, service_pl::Entity).await?;
    drop_table(db, client::Entity).await?;
    drop_table(db, user::Entity).await?;
    Ok(())
}

/// Table names in creation order.
pub fn table_names() -> Vec<String> {
    [
        user::Entity.table_name(),
        client::Entity.table_name(),
        service_pl::Entity.table_name(),
        material_pl::Entity.table_name(),
        executor::Entity.table_name(),
        request::Entity.table_name(),
        chosen_service::Entity.table_name(),
        chosen_material::Entity.table_name(),
        work_group::Entity.table_name(),
        invoice::Entity.table_name(),
        payment_order::Entity.table_name(),
        materials_photo::Entity.table_name(),
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

async fn rows_of<E, C>(db: &C, filter: Option<&str>) -> Result<Vec<Value>, AppError>
where
    E: EntityTrait,
    E::Model: Serialize,
    C: ConnectionTrait,
{
    let mut select = E::find();
    if let Some(condition) = filter {
        select = select.filter(Expr::cust(condition.to_string()));
    }
    let mut rows = Vec::new();
    for model in select.all(db).await? {
        rows.push(serde_json::to_value(&model)?);
    }
    Ok(rows)
}

/// Rows of `table` as JSON, decoded through the entity so every column keeps
/// its type. `filter` is a raw SQL condition for the WHERE clause.
pub async fn dump_table<C: ConnectionTrait>(
    db: &C,
    table: &str,
    filter: Option<&str>,
) -> Result<Vec<Value>, AppError> {
    macro_rules! dump {
        ($($module:ident),+ $(,)?) => {
            $(
                if table == $module::Entity.table_name() {
                    return rows_of::<$module::Entity, C>(db, filter).await;
                }
            )+
        };
    }
    dump!(
        user,
        client,
        service_pl,
        material_pl,
        executor,
        request,
        chosen_service,
        chosen_material,
        work_group,
        invoice,
        payment_order,
        materials_photo,
    );
    Err(AppError::InvalidInput(format!(
        "Unknown table '{}'. Known tables: {}",
        table,
        table_names().join(", ")
    )))
}
