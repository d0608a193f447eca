//! `SeaORM` Entity for fuel_types reference table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::export_source::Exportable;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fuel_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Exportable for Entity {
    const TYPE_NAME: &'static str = "fuel_types";

    fn writable_columns() -> Vec<Column> {
        vec![Column::Name, Column::Code]
    }
}
