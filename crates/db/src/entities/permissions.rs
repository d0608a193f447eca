//! `SeaORM` Entity for permissions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::export_source::{BelongsTo, Exportable};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub role_id: i32,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_delete = "Cascade"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Exportable for Entity {
    const TYPE_NAME: &'static str = "permissions";

    fn writable_columns() -> Vec<Column> {
        vec![Column::RoleId, Column::Name]
    }

    fn export_relations() -> Vec<BelongsTo> {
        vec![BelongsTo::new::<super::roles::Entity>("role", || Relation::Role.def())]
    }
}
