//! `SeaORM` Entity for customers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::export_source::{BelongsTo, Exportable};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub broker_id: i32,
    pub branch_id: Option<i32>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brokers::Entity",
        from = "Column::BrokerId",
        to = "super::brokers::Column::Id"
    )]
    Broker,
    #[sea_orm(
        belongs_to = "super::branches::Entity",
        from = "Column::BranchId",
        to = "super::branches::Column::Id"
    )]
    Branch,
}

impl Related<super::brokers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broker.def()
    }
}

impl Related<super::branches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Exportable for Entity {
    const TYPE_NAME: &'static str = "customers";

    fn writable_columns() -> Vec<Column> {
        vec![
            Column::BrokerId,
            Column::BranchId,
            Column::Name,
            Column::Email,
            Column::Phone,
            Column::Status,
        ]
    }

    fn export_relations() -> Vec<BelongsTo> {
        vec![
            BelongsTo::new::<super::branches::Entity>("branch", || Relation::Branch.def()),
            BelongsTo::new::<super::brokers::Entity>("broker", || Relation::Broker.def()),
        ]
    }
}
