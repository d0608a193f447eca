//! `SeaORM` Entity for branches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::export_source::{BelongsTo, Exportable};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "branches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub broker_id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub is_head_office: bool,
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
    #[sea_orm(has_many = "super::customers::Entity")]
    Customers,
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::brokers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broker.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Exportable for Entity {
    const TYPE_NAME: &'static str = "branches";

    fn writable_columns() -> Vec<Column> {
        vec![
            Column::BrokerId,
            Column::Name,
            Column::Code,
            Column::IsHeadOffice,
        ]
    }

    fn export_relations() -> Vec<BelongsTo> {
        vec![BelongsTo::new::<super::brokers::Entity>("broker", || {
            Relation::Broker.def()
        })]
    }
}
