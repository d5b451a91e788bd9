//! SeaORM Entity for helps table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "helps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub help_type_id: Option<i32>,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Member,
    #[sea_orm(
        belongs_to = "super::help_types::Entity",
        from = "Column::HelpTypeId",
        to = "super::help_types::Column::Id"
    )]
    HelpType,
    #[sea_orm(has_many = "super::help_resources::Entity")]
    HelpResource,
}

impl Related<super::help_resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HelpResource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
