//! SeaORM Entity for contributions table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub help_id: i32,
    pub member_id: i32,
    pub help_type_id: i32,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::helps::Entity",
        from = "Column::HelpId",
        to = "super::helps::Column::Id"
    )]
    Help,
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
}

impl ActiveModelBehavior for ActiveModel {}
