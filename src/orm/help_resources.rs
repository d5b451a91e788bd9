//! SeaORM Entity for help_resources table
//!
//! Comments and file attachments share this table. A row with a `resource_id`
//! is an attachment; a row without one is a comment.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "help_resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub help_id: i32,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub resource_id: Option<i32>,
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
        belongs_to = "super::resources::Entity",
        from = "Column::ResourceId",
        to = "super::resources::Column::Id"
    )]
    Resource,
}

impl Related<super::helps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Help.def()
    }
}

impl Related<super::resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
