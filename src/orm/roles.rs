//! SeaORM Entity for roles table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Model {
    /// Parses the stored name into a [`crate::role::Role`].
    pub fn role(&self) -> Result<crate::role::Role, crate::role::UnknownRole> {
        self.name.parse()
    }
}

impl ActiveModelBehavior for ActiveModel {}
