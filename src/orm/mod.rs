//! SeaORM entities, one file per table.

pub mod auth_tokens;
pub mod contributions;
pub mod help_resources;
pub mod help_types;
pub mod helps;
pub mod member_roles;
pub mod members;
pub mod resources;
pub mod roles;
