//! Postgres-backed [`HelpRepository`].

use super::{
    Contribution, Help, HelpError, HelpRepository, HelpResource, HelpResourceKind, HelpType,
    Resource,
};
use crate::orm::{contributions, help_resources, help_types, helps, resources};
use async_trait::async_trait;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait,
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

pub struct DbHelpRepository {
    db: DatabaseConnection,
}

impl DbHelpRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<helps::Model> for Help {
    fn from(m: helps::Model) -> Self {
        Help {
            id: Some(m.id),
            member_id: m.member_id,
            help_type_id: m.help_type_id,
            title: m.title,
            description: m.description,
            created_at: m.created_at,
            resources: Vec::new(),
        }
    }
}

impl From<resources::Model> for Resource {
    fn from(m: resources::Model) -> Self {
        Resource {
            id: Some(m.id),
            url: m.url,
            name: m.name,
            extension: m.extension,
            content_type: m.content_type,
            size: m.size,
            created_at: m.created_at,
        }
    }
}

impl From<help_types::Model> for HelpType {
    fn from(m: help_types::Model) -> Self {
        HelpType {
            id: Some(m.id),
            name: m.name,
        }
    }
}

impl From<contributions::Model> for Contribution {
    fn from(m: contributions::Model) -> Self {
        Contribution {
            id: Some(m.id),
            help_id: m.help_id,
            member_id: m.member_id,
            help_type_id: m.help_type_id,
            message: m.message,
            created_at: m.created_at,
        }
    }
}

/// Rows without a resource are comments.
fn help_resource_from_row(
    row: help_resources::Model,
    resource: Option<resources::Model>,
) -> HelpResource {
    let kind = match resource {
        Some(resource) => HelpResourceKind::Attachment {
            resource: resource.into(),
        },
        None => HelpResourceKind::Comment {
            comment: row.comment,
        },
    };

    HelpResource {
        id: Some(row.id),
        help_id: row.help_id,
        created_at: row.created_at,
        kind,
    }
}

/// Inserts a help resource row, and its resource row first for attachments.
async fn insert_help_resource<C>(
    conn: &C,
    mut help_resource: HelpResource,
) -> Result<HelpResource, DbErr>
where
    C: ConnectionTrait,
{
    let (comment, resource_id) = match &mut help_resource.kind {
        HelpResourceKind::Comment { comment } => (comment.to_owned(), None),
        HelpResourceKind::Attachment { resource } => {
            let resource_id = match resource.id {
                Some(id) => id,
                None => {
                    let model = resources::ActiveModel {
                        url: Set(resource.url.to_owned()),
                        name: Set(resource.name.to_owned()),
                        extension: Set(resource.extension.to_owned()),
                        content_type: Set(resource.content_type.to_owned()),
                        size: Set(resource.size),
                        created_at: Set(resource.created_at),
                        ..Default::default()
                    }
                    .insert(conn)
                    .await?;
                    resource.id = Some(model.id);
                    model.id
                }
            };
            (String::new(), Some(resource_id))
        }
    };

    let row = help_resources::ActiveModel {
        help_id: Set(help_resource.help_id),
        comment: Set(comment),
        resource_id: Set(resource_id),
        created_at: Set(help_resource.created_at),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    help_resource.id = Some(row.id);
    Ok(help_resource)
}

#[async_trait]
impl HelpRepository for DbHelpRepository {
    async fn get_all(&self) -> Result<Vec<Help>, HelpError> {
        let helps = helps::Entity::find()
            .order_by_asc(helps::Column::Id)
            .all(&self.db)
            .await?;

        Ok(helps.into_iter().map(Help::from).collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Help>, HelpError> {
        let help = helps::Entity::find_by_id(id).one(&self.db).await?;
        Ok(help.map(Help::from))
    }

    async fn get_with_resources(&self, id: i32) -> Result<Option<Help>, HelpError> {
        let mut help = match self.get(id).await? {
            Some(help) => help,
            None => return Ok(None),
        };
        help.resources = self.get_resources(id).await?;
        Ok(Some(help))
    }

    async fn save(&self, mut help: Help) -> Result<Help, HelpError> {
        let txn = self.db.begin().await?;

        let model = match help.id {
            None => {
                helps::ActiveModel {
                    member_id: Set(help.member_id),
                    help_type_id: Set(help.help_type_id),
                    title: Set(help.title.to_owned()),
                    description: Set(help.description.to_owned()),
                    created_at: Set(help.created_at),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
            Some(id) => {
                helps::ActiveModel {
                    id: Unchanged(id),
                    member_id: Set(help.member_id),
                    help_type_id: Set(help.help_type_id),
                    title: Set(help.title.to_owned()),
                    description: Set(help.description.to_owned()),
                    created_at: Unchanged(help.created_at),
                }
                .update(&txn)
                .await?
            }
        };
        help.id = Some(model.id);

        let mut saved = Vec::with_capacity(help.resources.len());
        for mut resource in std::mem::take(&mut help.resources) {
            if resource.id.is_none() {
                resource.help_id = model.id;
                resource = insert_help_resource(&txn, resource).await?;
            }
            saved.push(resource);
        }
        help.resources = saved;

        txn.commit().await?;
        Ok(help)
    }

    async fn get_resources(&self, help_id: i32) -> Result<Vec<HelpResource>, HelpError> {
        let rows = help_resources::Entity::find()
            .filter(help_resources::Column::HelpId.eq(help_id))
            .order_by_asc(help_resources::Column::CreatedAt)
            .order_by_asc(help_resources::Column::Id)
            .find_also_related(resources::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row, resource)| help_resource_from_row(row, resource))
            .collect())
    }

    async fn save_help_resource(&self, resource: HelpResource) -> Result<HelpResource, HelpError> {
        if resource.id.is_some() {
            // Resources are append-only.
            return Ok(resource);
        }
        Ok(insert_help_resource(&self.db, resource).await?)
    }

    async fn get_help_types(&self) -> Result<Vec<HelpType>, HelpError> {
        let types = help_types::Entity::find()
            .order_by_asc(help_types::Column::Name)
            .all(&self.db)
            .await?;
        Ok(types.into_iter().map(HelpType::from).collect())
    }

    async fn get_help_type(&self, id: i32) -> Result<Option<HelpType>, HelpError> {
        let help_type = help_types::Entity::find_by_id(id).one(&self.db).await?;
        Ok(help_type.map(HelpType::from))
    }

    async fn get_help_type_by_name(&self, name: &str) -> Result<Option<HelpType>, HelpError> {
        let help_type = help_types::Entity::find()
            .filter(help_types::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(help_type.map(HelpType::from))
    }

    async fn save_help_type(&self, help_type: HelpType) -> Result<HelpType, HelpError> {
        let model = match help_type.id {
            None => {
                help_types::ActiveModel {
                    name: Set(help_type.name),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
            Some(id) => {
                help_types::ActiveModel {
                    id: Unchanged(id),
                    name: Set(help_type.name),
                }
                .update(&self.db)
                .await?
            }
        };
        Ok(model.into())
    }

    async fn get_contributions(&self, help_id: i32) -> Result<Vec<Contribution>, HelpError> {
        let rows = contributions::Entity::find()
            .filter(contributions::Column::HelpId.eq(help_id))
            .order_by_asc(contributions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Contribution::from).collect())
    }

    async fn save_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, HelpError> {
        if contribution.id.is_some() {
            // Contributions are never edited.
            return Ok(contribution);
        }

        let model = contributions::ActiveModel {
            help_id: Set(contribution.help_id),
            member_id: Set(contribution.member_id),
            help_type_id: Set(contribution.help_type_id),
            message: Set(contribution.message),
            created_at: Set(contribution.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }
}
