//! In-memory [`HelpRepository`] for running without a database.
//!
//! Every entity lives in its own map keyed by id; children refer to parents by
//! id only. The lock is never held across an await.

use super::{
    Contribution, Help, HelpError, HelpRepository, HelpResource, HelpResourceKind, HelpType,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
struct Arena {
    helps: BTreeMap<i32, Help>,
    help_resources: BTreeMap<i32, HelpResource>,
    help_types: BTreeMap<i32, HelpType>,
    contributions: BTreeMap<i32, Contribution>,
    next_id: i32,
}

impl Arena {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_help_resource(&mut self, mut resource: HelpResource) -> HelpResource {
        if let HelpResourceKind::Attachment { resource: file } = &mut resource.kind {
            if file.id.is_none() {
                file.id = Some(self.next_id());
            }
        }
        let id = self.next_id();
        resource.id = Some(id);
        self.help_resources.insert(id, resource.clone());
        resource
    }

    fn resources_of(&self, help_id: i32) -> Vec<HelpResource> {
        let mut resources: Vec<HelpResource> = self
            .help_resources
            .values()
            .filter(|r| r.help_id == help_id)
            .cloned()
            .collect();
        resources.sort_by_key(|r| (r.created_at, r.id));
        resources
    }
}

#[derive(Default)]
pub struct MemoryHelpRepository {
    arena: RwLock<Arena>,
}

impl MemoryHelpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HelpRepository for MemoryHelpRepository {
    async fn get_all(&self) -> Result<Vec<Help>, HelpError> {
        Ok(self.read().helps.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Help>, HelpError> {
        Ok(self.read().helps.get(&id).cloned())
    }

    async fn get_with_resources(&self, id: i32) -> Result<Option<Help>, HelpError> {
        let arena = self.read();
        Ok(arena.helps.get(&id).cloned().map(|mut help| {
            help.resources = arena.resources_of(id);
            help
        }))
    }

    async fn save(&self, mut help: Help) -> Result<Help, HelpError> {
        let mut arena = self.write();

        let id = match help.id {
            Some(id) if arena.helps.contains_key(&id) => id,
            Some(_) => return Err(HelpError::NotFound("The help doesn't exist.")),
            None => arena.next_id(),
        };
        help.id = Some(id);

        let mut saved = Vec::with_capacity(help.resources.len());
        for mut resource in std::mem::take(&mut help.resources) {
            if resource.id.is_none() {
                resource.help_id = id;
                resource = arena.insert_help_resource(resource);
            }
            saved.push(resource);
        }

        arena.helps.insert(
            id,
            Help {
                resources: Vec::new(),
                ..help.clone()
            },
        );
        help.resources = saved;
        Ok(help)
    }

    async fn get_resources(&self, help_id: i32) -> Result<Vec<HelpResource>, HelpError> {
        Ok(self.read().resources_of(help_id))
    }

    async fn save_help_resource(&self, resource: HelpResource) -> Result<HelpResource, HelpError> {
        if resource.id.is_some() {
            return Ok(resource);
        }
        Ok(self.write().insert_help_resource(resource))
    }

    async fn get_help_types(&self) -> Result<Vec<HelpType>, HelpError> {
        let mut types: Vec<HelpType> = self.read().help_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn get_help_type(&self, id: i32) -> Result<Option<HelpType>, HelpError> {
        Ok(self.read().help_types.get(&id).cloned())
    }

    async fn get_help_type_by_name(&self, name: &str) -> Result<Option<HelpType>, HelpError> {
        Ok(self
            .read()
            .help_types
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn save_help_type(&self, mut help_type: HelpType) -> Result<HelpType, HelpError> {
        let mut arena = self.write();
        let id = match help_type.id {
            Some(id) => id,
            None => arena.next_id(),
        };
        help_type.id = Some(id);
        arena.help_types.insert(id, help_type.clone());
        Ok(help_type)
    }

    async fn get_contributions(&self, help_id: i32) -> Result<Vec<Contribution>, HelpError> {
        Ok(self
            .read()
            .contributions
            .values()
            .filter(|c| c.help_id == help_id)
            .cloned()
            .collect())
    }

    async fn save_contribution(
        &self,
        mut contribution: Contribution,
    ) -> Result<Contribution, HelpError> {
        if contribution.id.is_some() {
            return Ok(contribution);
        }
        let mut arena = self.write();
        let id = arena.next_id();
        contribution.id = Some(id);
        arena.contributions.insert(id, contribution.clone());
        Ok(contribution)
    }
}
