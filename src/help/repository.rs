use super::{Contribution, Help, HelpError, HelpResource, HelpType};
use async_trait::async_trait;

/// Persistence for the help family.
///
/// `save_*` methods insert values without an id and update values with one.
/// The service layer is the only caller.
#[async_trait]
pub trait HelpRepository: Send + Sync {
    /// All helps, without their resources.
    async fn get_all(&self) -> Result<Vec<Help>, HelpError>;

    /// A single help, without its resources.
    async fn get(&self, id: i32) -> Result<Option<Help>, HelpError>;

    /// A single help with its resources loaded in creation order.
    async fn get_with_resources(&self, id: i32) -> Result<Option<Help>, HelpError>;

    /// Saves the help and inserts every resource in it that has no id yet.
    /// Existing resources are never modified or removed.
    async fn save(&self, help: Help) -> Result<Help, HelpError>;

    /// Resources of a help in creation order.
    async fn get_resources(&self, help_id: i32) -> Result<Vec<HelpResource>, HelpError>;

    async fn save_help_resource(&self, resource: HelpResource) -> Result<HelpResource, HelpError>;

    async fn get_help_types(&self) -> Result<Vec<HelpType>, HelpError>;

    async fn get_help_type(&self, id: i32) -> Result<Option<HelpType>, HelpError>;

    /// Help type with exactly this name.
    async fn get_help_type_by_name(&self, name: &str) -> Result<Option<HelpType>, HelpError>;

    async fn save_help_type(&self, help_type: HelpType) -> Result<HelpType, HelpError>;

    async fn get_contributions(&self, help_id: i32) -> Result<Vec<Contribution>, HelpError>;

    async fn save_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, HelpError>;
}
