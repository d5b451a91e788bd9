use super::{
    Contribution, Help, HelpDraft, HelpError, HelpRepository, HelpResource, HelpType,
    UploadFailure,
};
use crate::file::{get_resource, unique_key, UploadedFile};
use crate::session::Caller;
use crate::storage::StorageBackend;
use chrono::Utc;
use std::sync::Arc;

/// A contribution as submitted; the contributor is always the caller.
#[derive(Clone, Debug)]
pub struct ContributionDraft {
    pub help_id: i32,
    pub help_type_id: i32,
    pub message: String,
}

/// Orchestrates every write to the help family.
pub struct HelpService {
    repo: Arc<dyn HelpRepository>,
    store: Arc<dyn StorageBackend>,
}

impl HelpService {
    pub fn new(repo: Arc<dyn HelpRepository>, store: Arc<dyn StorageBackend>) -> Self {
        Self { repo, store }
    }

    pub async fn get_all(&self) -> Result<Vec<Help>, HelpError> {
        self.repo.get_all().await
    }

    pub async fn get_help_with_resources(&self, id: i32) -> Result<Option<Help>, HelpError> {
        self.repo.get_with_resources(id).await
    }

    async fn check_help_type(&self, help_type_id: Option<i32>) -> Result<(), HelpError> {
        if let Some(id) = help_type_id {
            if self.repo.get_help_type(id).await?.is_none() {
                return Err(HelpError::Invalid("Unknown help type."));
            }
        }
        Ok(())
    }

    /// Creates a help owned by `member_id`.
    pub async fn create(&self, member_id: i32, draft: HelpDraft) -> Result<Help, HelpError> {
        self.check_help_type(draft.help_type_id).await?;
        let help = self.repo.save(Help::new(member_id, draft)).await?;
        log::info!(
            "Member {} posted help {}",
            help.member_id,
            help.id.unwrap_or_default()
        );
        Ok(help)
    }

    /// Updates the editable fields of an existing help on behalf of `caller`.
    /// Owner and resources are kept as stored.
    pub async fn update(
        &self,
        id: i32,
        caller: &Caller,
        draft: HelpDraft,
    ) -> Result<Help, HelpError> {
        self.check_help_type(draft.help_type_id).await?;
        let mut help = self
            .repo
            .get(id)
            .await?
            .ok_or(HelpError::NotFound("The help doesn't exist."))?;
        Self::ensure_can_modify(&help, caller)?;
        help.apply(draft);
        self.repo.save(help).await
    }

    pub async fn get_resources(&self, help_id: i32) -> Result<Vec<HelpResource>, HelpError> {
        self.repo.get_resources(help_id).await
    }

    /// Comments of a help, or `None` when the help does not exist.
    pub async fn get_comments(&self, help_id: i32) -> Result<Option<Vec<HelpResource>>, HelpError> {
        if self.repo.get(help_id).await?.is_none() {
            return Ok(None);
        }
        let resources = self.repo.get_resources(help_id).await?;
        Ok(Some(
            resources.into_iter().filter(HelpResource::is_comment).collect(),
        ))
    }

    /// Adds a comment to a help. `None` when the help does not exist or the
    /// comment is blank.
    pub async fn save_help_resource(
        &self,
        help_id: i32,
        comment: &str,
    ) -> Result<Option<HelpResource>, HelpError> {
        let comment = comment.trim();
        if comment.is_empty() || self.repo.get(help_id).await?.is_none() {
            return Ok(None);
        }
        let saved = self
            .repo
            .save_help_resource(HelpResource::comment(help_id, comment.to_owned()))
            .await?;
        Ok(Some(saved))
    }

    pub async fn get_help_types(&self) -> Result<Vec<HelpType>, HelpError> {
        self.repo.get_help_types().await
    }

    /// Adds a help type. Names are trimmed and must be non-blank and unique.
    pub async fn save_help_type(&self, name: &str) -> Result<HelpType, HelpError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HelpError::Invalid("Help type name is required."));
        }
        if self.repo.get_help_type_by_name(name).await?.is_some() {
            return Err(HelpError::Invalid("Help type already exists."));
        }

        let help_type = self
            .repo
            .save_help_type(HelpType {
                id: None,
                name: name.to_owned(),
            })
            .await?;
        log::info!("Help type '{}' added", help_type.name);
        Ok(help_type)
    }

    /// Contributions of a help, or `None` when the help does not exist.
    pub async fn get_contributions(
        &self,
        help_id: i32,
    ) -> Result<Option<Vec<Contribution>>, HelpError> {
        if self.repo.get(help_id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.repo.get_contributions(help_id).await?))
    }

    /// Records an offer of assistance from `member_id`. `None` when the help
    /// or help type does not exist.
    pub async fn save_contribution(
        &self,
        member_id: i32,
        draft: ContributionDraft,
    ) -> Result<Option<Contribution>, HelpError> {
        if self.repo.get(draft.help_id).await?.is_none()
            || self.repo.get_help_type(draft.help_type_id).await?.is_none()
        {
            return Ok(None);
        }

        let contribution = self
            .repo
            .save_contribution(Contribution {
                id: None,
                help_id: draft.help_id,
                member_id,
                help_type_id: draft.help_type_id,
                message: draft.message,
                created_at: Utc::now().naive_utc(),
            })
            .await?;
        Ok(Some(contribution))
    }

    /// Only the owner of a help or an administrator may edit it or attach
    /// files to it.
    pub fn ensure_can_modify(help: &Help, caller: &Caller) -> Result<(), HelpError> {
        if help.member_id == caller.member_id || caller.is_administrator() {
            return Ok(());
        }
        log::debug!(
            "Member {} may not modify help {} owned by {}",
            caller.member_id,
            help.id.unwrap_or_default(),
            help.member_id
        );
        Err(HelpError::Forbidden)
    }

    /// Uploads `files` in order and attaches them to `help`, saving the help
    /// once at the end.
    ///
    /// Stops at the first storage failure without saving anything. Objects
    /// uploaded before the failure stay in the store and are reported back.
    pub async fn attach_resources(
        &self,
        mut help: Help,
        files: Vec<UploadedFile>,
    ) -> Result<Help, HelpError> {
        let help_id = help.id.ok_or(HelpError::NotFound("The help doesn't exist."))?;
        let mut uploaded = Vec::with_capacity(files.len());

        for file in &files {
            let key = unique_key(&file.name);

            if let Err(source) = self.store.put_file(&key, file.path()).await {
                log::error!(
                    "Upload of '{}' for help {} failed: {}",
                    file.name,
                    help_id,
                    source
                );
                if !uploaded.is_empty() {
                    log::warn!(
                        "Objects left in bucket '{}' after failed upload: {:?}",
                        self.store.bucket_name(),
                        uploaded
                    );
                }
                return Err(HelpError::Upload(UploadFailure {
                    uploaded,
                    failed: file.name.to_owned(),
                    source,
                }));
            }

            let resource = get_resource(file, self.store.public_url(&key));
            help.resources.push(HelpResource::attachment(help_id, resource));
            uploaded.push(key);
        }

        let help = self.repo.save(help).await?;
        log::info!("Attached {} resource(s) to help {}", uploaded.len(), help_id);
        Ok(help)
    }
}
