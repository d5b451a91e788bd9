//! Resolves the `x-auth-token` header to the calling member.
//!
//! Tokens are issued by the members module; this module only looks them up.

use crate::app_config::StaticToken;
use crate::orm::{auth_tokens, member_roles, roles};
use crate::role::Role;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use moka::sync::Cache;
use sea_orm::{
    entity::*, query::*, ColumnTrait, Condition, DatabaseConnection, DbErr, QueryFilter,
};
use serde::Serialize;
use std::time::Duration;

/// Header carrying the authentication token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// The authenticated member behind a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub member_id: i32,
    pub roles: Vec<Role>,
}

impl Caller {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }

    pub fn is_administrator(&self) -> bool {
        self.roles.contains(&Role::Administrator)
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the caller owning `token`, or `None` for unknown or expired tokens.
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>, DbErr>;
}

/// Looks tokens up in `auth_tokens` and caches resolved callers briefly.
pub struct DbAuthenticator {
    db: DatabaseConnection,
    cache: Cache<String, Caller>,
}

impl DbAuthenticator {
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(10_000)
                .build(),
        }
    }
}

#[async_trait]
impl Authenticator for DbAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>, DbErr> {
        if let Some(caller) = self.cache.get(token) {
            return Ok(Some(caller));
        }

        let now = Utc::now().naive_utc();
        let token_row = auth_tokens::Entity::find_by_id(token.to_owned())
            .filter(
                Condition::any()
                    .add(auth_tokens::Column::ExpiresAt.is_null())
                    .add(auth_tokens::Column::ExpiresAt.gt(now)),
            )
            .one(&self.db)
            .await?;

        let token_row = match token_row {
            Some(row) => row,
            None => return Ok(None),
        };

        let grants = member_roles::Entity::find()
            .filter(member_roles::Column::MemberId.eq(token_row.member_id))
            .find_also_related(roles::Entity)
            .all(&self.db)
            .await?;

        let roles = grants
            .into_iter()
            .filter_map(|(_, role)| role)
            .filter_map(|role| match role.role() {
                Ok(role) => Some(role),
                Err(e) => {
                    log::warn!("Ignoring grant for member {}: {}", token_row.member_id, e);
                    None
                }
            })
            .collect();

        let caller = Caller {
            member_id: token_row.member_id,
            roles,
        };
        self.cache.insert(token.to_owned(), caller.clone());
        Ok(Some(caller))
    }
}

/// Token registry held in memory.
#[derive(Default)]
pub struct MemoryAuthenticator {
    tokens: DashMap<String, Caller>,
}

impl MemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the tokens listed under `auth.static_tokens`. Unknown role
    /// names are logged and skipped.
    pub fn from_static_tokens(tokens: &[StaticToken]) -> Self {
        let auth = Self::new();
        for entry in tokens {
            let roles = entry
                .roles
                .iter()
                .filter_map(|name| match name.parse::<Role>() {
                    Ok(role) => Some(role),
                    Err(e) => {
                        log::warn!("Static token for member {}: {}", entry.member_id, e);
                        None
                    }
                })
                .collect();
            auth.insert(
                entry.token.to_owned(),
                Caller {
                    member_id: entry.member_id,
                    roles,
                },
            );
        }
        auth
    }

    pub fn insert(&self, token: String, caller: Caller) {
        self.tokens.insert(token, caller);
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>, DbErr> {
        Ok(self.tokens.get(token).map(|c| c.value().clone()))
    }
}
