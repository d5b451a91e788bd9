//! In-memory application harness for API tests
#![allow(dead_code)]

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use async_trait::async_trait;
use ethearts::app_config::AppConfig;
use ethearts::help::memory::MemoryHelpRepository;
use ethearts::help::{
    Contribution, Help, HelpDraft, HelpError, HelpRepository, HelpResource, HelpService, HelpType,
};
use ethearts::middleware::ClientCtx;
use ethearts::role::Role;
use ethearts::session::{Authenticator, Caller, MemoryAuthenticator, AUTH_TOKEN_HEADER};
use ethearts::storage::{StorageBackend, StorageError};
use sea_orm::DbErr;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const USER_TOKEN: &str = "user-token";
pub const OTHER_USER_TOKEN: &str = "other-user-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const NO_ROLE_TOKEN: &str = "no-role-token";

pub const USER_ID: i32 = 1;
pub const ADMIN_ID: i32 = 2;
pub const OTHER_USER_ID: i32 = 3;

/// Memory repository that counts calls to `save`.
#[derive(Default)]
pub struct CountingRepository {
    inner: MemoryHelpRepository,
    saves: AtomicUsize,
}

impl CountingRepository {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HelpRepository for CountingRepository {
    async fn get_all(&self) -> Result<Vec<Help>, HelpError> {
        self.inner.get_all().await
    }

    async fn get(&self, id: i32) -> Result<Option<Help>, HelpError> {
        self.inner.get(id).await
    }

    async fn get_with_resources(&self, id: i32) -> Result<Option<Help>, HelpError> {
        self.inner.get_with_resources(id).await
    }

    async fn save(&self, help: Help) -> Result<Help, HelpError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(help).await
    }

    async fn get_resources(&self, help_id: i32) -> Result<Vec<HelpResource>, HelpError> {
        self.inner.get_resources(help_id).await
    }

    async fn save_help_resource(&self, resource: HelpResource) -> Result<HelpResource, HelpError> {
        self.inner.save_help_resource(resource).await
    }

    async fn get_help_types(&self) -> Result<Vec<HelpType>, HelpError> {
        self.inner.get_help_types().await
    }

    async fn get_help_type(&self, id: i32) -> Result<Option<HelpType>, HelpError> {
        self.inner.get_help_type(id).await
    }

    async fn get_help_type_by_name(&self, name: &str) -> Result<Option<HelpType>, HelpError> {
        self.inner.get_help_type_by_name(name).await
    }

    async fn save_help_type(&self, help_type: HelpType) -> Result<HelpType, HelpError> {
        self.inner.save_help_type(help_type).await
    }

    async fn get_contributions(&self, help_id: i32) -> Result<Vec<Contribution>, HelpError> {
        self.inner.get_contributions(help_id).await
    }

    async fn save_contribution(
        &self,
        contribution: Contribution,
    ) -> Result<Contribution, HelpError> {
        self.inner.save_contribution(contribution).await
    }
}

/// Object store that records keys and can fail the n-th upload.
#[derive(Default)]
pub struct RecordingStorage {
    keys: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail_on: Option<usize>,
}

impl RecordingStorage {
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for RecordingStorage {
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(attempt) {
            return Err(StorageError::S3("service unavailable".to_owned()));
        }
        assert!(path.exists(), "temp file must exist during upload");
        self.keys.lock().unwrap().push(key.to_owned());
        Ok(())
    }

    fn bucket_name(&self) -> &str {
        "test-bucket"
    }

    fn base_url(&self) -> &str {
        "https://objects.example.com"
    }
}

/// Authenticator whose backing store is unreachable.
pub struct UnavailableAuthenticator;

#[async_trait]
impl Authenticator for UnavailableAuthenticator {
    async fn authenticate(&self, _token: &str) -> Result<Option<Caller>, DbErr> {
        Err(DbErr::Conn("connection refused".to_owned()))
    }
}

pub struct TestApp {
    pub repo: Arc<CountingRepository>,
    pub store: Arc<RecordingStorage>,
    pub auth: Arc<dyn Authenticator>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(RecordingStorage::default())
    }

    pub fn with_storage(store: RecordingStorage) -> Self {
        let auth = MemoryAuthenticator::new();
        let callers = [
            (USER_TOKEN, USER_ID, vec![Role::User]),
            (OTHER_USER_TOKEN, OTHER_USER_ID, vec![Role::User]),
            (ADMIN_TOKEN, ADMIN_ID, vec![Role::Administrator]),
            (NO_ROLE_TOKEN, 4, Vec::new()),
        ];
        for (token, member_id, roles) in callers {
            auth.insert(token.to_owned(), Caller { member_id, roles });
        }

        let mut config = AppConfig::default();
        config.limits.max_upload_size_mb = 1;
        config.limits.max_files_per_upload = 3;

        Self {
            repo: Arc::new(CountingRepository::default()),
            store: Arc::new(store),
            auth: Arc::new(auth),
            config,
        }
    }

    pub fn with_authenticator(auth: Arc<dyn Authenticator>) -> Self {
        Self {
            auth,
            ..Self::new()
        }
    }

    pub fn service(&self) -> HelpService {
        HelpService::new(self.repo.clone(), self.store.clone())
    }

    /// Creates a help owned by `member_id` directly through the service.
    pub async fn seed_help(&self, member_id: i32, title: &str) -> Help {
        self.service()
            .create(
                member_id,
                HelpDraft {
                    title: title.to_owned(),
                    description: format!("{} description", title),
                    help_type_id: None,
                },
            )
            .await
            .expect("seed help")
    }

    pub async fn seed_help_type(&self, name: &str) -> HelpType {
        self.service()
            .save_help_type(name)
            .await
            .expect("seed help type")
    }

    /// Sends `req` through a fresh app sharing this harness' state.
    /// Returns the status and the JSON body, or `Value::Null` for empty bodies.
    pub async fn send(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let auth = self.auth.clone();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(self.service()))
                .app_data(Data::from(auth))
                .app_data(Data::new(self.config.clone()))
                .wrap(ClientCtx::default())
                .configure(ethearts::web::configure),
        )
        .await;

        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("response body is JSON")
        };
        (status, json)
    }
}

/// Request carrying the auth token header.
pub fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((AUTH_TOKEN_HEADER, token))
}
