#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use listing_bulk_api::auth::{generate_jwt, AuthUser, Claims};
use listing_bulk_api::config::AppConfig;
use listing_bulk_api::database::models::{BulkImport, BulkImportStatus, ExportFilter, GenerationRecord, NewGeneration};
use listing_bulk_api::database::{GenerationRepository, MemoryGenerationRepository, RepositoryError};
use listing_bulk_api::generation::{GeneratedListing, GenerationError, ListingGenerator};
use listing_bulk_api::jobs::{BulkJob, BulkJobRunner, MemoryJobStore};
use listing_bulk_api::listing::{CsvRow, ListingOutput, LISTING_LIST_LEN};
use listing_bulk_api::quota::{MemoryQuotaStore, PlanLimits, PlanTier, QuotaGate, QuotaStore, QuotaStoreError};
use listing_bulk_api::AppState;

pub fn row(name: &str) -> CsvRow {
    CsvRow {
        product_name: name.to_string(),
        niche: Some("Home".to_string()),
        audience: None,
        keywords: vec!["gift".to_string(), "handmade".to_string()],
        tone: None,
    }
}

pub fn rows(names: &[&str]) -> Vec<CsvRow> {
    names.iter().map(|n| row(n)).collect()
}

pub fn user(id: &str, plan: PlanTier) -> AuthUser {
    AuthUser {
        user_id: id.to_string(),
        email: None,
        plan,
    }
}

pub fn listing_for(name: &str) -> ListingOutput {
    ListingOutput {
        title: format!("{} for every home", name),
        description: format!("A lovely {}.", name),
        tags: (1..=LISTING_LIST_LEN).map(|i| format!("tag {}", i)).collect(),
        materials: (1..=LISTING_LIST_LEN).map(|i| format!("material {}", i)).collect(),
        alt_texts: Vec::new(),
        price: None,
        extras: Default::default(),
    }
}

/// Generator whose behaviour is scripted per product name
#[derive(Default)]
pub struct ScriptedGenerator {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, product: &str, delay: Duration) -> Self {
        self.delays.insert(product.to_string(), delay);
        self
    }

    pub fn fail(mut self, product: &str, message: &str) -> Self {
        self.failures.insert(product.to_string(), message.to_string());
        self
    }

    /// Product names in the order generation was attempted
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ListingGenerator for ScriptedGenerator {
    async fn generate(&self, row: &CsvRow) -> Result<GeneratedListing, GenerationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(row.product_name.clone());
        }
        if let Some(delay) = self.delays.get(&row.product_name) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(&row.product_name) {
            return Err(GenerationError::Http {
                status: 500,
                body: message.clone(),
            });
        }
        Ok(GeneratedListing {
            listing: listing_for(&row.product_name),
            tokens_used: 42,
        })
    }
}

/// Quota store that is never reachable
pub struct UnreachableQuotaStore;

#[async_trait]
impl QuotaStore for UnreachableQuotaStore {
    async fn used(&self, _user_id: &str, _month_key: &str) -> Result<u32, QuotaStoreError> {
        Err(QuotaStoreError::Unavailable("connection refused".to_string()))
    }

    async fn try_increment(
        &self,
        _user_id: &str,
        _month_key: &str,
        _plan: PlanTier,
        _count: u32,
        _cap: u32,
    ) -> Result<Option<u32>, QuotaStoreError> {
        Err(QuotaStoreError::Unavailable("connection refused".to_string()))
    }
}

/// Repository that records imports but cannot persist generations
#[derive(Default)]
pub struct ReadOnlyRepository {
    inner: MemoryGenerationRepository,
}

impl ReadOnlyRepository {
    pub async fn bulk_import(&self, id: Uuid) -> Option<BulkImport> {
        self.inner.bulk_import(id).await
    }
}

#[async_trait]
impl GenerationRepository for ReadOnlyRepository {
    async fn create_bulk_import(
        &self,
        user_id: &str,
        file_name: Option<&str>,
        total_rows: u32,
    ) -> Result<BulkImport, RepositoryError> {
        self.inner.create_bulk_import(user_id, file_name, total_rows).await
    }

    async fn finish_bulk_import(
        &self,
        id: Uuid,
        status: BulkImportStatus,
        successful_rows: u32,
        failed_rows: u32,
    ) -> Result<(), RepositoryError> {
        self.inner.finish_bulk_import(id, status, successful_rows, failed_rows).await
    }

    async fn save_generation(&self, _new: NewGeneration) -> Result<GenerationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    async fn list_generations(
        &self,
        user_id: &str,
        filter: &ExportFilter,
    ) -> Result<Vec<GenerationRecord>, RepositoryError> {
        self.inner.list_generations(user_id, filter).await
    }
}

/// Runner wired to in-memory collaborators the test can inspect
pub struct Harness {
    pub runner: Arc<BulkJobRunner>,
    pub quota: Arc<QuotaGate>,
    pub quota_store: Arc<MemoryQuotaStore>,
    pub repository: Arc<MemoryGenerationRepository>,
    pub generator: Arc<ScriptedGenerator>,
}

impl Harness {
    pub fn new(generator: ScriptedGenerator, generation_timeout: Duration) -> Self {
        let quota_store = Arc::new(MemoryQuotaStore::new());
        let quota = Arc::new(QuotaGate::new(quota_store.clone(), PlanLimits::default()));
        let repository = Arc::new(MemoryGenerationRepository::new());
        let generator = Arc::new(generator);
        let jobs = Arc::new(MemoryJobStore::new(
            Duration::from_secs(3600),
            Duration::from_secs(6 * 3600),
        ));
        let runner = Arc::new(BulkJobRunner::new(
            jobs,
            quota.clone(),
            generator.clone(),
            repository.clone(),
            generation_timeout,
        ));

        Self {
            runner,
            quota,
            quota_store,
            repository,
            generator,
        }
    }

    pub async fn start(&self, user: &AuthUser, rows: Vec<CsvRow>) -> Result<BulkJob> {
        let total = u32::try_from(rows.len())?;
        let import = self
            .repository
            .create_bulk_import(&user.user_id, Some("test.csv"), total)
            .await?;
        Ok(self.runner.start(user.clone(), rows, import.id).await)
    }

    /// Seed the current month's counter
    pub async fn set_used(&self, user: &AuthUser, used: u32) {
        let month = QuotaGate::month_key(Utc::now());
        self.quota_store.set_used(&user.user_id, &month, used).await;
    }
}

/// Poll until the job reaches a terminal status
pub async fn wait_for_terminal(runner: &BulkJobRunner, job_id: Uuid) -> Result<BulkJob> {
    for _ in 0..500 {
        match runner.get_progress(job_id).await {
            Some(job) if job.status.is_terminal() => return Ok(job),
            Some(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            None => bail!("job {} disappeared", job_id),
        }
    }
    bail!("job {} did not finish in time", job_id)
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.cors_origins = Vec::new();
    config
}

pub fn test_state(generator: ScriptedGenerator) -> AppState {
    AppState::in_memory(test_config(), Arc::new(generator))
}

pub fn bearer(state: &AppState, user_id: &str, plan: PlanTier) -> String {
    let claims = Claims::new(user_id, None, plan, 1);
    let token = generate_jwt(&claims, &state.config.security.jwt_secret).expect("token mints");
    format!("Bearer {}", token)
}

pub const BOUNDARY: &str = "X-LISTING-TEST-BOUNDARY";

/// Hand-built multipart/form-data body
pub fn multipart_body(file_name: &str, csv: &str, mapping: Option<&str>) -> Vec<u8> {
    let mut body = String::new();
    body.push_str(&format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n",
        b = BOUNDARY,
        f = file_name,
        c = csv
    ));
    if let Some(mapping) = mapping {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"columnMapping\"\r\n\r\n{m}\r\n",
            b = BOUNDARY,
            m = mapping
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body.into_bytes()
}

pub fn upload_request(auth: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/csv/upload")
        .header(header::AUTHORIZATION, auth)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request builder must not fail")
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builder must not fail")
}

pub async fn body_bytes(response: Response<Body>) -> Result<Vec<u8>> {
    Ok(response.into_body().collect().await?.to_bytes().to_vec())
}

pub async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = body_bytes(response).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// App state plus a handle on its quota counters
pub fn test_state_with_quota(generator: ScriptedGenerator, config: AppConfig) -> (AppState, Arc<MemoryQuotaStore>) {
    let quota_store = Arc::new(MemoryQuotaStore::new());
    let state = AppState::new(
        config,
        quota_store.clone(),
        Arc::new(MemoryGenerationRepository::new()),
        Arc::new(generator),
        None,
    );
    (state, quota_store)
}
