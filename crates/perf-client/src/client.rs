// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::ClientConfig;
use crate::measurement_set::decode_measurement_set;
use perf_core::wire::ensure_ok_status;
use perf_core::wire::id_from_value;
use perf_core::{AnalysisTaskCreator, ConfiguredSeries, OutlierUpdater, PerfError, SeriesFetcher};
use perf_model::{BuildRequestsPayload, ManifestPayload, TriggerablesPayload};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Status the privileged API answers with once a CSRF token has expired.
const INVALID_TOKEN_STATUS: &str = "InvalidToken";

/// Path of a measurement set. The cached form is a static file; the other
/// goes through the API and reflects writes immediately.
pub fn measurement_set_path(platform_id: u64, metric_id: u64, no_cache: bool) -> String {
    if no_cache {
        format!("/api/measurement-set/?platform={platform_id}&metric={metric_id}")
    } else {
        format!("/data/measurement-set-{platform_id}-{metric_id}.json")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRunStatus {
    run: u64,
    marked_outlier: bool,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAnalysisTask<'a> {
    name: &'a str,
    start_run: u64,
    end_run: u64,
    token: String,
}

/// Blocking client for the dashboard server.
#[derive(Debug)]
pub struct RemoteApiClient {
    http: Client,
    config: ClientConfig,
    csrf_token: Mutex<Option<String>>,
}

impl RemoteApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, PerfError> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| PerfError::transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            config,
            csrf_token: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fetch_triggerables(&self) -> Result<TriggerablesPayload, PerfError> {
        self.get_payload("/api/triggerables/")
    }

    pub fn fetch_build_requests(&self, triggerable_id: u64) -> Result<BuildRequestsPayload, PerfError> {
        self.get_payload(&format!("/api/build-requests/{triggerable_id}"))
    }

    pub fn fetch_manifest(&self) -> Result<ManifestPayload, PerfError> {
        self.get_payload("/data/manifest.json")
    }

    pub fn fetch_measurement_set(
        &self,
        platform_id: u64,
        metric_id: u64,
        no_cache: bool,
    ) -> Result<Vec<ConfiguredSeries>, PerfError> {
        let payload = self.get_json(&measurement_set_path(platform_id, metric_id, no_cache))?;
        decode_measurement_set(&payload)
    }

    /// Marks or unmarks one run.
    pub fn update_run_status(&self, run_id: u64, marked_outlier: bool) -> Result<(), PerfError> {
        self.post_privileged("/privileged-api/update-run-status", |token| UpdateRunStatus {
            run: run_id,
            marked_outlier,
            token: token.to_string(),
        })?;
        info!(run_id, marked_outlier, "run status updated");
        Ok(())
    }

    /// Opens an analysis task over the runs from `start_run_id` to
    /// `end_run_id` and returns its id.
    pub fn create_analysis_task(
        &self,
        name: &str,
        start_run_id: u64,
        end_run_id: u64,
    ) -> Result<u64, PerfError> {
        let payload = self.post_privileged("/privileged-api/create-analysis-task", |token| {
            CreateAnalysisTask {
                name,
                start_run: start_run_id,
                end_run: end_run_id,
                token: token.to_string(),
            }
        })?;
        let task_id = task_id_from_payload(&payload)?;
        info!(task_id, start_run_id, end_run_id, "analysis task created");
        Ok(task_id)
    }

    /// Posts a body carrying a CSRF token. An expired token is regenerated
    /// and the request retried once.
    fn post_privileged<B, F>(&self, path: &str, body: F) -> Result<Value, PerfError>
    where
        B: Serialize,
        F: Fn(&str) -> B,
    {
        match self.post_with_token(path, &body) {
            Err(PerfError::Remote(status)) if status == INVALID_TOKEN_STATUS => {
                debug!(path, "csrf token rejected; regenerating");
                self.forget_csrf_token();
                self.post_with_token(path, &body)
            }
            other => other,
        }
    }

    fn post_with_token<B, F>(&self, path: &str, body: &F) -> Result<Value, PerfError>
    where
        B: Serialize,
        F: Fn(&str) -> B,
    {
        let token = self.csrf_token()?;
        self.post_json(path, &body(&token))
    }

    fn csrf_token(&self) -> Result<String, PerfError> {
        if let Some(token) = self.lock_token()?.clone() {
            return Ok(token);
        }
        let payload = self.post_json("/privileged-api/generate-csrf-token", &Value::Object(Default::default()))?;
        let token = payload
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PerfError::transport("csrf token response has no token"))?;
        *self.lock_token()? = Some(token.clone());
        Ok(token)
    }

    fn forget_csrf_token(&self) {
        if let Ok(mut token) = self.csrf_token.lock() {
            *token = None;
        }
    }

    fn lock_token(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, PerfError> {
        self.csrf_token
            .lock()
            .map_err(|_| PerfError::transport("csrf token cache is poisoned"))
    }

    fn get_payload<T: DeserializeOwned>(&self, path: &str) -> Result<T, PerfError> {
        let payload = self.get_json(path)?;
        serde_json::from_value(payload)
            .map_err(|err| PerfError::transport(format!("malformed payload from {path}: {err}")))
    }

    fn get_json(&self, path: &str) -> Result<Value, PerfError> {
        let url = self.config.url(path);
        debug!(%url, "GET");
        self.send(self.http.get(&url), &url)
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, PerfError> {
        let url = self.config.url(path);
        debug!(%url, "POST");
        self.send(self.http.post(&url).json(body), &url)
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Value, PerfError> {
        let response = request
            .send()
            .map_err(|err| PerfError::transport(format!("request to {url} failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "unexpected HTTP status");
            return Err(PerfError::transport(format!("{url} answered HTTP {}", status.as_u16())));
        }
        let payload: Value = response
            .json()
            .map_err(|err| PerfError::transport(format!("{url} did not return JSON: {err}")))?;
        ensure_ok_status(&payload)?;
        Ok(payload)
    }
}

fn task_id_from_payload(payload: &Value) -> Result<u64, PerfError> {
    payload
        .get("taskId")
        .and_then(id_from_value)
        .ok_or_else(|| PerfError::transport("analysis task response has no taskId"))
}

impl SeriesFetcher for RemoteApiClient {
    fn fetch_series(
        &self,
        platform_id: u64,
        metric_id: u64,
        no_cache: bool,
    ) -> Result<Vec<ConfiguredSeries>, PerfError> {
        self.fetch_measurement_set(platform_id, metric_id, no_cache)
    }
}

impl OutlierUpdater for RemoteApiClient {
    fn update_run_status(&self, run_id: u64, marked_outlier: bool) -> Result<(), PerfError> {
        RemoteApiClient::update_run_status(self, run_id, marked_outlier)
    }
}

impl AnalysisTaskCreator for RemoteApiClient {
    fn create_analysis_task(
        &self,
        name: &str,
        start_run_id: u64,
        end_run_id: u64,
    ) -> Result<u64, PerfError> {
        RemoteApiClient::create_analysis_task(self, name, start_run_id, end_run_id)
    }
}
