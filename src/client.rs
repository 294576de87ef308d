//! HTTP client for the archive-check endpoint.
//!
//! One multipart upload per file. Every failure mode (transport errors,
//! timeouts, error statuses, unreadable bodies) resolves to a
//! [`CheckOutcome`] value; nothing escapes this module's boundary, which is
//! what lets the dispatcher keep a batch alive past one bad file.

use crate::config::RunConfig;
use crate::error::Result;
use crate::timing::{self, UploadBudgets};
use crate::types::{CheckOutcome, FileDescriptor};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

/// Client for one run's archive checks.
#[derive(Clone, Debug)]
pub struct ArchiveCheckClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    share_root: String,
    exclude_source: bool,
}

impl ArchiveCheckClient {
    /// Build the client for a run. Connection and pool budgets are fixed
    /// per [`timing`] and configured here; the size-scaled budget is applied
    /// per request in [`check`](Self::check).
    pub fn new(config: &RunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timing::CONNECT_TIMEOUT)
            .pool_idle_timeout(timing::POOL_IDLE_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            username: config.credentials.username.clone(),
            password: config.credentials.password.clone(),
            share_root: config.share_root.trim_end_matches('\\').to_string(),
            exclude_source: config.exclude_source,
        })
    }

    /// Check one file against the archive. Streams the file as the `file`
    /// field of a multipart POST; credentials ride as request headers, never
    /// in the URL.
    pub async fn check(&self, file: &FileDescriptor, budgets: &UploadBudgets) -> CheckOutcome {
        match self.try_check(file, budgets).await {
            Ok(outcome) => outcome,
            Err(e) => CheckOutcome::Failed(format!(
                "Error processing file {}: {}",
                file.normalized_path(),
                e
            )),
        }
    }

    async fn try_check(
        &self,
        file: &FileDescriptor,
        budgets: &UploadBudgets,
    ) -> Result<CheckOutcome> {
        let handle = tokio::fs::File::open(&file.path).await?;
        let stream = tokio_util::io::ReaderStream::new(handle);
        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), file.size)
            .file_name(file.file_name());
        let form = Form::new().part("file", part);

        let budget = budgets.request_budget();
        let request = self
            .http
            .post(&self.endpoint)
            .header("user", &self.username)
            .header("password", &self.password)
            .multipart(form)
            .timeout(budget);

        let response = match tokio::time::timeout(budget, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(file = %file.path.display(), error = %e, "check request failed");
                return Ok(CheckOutcome::Failed(format!("Request error: {}", e)));
            }
            Err(_) => {
                tracing::warn!(file = %file.path.display(), ?budget, "check request timed out");
                return Ok(CheckOutcome::Failed(format!(
                    "Request timed out after {:?}",
                    budget
                )));
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(CheckOutcome::NotFound);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(CheckOutcome::Failed(format!(
                    "Failed to read response body: {}",
                    e
                )));
            }
        };

        if status.is_success() {
            match serde_json::from_str::<Vec<String>>(&body) {
                Ok(raw) => {
                    let locations = self.resolve_locations(raw, &file.normalized_path());
                    tracing::debug!(
                        file = %file.path.display(),
                        locations = locations.len(),
                        "archive check returned locations"
                    );
                    Ok(CheckOutcome::Found(locations))
                }
                Err(_) => Ok(CheckOutcome::Failed(format!(
                    "Unexpected response body: {}",
                    body
                ))),
            }
        } else {
            Ok(CheckOutcome::Failed(format!(
                "Request error ({}): {}",
                status, body
            )))
        }
    }

    /// Rewrite one remote-relative location into the display convention:
    /// forward slashes folded to backslashes under the network-share root.
    fn rewrite_location(&self, remote: &str) -> String {
        format!(
            "{}\\{}",
            self.share_root,
            remote.trim_start_matches('/').replace('/', "\\")
        )
    }

    /// Rewrite all returned locations and, when source exclusion is on,
    /// drop entries equal to the file's own normalized path. A pure filter
    /// over a fresh list; nothing is deleted mid-iteration.
    fn resolve_locations(&self, raw: Vec<String>, source: &str) -> Vec<String> {
        raw.into_iter()
            .map(|location| self.rewrite_location(&location))
            .filter(|location| !self.exclude_source || location != source)
            .collect()
    }
}
