use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{Applicant, Application, Job};

/// Read-only client for the job portal backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recruiter-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Jobs posted by the authenticated recruiter.
    pub async fn fetch_jobs(&self) -> anyhow::Result<Vec<Job>> {
        self.get_collection("jobs", &[("myjobs", "1")]).await
    }

    pub async fn fetch_applicants(&self) -> anyhow::Result<Vec<Applicant>> {
        self.get_collection("applicants", &[]).await
    }

    pub async fn fetch_applications(&self) -> anyhow::Result<Vec<Application>> {
        self.get_collection("applications", &[]).await
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, resource);
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;

        let records: Vec<T> = response
            .json()
            .await
            .with_context(|| format!("{url} did not return a JSON array of {resource}"))?;

        debug!(resource, count = records.len(), "fetched collection");
        Ok(records)
    }
}
