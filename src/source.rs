use std::path::Path;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::db;
use crate::models::{Applicant, Application, Job, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// Job portal backend API
    Api,
    /// Postgres tables populated by `seed` or `import`
    Db,
    /// JSON snapshot file
    File,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Api => "api",
            SourceKind::Db => "db",
            SourceKind::File => "file",
        }
    }
}

/// Fetches all three collections concurrently; any that fail come back empty.
pub async fn from_api(client: &ApiClient) -> Snapshot {
    let (jobs, applicants, applications) = tokio::join!(
        client.fetch_jobs(),
        client.fetch_applicants(),
        client.fetch_applications(),
    );

    assemble(jobs, applicants, applications)
}

pub async fn from_db(pool: &PgPool) -> Snapshot {
    let (jobs, applicants, applications) = tokio::join!(
        db::fetch_jobs(pool),
        db::fetch_applicants(pool),
        db::fetch_applications(pool),
    );

    assemble(jobs, applicants, applications)
}

pub fn from_file(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid snapshot", path.display()))?;
    log_loaded(&snapshot);
    Ok(snapshot)
}

fn assemble(
    jobs: anyhow::Result<Vec<Job>>,
    applicants: anyhow::Result<Vec<Applicant>>,
    applications: anyhow::Result<Vec<Application>>,
) -> Snapshot {
    let snapshot = Snapshot {
        jobs: or_empty("jobs", jobs),
        applicants: or_empty("applicants", applicants),
        applications: or_empty("applications", applications),
    };
    log_loaded(&snapshot);
    snapshot
}

fn or_empty<T>(collection: &str, result: anyhow::Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            warn!(collection, error = %format!("{err:#}"), "fetch failed, using an empty collection");
            Vec::new()
        }
    }
}

fn log_loaded(snapshot: &Snapshot) {
    info!(
        jobs = snapshot.jobs.len(),
        applicants = snapshot.applicants.len(),
        applications = snapshot.applications.len(),
        "snapshot loaded"
    );
}
