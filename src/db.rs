use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{parse_timestamp, Applicant, Application, ApplicationStatus, Job};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportKind {
    Jobs,
    Applicants,
    Applications,
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config.require_database_url()?;
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let jobs = vec![
        ("seed-job-001", "Backend Engineer", "Full Time"),
        ("seed-job-002", "Frontend Developer", "Full Time"),
        ("seed-job-003", "Data Analyst", "Part Time"),
        ("seed-job-004", "Support Specialist", "Work From Home"),
    ];

    for (source_key, title, job_type) in jobs {
        insert_job(pool, source_key, title, job_type).await?;
    }

    // Relative to today so a fresh seed shows up in the trailing windows.
    let today = Utc::now();
    let days_ago = |days: i64| Some(today - Duration::days(days));
    let applicants = vec![
        ("seed-app-001", "avery.lee@example.com", ApplicationStatus::Accepted, days_ago(40), days_ago(3)),
        ("seed-app-002", "jules.moreno@example.com", ApplicationStatus::Accepted, days_ago(75), days_ago(16)),
        ("seed-app-003", "kiara.patel@example.com", ApplicationStatus::Finished, days_ago(20), None),
        ("seed-app-004", "noah.kim@example.com", ApplicationStatus::Applied, days_ago(2), None),
        ("seed-app-005", "mira.santos@example.com", ApplicationStatus::Shortlisted, days_ago(33), None),
        ("seed-app-006", "leo.martin@example.com", ApplicationStatus::Rejected, days_ago(130), None),
    ];

    for (source_key, email, status, applied, joined) in applicants {
        insert_applicant(pool, source_key, email, status, applied, joined).await?;
    }

    let applications = vec![
        ("seed-apl-001", Some("seed-job-001"), "avery.lee@example.com"),
        ("seed-apl-002", Some("seed-job-002"), "jules.moreno@example.com"),
        ("seed-apl-003", Some("seed-job-003"), "kiara.patel@example.com"),
        ("seed-apl-004", Some("seed-job-001"), "noah.kim@example.com"),
        ("seed-apl-005", Some("seed-job-004"), "mira.santos@example.com"),
        ("seed-apl-006", None, "leo.martin@example.com"),
    ];

    for (source_key, job_key, email) in applications {
        insert_application(pool, source_key, job_key, Some(email)).await?;
    }

    Ok(())
}

pub async fn fetch_jobs(pool: &PgPool) -> anyhow::Result<Vec<Job>> {
    let rows = sqlx::query("SELECT id, title, job_type FROM job_portal.jobs ORDER BY created_at, id")
        .fetch_all(pool)
        .await?;

    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.get("id");
        jobs.push(Job {
            id: Some(id.to_string()),
            title: row.get("title"),
            job_type: row.get("job_type"),
        });
    }

    Ok(jobs)
}

pub async fn fetch_applicants(pool: &PgPool) -> anyhow::Result<Vec<Applicant>> {
    let rows = sqlx::query(
        "SELECT id, status, date_of_application, date_of_joining FROM job_portal.applicants",
    )
    .fetch_all(pool)
    .await?;

    let mut applicants = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.get("id");
        let status: String = row.get("status");
        applicants.push(Applicant {
            id: Some(id.to_string()),
            status: ApplicationStatus::from(status.as_str()),
            date_of_application: row.get("date_of_application"),
            date_of_joining: row.get("date_of_joining"),
        });
    }

    Ok(applicants)
}

pub async fn fetch_applications(pool: &PgPool) -> anyhow::Result<Vec<Application>> {
    let rows = sqlx::query("SELECT id, job_id FROM job_portal.applications")
        .fetch_all(pool)
        .await?;

    let mut applications = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.get("id");
        let job_id: Option<Uuid> = row.get("job_id");
        applications.push(Application {
            id: Some(id.to_string()),
            job_id: job_id.map(|id| id.to_string()),
        });
    }

    Ok(applications)
}

#[derive(Debug, serde::Deserialize)]
struct JobRow {
    title: String,
    job_type: String,
    source_key: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ApplicantRow {
    email: String,
    status: String,
    date_of_application: Option<String>,
    date_of_joining: Option<String>,
    source_key: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ApplicationRow {
    job_source_key: Option<String>,
    applicant_email: Option<String>,
    source_key: Option<String>,
}

pub async fn import_csv(pool: &PgPool, kind: ImportKind, csv_path: &Path) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    match kind {
        ImportKind::Jobs => {
            for row in read_rows::<JobRow>(csv_path)? {
                let source_key = source_key_or_new(row.source_key);
                if insert_job(pool, &source_key, &row.title, &row.job_type).await? {
                    inserted += 1;
                }
            }
        }
        ImportKind::Applicants => {
            for row in read_rows::<ApplicantRow>(csv_path)? {
                let source_key = source_key_or_new(row.source_key);
                let applied = row.date_of_application.as_deref().and_then(parse_timestamp);
                let joined = row.date_of_joining.as_deref().and_then(parse_timestamp);
                let status = ApplicationStatus::from(row.status.as_str());
                if insert_applicant(pool, &source_key, &row.email, status, applied, joined).await? {
                    inserted += 1;
                }
            }
        }
        ImportKind::Applications => {
            for row in read_rows::<ApplicationRow>(csv_path)? {
                let source_key = source_key_or_new(row.source_key);
                if insert_application(
                    pool,
                    &source_key,
                    row.job_source_key.as_deref(),
                    row.applicant_email.as_deref(),
                )
                .await?
                {
                    inserted += 1;
                }
            }
        }
    }

    info!(?kind, inserted, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

fn read_rows<T: DeserializeOwned>(csv_path: &Path) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("invalid CSV record {}", index + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn source_key_or_new(source_key: Option<String>) -> String {
    source_key
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()))
}

async fn insert_job(pool: &PgPool, source_key: &str, title: &str, job_type: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO job_portal.jobs (id, title, job_type, source_key)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(job_type)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_applicant(
    pool: &PgPool,
    source_key: &str,
    email: &str,
    status: ApplicationStatus,
    date_of_application: Option<DateTime<Utc>>,
    date_of_joining: Option<DateTime<Utc>>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO job_portal.applicants
        (id, email, status, date_of_application, date_of_joining, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(status.as_str())
    .bind(date_of_application)
    .bind(date_of_joining)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_application(
    pool: &PgPool,
    source_key: &str,
    job_source_key: Option<&str>,
    applicant_email: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO job_portal.applications (id, job_id, applicant_email, source_key)
        VALUES ($1, (SELECT id FROM job_portal.jobs WHERE source_key = $2), $3, $4)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_source_key)
    .bind(applicant_email)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_applicant_rows_with_optional_columns() {
        let file = write_csv(
            "email,status,date_of_application,date_of_joining,source_key\n\
             avery@example.com,accepted,2024-02-01,2024-03-11T00:00:00Z,hr-001\n\
             jules@example.com,applied,2024-03-02,,\n",
        );

        let rows: Vec<ApplicantRow> = read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source_key.as_deref(), Some("hr-001"));
        assert!(rows[1].date_of_joining.is_none());
        assert!(rows[1].source_key.is_none());
    }

    #[test]
    fn reports_the_failing_record() {
        let file = write_csv("title,job_type,source_key\nBackend Engineer\n");
        let err = read_rows::<JobRow>(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid CSV record 1"));
    }

    #[test]
    fn blank_source_keys_are_replaced() {
        assert_eq!(source_key_or_new(Some("hr-7".to_string())), "hr-7");
        assert!(source_key_or_new(Some("  ".to_string())).starts_with("import-"));
        assert!(source_key_or_new(None).starts_with("import-"));
    }
}
