use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default = "undefined_job_type", deserialize_with = "lenient_job_type")]
    pub job_type: String,
}

/// Key used for jobs posted without a usable type.
pub const UNDEFINED_JOB_TYPE: &str = "undefined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Accepted,
    Rejected,
    Deleted,
    Cancelled,
    Finished,
    #[default]
    Unknown,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Deleted => "deleted",
            ApplicationStatus::Cancelled => "cancelled",
            ApplicationStatus::Finished => "finished",
            ApplicationStatus::Unknown => "unknown",
        }
    }
}

// Exact match only, whichever source the status came from.
impl From<&str> for ApplicationStatus {
    fn from(value: &str) -> Self {
        match value {
            "applied" => ApplicationStatus::Applied,
            "shortlisted" => ApplicationStatus::Shortlisted,
            "accepted" => ApplicationStatus::Accepted,
            "rejected" => ApplicationStatus::Rejected,
            "deleted" => ApplicationStatus::Deleted,
            "cancelled" => ApplicationStatus::Cancelled,
            "finished" => ApplicationStatus::Finished,
            _ => ApplicationStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ApplicationStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_of_application: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_of_joining: Option<DateTime<Utc>>,
}

/// Opaque to the dashboard, which only counts these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub applicants: Vec<Applicant>,
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub total_jobs: usize,
    pub total_applications: usize,
    pub active_employees: usize,
    pub pending_reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
}

/// Job type counts in the order each type was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobTypeDistribution(Vec<(String, usize)>);

impl JobTypeDistribution {
    pub fn record(&mut self, job_type: &str) {
        match self.0.iter_mut().find(|(name, _)| name == job_type) {
            Some((_, count)) => *count += 1,
            None => self.0.push((job_type.to_string(), 1)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for JobTypeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub summary: SummaryCounts,
    pub monthly_applications: Vec<BucketCount>,
    pub job_type_distribution: JobTypeDistribution,
    pub weekly_new_employees: Vec<BucketCount>,
}

/// Parses RFC 3339 timestamps, naive date-times (assumed UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Other(serde::de::IgnoredAny),
}

// Bad dates must not reject the whole record, they just fall into no bucket.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text),
        Some(RawTimestamp::Millis(millis)) => Utc.timestamp_millis_opt(millis).single(),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    Other(serde::de::IgnoredAny),
}

impl RawScalar {
    fn into_text(self) -> Option<String> {
        match self {
            RawScalar::Text(text) => Some(text),
            RawScalar::Integer(value) => Some(value.to_string()),
            RawScalar::Float(value) => Some(value.to_string()),
            RawScalar::Flag(value) => Some(value.to_string()),
            RawScalar::Other(_) => None,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawScalar>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawScalar::Text(text)) => Some(text),
        _ => None,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<ApplicationStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawScalar>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawScalar::Text(text)) => ApplicationStatus::from(text.as_str()),
        _ => ApplicationStatus::Unknown,
    })
}

fn undefined_job_type() -> String {
    UNDEFINED_JOB_TYPE.to_string()
}

// Scalars keep their text form; null and structured values share one key.
fn lenient_job_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawScalar>::deserialize(deserializer)?;
    Ok(raw
        .and_then(RawScalar::into_text)
        .unwrap_or_else(undefined_job_type))
}
