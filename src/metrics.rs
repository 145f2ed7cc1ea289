use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{
    Applicant, Application, ApplicationStatus, BucketCount, DashboardMetrics, Job,
    JobTypeDistribution, SummaryCounts,
};

pub const MONTH_WINDOW: u32 = 6;
pub const WEEK_WINDOW: i64 = 4;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month, compared by `(year, month)` rather than by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn months_before(self, months: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 - i64::from(months);
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn label(&self) -> String {
        let name = MONTH_ABBREVIATIONS[(self.month as usize + 11) % 12];
        format!("{} {}", name, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekBucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The current month and the preceding ones, oldest first.
pub fn monthly_buckets(now: DateTime<Utc>) -> Vec<MonthBucket> {
    let current = MonthBucket::containing(now.date_naive());
    (0..MONTH_WINDOW)
        .rev()
        .map(|offset| current.months_before(offset))
        .collect()
}

/// Sunday-aligned weeks, oldest first; the last one starts on the Sunday
/// on or before `now`.
pub fn weekly_buckets(now: DateTime<Utc>) -> Vec<WeekBucket> {
    let today = now.date_naive();
    let weekday_offset = i64::from(today.weekday().num_days_from_sunday());

    (0..WEEK_WINDOW)
        .rev()
        .map(|weeks_ago| {
            let start = today
                .checked_sub_signed(Duration::days(weekday_offset + weeks_ago * 7))
                .unwrap_or(NaiveDate::MIN);
            let end = start
                .checked_add_signed(Duration::days(6))
                .unwrap_or(NaiveDate::MAX);
            WeekBucket {
                label: format!("Week {}", WEEK_WINDOW - weeks_ago),
                start,
                end,
            }
        })
        .collect()
}

pub fn summarize(
    jobs: &[Job],
    applicants: &[Applicant],
    applications: &[Application],
) -> SummaryCounts {
    let with_status = |status: ApplicationStatus| {
        applicants
            .iter()
            .filter(|applicant| applicant.status == status)
            .count()
    };

    SummaryCounts {
        total_jobs: jobs.len(),
        total_applications: applications.len(),
        active_employees: with_status(ApplicationStatus::Accepted),
        pending_reviews: with_status(ApplicationStatus::Finished),
    }
}

pub fn applications_per_month(applicants: &[Applicant], now: DateTime<Utc>) -> Vec<BucketCount> {
    let buckets = monthly_buckets(now);
    let mut counts = vec![0usize; buckets.len()];

    for applicant in applicants {
        let Some(applied_on) = applicant.date_of_application.map(|d| d.date_naive()) else {
            continue;
        };
        if let Some(index) = buckets.iter().position(|bucket| bucket.contains(applied_on)) {
            counts[index] += 1;
        }
    }

    buckets
        .iter()
        .zip(counts)
        .map(|(bucket, count)| BucketCount {
            label: bucket.label(),
            count,
        })
        .collect()
}

pub fn job_type_distribution(jobs: &[Job]) -> JobTypeDistribution {
    let mut distribution = JobTypeDistribution::default();
    for job in jobs {
        distribution.record(&job.job_type);
    }
    distribution
}

pub fn new_employees_per_week(applicants: &[Applicant], now: DateTime<Utc>) -> Vec<BucketCount> {
    let buckets = weekly_buckets(now);
    let mut counts = vec![0usize; buckets.len()];

    for applicant in applicants {
        if applicant.status != ApplicationStatus::Accepted {
            continue;
        }
        let Some(joined_on) = applicant.date_of_joining.map(|d| d.date_naive()) else {
            continue;
        };
        if let Some(index) = buckets.iter().position(|bucket| bucket.contains(joined_on)) {
            counts[index] += 1;
        }
    }

    buckets
        .into_iter()
        .zip(counts)
        .map(|(bucket, count)| BucketCount {
            label: bucket.label,
            count,
        })
        .collect()
}

/// Computes every dashboard series from one snapshot and one reference instant.
pub fn aggregate(
    jobs: &[Job],
    applicants: &[Applicant],
    applications: &[Application],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    DashboardMetrics {
        summary: summarize(jobs, applicants, applications),
        monthly_applications: applications_per_month(applicants, now),
        job_type_distribution: job_type_distribution(jobs),
        weekly_new_employees: new_employees_per_week(applicants, now),
    }
}
