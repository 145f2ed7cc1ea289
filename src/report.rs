use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{BucketCount, DashboardMetrics};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

pub fn stat_cards(metrics: &DashboardMetrics) -> [(&'static str, usize); 4] {
    let summary = &metrics.summary;
    [
        ("Total Jobs", summary.total_jobs),
        ("Applications", summary.total_applications),
        ("Active Employees", summary.active_employees),
        ("Pending Reviews", summary.pending_reviews),
    ]
}

/// Scales `count` against `max` into a fixed-width text bar.
pub fn bar(count: usize, max: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let filled = (count * BAR_WIDTH).div_ceil(max).min(BAR_WIDTH);
    "#".repeat(filled)
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn write_series(output: &mut String, series: &[BucketCount], unit: &str) {
    let max = series.iter().map(|bucket| bucket.count).max().unwrap_or(0);
    for bucket in series {
        let _ = writeln!(
            output,
            "- {:<8} {:>4} {} {}",
            bucket.label,
            bucket.count,
            unit,
            bar(bucket.count, max)
        );
    }
}

/// Plain-text rendering for the terminal.
pub fn render_summary(metrics: &DashboardMetrics) -> String {
    let mut output = String::new();

    for (title, value) in stat_cards(metrics) {
        let _ = writeln!(output, "{title}: {value}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Applications Over Time:");
    write_series(&mut output, &metrics.monthly_applications, "applications");

    let _ = writeln!(output);
    let _ = writeln!(output, "Job Types:");
    if metrics.job_type_distribution.is_empty() {
        let _ = writeln!(output, "No jobs posted yet.");
    } else {
        for (job_type, count) in metrics.job_type_distribution.iter() {
            let _ = writeln!(output, "- {job_type}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "New Employees:");
    write_series(&mut output, &metrics.weekly_new_employees, "joined");

    output
}

pub fn build_report(metrics: &DashboardMetrics, now: DateTime<Utc>, source: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Recruiter Dashboard");
    let _ = writeln!(
        output,
        "Generated {} from the {} source",
        now.format("%Y-%m-%d %H:%M UTC"),
        source
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Metric | Value |");
    let _ = writeln!(output, "|---|---|");
    for (title, value) in stat_cards(metrics) {
        let _ = writeln!(output, "| {title} | {value} |");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Applications Over Time");
    let _ = writeln!(output, "```");
    write_series(&mut output, &metrics.monthly_applications, "applications");
    let _ = writeln!(output, "```");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Job Types");
    let distribution = &metrics.job_type_distribution;
    if distribution.is_empty() {
        let _ = writeln!(output, "No jobs posted yet.");
    } else {
        let total = distribution.total();
        for (job_type, count) in distribution.iter() {
            let _ = writeln!(
                output,
                "- {}: {} jobs ({:.1}%)",
                job_type,
                count,
                share(count, total)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## New Employees");
    let _ = writeln!(output, "```");
    write_series(&mut output, &metrics.weekly_new_employees, "joined");
    let _ = writeln!(output, "```");

    output
}

pub fn to_json(metrics: &DashboardMetrics) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(metrics)?)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::metrics;
    use crate::models::{Applicant, ApplicationStatus, Job};

    fn sample_metrics() -> (DashboardMetrics, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let jobs = vec![
            Job {
                id: None,
                title: Some("Backend Engineer".to_string()),
                job_type: "Full-time".to_string(),
            },
            Job {
                id: None,
                title: Some("Platform Engineer".to_string()),
                job_type: "Full-time".to_string(),
            },
            Job {
                id: None,
                title: Some("Design Intern".to_string()),
                job_type: "Intern".to_string(),
            },
        ];
        let applicants = vec![Applicant {
            id: None,
            status: ApplicationStatus::Accepted,
            date_of_application: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            date_of_joining: Some(Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()),
        }];
        (metrics::aggregate(&jobs, &applicants, &[], now), now)
    }

    #[test]
    fn bars_scale_to_the_largest_bucket() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(3, 0), "");
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(1, 10).len(), 2);
        assert_eq!(bar(1, 1000).len(), 1);
    }

    #[test]
    fn summary_lists_cards_and_series() {
        let (metrics, _) = sample_metrics();
        let text = render_summary(&metrics);

        assert!(text.contains("Total Jobs: 3"));
        assert!(text.contains("Active Employees: 1"));
        assert!(text.contains("- Full-time: 2"));
        assert!(text.contains("Mar 2024"));
        assert!(text.contains("Week 4"));
    }

    #[test]
    fn markdown_report_includes_job_type_shares() {
        let (metrics, now) = sample_metrics();
        let report = build_report(&metrics, now, "file");

        assert!(report.starts_with("# Recruiter Dashboard"));
        assert!(report.contains("Generated 2024-03-15 09:30 UTC from the file source"));
        assert!(report.contains("| Pending Reviews | 0 |"));
        assert!(report.contains("- Full-time: 2 jobs (66.7%)"));
        assert!(report.contains("- Intern: 1 jobs (33.3%)"));
    }

    #[test]
    fn empty_report_says_no_jobs() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let metrics = metrics::aggregate(&[], &[], &[], now);
        assert!(build_report(&metrics, now, "api").contains("No jobs posted yet."));
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let (metrics, _) = sample_metrics();
        let json: serde_json::Value = serde_json::from_str(&to_json(&metrics).unwrap()).unwrap();

        assert_eq!(json["summary"]["totalJobs"], 3);
        assert_eq!(json["summary"]["activeEmployees"], 1);
        assert_eq!(json["monthlyApplications"][5]["label"], "Mar 2024");
        assert_eq!(json["monthlyApplications"][5]["count"], 1);
        assert_eq!(json["jobTypeDistribution"]["Intern"], 1);
        assert_eq!(json["weeklyNewEmployees"][3]["count"], 1);
    }
}
