use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::domain::error::Result;
use crate::domain::report::ExportReport;
use crate::domain::validation::{ValidationResults, ValidationSummary};
use crate::infrastructure::storage::ReportSink;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// A report that has been serialized and handed to a sink.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredReport {
    pub filename: String,
    pub location: String,
    #[serde(skip)]
    pub contents: String,
}

pub fn build_report(
    product_id: Option<i64>,
    product_name: Option<&str>,
    snapshot: ValidationResults,
) -> ExportReport {
    build_report_at(Utc::now(), product_id, product_name, snapshot)
}

/// Summary is derived with the same rule as `ValidationStore::summary`, and
/// the results are embedded untouched.
pub fn build_report_at(
    now: DateTime<Utc>,
    product_id: Option<i64>,
    product_name: Option<&str>,
    snapshot: ValidationResults,
) -> ExportReport {
    ExportReport {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        product_id,
        product_name: product_name.map(str::to_string),
        summary: ValidationSummary::from_results(&snapshot),
        results: snapshot,
    }
}

/// A missing id and the id `0` are both named `unknown`.
pub fn default_filename(product_id: Option<i64>, now: DateTime<Utc>) -> String {
    let subject = product_id
        .filter(|id| *id != 0)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("validation-report-{}-{}.json", subject, now.timestamp_millis())
}

/// Uses the caller's hint when it survives sanitizing, otherwise the default
/// `validation-report-<id>-<millis>.json` name.
pub fn resolve_filename(hint: Option<&str>, product_id: Option<i64>, now: DateTime<Utc>) -> String {
    hint.map(|hint| {
        UNSAFE_FILENAME_CHARS
            .replace_all(hint.trim(), "_")
            .trim_start_matches('.')
            .to_string()
    })
    .filter(|name| !name.is_empty())
    .unwrap_or_else(|| default_filename(product_id, now))
}

/// Pretty JSON with two-space indentation.
pub fn render_report(report: &ExportReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn download_report(
    report: &ExportReport,
    filename_hint: Option<&str>,
    sink: &dyn ReportSink,
) -> Result<DeliveredReport> {
    let contents = render_report(report)?;
    let filename = resolve_filename(filename_hint, report.product_id, Utc::now());
    let location = sink.deliver(&filename, contents.as_bytes())?;

    info!(
        filename = %filename,
        location = %location,
        total = report.summary.total,
        "Validation report exported"
    );

    Ok(DeliveredReport {
        filename,
        location,
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::validation::{VerdictRecord, VerdictStatus};
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        files: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ReportSink for MemorySink {
        fn deliver(&self, filename: &str, contents: &[u8]) -> Result<String> {
            self.files
                .lock()
                .unwrap()
                .push((filename.to_string(), contents.to_vec()));
            Ok(format!("memory://{}", filename))
        }
    }

    struct BrokenSink;

    impl ReportSink for BrokenSink {
        fn deliver(&self, _filename: &str, _contents: &[u8]) -> Result<String> {
            Err(AppError::IoError("downloads are disabled".to_string()))
        }
    }

    fn sample_results() -> ValidationResults {
        let mut results = ValidationResults::new();
        results.insert(
            "product_name".to_string(),
            VerdictRecord::new(VerdictStatus::Pass, ""),
        );
        results.insert(
            "lead_in_price".to_string(),
            VerdictRecord::new(VerdictStatus::Fail, "wrong currency"),
        );
        results
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_build_report_summary_and_results() {
        let report = build_report_at(fixed_now(), Some(42), Some("Peru Explorer"), sample_results());

        assert_eq!(report.timestamp, "2026-03-14T09:26:53.000Z");
        assert_eq!(report.product_id, Some(42));
        assert_eq!(report.product_name.as_deref(), Some("Peru Explorer"));
        assert_eq!(
            report.summary,
            ValidationSummary {
                total: 2,
                passed: 1,
                failed: 1
            }
        );
        assert_eq!(report.results, sample_results());
    }

    #[test]
    fn test_render_report_uses_export_keys() {
        let report = build_report_at(fixed_now(), Some(42), None, sample_results());
        let json = render_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["productId"], 42);
        assert!(value.get("productName").is_none());
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["results"]["lead_in_price"]["status"], "fail");
        assert_eq!(value["results"]["lead_in_price"]["comment"], "wrong currency");
        assert!(json.contains("\n  \"summary\""));
    }

    #[test]
    fn test_rendered_report_parses_back_to_same_report() {
        let report = build_report_at(fixed_now(), None, Some("Nile Cruise"), sample_results());
        let json = render_report(&report).unwrap();
        let parsed: ExportReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(
            default_filename(Some(42), fixed_now()),
            format!("validation-report-42-{}.json", fixed_now().timestamp_millis())
        );
        assert!(default_filename(None, fixed_now()).starts_with("validation-report-unknown-"));
        assert_eq!(
            default_filename(Some(0), fixed_now()),
            default_filename(None, fixed_now())
        );
    }

    #[test]
    fn test_resolve_filename_sanitizes_hint() {
        assert_eq!(
            resolve_filename(Some("../etc/peru report.json"), Some(1), fixed_now()),
            "_etc_peru_report.json"
        );
        assert_eq!(
            resolve_filename(Some("   "), Some(7), fixed_now()),
            default_filename(Some(7), fixed_now())
        );
    }

    #[test]
    fn test_download_report_delivers_pretty_json() {
        let sink = MemorySink::default();
        let report = build_report(Some(42), Some("Peru Explorer"), sample_results());
        let delivered = download_report(&report, None, &sink).unwrap();

        let pattern = Regex::new(r"^validation-report-42-\d+\.json$").unwrap();
        assert!(pattern.is_match(&delivered.filename));
        assert_eq!(delivered.location, format!("memory://{}", delivered.filename));

        let files = sink.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        let parsed: ExportReport = serde_json::from_slice(&files[0].1).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_download_report_surfaces_sink_failure() {
        let report = build_report(Some(1), None, sample_results());
        let err = download_report(&report, Some("x.json"), &BrokenSink).unwrap_err();
        assert_eq!(err, AppError::IoError("downloads are disabled".to_string()));
    }
}
