use crate::core::{MigrationReport, OutcomeStatus, RemoteId};
use crate::utils::error::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    model: &'a str,
    old_id: String,
    status: &'a str,
    new_id: String,
    orphaned_media: String,
    error: &'a str,
    recorded_at: String,
}

fn id_text(id: Option<&RemoteId>) -> String {
    match id {
        Some(RemoteId::String(s)) => s.clone(),
        Some(RemoteId::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// One CSV row per entry across all given reports.
pub fn write_csv<P: AsRef<Path>>(reports: &[MigrationReport], path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for report in reports {
        for outcome in &report.outcomes {
            writer.serialize(ReportRow {
                model: &report.destination_model,
                old_id: id_text(Some(&outcome.old_id)),
                status: match outcome.status {
                    OutcomeStatus::Created => "created",
                    OutcomeStatus::Failed => "failed",
                },
                new_id: id_text(outcome.new_id.as_ref()),
                orphaned_media: outcome
                    .orphaned_media
                    .iter()
                    .map(|id| id_text(Some(id)))
                    .collect::<Vec<_>>()
                    .join(";"),
                error: outcome.error.as_deref().unwrap_or(""),
                recorded_at: outcome.recorded_at.to_rfc3339(),
            })?;
        }
    }
    writer.flush()?;

    tracing::info!("📁 Report saved to: {}", path.as_ref().display());
    Ok(())
}

pub fn log_summary(report: &MigrationReport) {
    tracing::info!(
        "📊 {} → {}: fetched {}, created {}, failed {}, orphaned media {}",
        report.source_model,
        report.destination_model,
        report.fetched,
        report.created(),
        report.failed(),
        report.orphaned_media()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntryOutcome;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join("run.csv");

        let mut report = MigrationReport::new("articles", "article");
        report.fetched = 2;
        report
            .outcomes
            .push(EntryOutcome::created(json!(1), Some(json!(101))));
        report.outcomes.push(EntryOutcome::failed(
            json!("2"),
            "Related entity with old_id 9 not found in 'author'".to_string(),
            vec![json!(7), json!(8)],
        ));

        write_csv(&[report], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["model", "old_id", "status", "new_id", "orphaned_media", "error", "recorded_at"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "article");
        assert_eq!(&rows[0][2], "created");
        assert_eq!(&rows[0][3], "101");
        assert_eq!(&rows[1][1], "2");
        assert_eq!(&rows[1][2], "failed");
        assert_eq!(&rows[1][4], "7;8");
        assert!(rows[1][5].contains("not found"));
    }
}
