use std::io::{self, Write};

use attain_report::{init_tracing, ReportConfig, ReportError, ReportService};
use attain_storage::JsonSnapshotStore;

fn main() -> Result<(), ReportError> {
    init_tracing();

    let config = ReportConfig::from_env();
    let store = JsonSnapshotStore::open(&config.snapshot_path)?;
    let service = ReportService::load(&store, &config)?;

    let payload = match config.report_mode.as_str() {
        "cohort" => serde_json::to_value(service.outcome_context()?)?,
        "student" => {
            let subject = config.subject.as_deref().ok_or_else(|| {
                ReportError::Config("ATTAIN_SUBJECT is required for student reports".to_string())
            })?;
            serde_json::to_value(service.student_report(subject)?)?
        }
        _ => {
            return Err(ReportError::Config(
                "ATTAIN_REPORT must be cohort or student".to_string(),
            ))
        }
    };

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &payload)?;
    writeln!(out)?;
    Ok(())
}
