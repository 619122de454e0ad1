use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;

/// `2026-10-17T12:00:00.000Z,57.8125`
pub fn format_record(timestamp: DateTime<Utc>, percentage: f64) -> String {
    format!(
        "{},{}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        percentage
    )
}

/// Append one record, opening and closing the file for this write only.
pub async fn append_record(
    path: &Path,
    timestamp: DateTime<Utc>,
    percentage: f64,
) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("create {}: {e}", parent.display()))?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| format!("open {}: {e}", path.display()))?;
    file.write_all(format_record(timestamp, percentage).as_bytes())
        .await
        .map_err(|e| format!("write {}: {e}", path.display()))?;
    file.flush()
        .await
        .map_err(|e| format!("flush {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::{append_record, format_record};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn record_is_iso_timestamp_then_percentage() {
        let line = format_record(at("2026-10-17T12:00:05.250+02:00"), 57.8125);
        assert_eq!(line, "2026-10-17T10:00:05.250Z,57.8125\n");
    }

    #[tokio::test]
    async fn appends_without_truncating_existing_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("logs").join("progress.csv");

        append_record(&path, at("2026-10-17T10:00:00Z"), 12.5)
            .await
            .expect("first append");
        append_record(&path, at("2026-10-17T11:00:00Z"), 13.0)
            .await
            .expect("second append");

        let contents = tokio::fs::read_to_string(&path).await.expect("read log");
        assert_eq!(
            contents,
            "2026-10-17T10:00:00.000Z,12.5\n2026-10-17T11:00:00.000Z,13\n"
        );
    }
}
