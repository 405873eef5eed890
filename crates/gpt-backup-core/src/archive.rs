//! Archive output for a finished harvest.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::models::Conversation;

/// Destination for the complete record list of a successful run.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Persist `conversations`, returning where they were written.
    async fn save(&self, conversations: &[Conversation]) -> Result<PathBuf>;
}

/// Writes pretty-printed JSON named after the local time of the save.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn write_at(&self, conversations: &[Conversation], at: NaiveDateTime) -> Result<PathBuf> {
        let body = serde_json::to_vec_pretty(conversations)
            .map_err(|e| HarvestError::Archive(format!("failed to serialize archive: {}", e)))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| io_error("create", &self.output_dir, e))?;

        let file_name = archive_file_name(&at);
        let path = self.output_dir.join(&file_name);
        let partial = self.output_dir.join(format!(".{}.partial", file_name));

        tokio::fs::write(&partial, &body)
            .await
            .map_err(|e| io_error("write", &partial, e))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| io_error("rename", &path, e))?;

        info!(
            "Wrote {} conversations ({} bytes) to {}",
            conversations.len(),
            body.len(),
            path.display()
        );
        Ok(path)
    }
}

#[async_trait]
impl ArchiveSink for JsonFileSink {
    async fn save(&self, conversations: &[Conversation]) -> Result<PathBuf> {
        self.write_at(conversations, Local::now().naive_local()).await
    }
}

/// `gpt-backup-YYYY-MM-DD-HH-MM-SS.json`, which sorts chronologically.
pub fn archive_file_name(at: &NaiveDateTime) -> String {
    format!("gpt-backup-{}.json", at.format("%Y-%m-%d-%H-%M-%S"))
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> HarvestError {
    HarvestError::Archive(format!("failed to {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::NormalizedMessage;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap()
    }

    fn sample() -> Vec<Conversation> {
        vec![Conversation {
            messages: vec![NormalizedMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
                model: "unknown".to_string(),
                create_time: Some(1.0),
            }],
            create_time: None,
            title: Some("Greeting".to_string()),
        }]
    }

    #[test]
    fn test_file_name_is_zero_padded() {
        assert_eq!(
            archive_file_name(&timestamp()),
            "gpt-backup-2024-03-07-09-05-02.json"
        );
    }

    #[tokio::test]
    async fn test_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nested"));

        let path = sink.write_at(&sample(), timestamp()).await.unwrap();

        assert_eq!(
            path,
            dir.path().join("nested").join("gpt-backup-2024-03-07-09-05-02.json")
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n  {\n    \"messages\""));
        assert!(!written.contains("\"create_time\": null"));

        let parsed: Vec<Conversation> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_save_uses_current_time() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());

        let path = sink.save(&[]).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("gpt-backup-"));
        assert!(name.ends_with(".json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
