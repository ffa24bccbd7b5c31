// crates/core/src/catalog.rs
//! Static asset catalog.
//!
//! A [`Project`] lists the assets generated for one video. Each asset is a
//! [`SubTask`] with a fixed weight; a project's weights sum to 100 so that the
//! aggregate of completed weights is the job's percentage.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Kind of file an asset produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    AudioDescription,
    TranscriptSrt,
    SubtitlesVtt,
    TranscriptTimeCoded,
    ThumbnailJpg,
    SignLanguagePip,
    /// Anything the generator has no pipeline for, keyed by extension.
    Other(String),
}

impl FileType {
    /// Map a file extension (without the dot) to a file type.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => FileType::AudioDescription,
            "srt" => FileType::TranscriptSrt,
            "vtt" => FileType::SubtitlesVtt,
            "txt" => FileType::TranscriptTimeCoded,
            "jpeg" | "jpg" => FileType::ThumbnailJpg,
            "mp4" => FileType::SignLanguagePip,
            other => FileType::Other(other.to_string()),
        }
    }

    /// MIME type served for this file type.
    pub fn mime(&self) -> &str {
        match self {
            FileType::AudioDescription => "audio/mp3",
            // No registered MIME type for SRT.
            FileType::TranscriptSrt => "text/plain",
            FileType::SubtitlesVtt => "text/vtt",
            FileType::TranscriptTimeCoded => "text/plain",
            FileType::ThumbnailJpg => "image/jpeg",
            FileType::SignLanguagePip => "video/mp4",
            FileType::Other(_) => "application/octet-stream",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FileType::Other(_))
    }
}

/// One asset to generate, contributing `weight` percent to its job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub name: String,
    pub file_type: FileType,
    pub weight: u8,
    /// Simulated generation time.
    pub duration_ms: u64,
}

impl SubTask {
    pub fn new(name: impl Into<String>, file_type: FileType, weight: u8, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            file_type,
            weight,
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// A project and the assets generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub tasks: Vec<SubTask>,
}

impl Project {
    pub fn total_weight(&self) -> u32 {
        self.tasks.iter().map(|t| u32::from(t.weight)).sum()
    }

    /// Check that the project has work and that its weights sum to 100.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.tasks.is_empty() {
            return Err(CatalogError::NoTasks {
                project_id: self.id.clone(),
            });
        }
        let total = self.total_weight();
        if total != 100 {
            return Err(CatalogError::WeightSum {
                project_id: self.id.clone(),
                total,
            });
        }
        Ok(())
    }
}

/// The project served by the catalog.
pub fn default_project() -> Project {
    Project {
        id: "12".to_string(),
        name: "My video on guide dogs.".to_string(),
        tasks: vec![
            SubTask::new("Audio Description", FileType::AudioDescription, 20, 4_000),
            SubTask::new("Transcript (SRT)", FileType::TranscriptSrt, 10, 1_500),
            SubTask::new("Subtitles (VTT)", FileType::SubtitlesVtt, 10, 1_500),
            SubTask::new("Transcript (Time-Coded)", FileType::TranscriptTimeCoded, 10, 2_000),
            SubTask::new("Thumbnail Image", FileType::ThumbnailJpg, 15, 2_500),
            SubTask::new(
                "Sign Language (Picture in Picture)",
                FileType::SignLanguagePip,
                35,
                6_000,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_project_weights_sum_to_100() {
        let project = default_project();
        assert_eq!(project.total_weight(), 100);
        assert!(project.validate().is_ok());
        assert!(project.tasks.iter().all(|t| t.file_type.is_known()));
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut project = default_project();
        project.tasks.pop();
        assert_eq!(
            project.validate(),
            Err(CatalogError::WeightSum {
                project_id: "12".to_string(),
                total: 65,
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_project() {
        let project = Project {
            id: "empty".to_string(),
            name: "Nothing".to_string(),
            tasks: Vec::new(),
        };
        assert!(matches!(project.validate(), Err(CatalogError::NoTasks { .. })));
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("mp3"), FileType::AudioDescription);
        assert_eq!(FileType::from_extension("JPG"), FileType::ThumbnailJpg);
        assert_eq!(FileType::from_extension("jpeg"), FileType::ThumbnailJpg);
        assert_eq!(FileType::from_extension("txt").mime(), "text/plain");
        assert_eq!(
            FileType::from_extension("gif"),
            FileType::Other("gif".to_string())
        );
        assert!(!FileType::from_extension("gif").is_known());
    }

    #[test]
    fn test_sub_task_serializes_camel_case() {
        let task = SubTask::new("Subtitles (VTT)", FileType::SubtitlesVtt, 10, 250);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["fileType"], "subtitles_vtt");
        assert_eq!(json["durationMs"], 250);
        assert_eq!(task.duration(), Duration::from_millis(250));
    }
}
