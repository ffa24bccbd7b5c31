// crates/core/src/progress.rs
//! Progress wire types pushed to subscribers over SSE.
//!
//! Every event carries an *absolute* progress value, so a consumer that missed
//! an event re-synchronises on the next one it receives.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a tracked generation job.
pub type JobId = String;

/// Literal sent in place of a percentage once a job has finished.
pub const COMPLETED_MARKER: &str = "completed";

/// Progress of a job as seen by subscribers.
///
/// Serializes as a bare integer (`42`) or the string `"completed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Percent(u8),
    Completed,
}

impl Progress {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Completed)
    }

    /// Percentage value, treating completion as 100.
    pub fn percent(&self) -> u8 {
        match self {
            Progress::Percent(p) => *p,
            Progress::Completed => 100,
        }
    }
}

impl Serialize for Progress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Progress::Percent(p) => serializer.serialize_u8(*p),
            Progress::Completed => serializer.serialize_str(COMPLETED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProgressVisitor;

        impl Visitor<'_> for ProgressVisitor {
            type Value = Progress;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an integer between 0 and 100 or \"{COMPLETED_MARKER}\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Progress, E> {
                match u8::try_from(v) {
                    Ok(p) if p <= 100 => Ok(Progress::Percent(p)),
                    _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Progress, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Progress, E> {
                if v == COMPLETED_MARKER {
                    Ok(Progress::Completed)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ProgressVisitor)
    }
}

/// One progress event for one job: `{ "jobID": "...", "progress": 40 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub progress: Progress,
}

impl ProgressEvent {
    pub fn percent(job_id: impl Into<JobId>, percent: u8) -> Self {
        Self {
            job_id: job_id.into(),
            progress: Progress::Percent(percent),
        }
    }

    pub fn completed(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: Progress::Completed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.progress.is_terminal()
    }
}
