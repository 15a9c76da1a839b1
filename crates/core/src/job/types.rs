//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    /// Allowed transitions. Every path goes through `Running`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Finished)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "finished" => Ok(JobStatus::Finished),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// The composer operations a job can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Encode,
    Trim,
    Mux,
    ExtractImage,
    EmbedCaptions,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Encode,
        OperationKind::Trim,
        OperationKind::Mux,
        OperationKind::ExtractImage,
        OperationKind::EmbedCaptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Encode => "Encode",
            OperationKind::Trim => "Trim",
            OperationKind::Mux => "Mux",
            OperationKind::ExtractImage => "ExtractImage",
            OperationKind::EmbedCaptions => "EmbedCaptions",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

/// An externally tracked unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Service that owns the job, e.g. `composer` or `inspection`.
    pub job_type: String,
    pub operation: String,
    /// Serialized operation arguments.
    pub arguments: Vec<String>,
    pub status: JobStatus,
    /// Serialized result, present only when `Finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Diagnostic, present only when `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Running));
        assert!(Running.can_transition_to(Finished));
        assert!(Running.can_transition_to(Failed));

        assert!(!Queued.can_transition_to(Finished));
        assert!(!Queued.can_transition_to(Failed));
        assert!(!Finished.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Running));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn test_terminal() {
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("RUNNING".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert!("paused".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_operation_round_trip_names() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("Transcode".parse::<OperationKind>().is_err());
    }
}
