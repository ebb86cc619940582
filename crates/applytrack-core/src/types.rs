//! Domain types shared by the tracker and the AI runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage of a job application.
///
/// Ordering follows the pipeline: applied → interview → offer/rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStage {
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStage {
    /// All stages in display order.
    pub const ALL: [ApplicationStage; 4] = [
        ApplicationStage::Applied,
        ApplicationStage::Interview,
        ApplicationStage::Offer,
        ApplicationStage::Rejected,
    ];

    /// Wire name used in stored documents and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStage::Applied => "applied",
            ApplicationStage::Interview => "interview",
            ApplicationStage::Offer => "offer",
            ApplicationStage::Rejected => "rejected",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStage::Applied => "Applied",
            ApplicationStage::Interview => "Interview",
            ApplicationStage::Offer => "Offer",
            ApplicationStage::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stage name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application stage: '{0}' (expected applied, interview, offer or rejected)")]
pub struct UnknownStage(pub String);

impl FromStr for ApplicationStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "applied" => Ok(ApplicationStage::Applied),
            "interview" => Ok(ApplicationStage::Interview),
            "offer" => Ok(ApplicationStage::Offer),
            "rejected" => Ok(ApplicationStage::Rejected),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

/// A recorded job application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub company_name: String,
    pub role: String,
    pub stage: ApplicationStage,
    pub application_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Create an application with all timestamps set to `applied_on`.
    pub fn new(
        id: impl Into<String>,
        company_name: impl Into<String>,
        role: impl Into<String>,
        stage: ApplicationStage,
        applied_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            role: role.into(),
            stage,
            application_date: applied_on,
            job_link: None,
            created_at: applied_on,
            updated_at: applied_on,
        }
    }
}

/// A free-text note attached to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(id: impl Into<String>, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            created_at,
            updated_at: created_at,
        }
    }
}
