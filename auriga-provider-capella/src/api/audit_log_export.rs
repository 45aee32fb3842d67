//! Audit-log export job payloads.
//!
//! Export jobs are asynchronous server-side: the POST returns an export ID
//! and the job moves through queued/in-progress before settling in
//! completed or failed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of an export job. The API reports free-form casing ("in progress",
/// "inProgress"), so parsing normalizes separators and case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ExportStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Unknown,
}

impl From<String> for ExportStatus {
    fn from(raw: String) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => ExportStatus::Queued,
            "inprogress" => ExportStatus::InProgress,
            "completed" => ExportStatus::Completed,
            "failed" => ExportStatus::Failed,
            _ => ExportStatus::Unknown,
        }
    }
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Queued => "queued",
            ExportStatus::InProgress => "in progress",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
            ExportStatus::Unknown => "unknown",
        }
    }

    /// Whether the job has settled; the caller decides how to report
    /// `Failed`.
    pub fn is_final(&self) -> bool {
        matches!(self, ExportStatus::Completed | ExportStatus::Failed)
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAuditLogExportRequest {
    /// Start of the audit window, RFC 3339.
    pub start: String,
    /// End of the audit window, RFC 3339.
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditLogExportResponse {
    pub export_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAuditLogExportResponse {
    pub audit_log_export_id: String,
    pub status: ExportStatus,
    #[serde(default, rename = "auditLogDownloadURL")]
    pub audit_log_download_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub expiration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_normalizes_casing_and_separators() {
        assert_eq!(ExportStatus::from("queued".to_string()), ExportStatus::Queued);
        assert_eq!(
            ExportStatus::from("in progress".to_string()),
            ExportStatus::InProgress
        );
        assert_eq!(
            ExportStatus::from("inProgress".to_string()),
            ExportStatus::InProgress
        );
        assert_eq!(
            ExportStatus::from("IN-PROGRESS".to_string()),
            ExportStatus::InProgress
        );
        assert_eq!(
            ExportStatus::from("archived".to_string()),
            ExportStatus::Unknown
        );
    }

    #[test]
    fn only_completed_and_failed_are_final() {
        assert!(ExportStatus::Completed.is_final());
        assert!(ExportStatus::Failed.is_final());
        assert!(!ExportStatus::Queued.is_final());
        assert!(!ExportStatus::InProgress.is_final());
        assert!(!ExportStatus::Unknown.is_final());
    }

    #[test]
    fn get_response_deserializes_download_url() {
        let body = r#"{
            "auditLogExportId": "ab0e4b46-5e62-4a3e-9c1d-819cb8a24a3f",
            "status": "completed",
            "auditLogDownloadURL": "https://example.com/exports/1.tar.gz",
            "createdAt": "2024-05-20T10:00:00Z",
            "start": "2024-05-19T00:00:00Z",
            "end": "2024-05-20T00:00:00Z"
        }"#;
        let job: GetAuditLogExportResponse = serde_json::from_str(body).unwrap();
        assert_eq!(job.status, ExportStatus::Completed);
        assert!(job.audit_log_download_url.is_some());
    }
}
