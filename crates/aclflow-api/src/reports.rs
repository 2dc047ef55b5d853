// Spreadsheet report downloads.

use bytes::Bytes;
use chrono::Utc;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::debug;

use crate::client::AclClient;
use crate::error::Error;
use crate::models::{RequestsEnvelope, SubmittedRecord};

/// A downloaded report: raw xlsx bytes plus the suggested file name.
#[derive(Debug, Clone)]
pub struct Report {
    pub filename: String,
    pub bytes: Bytes,
}

impl AclClient {
    /// Every request the caller may see.
    ///
    /// `GET /api/v1/generate-xlsx`
    pub async fn download_report(&self) -> Result<Report, Error> {
        let resp = self.send_get("api/v1/generate-xlsx", &[]).await?;
        let fallback = format!("acl_requests_{}.xlsx", today());
        self.read_report(resp, fallback).await
    }

    /// Only the rows that were just submitted.
    ///
    /// `POST /api/v1/generate-xlsx/submission` with `{"requests": [...]}`
    pub async fn download_submission_report(
        &self,
        records: &[SubmittedRecord],
    ) -> Result<Report, Error> {
        let resp = self
            .send_post(
                "api/v1/generate-xlsx/submission",
                &RequestsEnvelope { requests: records },
            )
            .await?;
        let fallback = format!("acl_submission_{}requests_{}.xlsx", records.len(), today());
        self.read_report(resp, fallback).await
    }

    async fn read_report(&self, resp: reqwest::Response, fallback: String) -> Result<Report, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or(fallback);
        let bytes = resp.bytes().await?;
        debug!(%filename, size = bytes.len(), "downloaded report");

        Ok(Report { filename, bytes })
    }
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Pull `filename="..."` (or the bare form) out of a `Content-Disposition` value.
fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_owned())
    })
}
