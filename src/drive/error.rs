//! Drive API error bodies.
//!
//! Google APIs return errors as
//! `{ "error": { "code": N, "message": "...", "status": "..." } }`;
//! older v3 endpoints omit `status` and list `errors[].reason` instead.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Drive API error [{status}]: {message} (HTTP {code})")]
pub struct DriveApiError {
    pub code: u16,
    pub message: String,
    pub status: String,
}

impl DriveApiError {
    pub fn from_api_response(status_code: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorDetail {
            reason: Option<String>,
        }
        #[derive(Deserialize)]
        struct ApiErrorInner {
            code: Option<u16>,
            message: Option<String>,
            status: Option<String>,
            #[serde(default)]
            errors: Vec<ErrorDetail>,
        }
        #[derive(Deserialize)]
        struct ApiErrorWrapper {
            error: Option<ApiErrorInner>,
        }

        if let Ok(wrapper) = serde_json::from_str::<ApiErrorWrapper>(body) {
            if let Some(err) = wrapper.error {
                let status = err
                    .status
                    .or_else(|| err.errors.into_iter().find_map(|e| e.reason))
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                return Self {
                    code: err.code.unwrap_or(status_code),
                    message: err.message.unwrap_or_else(|| "Unknown error".to_string()),
                    status,
                };
            }
        }

        Self {
            code: status_code,
            message: if body.is_empty() {
                format!("HTTP {}", status_code)
            } else {
                body.chars().take(500).collect()
            },
            status: "UNKNOWN".to_string(),
        }
    }
}
