use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    form::form_model::FieldSet,
    reconcile::{error::FormError, round::RoundReport},
};

/// One line of the round trace.
#[derive(Debug, Serialize)]
pub struct RoundTraceEvent {
    pub timestamp_ms: u128,
    pub round: u64,

    pub request: String,

    pub field_count: Option<usize>,
    pub minted: Vec<String>,
    pub carried: Vec<String>,
    pub dangling: usize,

    pub fingerprint: Option<String>,
    pub error: Option<String>,
}

impl RoundTraceEvent {
    pub fn now(round: u64, request: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            round,
            request: request.to_string(),
            field_count: None,
            minted: vec![],
            carried: vec![],
            dangling: 0,
            fingerprint: None,
            error: None,
        }
    }

    pub fn with_report(mut self, report: &RoundReport) -> Self {
        self.minted = report.minted.iter().map(|id| id.to_string()).collect();
        self.carried = report.carried.iter().map(|id| id.to_string()).collect();
        self.dangling = report.dangling.len();
        self
    }

    pub fn with_form(mut self, form: &FieldSet) -> Self {
        self.field_count = Some(form.len());
        self.fingerprint = form_fingerprint(form);
        self
    }

    pub fn with_error(mut self, error: &FormError) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// SHA-1 of the form's compact JSON; identical forms across rounds share it.
pub fn form_fingerprint(form: &FieldSet) -> Option<String> {
    use sha1::{Digest, Sha1};

    let json = serde_json::to_string(form).ok()?;
    let mut hasher = Sha1::new();
    hasher.update(json.as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}
