//! Check evaluation.
//!
//! Pure classification of retrieved certificate facts into a monitoring
//! verdict: days-to-expiry against the two thresholds, subject identity
//! against the expected name, and the human-readable message the plugin
//! prints. No I/O happens here; everything is driven by the values passed
//! in, so the whole decision table is unit-testable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;

use crate::error::CheckError;
use crate::{CertificateFacts, Target};

/// Timestamp format used in check messages, e.g. `2026-05-12 23:59:59 UTC`.
const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Monitoring-plugin service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Error,
    Unknown,
}

impl Status {
    /// Process exit code per the plugin convention.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Error => 2,
            Status::Unknown => 3,
        }
    }
}

/// Day thresholds below which the check degrades. Not validated against
/// each other; the severe threshold always wins when both match.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub warning_days: i64,
    pub error_days: i64,
}

/// The terminal output of one check invocation.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: Status,
    pub message: String,
    pub exit_code: i32,
}

impl CheckResult {
    fn new(status: Status, message: String) -> CheckResult {
        CheckResult {
            status,
            message,
            exit_code: status.exit_code(),
        }
    }

    /// Maps a retrieval failure to the UNKNOWN verdict. The missing-peer-
    /// certificate case keeps its own message so "endpoint gave us
    /// nothing" stays distinguishable from a malformed certificate.
    pub fn from_error(err: &CheckError) -> CheckResult {
        let message = match err {
            CheckError::NoPeerCertificate => err.to_string(),
            _ => format!("Could not validate certificate: {}", err),
        };
        CheckResult::new(Status::Unknown, message)
    }
}

/// Classifies the certificate facts against the thresholds and the
/// expected subject, and builds the plugin message.
///
/// `expected_subject` falls back to the target host when not configured.
/// Day counting is a truncating whole-day difference in the certificate's
/// timezone.
pub fn evaluate(
    facts: &CertificateFacts,
    now: DateTime<Utc>,
    expected_subject: Option<&str>,
    thresholds: &Thresholds,
    target: &Target,
) -> CheckResult {
    let days_left = (facts.not_after - now).num_days();

    // ERROR is tested first so the severe threshold wins whenever both
    // conditions hold, regardless of how the thresholds are ordered.
    let expiry_status = if days_left < thresholds.error_days {
        Status::Error
    } else if days_left < thresholds.warning_days {
        Status::Warning
    } else {
        Status::Ok
    };

    let expected = expected_subject.unwrap_or(&target.host);
    let mut status = expiry_status;
    let mut lines = Vec::new();

    if expiry_status != Status::Ok {
        lines.push(format!(
            "Certificate expires on {} which is in {} days.",
            facts.not_after.format(OUTPUT_TIME_FORMAT),
            days_left
        ));
    }

    if facts.subject_common_name != expected {
        lines.push(format!(
            "Expected subject {} but certificate for {}.",
            expected, facts.subject_common_name
        ));
        status = Status::Error;
    }

    if status == Status::Ok {
        let starttls_comment = match target.starttls {
            Some(protocol) => format!(" (StartTLS {})", protocol),
            None => String::new(),
        };
        lines.push(format!(
            "Certificate for {}:{}{} OK: {} until expiry ({}) and subject is {}.",
            target.host,
            target.port,
            starttls_comment,
            days_left,
            facts.not_after.format(OUTPUT_TIME_FORMAT),
            facts.subject_common_name
        ));
    }

    CheckResult::new(status, lines.join("\n"))
}
