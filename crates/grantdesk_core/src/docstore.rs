//! Deterministic object keys and presign policy for the document store.
//!
//! # Responsibility
//! - Derive stable object keys for uploaded documents.
//! - Carry expiry defaults for presigned upload/download URLs.
//!
//! # Invariants
//! - Keys follow `{prefix}/{entity}/{category}/{timestamp}_{filename}`.
//! - Sanitized filename segments are never empty and never contain path
//!   separators or control characters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use uuid::Uuid;

static UNSAFE_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|[:cntrl:]\s]+"#).expect("valid segment regex"));

const FALLBACK_SEGMENT: &str = "file";

/// Expiry settings for presigned URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresignPolicy {
    pub upload_expiry: Duration,
    pub download_expiry: Duration,
}

impl Default for PresignPolicy {
    fn default() -> Self {
        Self {
            upload_expiry: Duration::from_secs(15 * 60),
            download_expiry: Duration::from_secs(5 * 60),
        }
    }
}

/// Builds the deterministic object key for one uploaded document.
pub fn object_key(
    prefix: &str,
    entity_uuid: Uuid,
    category: &str,
    timestamp_ms: i64,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{}/{}_{}",
        sanitize_segment(prefix),
        entity_uuid,
        sanitize_segment(category),
        timestamp_ms,
        sanitize_segment(filename),
    )
}

/// Collapses unsafe character runs to `_` and guarantees a non-empty segment.
pub fn sanitize_segment(value: &str) -> String {
    let replaced = UNSAFE_SEGMENT_RE.replace_all(value.trim(), "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_SEGMENT.to_string()
    } else {
        trimmed.to_string()
    }
}
