#![forbid(unsafe_code)]

use crate::error::CallableError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Renders a stored epoch-millisecond timestamp for callable responses.
///
/// Timestamps outside what RFC 3339 can express are an internal error rather than a
/// silently substituted epoch.
pub(crate) fn rfc3339_from_ms(ts_ms: i64) -> Result<String, CallableError> {
    let out_of_range =
        |detail: String| CallableError::Internal(format!("timestamp {ts_ms}ms: {detail}"));
    let nanos = i128::from(ts_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|err| out_of_range(err.to_string()))?
        .format(&Rfc3339)
        .map_err(|err| out_of_range(err.to_string()))
}
