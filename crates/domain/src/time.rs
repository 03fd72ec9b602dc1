//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for input samples and task execution times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert milliseconds since the Unix epoch, as reported by input
/// samplers, into a [`Timestamp`].
///
/// Returns `None` when the value is out of the representable range.
#[must_use]
pub fn from_unix_millis(millis: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(millis)
}
