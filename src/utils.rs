// src/utils.rs
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ApiError;

// Lock helpers: a panic while holding one of our locks leaves plain data behind,
// so the poison flag is ignored.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Human-friendly age of a timestamp: "Today", "Yesterday", "3 days ago",
/// "2 weeks ago", "4 months ago".
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - date).num_days().unsigned_abs();

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Content type for an uploaded resume. Only PDF is accepted.
pub fn resume_content_type(filename: &str) -> Result<&'static str, ApiError> {
    match get_file_extension(filename).as_deref() {
        Some("pdf") => Ok("application/pdf"),
        _ => Err(ApiError::InvalidRequest(format!(
            "Unsupported resume format: {}. Please upload a PDF file",
            filename
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_date_buckets() {
        let now = Utc::now();
        assert_eq!(relative_date(now - Duration::hours(3), now), "Today");
        assert_eq!(relative_date(now - Duration::hours(30), now), "Yesterday");
        assert_eq!(relative_date(now - Duration::days(4), now), "4 days ago");
        assert_eq!(relative_date(now - Duration::days(15), now), "2 weeks ago");
        assert_eq!(relative_date(now - Duration::days(95), now), "3 months ago");
    }

    #[test]
    fn test_relative_date_future_uses_absolute_difference() {
        let now = Utc::now();
        assert_eq!(relative_date(now + Duration::days(2), now), "2 days ago");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("resume.PDF"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_resume_content_type() {
        assert_eq!(resume_content_type("cv.pdf").unwrap(), "application/pdf");
        assert!(resume_content_type("cv.docx").is_err());
        assert!(resume_content_type("cv").is_err());
    }
}
