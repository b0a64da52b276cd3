//! Domain types for referral letter batches.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Minimum length of a referral reference. Shorter values are rejected
/// before any network call.
pub const MIN_REFERENCE_LEN: usize = 10;

/// A referral reference that failed length validation.
#[derive(Debug, Clone, Error)]
#[error("Invalid referral ref: {0}")]
pub struct InvalidReference(pub String);

/// Validate the shape of a referral reference.
pub fn validate_reference(reference: &str) -> Result<(), InvalidReference> {
    if reference.len() < MIN_REFERENCE_LEN {
        return Err(InvalidReference(reference.to_string()));
    }
    Ok(())
}

/// Filename a letter is stored under.
pub fn letter_filename(reference: &str) -> String {
    format!("referral-{}.pdf", reference)
}

/// Deterministic on-disk path for a reference inside the output directory.
pub fn letter_path(output_dir: &Path, reference: &str) -> PathBuf {
    output_dir.join(letter_filename(reference))
}

/// A single reference that could not be downloaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub reference: String,
    pub error: String,
}

/// Batch completion signal reported to the host after a run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: Vec<FailedDownload>,
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reference_minimum_length() {
        assert!(validate_reference("ABCDEFGHIJ").is_ok());
        assert!(validate_reference("ABCDEFGHIJK").is_ok());
        assert!(validate_reference("ABCDEFGHI").is_err());
        assert!(validate_reference("").is_err());
    }

    #[test]
    fn test_invalid_reference_message() {
        let err = validate_reference("short").unwrap_err();
        assert_eq!(err.to_string(), "Invalid referral ref: short");
    }

    #[test]
    fn test_letter_path_is_deterministic() {
        let dir = Path::new("/tmp/letters");
        assert_eq!(
            letter_path(dir, "ABCDEFGHIJ"),
            PathBuf::from("/tmp/letters/referral-ABCDEFGHIJ.pdf")
        );
        assert_eq!(
            letter_path(dir, "ABCDEFGHIJ"),
            letter_path(dir, "ABCDEFGHIJ")
        );
    }
}
