//! Storage safety helpers: filename encoding, size caps, guarded JSON parsing.

/// Errors raised when stored data fails a safety check before use.
#[derive(Debug, thiserror::Error)]
pub enum StorageSafetyError {
    #[error("file size exceeds limit ({limit} bytes)")]
    FileSizeExceeded { limit: usize },

    #[error("invalid or malformed JSON document")]
    InvalidFormat,
}

/// Generate a filesystem-safe filename from a username using percent encoding.
///
/// Usernames may contain spaces, unicode, or separator characters; encoding
/// everything non-alphanumeric keeps one flat `users/` directory with no
/// traversal risk.
pub fn safe_filename(username: &str) -> String {
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
    utf8_percent_encode(username, NON_ALPHANUMERIC).to_string()
}

/// Reject files larger than `max_size` bytes before reading them.
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), StorageSafetyError> {
    if size > max_size {
        return Err(StorageSafetyError::FileSizeExceeded {
            limit: max_size as usize,
        });
    }
    Ok(())
}

/// Parse a JSON document with a byte cap and tolerance for leading NULs.
///
/// Interrupted writes have been observed to leave NUL bytes at the front of a
/// file; valid JSON cannot start with one, so stripping them is safe.
pub fn secure_json_parse<T>(content: &str, max_bytes: usize) -> Result<T, StorageSafetyError>
where
    T: serde::de::DeserializeOwned,
{
    if content.len() > max_bytes {
        return Err(StorageSafetyError::FileSizeExceeded { limit: max_bytes });
    }

    let normalized = content.trim_start_matches('\0');

    serde_json::from_str(normalized).map_err(|_| StorageSafetyError::InvalidFormat)
}
