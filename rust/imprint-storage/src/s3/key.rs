//! Object key encoding for S3 request paths.
//!
//! Artifact keys are used verbatim as S3 object keys: the CDN that serves an
//! artifact addresses it by the very same key, so no reversible re-encoding
//! (base58 and the like) may be applied. Each `/`-delimited segment is
//! percent-encoded per RFC 3986 exactly once, which is also the form SigV4
//! expects in the canonical URI.

use std::fmt::Write as FmtWrite;

use crate::StorageError;

/// Percent-encode an object key for use in a request path.
///
/// Unreserved characters (`A-Z`, `a-z`, `0-9`, `-`, `_`, `.`, `~`) and the `/`
/// separators are kept; every other byte becomes `%XX`.
///
/// URL parsers collapse `.` and `..` path segments, which would silently
/// address a different object, so keys containing them are rejected.
pub fn encode(key: &str) -> Result<String, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_owned()));
    }

    key.split('/')
        .map(|segment| match segment {
            "." | ".." => Err(StorageError::InvalidKey(key.to_owned())),
            segment => Ok(percent_encode(segment)),
        })
        .collect::<Result<Vec<String>, StorageError>>()
        .map(|segments| segments.join("/"))
}

/// Percent-encode a string according to RFC 3986.
///
/// Unreserved characters (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) are not encoded.
/// All other bytes are encoded as `%XX` where XX is the uppercase hex value.
pub(crate) fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{:02X}", byte);
            }
        }
    }
    result
}
