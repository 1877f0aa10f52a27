use crate::Fingerprint;

/// The file name used when a request does not name one.
pub const DEFAULT_FILENAME: &str = "generated.pdf";

/// Where an artifact is stored: `[namespace/]fingerprint/filename`.
///
/// The namespace and file name are used as given. A `/` inside either adds
/// path segments, and nothing is escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compose the storage key of a request.
///
/// An absent or empty `filename` becomes [DEFAULT_FILENAME]; an absent or
/// empty `namespace` is left out.
pub fn build_key(
    fingerprint: &Fingerprint,
    namespace: Option<&str>,
    filename: Option<&str>,
) -> CacheKey {
    let filename = filename
        .filter(|filename| !filename.is_empty())
        .unwrap_or(DEFAULT_FILENAME);

    CacheKey(match namespace.filter(|namespace| !namespace.is_empty()) {
        Some(namespace) => format!("{namespace}/{fingerprint}/{filename}"),
        None => format!("{fingerprint}/{filename}"),
    })
}
