/// The lowercase hex MD5 digest of a request's raw bytes.
///
/// Used only to recognise repeated requests. It is not a security boundary:
/// anyone can compute it and collisions merely return a previously rendered
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The 32 hex characters of the digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint `bytes` exactly as they were received.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint(format!("{:x}", md5::compute(bytes)))
}
