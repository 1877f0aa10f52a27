use base64::Engine;

/// Encodes `bytes` with the standard base64 alphabet and then swaps the three
/// characters that are not safe in a query string: `+` becomes `-`, `=`
/// becomes `_` and `/` becomes `~`.
///
/// This is the alphabet CloudFront expects for `Signature` and `Policy`
/// parameters; it is neither the standard nor the RFC 4648 URL-safe alphabet.
pub fn url_safe_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD
        .encode(bytes)
        .chars()
        .map(|character| match character {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}
