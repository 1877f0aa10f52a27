use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};

/// Generate a deterministic 1024-bit RSA key from `seed`.
///
/// Small keys keep test runs fast; never use them outside of tests.
pub fn generate_test_key(seed: u64) -> RsaPrivateKey {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RsaPrivateKey::new(&mut rng, 1024).expect("Failed to generate test key")
}

/// Encode `key` as a PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM document.
pub fn pkcs1_pem(key: &RsaPrivateKey) -> Result<String, rsa::pkcs1::Error> {
    Ok(key.to_pkcs1_pem(LineEnding::LF)?.to_string())
}

/// Encode `key` as a PKCS#8 (`BEGIN PRIVATE KEY`) PEM document.
pub fn pkcs8_pem(key: &RsaPrivateKey) -> Result<String, rsa::pkcs8::Error> {
    Ok(key.to_pkcs8_pem(LineEnding::LF)?.to_string())
}
