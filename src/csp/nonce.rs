use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;

/// Generate a per-request CSP nonce: 24 random bytes encoded to a
/// 32-character URL-safe string.
pub fn generate_nonce() -> String {
    let mut raw = [0u8; 24];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Extension-map key under which handlers observe the request nonce.
pub const CSP_NONCE_KEY: &str = "csp_nonce";
