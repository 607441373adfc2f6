//! Opaque refresh tokens.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

/// Random bytes per refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Generate a refresh token: 64 bytes from a CSPRNG, base64 encoded.
/// Compared only by exact equality, never parsed.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}
