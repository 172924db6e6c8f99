use honeypot_core::utils::keccak256;

/// Computes the 4-byte selector of a function signature such as `balanceOf(address)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Strips an optional `0x` prefix and decodes hex.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(input.trim().trim_start_matches("0x"))
}
