/// Hex-encoded BLAKE3 digest of a byte slice.
#[must_use]
pub fn blake3_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
