//! Hashing helpers shared by the name batch codec and the reference translators
//!
//! Every hash in this codec is a CityHash64 over a *case-folded* byte form of a
//! string: ASCII bytes if every code point is `<= 127`, UTF-16LE bytes otherwise.
//! This one rule backs the name batch hashes (§4.1), [`PackageId`](crate::types::PackageId)
//! and public export hashes (§3), and script-import path hashes (§4.3).

use naive_cityhash::cityhash64;

/// Hash-algorithm id written at the start of every non-empty name batch.
pub const HASH_VERSION_CITYHASH64: u64 = 0xC1640000;

/// Case-fold a string to lowercase, ASCII-aware but also lowercasing non-ASCII
/// via `char::to_lowercase`, matching the runtime's `FString::ToLower`.
pub fn to_lower_string(value: &str) -> String {
    value.to_lowercase()
}

/// Byte form fed to CityHash64 for a name or path: ASCII bytes when every code
/// point fits in a byte, UTF-16LE bytes otherwise.
pub fn hashable_bytes(value: &str) -> Vec<u8> {
    if value.chars().all(|c| (c as u32) <= 127) {
        value.as_bytes().to_vec()
    } else {
        value
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect()
    }
}

/// CityHash64 over the lowercase byte form of `value`. This is the hash used
/// for name-batch entries, `PackageId`, and `public_export_hash`.
pub fn cityhash64_to_lower(value: &str) -> u64 {
    let lower = to_lower_string(value);
    cityhash64(&hashable_bytes(&lower))
}

/// `PackageId` hashes clear the top bit of the raw CityHash64 result.
pub fn package_id_hash(package_path: &str) -> u64 {
    cityhash64_to_lower(package_path) & 0x7FFF_FFFF_FFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_case_folded_before_hashing() {
        assert_eq!(cityhash64_to_lower("Widget"), cityhash64_to_lower("widget"));
    }

    #[test]
    fn package_id_hash_clears_top_bit() {
        let hash = package_id_hash("/Game/Library");
        assert_eq!(hash & 0x8000_0000_0000_0000, 0);
    }
}
