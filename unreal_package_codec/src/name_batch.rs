//! The shared hashed, length-tagged name-table codec (§4.1)
//!
//! Used for the zen package's own name map and for the imported-package-names
//! section (§6). The legacy header's name table uses a simpler, unhashed,
//! per-entry fstring format instead (see `legacy::reader`/`legacy::writer`).
//! Layout:
//!
//! ```text
//! count: u32                      // 0 => nothing else follows
//! total_string_bytes: u32
//! hash_algorithm_id: u64          // always HASH_VERSION_CITYHASH64
//! hash[count]: u64                // CityHash64 of the lowercase byte form
//! header[count]: i16 (big-endian) // positive = ascii length, negative = utf16 code units
//! bytes                           // concatenated string bytes, no padding
//! ```

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, BE, LE};

use crate::crc;
use crate::error::Error;

/// Selects how non-ASCII names are encoded.
///
/// [`NameEncoding::Strict`] is the default and preserves non-ASCII names as
/// UTF-16. [`NameEncoding::Lossy`] downgrades them to ASCII by replacing every
/// non-ASCII code point with `'?'`; it exists only for compatibility with one
/// specific consumer that cannot read UTF-16 name batch entries and should be
/// treated as a compatibility hack, not a default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NameEncoding {
    /// Preserve non-ASCII names as UTF-16 (default)
    #[default]
    Strict,
    /// Replace non-ASCII code points with `'?'`
    Lossy,
}

fn encoded_form(name: &str, encoding: NameEncoding) -> String {
    match encoding {
        NameEncoding::Strict => name.to_string(),
        NameEncoding::Lossy => name
            .chars()
            .map(|c| if c.is_ascii() { c } else { '?' })
            .collect(),
    }
}

/// Write a name batch to `writer`.
pub fn write_name_batch<W: Write>(
    writer: &mut W,
    names: &[String],
    encoding: NameEncoding,
) -> Result<(), Error> {
    if names.is_empty() {
        writer.write_u32::<LE>(0)?;
        return Ok(());
    }

    let encoded: Vec<String> = names.iter().map(|n| encoded_form(n, encoding)).collect();

    let mut byte_forms = Vec::with_capacity(encoded.len());
    let mut total_bytes = 0u32;
    for name in &encoded {
        let is_ascii = name.chars().all(|c| (c as u32) <= 127);
        let bytes = if is_ascii {
            name.as_bytes().to_vec()
        } else {
            name.encode_utf16().flat_map(u16::to_le_bytes).collect()
        };
        total_bytes += bytes.len() as u32;
        byte_forms.push((is_ascii, bytes));
    }

    writer.write_u32::<LE>(encoded.len() as u32)?;
    writer.write_u32::<LE>(total_bytes)?;
    writer.write_u64::<LE>(crc::HASH_VERSION_CITYHASH64)?;

    for name in &encoded {
        writer.write_u64::<LE>(crc::cityhash64_to_lower(name))?;
    }

    for (is_ascii, bytes) in &byte_forms {
        let header: i16 = if *is_ascii {
            bytes.len() as i16
        } else {
            let code_units = (bytes.len() / 2) as i32;
            (code_units + i32::from(i16::MIN)) as i16
        };
        writer.write_i16::<BE>(header)?;
    }

    for (_, bytes) in &byte_forms {
        writer.write_all(bytes)?;
    }

    Ok(())
}

/// Read a name batch from `reader`, verifying every stored hash matches the
/// CityHash64 of the decoded name's lowercase byte form.
pub fn read_name_batch<R: Read>(reader: &mut R) -> Result<Vec<String>, Error> {
    let count = reader.read_u32::<LE>()?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let _total_bytes = reader.read_u32::<LE>()?;
    let hash_version = reader.read_u64::<LE>()?;
    if hash_version != crc::HASH_VERSION_CITYHASH64 {
        return Err(Error::unimplemented(format!(
            "unsupported name batch hash algorithm id {hash_version:#x}"
        )));
    }

    let mut hashes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        hashes.push(reader.read_u64::<LE>()?);
    }

    let mut headers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        headers.push(reader.read_i16::<BE>()?);
    }

    let mut names = Vec::with_capacity(count as usize);
    for (i, header) in headers.into_iter().enumerate() {
        let name = if header >= 0 {
            let mut bytes = vec![0u8; header as usize];
            reader.read_exact(&mut bytes)?;
            String::from_utf8(bytes)?
        } else {
            let code_units = (header as i32 - i32::from(i16::MIN)) as usize;
            let mut bytes = vec![0u8; code_units * 2];
            reader.read_exact(&mut bytes)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units)?
        };

        let expected_hash = crc::cityhash64_to_lower(&name);
        if expected_hash != hashes[i] {
            return Err(Error::malformed(
                "name batch",
                0,
                format!(
                    "hash mismatch for entry {i}: expected {:#x}, got {:#x} ({name:?})",
                    hashes[i], expected_hash
                ),
            ));
        }

        names.push(name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(names: &[&str], encoding: NameEncoding) -> Vec<String> {
        let owned: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let mut buf = Vec::new();
        write_name_batch(&mut buf, &owned, encoding).unwrap();
        read_name_batch(&mut buf.as_slice()).unwrap()
    }

    #[test]
    fn empty_batch_round_trips() {
        assert_eq!(round_trip(&[], NameEncoding::Strict), Vec::<String>::new());
    }

    #[test]
    fn ascii_batch_round_trips() {
        let names = ["Widget", "StaticMesh", "Actor_3"];
        assert_eq!(round_trip(&names, NameEncoding::Strict), names);
    }

    #[test]
    fn unicode_batch_round_trips_strict() {
        let names = ["Caf\u{e9}", "\u{65e5}\u{672c}\u{8a9e}"];
        assert_eq!(round_trip(&names, NameEncoding::Strict), names);
    }

    #[test]
    fn lossy_mode_downgrades_non_ascii() {
        let mut buf = Vec::new();
        write_name_batch(
            &mut buf,
            &["Caf\u{e9}".to_string()],
            NameEncoding::Lossy,
        )
        .unwrap();
        let decoded = read_name_batch(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, vec!["Caf?".to_string()]);
    }
}
