//! Bidirectional codec between legacy uasset and zen/IoStore cooked package
//! containers.
//!
//! This crate parses and serializes both cooked package header formats and
//! converts between them. It does not interpret export bodies, resolve
//! asset paths against a running project, or manage bulk-data files beyond
//! carrying their bytes through unchanged; callers that need those things
//! layer them on top through [`ForeignPackageContext`] and
//! [`ScriptObjectsDatabase`].

pub mod containers;
pub mod convert;
pub mod crc;
pub mod error;
pub mod flags;
pub mod legacy;
pub mod name_batch;
pub mod object_index;
pub mod script_objects;
pub mod types;
pub mod zen;

pub use convert::{ConversionOptions, ForeignPackageContext, ForeignPackageView, ForeignExportView, NullForeignPackageContext};
pub use error::Error;
pub use legacy::LegacyPackage;
pub use name_batch::NameEncoding;
pub use script_objects::{ScriptObjectEntry, ScriptObjectsDatabase};
pub use zen::ZenPackage;

/// Parse a legacy header plus its exports blob into a [`LegacyPackage`].
///
/// `bulk_data` carries the contents of a sibling `.ubulk` file, if the
/// package has one; it is stored on the result untouched.
pub fn parse_legacy_package(
    header_bytes: &[u8],
    exports_bytes: &[u8],
    bulk_data: Option<Vec<u8>>,
) -> Result<LegacyPackage, Error> {
    legacy::reader::read_legacy_package(header_bytes, exports_bytes, bulk_data)
}

/// Serialize a [`LegacyPackage`] back into its header and exports byte
/// streams.
pub fn write_legacy_package(package: &LegacyPackage) -> Result<(Vec<u8>, Vec<u8>), Error> {
    legacy::writer::write_legacy_package(package)
}

/// Parse a zen/IoStore package's serialized header and trailing body into a
/// [`ZenPackage`].
pub fn parse_zen_package(bytes: &[u8]) -> Result<ZenPackage, Error> {
    zen::reader::read_zen_package(bytes)
}

/// Serialize a [`ZenPackage`] back into a single byte buffer.
pub fn write_zen_package(package: &ZenPackage, encoding: NameEncoding) -> Result<Vec<u8>, Error> {
    zen::writer::write_zen_package(package, encoding)
}

/// Convert a legacy header plus exports blob directly into serialized zen
/// bytes, round-tripping through [`LegacyPackage`] and [`ZenPackage`] (§4.3).
///
/// `package_path` is the cooked package's own content path, e.g.
/// `/Game/Characters/Hero`, needed to detect self-referencing imports and to
/// name the package in its own summary.
pub fn convert_legacy_to_zen(
    header_bytes: &[u8],
    exports_bytes: &[u8],
    bulk_data: Option<Vec<u8>>,
    package_path: &str,
    options: &ConversionOptions,
) -> Result<Vec<u8>, Error> {
    let legacy_package = parse_legacy_package(header_bytes, exports_bytes, bulk_data)?;
    let zen_package = convert::legacy_to_zen::convert(&legacy_package, package_path, options)?;
    write_zen_package(&zen_package, options.name_encoding)
}

/// Convert serialized zen bytes directly into a legacy header plus exports
/// blob, round-tripping through [`ZenPackage`] and [`LegacyPackage`] (§4.2).
///
/// Returns `(header_bytes, exports_bytes, bulk_data)`; `bulk_data` is always
/// `None` since zen packages carry no sibling bulk-data file reference.
pub fn convert_zen_to_legacy(
    zen_bytes: &[u8],
    context: &dyn ForeignPackageContext,
    options: &ConversionOptions,
) -> Result<(Vec<u8>, Vec<u8>, Option<Vec<u8>>), Error> {
    let zen_package = parse_zen_package(zen_bytes)?;
    let legacy_package = convert::zen_to_legacy::convert(&zen_package, context, options)?;
    let (header_bytes, exports_bytes) = write_legacy_package(&legacy_package)?;
    Ok((header_bytes, exports_bytes, legacy_package.bulk_data.clone()))
}
