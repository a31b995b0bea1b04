//! Object/package/export flag bitsets shared by both package formats

use bitflags::bitflags;

bitflags! {
    /// `UObject` flags, as stored in both legacy export entries and zen export
    /// map entries. Only the bits the converters inspect are named; the rest
    /// pass through untouched.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct EObjectFlags: u32 {
        /// No flags
        const NONE = 0x0000_0000;
        /// Object is visible outside its package
        const PUBLIC = 0x0000_0001;
        /// Object is standalone, kept alive as long as its package is loaded
        const STANDALONE = 0x0000_0002;
        /// Object can be saved as part of a transaction
        const TRANSACTIONAL = 0x0000_0008;
        /// Object is a class default object
        const CLASS_DEFAULT_OBJECT = 0x0000_0010;
        /// Object is part of an archetype hierarchy
        const ARCH_TYPE_OBJECT = 0x0000_0020;
    }

    /// `UPackage` flags
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct EPackageFlags: u32 {
        /// No flags
        const NONE = 0x0000_0000;
        /// Package is cooked
        const COOKED = 0x0000_0008;
        /// Package was produced for a specific localized culture
        const FILTER_EDITOR_ONLY = 0x8000_0000;
        /// Package's name map contains Unicode entries
        const UNVERSIONED = 0x2000_0000;
    }

    /// Zen export map filter flags (§3)
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct EExportFilterFlags: u8 {
        /// Export loads on both client and server
        const NONE = 0x0;
        /// Export is stripped on clients
        const NOT_FOR_CLIENT = 0x1;
        /// Export is stripped on servers
        const NOT_FOR_SERVER = 0x2;
    }
}

/// Legacy export filter bits, carried as two separate booleans rather than a
/// bitset on the wire (§6). Converts 1:1 with [`EExportFilterFlags`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LegacyExportFilter {
    /// Not loaded on clients
    pub not_for_client: bool,
    /// Not loaded on servers
    pub not_for_server: bool,
}

impl From<EExportFilterFlags> for LegacyExportFilter {
    fn from(flags: EExportFilterFlags) -> Self {
        LegacyExportFilter {
            not_for_client: flags.contains(EExportFilterFlags::NOT_FOR_CLIENT),
            not_for_server: flags.contains(EExportFilterFlags::NOT_FOR_SERVER),
        }
    }
}

impl From<LegacyExportFilter> for EExportFilterFlags {
    fn from(filter: LegacyExportFilter) -> Self {
        let mut flags = EExportFilterFlags::NONE;
        if filter.not_for_client {
            flags |= EExportFilterFlags::NOT_FOR_CLIENT;
        }
        if filter.not_for_server {
            flags |= EExportFilterFlags::NOT_FOR_SERVER;
        }
        flags
    }
}
