use crate::{
    compression::CompressionMethod,
    mode::{self, CREATOR_UNIX},
    path::EntryName,
    records::{
        extended_timestamp_field, CentralDirectoryHeader, HeaderFields, FLAG_DATA_DESCRIPTOR,
        VERSION_NEEDED,
    },
    time::{DosDateTime, UtcDateTime},
    Error,
};
use std::io::Write;

/// Entry count at which the end of central directory record would need the
/// 64-bit variant (0xFFFF is its sentinel).
pub(crate) const MAX_ENTRIES: usize = u16::MAX as usize - 1;

/// Largest size or offset a 32-bit header field records (0xFFFFFFFF is the
/// 64-bit sentinel).
pub(crate) const MAX_FIELD_VALUE: u64 = u32::MAX as u64 - 1;

/// The finalized summary of a closed entry.
///
/// Created when an entry closes and immutable afterwards. The archive writer
/// keeps every descriptor, in write order, and serializes them as the central
/// directory when the archive is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntryDescriptor {
    pub(crate) name: EntryName,
    pub(crate) compression_method: CompressionMethod,
    pub(crate) crc: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) local_header_offset: u64,
    pub(crate) flags: u16,
    pub(crate) modification_time: Option<UtcDateTime>,
    pub(crate) unix_permissions: Option<u32>,
}

impl ZipEntryDescriptor {
    /// The normalized entry name.
    pub fn name(&self) -> &EntryName {
        &self.name
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    /// CRC32 of the uncompressed data.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Number of bytes emitted by the compression filter.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Number of bytes fed into the compression filter.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Absolute position of the entry's local file header.
    pub fn local_header_offset(&self) -> u64 {
        self.local_header_offset
    }

    /// The general purpose bit flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns true if a data descriptor follows the entry's data.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    pub fn is_dir(&self) -> bool {
        self.name.is_dir()
    }

    pub fn modification_time(&self) -> Option<UtcDateTime> {
        self.modification_time
    }

    pub fn unix_permissions(&self) -> Option<u32> {
        self.unix_permissions
    }

    /// The external file attributes recorded in the central directory.
    pub fn external_file_attributes(&self) -> u32 {
        mode::external_attributes(self.unix_permissions, self.is_dir())
    }

    fn version_made_by(&self) -> u16 {
        // Unix permissions are only interpreted when the host is Unix
        let host = self.unix_permissions.map(|_| CREATOR_UNIX).unwrap_or(0);
        (host << 8) | VERSION_NEEDED
    }

    fn write_central_header<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        let (last_mod_time, last_mod_date) = self
            .modification_time
            .as_ref()
            .map(DosDateTime::from)
            .unwrap_or(DosDateTime::EPOCH)
            .into_parts();
        let extra_field = extended_timestamp_field(self.modification_time.as_ref());

        let header = CentralDirectoryHeader {
            version_made_by: self.version_made_by(),
            fields: HeaderFields {
                flags: self.flags,
                compression_method: self.compression_method.as_id(),
                last_mod_time,
                last_mod_date,
                crc32: self.crc,
                compressed_size: field_u32("compressed size", self.compressed_size)?,
                uncompressed_size: field_u32("uncompressed size", self.uncompressed_size)?,
                file_name: self.name.as_str().as_bytes(),
                extra_field: &extra_field,
            },
            external_file_attrs: self.external_file_attributes(),
            local_header_offset: field_u32("local header offset", self.local_header_offset)?,
        };

        header.write(writer)?;
        Ok(())
    }
}

/// Narrows a size or offset to its 32-bit header field.
pub(crate) fn field_u32(what: &'static str, value: u64) -> Result<u32, Error> {
    if value > MAX_FIELD_VALUE {
        return Err(Error::size_limit(what, value));
    }

    Ok(value as u32)
}

/// Ordered collection of closed entries.
#[derive(Debug, Default)]
pub(crate) struct CentralDirectory {
    entries: Vec<ZipEntryDescriptor>,
}

impl CentralDirectory {
    pub(crate) fn new() -> Self {
        CentralDirectory {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: ZipEntryDescriptor) {
        debug_assert!(
            self.entries
                .last()
                .map_or(true, |last| last.local_header_offset <= entry.local_header_offset),
            "local header offsets must not decrease"
        );
        self.entries.push(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when another entry would overflow the record count.
    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }

    pub(crate) fn entries(&self) -> &[ZipEntryDescriptor] {
        &self.entries
    }

    /// Writes one central directory header per entry, in insertion order.
    pub(crate) fn write_records<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        for entry in &self.entries {
            entry.write_central_header(writer)?;
        }
        Ok(())
    }
}
