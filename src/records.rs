//! Byte layouts of the records a writer emits.
//!
//! Each record is assembled in memory and handed to the destination with a
//! single `write_all` so the counting sink observes whole records. All
//! integers are little endian.

use crate::time::{UtcDateTime, EXTENDED_TIMESTAMP_ID};
use crate::utils::PutLe;
use std::io::{self, Write};

pub(crate) const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub(crate) const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub(crate) const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
pub(crate) const END_OF_CENTRAL_DIR_SIGNATURE: u32 = 0x06054b50;

/// Version 2.0: Deflate, directories, and data descriptors.
pub(crate) const VERSION_NEEDED: u16 = 20;

// General purpose bit flags
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x08; // bit 3: crc and sizes follow the data
pub(crate) const FLAG_UTF8_ENCODING: u16 = 0x800; // bit 11: UTF-8 encoding flag (EFS)

/// Fields shared by the local header and the central directory header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeaderFields<'a> {
    pub(crate) flags: u16,
    pub(crate) compression_method: u16,
    pub(crate) last_mod_time: u16,
    pub(crate) last_mod_date: u16,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) file_name: &'a [u8],
    pub(crate) extra_field: &'a [u8],
}

impl HeaderFields<'_> {
    fn put_common(&self, buf: &mut Vec<u8>) {
        buf.put_u16_le(self.flags);
        buf.put_u16_le(self.compression_method);
        buf.put_u16_le(self.last_mod_time);
        buf.put_u16_le(self.last_mod_date);
        buf.put_u32_le(self.crc32);
        buf.put_u32_le(self.compressed_size);
        buf.put_u32_le(self.uncompressed_size);
        buf.put_u16_le(self.file_name.len() as u16);
        buf.put_u16_le(self.extra_field.len() as u16);
    }
}

/// Local file header (APPNOTE 4.3.7), written before an entry's data.
pub(crate) struct LocalFileHeader<'a> {
    pub(crate) fields: HeaderFields<'a>,
}

impl LocalFileHeader<'_> {
    pub(crate) const SIZE: usize = 30;

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let fields = &self.fields;
        let mut buf = Vec::with_capacity(
            Self::SIZE + fields.file_name.len() + fields.extra_field.len(),
        );
        buf.put_u32_le(LOCAL_FILE_HEADER_SIGNATURE);
        buf.put_u16_le(VERSION_NEEDED);
        fields.put_common(&mut buf);
        buf.extend_from_slice(fields.file_name);
        buf.extend_from_slice(fields.extra_field);
        writer.write_all(&buf)
    }
}

/// Data descriptor (APPNOTE 4.3.9), written after an entry's data when
/// general purpose bit 3 is set.
pub(crate) struct DataDescriptor {
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
}

impl DataDescriptor {
    pub(crate) const SIZE: usize = 16;

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u32_le(DATA_DESCRIPTOR_SIGNATURE);
        buf.put_u32_le(self.crc32);
        buf.put_u32_le(self.compressed_size);
        buf.put_u32_le(self.uncompressed_size);
        writer.write_all(&buf)
    }
}

/// Central directory file header (APPNOTE 4.3.12).
pub(crate) struct CentralDirectoryHeader<'a> {
    pub(crate) version_made_by: u16,
    pub(crate) fields: HeaderFields<'a>,
    pub(crate) external_file_attrs: u32,
    pub(crate) local_header_offset: u32,
}

impl CentralDirectoryHeader<'_> {
    pub(crate) const SIZE: usize = 46;

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let fields = &self.fields;
        let mut buf = Vec::with_capacity(
            Self::SIZE + fields.file_name.len() + fields.extra_field.len(),
        );
        buf.put_u32_le(CENTRAL_HEADER_SIGNATURE);
        buf.put_u16_le(self.version_made_by);
        buf.put_u16_le(VERSION_NEEDED);
        fields.put_common(&mut buf);
        buf.put_u16_le(0); // file comment length
        buf.put_u16_le(0); // disk number start
        buf.put_u16_le(0); // internal file attributes
        buf.put_u32_le(self.external_file_attrs);
        buf.put_u32_le(self.local_header_offset);
        buf.extend_from_slice(fields.file_name);
        buf.extend_from_slice(fields.extra_field);
        writer.write_all(&buf)
    }
}

/// End of central directory record (APPNOTE 4.3.16), always without a
/// comment.
pub(crate) struct EndOfCentralDirectory {
    pub(crate) num_entries: u16,
    pub(crate) central_dir_size: u32,
    pub(crate) central_dir_offset: u32,
}

impl EndOfCentralDirectory {
    pub(crate) const SIZE: usize = 22;

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u32_le(END_OF_CENTRAL_DIR_SIGNATURE);
        buf.put_u16_le(0); // number of this disk
        buf.put_u16_le(0); // disk where the central directory starts
        buf.put_u16_le(self.num_entries); // entries on this disk
        buf.put_u16_le(self.num_entries); // total entries
        buf.put_u32_le(self.central_dir_size);
        buf.put_u32_le(self.central_dir_offset);
        buf.put_u16_le(0); // comment length
        writer.write_all(&buf)
    }
}

/// Builds the extended timestamp extra field (0x5455) carrying only the
/// modification time. Empty when no time is given.
pub(crate) fn extended_timestamp_field(modification_time: Option<&UtcDateTime>) -> Vec<u8> {
    let Some(datetime) = modification_time else {
        return Vec::new();
    };

    // The field holds an unsigned 32-bit Unix time
    let unix_time = datetime.to_unix().clamp(0, i64::from(u32::MAX)) as u32;

    let mut buf = Vec::with_capacity(9);
    buf.put_u16_le(EXTENDED_TIMESTAMP_ID);
    buf.put_u16_le(5); // 1 byte flags + 4 bytes timestamp
    buf.put_u8(1); // modification time present
    buf.put_u32_le(unix_time);
    buf
}
