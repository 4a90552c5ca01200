use crate::{
    compression::{CompressionMethod, Compressor, DEFAULT_COMPRESSION_LEVEL},
    counting::CountWriter,
    crc::Crc32,
    directory::{field_u32, CentralDirectory, ZipEntryDescriptor},
    errors::ErrorKind,
    path::EntryName,
    records::{
        extended_timestamp_field, DataDescriptor, EndOfCentralDirectory, HeaderFields,
        LocalFileHeader, FLAG_DATA_DESCRIPTOR, FLAG_UTF8_ENCODING,
    },
    time::{DosDateTime, UtcDateTime},
    Error,
};
use log::{debug, trace, warn};
use std::io::{self, Write};

/// Builds a `ZipArchiveWriter`.
#[derive(Debug, Clone)]
pub struct ZipArchiveWriterBuilder {
    count: u64,
    compression_level: u32,
}

impl ZipArchiveWriterBuilder {
    /// Creates a new `ZipArchiveWriterBuilder`.
    pub fn new() -> Self {
        ZipArchiveWriterBuilder {
            count: 0,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Starts writing at `offset`.
    ///
    /// This is useful when the archive is appended to existing data (eg: a
    /// self extracting stub) as every recorded offset is absolute.
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.count = offset;
        self
    }

    /// Sets the default Deflate level (0-9) of file entries.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Builds a `ZipArchiveWriter` that writes to `writer`.
    pub fn build<W: Write>(&self, writer: W) -> ZipArchiveWriter<W> {
        ZipArchiveWriter {
            writer: CountWriter::new(writer, self.count),
            directory: CentralDirectory::new(),
            session: EntrySession::None,
            state: ArchiveState::Writing,
            compression_level: self.compression_level,
            scratch: Vec::new(),
        }
    }
}

impl Default for ZipArchiveWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveState {
    Writing,
    Finished,
    Poisoned,
}

/// At most one file entry is open at a time.
#[derive(Debug)]
enum EntrySession {
    /// Nothing has been written yet.
    None,
    Open(OpenEntry),
    /// The latest entry has been closed.
    Closed,
}

#[derive(Debug)]
struct OpenEntry {
    name: EntryName,
    local_header_offset: u64,
    flags: u16,
    compressor: Box<dyn Compressor>,
    crc: Crc32,
    uncompressed_size: u64,
    compressed_size: u64,
    modification_time: Option<UtcDateTime>,
    unix_permissions: Option<u32>,
}

/// Streams a Zip archive to a destination that may not be seekable.
///
/// Entries are written one at a time: open one with [`new_file`], write its
/// data through [`write_data`] (or the [`std::io::Write`] impl), and close
/// it with [`close_entry`]. Since the destination is never rewound, every
/// file entry's local header records zeroed sizes and a data descriptor
/// carrying the CRC and sizes follows the entry data.
///
/// Finishing the archive closes a still open entry before writing the
/// central directory. This happens for [`finish`], [`close`], and when the
/// writer is dropped, so an archive is never finalized without its last
/// entry.
///
/// ```rust
/// use std::io::Write;
/// use streamzip::{CompressionMethod, ZipArchiveWriter};
///
/// let mut archive = ZipArchiveWriter::new(Vec::new());
/// archive
///     .new_file("hello.txt")
///     .compression_method(CompressionMethod::Deflate)
///     .create()?;
/// archive.write_all(b"Hello, world!")?;
/// let entry = archive.close_entry()?;
/// assert_eq!(entry.uncompressed_size(), 13);
///
/// archive.new_file("dangling.txt").create()?;
/// archive.write_all(b"closed by finish")?;
/// let output = archive.finish()?;
/// assert_eq!(&output[..4], b"PK\x03\x04");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// [`new_file`]: ZipArchiveWriter::new_file
/// [`write_data`]: ZipArchiveWriter::write_data
/// [`close_entry`]: ZipArchiveWriter::close_entry
/// [`finish`]: ZipArchiveWriter::finish
/// [`close`]: ZipArchiveWriter::close
#[derive(Debug)]
pub struct ZipArchiveWriter<W: Write> {
    writer: CountWriter<W>,
    directory: CentralDirectory,
    session: EntrySession,
    state: ArchiveState,
    compression_level: u32,
    scratch: Vec<u8>,
}

impl<W: Write> ZipArchiveWriter<W> {
    /// Creates a new `ZipArchiveWriter` that writes to `writer`.
    pub fn new(writer: W) -> Self {
        ZipArchiveWriterBuilder::new().build(writer)
    }

    /// Creates a builder for adding a new file to the archive.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::io::Write;
    /// # let mut archive = streamzip::ZipArchiveWriter::new(Vec::new());
    /// archive.new_file("my-file")
    ///     .compression_method(streamzip::CompressionMethod::Deflate)
    ///     .unix_permissions(0o644)
    ///     .create()?;
    /// archive.write_all(b"Hello, world!")?;
    /// archive.close_entry()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn new_file<'a>(&'a mut self, name: &'a str) -> ZipFileBuilder<'a, W> {
        ZipFileBuilder {
            archive: self,
            name,
            options: FileOptions::default(),
        }
    }

    /// Creates a builder for adding a new directory to the archive.
    ///
    /// The name of the directory must end with a `/`.
    ///
    /// ```rust
    /// # let mut archive = streamzip::ZipArchiveWriter::new(Vec::new());
    /// archive.new_dir("my-dir/")
    ///     .unix_permissions(0o755)
    ///     .create()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn new_dir<'a>(&'a mut self, name: &'a str) -> ZipDirBuilder<'a, W> {
        ZipDirBuilder {
            archive: self,
            name,
            options: DirOptions::default(),
        }
    }

    /// Appends uncompressed bytes to the open file entry.
    ///
    /// The data is checksummed, fed through the entry's compressor, and
    /// whatever the compressor produces is written to the destination.
    /// Writing an empty slice does nothing.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NoEntryOpen`] when no entry is open. A failure
    /// from the destination or compressor leaves the archive unusable.
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ensure_writable()?;
        let EntrySession::Open(entry) = &mut self.session else {
            return Err(Error::from(ErrorKind::NoEntryOpen));
        };

        if data.is_empty() {
            return Ok(());
        }

        let result = stream_data(&mut self.writer, entry, &mut self.scratch, data);
        self.poison_on_err(result)
    }

    /// Closes the open file entry.
    ///
    /// Flushes the compressor, writes the data descriptor, and records the
    /// entry for the central directory.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::NoEntryOpen`] if no entry was ever opened and
    /// [`ErrorKind::EntryAlreadyClosed`] if the latest entry is already
    /// closed.
    pub fn close_entry(&mut self) -> Result<ZipEntryDescriptor, Error> {
        self.ensure_writable()?;
        match std::mem::replace(&mut self.session, EntrySession::Closed) {
            EntrySession::Open(entry) => {
                let result = self.finish_entry(entry);
                self.poison_on_err(result)
            }
            EntrySession::None => {
                self.session = EntrySession::None;
                Err(Error::from(ErrorKind::NoEntryOpen))
            }
            EntrySession::Closed => Err(Error::from(ErrorKind::EntryAlreadyClosed)),
        }
    }

    /// Returns true while a file entry accepts data.
    pub fn is_entry_open(&self) -> bool {
        matches!(self.session, EntrySession::Open(_))
    }

    /// Returns true once the central directory has been written.
    pub fn is_finished(&self) -> bool {
        self.state == ArchiveState::Finished
    }

    /// The entries closed so far, in the order they were written.
    pub fn entries(&self) -> &[ZipEntryDescriptor] {
        self.directory.entries()
    }

    /// The absolute position the next byte will be written at.
    pub fn offset(&self) -> u64 {
        self.writer.count()
    }

    /// Finishes the archive, releasing the destination.
    ///
    /// An open entry is closed first, then the central directory and the end
    /// of central directory record are written and the destination is
    /// flushed. Calling `close` on a finished archive does nothing.
    pub fn close(&mut self) -> Result<(), Error> {
        self.finalize().map(|_| ())
    }

    /// Finishes the archive and returns the underlying writer.
    ///
    /// See [`close`](ZipArchiveWriter::close) for what finishing entails.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ArchiveFinished`] if the archive was already
    /// closed, as the destination has been released.
    pub fn finish(mut self) -> Result<W, Error> {
        match self.finalize()? {
            Some(writer) => Ok(writer),
            None => Err(Error::from(ErrorKind::ArchiveFinished)),
        }
    }

    fn ensure_writable(&self) -> Result<(), Error> {
        match self.state {
            ArchiveState::Writing => Ok(()),
            ArchiveState::Finished => Err(Error::from(ErrorKind::ArchiveFinished)),
            ArchiveState::Poisoned => Err(Error::from(ErrorKind::Poisoned)),
        }
    }

    fn ensure_no_open_entry(&self) -> Result<(), Error> {
        match &self.session {
            EntrySession::Open(entry) => Err(Error::from(ErrorKind::EntryAlreadyOpen {
                name: entry.name.to_string(),
            })),
            _ => Ok(()),
        }
    }

    /// Checks the limits a new entry's records must fit in, before anything
    /// is written.
    fn ensure_entry_fits(&self) -> Result<u64, Error> {
        if self.directory.is_full() {
            return Err(Error::size_limit(
                "entry count",
                self.directory.len() as u64 + 1,
            ));
        }

        let local_header_offset = self.writer.count();
        field_u32("local header offset", local_header_offset)?;
        Ok(local_header_offset)
    }

    fn poison_on_err<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if result.is_err() {
            self.state = ArchiveState::Poisoned;
        }
        result
    }

    fn open_file(&mut self, name: &str, options: FileOptions) -> Result<(), Error> {
        self.ensure_writable()?;
        self.ensure_no_open_entry()?;
        let name = EntryName::file(name)?;
        let local_header_offset = self.ensure_entry_fits()?;

        let mut flags = FLAG_DATA_DESCRIPTOR;
        if name.needs_utf8_encoding() {
            flags |= FLAG_UTF8_ENCODING;
        }

        let compressor = match options.compressor {
            Some(compressor) => compressor,
            None => {
                let level = options.compression_level.unwrap_or(self.compression_level);
                options.compression_method.compressor(level)
            }
        };

        let result = self.write_local_header(
            &name,
            flags,
            compressor.method(),
            options.modification_time.as_ref(),
        );
        self.poison_on_err(result)?;

        debug!(
            "opened entry {} at offset {} ({:?})",
            name,
            local_header_offset,
            compressor.method()
        );

        self.session = EntrySession::Open(OpenEntry {
            name,
            local_header_offset,
            flags,
            compressor,
            crc: Crc32::new(),
            uncompressed_size: 0,
            compressed_size: 0,
            modification_time: options.modification_time,
            unix_permissions: options.unix_permissions,
        });

        Ok(())
    }

    fn add_dir(&mut self, name: &str, options: DirOptions) -> Result<ZipEntryDescriptor, Error> {
        self.ensure_writable()?;
        self.ensure_no_open_entry()?;
        let name = EntryName::dir(name)?;
        let local_header_offset = self.ensure_entry_fits()?;

        let flags = if name.needs_utf8_encoding() {
            FLAG_UTF8_ENCODING
        } else {
            0
        };

        let result = self.write_local_header(
            &name,
            flags,
            CompressionMethod::Store,
            options.modification_time.as_ref(),
        );
        self.poison_on_err(result)?;

        debug!("added directory {} at offset {}", name, local_header_offset);

        let descriptor = ZipEntryDescriptor {
            name,
            compression_method: CompressionMethod::Store,
            crc: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset,
            flags,
            modification_time: options.modification_time,
            unix_permissions: options.unix_permissions,
        };
        self.directory.push(descriptor.clone());
        self.session = EntrySession::Closed;
        Ok(descriptor)
    }

    /// Writes a local file header with zeroed crc and sizes.
    fn write_local_header(
        &mut self,
        name: &EntryName,
        flags: u16,
        compression_method: CompressionMethod,
        modification_time: Option<&UtcDateTime>,
    ) -> Result<(), Error> {
        let (last_mod_time, last_mod_date) = modification_time
            .map(DosDateTime::from)
            .unwrap_or(DosDateTime::EPOCH)
            .into_parts();
        let extra_field = extended_timestamp_field(modification_time);

        let header = LocalFileHeader {
            fields: HeaderFields {
                flags,
                compression_method: compression_method.as_id(),
                last_mod_time,
                last_mod_date,
                crc32: 0,
                compressed_size: 0,
                uncompressed_size: 0,
                file_name: name.as_str().as_bytes(),
                extra_field: &extra_field,
            },
        };

        header.write(&mut self.writer)?;
        Ok(())
    }

    fn finish_entry(&mut self, entry: OpenEntry) -> Result<ZipEntryDescriptor, Error> {
        let OpenEntry {
            name,
            local_header_offset,
            flags,
            compressor,
            crc,
            uncompressed_size,
            mut compressed_size,
            modification_time,
            unix_permissions,
        } = entry;

        let compression_method = compressor.method();
        self.scratch.clear();
        compressor.finish(&mut self.scratch)?;
        self.writer.write_all(&self.scratch)?;
        compressed_size += self.scratch.len() as u64;

        let crc = crc.value();
        let data_descriptor = DataDescriptor {
            crc32: crc,
            compressed_size: field_u32("compressed size", compressed_size)?,
            uncompressed_size: field_u32("uncompressed size", uncompressed_size)?,
        };
        data_descriptor.write(&mut self.writer)?;

        debug!(
            "closed entry {}: crc 0x{:08x}, {} bytes in, {} bytes out",
            name, crc, uncompressed_size, compressed_size
        );

        let descriptor = ZipEntryDescriptor {
            name,
            compression_method,
            crc,
            compressed_size,
            uncompressed_size,
            local_header_offset,
            flags,
            modification_time,
            unix_permissions,
        };
        self.directory.push(descriptor.clone());
        Ok(descriptor)
    }

    fn finalize(&mut self) -> Result<Option<W>, Error> {
        match self.state {
            ArchiveState::Finished => return Ok(None),
            ArchiveState::Poisoned => return Err(Error::from(ErrorKind::Poisoned)),
            ArchiveState::Writing => {}
        }
        debug_assert!(!self.writer.is_closed());

        let result = self.write_central_directory();
        self.poison_on_err(result)?;

        let result = self.writer.close().map_err(Error::io);
        let writer = self.poison_on_err(result)?;
        self.state = ArchiveState::Finished;
        Ok(writer)
    }

    fn write_central_directory(&mut self) -> Result<(), Error> {
        // An entry left open is closed before anything else so that it is
        // both part of the directory and ahead of the directory offset.
        let session = std::mem::replace(&mut self.session, EntrySession::Closed);
        if let EntrySession::Open(entry) = session {
            debug!("auto-closing entry {} before finishing archive", entry.name);
            self.finish_entry(entry)?;
        }
        debug_assert!(!self.is_entry_open(), "directory written with an open entry");

        let central_dir_offset = self.writer.count();
        let offset_field = field_u32("central directory offset", central_dir_offset)?;
        let num_entries = u16::try_from(self.directory.len())
            .map_err(|_| Error::size_limit("entry count", self.directory.len() as u64))?;

        self.directory.write_records(&mut self.writer)?;
        let central_dir_size = self.writer.count() - central_dir_offset;

        let eocd = EndOfCentralDirectory {
            num_entries,
            central_dir_size: field_u32("central directory size", central_dir_size)?,
            central_dir_offset: offset_field,
        };
        eocd.write(&mut self.writer)?;

        debug!(
            "finished archive: {} entries, central directory of {} bytes at offset {}",
            num_entries, central_dir_size, central_dir_offset
        );

        Ok(())
    }
}

fn stream_data<W: Write>(
    writer: &mut CountWriter<W>,
    entry: &mut OpenEntry,
    scratch: &mut Vec<u8>,
    data: &[u8],
) -> Result<(), Error> {
    entry.crc.update(data);

    scratch.clear();
    entry.compressor.feed(data, scratch)?;
    writer.write_all(scratch)?;

    entry.uncompressed_size += data.len() as u64;
    entry.compressed_size += scratch.len() as u64;
    trace!(
        "entry {}: {} bytes in, {} bytes out",
        entry.name,
        data.len(),
        scratch.len()
    );
    Ok(())
}

impl<W: Write> Drop for ZipArchiveWriter<W> {
    fn drop(&mut self) {
        if self.state != ArchiveState::Writing {
            return;
        }

        if let Err(e) = self.finalize() {
            warn!("unable to finish zip archive on drop: {}", e);
        }
    }
}

impl<W: Write> Write for ZipArchiveWriter<W> {
    /// Appends to the open entry. See [`ZipArchiveWriter::write_data`].
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[derive(Debug)]
struct FileOptions {
    compression_method: CompressionMethod,
    compression_level: Option<u32>,
    compressor: Option<Box<dyn Compressor>>,
    modification_time: Option<UtcDateTime>,
    unix_permissions: Option<u32>,
}

impl Default for FileOptions {
    fn default() -> Self {
        FileOptions {
            compression_method: CompressionMethod::Store,
            compression_level: None,
            compressor: None,
            modification_time: None,
            unix_permissions: None,
        }
    }
}

#[derive(Debug, Default)]
struct DirOptions {
    modification_time: Option<UtcDateTime>,
    unix_permissions: Option<u32>,
}

/// A builder for opening a file entry.
#[derive(Debug)]
pub struct ZipFileBuilder<'a, W: Write> {
    archive: &'a mut ZipArchiveWriter<W>,
    name: &'a str,
    options: FileOptions,
}

impl<'a, W> ZipFileBuilder<'a, W>
where
    W: Write,
{
    /// Sets the compression method for the file entry. Defaults to
    /// [`CompressionMethod::Store`].
    pub fn compression_method(mut self, compression_method: CompressionMethod) -> Self {
        self.options.compression_method = compression_method;
        self
    }

    /// Overrides the archive's Deflate level (0-9) for this entry.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.options.compression_level = Some(level.min(9));
        self
    }

    /// Compresses the entry with a caller supplied compressor.
    ///
    /// The method recorded in the headers is the one the compressor reports,
    /// regardless of [`compression_method`](ZipFileBuilder::compression_method).
    pub fn compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.options.compressor = Some(compressor);
        self
    }

    /// Sets the modification time for the file entry.
    ///
    /// Only accepts UTC timestamps to ensure Extended Timestamp fields are written correctly.
    pub fn last_modified(mut self, modification_time: UtcDateTime) -> Self {
        self.options.modification_time = Some(modification_time);
        self
    }

    /// Sets the Unix permissions for the file entry.
    ///
    /// Accepts either:
    /// - Basic permission bits (e.g., 0o644 for rw-r--r--, 0o755 for rwxr-xr-x)
    /// - Full Unix mode including file type (e.g., 0o100644 for regular file)
    /// - Special permission bits are preserved (SUID: 0o4000, SGID: 0o2000, sticky: 0o1000)
    ///
    /// When set, the entry is recorded as made by a Unix host so that readers
    /// interpret the permissions.
    pub fn unix_permissions(mut self, permissions: u32) -> Self {
        self.options.unix_permissions = Some(permissions);
        self
    }

    /// Writes the local file header and opens the entry for data.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EntryAlreadyOpen`] when another entry is still
    /// open, and with [`ErrorKind::InvalidInput`] for a name that is empty
    /// after normalization.
    pub fn create(self) -> Result<(), Error> {
        self.archive.open_file(self.name, self.options)
    }
}

/// A builder for adding a directory entry.
#[derive(Debug)]
pub struct ZipDirBuilder<'a, W: Write> {
    archive: &'a mut ZipArchiveWriter<W>,
    name: &'a str,
    options: DirOptions,
}

impl<'a, W> ZipDirBuilder<'a, W>
where
    W: Write,
{
    /// Sets the modification time for the directory entry.
    pub fn last_modified(mut self, modification_time: UtcDateTime) -> Self {
        self.options.modification_time = Some(modification_time);
        self
    }

    /// Sets the Unix permissions for the directory entry.
    pub fn unix_permissions(mut self, permissions: u32) -> Self {
        self.options.unix_permissions = Some(permissions);
        self
    }

    /// Writes the directory entry, which has no data and is closed at once.
    pub fn create(self) -> Result<ZipEntryDescriptor, Error> {
        self.archive.add_dir(self.name, self.options)
    }
}
