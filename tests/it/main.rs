use quickcheck::Arbitrary;
use quickcheck_macros::quickcheck;
use std::io::{Cursor, Read, Write};
use streamzip::{CompressionMethod, ZipArchiveWriter};

mod modification_time_tests;
mod offset_tests;
mod permission_tests;

/// An entry as seen by the `zip` crate.
#[derive(Debug)]
pub struct DecodedEntry {
    pub name: String,
    pub size: u64,
    pub compression: zip::CompressionMethod,
    pub data: Vec<u8>,
}

/// Reads every entry with an independent decoder, verifying CRCs along the way.
pub fn decode_archive(data: &[u8]) -> Vec<DecodedEntry> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    let mut result = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        result.push(DecodedEntry {
            name: file.name().to_string(),
            size: file.size(),
            compression: file.compression(),
            data,
        });
    }
    result
}

/// Fields of the end of central directory record.
#[derive(Debug, PartialEq, Eq)]
pub struct Trailer {
    pub entries_on_disk: u16,
    pub total_entries: u16,
    pub central_dir_size: u32,
    pub central_dir_offset: u32,
}

pub fn parse_trailer(data: &[u8]) -> Trailer {
    assert!(data.len() >= 22, "archive too short for a trailer");
    let eocd = &data[data.len() - 22..];
    assert_eq!(&eocd[..4], b"PK\x05\x06", "missing end of central directory");
    let u16_at = |pos: usize| u16::from_le_bytes([eocd[pos], eocd[pos + 1]]);
    let u32_at = |pos: usize| {
        u32::from_le_bytes([eocd[pos], eocd[pos + 1], eocd[pos + 2], eocd[pos + 3]])
    };

    assert_eq!(u16_at(20), 0, "comment length");
    Trailer {
        entries_on_disk: u16_at(8),
        total_entries: u16_at(10),
        central_dir_size: u32_at(12),
        central_dir_offset: u32_at(16),
    }
}

/// Counts central directory headers by walking them from the recorded offset.
pub fn count_central_headers(data: &[u8], trailer: &Trailer, base: u64) -> usize {
    let start = (u64::from(trailer.central_dir_offset) - base) as usize;
    let end = start + trailer.central_dir_size as usize;
    assert_eq!(end, data.len() - 22, "directory must end at the trailer");

    let mut pos = start;
    let mut count = 0;
    while pos < end {
        assert_eq!(&data[pos..pos + 4], b"PK\x01\x02", "header {} at {}", count, pos);
        let name_len = u16::from_le_bytes([data[pos + 28], data[pos + 29]]) as usize;
        let extra_len = u16::from_le_bytes([data[pos + 30], data[pos + 31]]) as usize;
        let comment_len = u16::from_le_bytes([data[pos + 32], data[pos + 33]]) as usize;
        pos += 46 + name_len + extra_len + comment_len;
        count += 1;
    }
    assert_eq!(pos, end);
    count
}

#[derive(Debug, Clone)]
struct ArbitraryEntry {
    name: String,
    data: Vec<u8>,
    deflate: bool,
    close: bool,
}

impl quickcheck::Arbitrary for ArbitraryEntry {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let name_len = usize::arbitrary(g) % 12 + 1;
        let name = (0..name_len)
            .map(|_| *g.choose(b"abcdefghijklmnopqrstuvwxyz0123456789").unwrap() as char)
            .collect();
        ArbitraryEntry {
            name,
            data: Vec::arbitrary(g),
            deflate: bool::arbitrary(g),
            close: bool::arbitrary(g),
        }
    }
}

#[quickcheck]
fn test_read_what_we_write(entries: Vec<ArbitraryEntry>) {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    let mut names = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        // Unique names so the decoder can't conflate entries
        let name = format!("{}/{}", i, entry.name);
        let method = if entry.deflate {
            CompressionMethod::Deflate
        } else {
            CompressionMethod::Store
        };

        archive
            .new_file(&name)
            .compression_method(method)
            .create()
            .unwrap();

        // Feed in uneven chunks to exercise incremental compression
        for chunk in entry.data.chunks(7) {
            archive.write_all(chunk).unwrap();
        }

        // The final entry may be left open for the archive to close. Any
        // other entry has to be closed before the next one is opened.
        if entry.close || i + 1 < entries.len() {
            let descriptor = archive.close_entry().unwrap();
            assert_eq!(descriptor.uncompressed_size(), entry.data.len() as u64);
            assert_eq!(descriptor.crc(), streamzip::crc32(&entry.data));
        }
        names.push(name);
    }

    let output = archive.finish().unwrap();
    let decoded = decode_archive(&output);
    assert_eq!(decoded.len(), entries.len());

    for ((actual, expected), name) in decoded.iter().zip(&entries).zip(&names) {
        assert_eq!(&actual.name, name);
        assert_eq!(actual.size, expected.data.len() as u64);
        assert_eq!(actual.data, expected.data);
        let method = if expected.deflate {
            zip::CompressionMethod::Deflated
        } else {
            zip::CompressionMethod::Stored
        };
        assert_eq!(actual.compression, method);
    }

    let trailer = parse_trailer(&output);
    assert_eq!(usize::from(trailer.total_entries), entries.len());
    assert_eq!(count_central_headers(&output, &trailer, 0), entries.len());
}

#[quickcheck]
fn test_store_output_is_input(data: Vec<u8>) {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive.new_file("file.txt").create().unwrap();
    let before = archive.offset();
    archive.write_data(&data).unwrap();
    assert_eq!(archive.offset() - before, data.len() as u64);
    let entry = archive.close_entry().unwrap();
    assert_eq!(entry.compressed_size(), entry.uncompressed_size());

    let output = archive.finish().unwrap();
    let start = before as usize;
    assert_eq!(&output[start..start + data.len()], &data[..]);
}
