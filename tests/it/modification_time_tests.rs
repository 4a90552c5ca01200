use std::io::{Cursor, Write};
use streamzip::{time::UtcDateTime, ZipArchiveWriter};

fn dos_datetime(output: &[u8], index: usize) -> (u16, u8, u8, u8, u8, u8) {
    let mut archive = zip::ZipArchive::new(Cursor::new(output)).unwrap();
    let file = archive.by_index(index).unwrap();
    let dt = file.last_modified().unwrap();
    (
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    )
}

/// Extra field bytes of the local header at the start of the archive.
fn local_extra_field(output: &[u8]) -> &[u8] {
    let name_len = u16::from_le_bytes([output[26], output[27]]) as usize;
    let extra_len = u16::from_le_bytes([output[28], output[29]]) as usize;
    &output[30 + name_len..30 + name_len + extra_len]
}

#[test]
fn test_modification_time_roundtrip_file() {
    let datetime = UtcDateTime::from_components(2023, 6, 15, 14, 30, 45, 0).unwrap();

    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_file("test.txt")
        .last_modified(datetime)
        .create()
        .unwrap();
    archive.write_all(b"Hello, world!").unwrap();
    let entry = archive.close_entry().unwrap();
    assert_eq!(entry.modification_time(), Some(datetime));

    let output = archive.finish().unwrap();
    // DOS times have two second resolution
    assert_eq!(dos_datetime(&output, 0), (2023, 6, 15, 14, 30, 44));
}

#[test]
fn test_modification_time_roundtrip_directory() {
    let datetime = UtcDateTime::from_components(2023, 8, 20, 9, 15, 30, 0).unwrap();

    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_dir("test_dir/")
        .last_modified(datetime)
        .create()
        .unwrap();
    let output = archive.finish().unwrap();

    assert_eq!(dos_datetime(&output, 0), (2023, 8, 20, 9, 15, 30));
}

#[test]
fn test_no_modification_time_defaults_to_dos_epoch() {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive.new_file("test.txt").create().unwrap();
    archive.write_all(b"Hello, world!").unwrap();
    let output = archive.finish().unwrap();

    assert_eq!(&output[10..12], &[0, 0]);
    assert_eq!(&output[12..14], &0x21u16.to_le_bytes());
    assert_eq!(dos_datetime(&output, 0), (1980, 1, 1, 0, 0, 0));
    assert!(local_extra_field(&output).is_empty());
}

#[test]
fn test_extended_timestamp_present() {
    let datetime = UtcDateTime::from_unix(1_700_000_000);

    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_file("test.txt")
        .last_modified(datetime)
        .create()
        .unwrap();
    let output = archive.finish().unwrap();

    let extra = local_extra_field(&output);
    assert_eq!(extra.len(), 9);
    assert_eq!(&extra[..2], &0x5455u16.to_le_bytes());
    assert_eq!(&extra[2..4], &5u16.to_le_bytes());
    assert_eq!(extra[4], 1);
    assert_eq!(&extra[5..], &1_700_000_000u32.to_le_bytes());

    // Readers still open the archive with the extra field present
    assert_eq!(crate::decode_archive(&output).len(), 1);
}

#[test]
fn test_timestamp_before_dos_range() {
    let datetime = UtcDateTime::from_components(1970, 1, 1, 0, 0, 0, 0).unwrap();

    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_file("old.txt")
        .last_modified(datetime)
        .create()
        .unwrap();
    let output = archive.finish().unwrap();

    assert_eq!(dos_datetime(&output, 0), (1980, 1, 1, 0, 0, 0));
    assert_eq!(&local_extra_field(&output)[5..], &[0, 0, 0, 0]);
}

#[test]
fn test_multiple_files_different_timestamps() {
    let datetime1 = UtcDateTime::from_components(2020, 1, 1, 12, 0, 0, 0).unwrap();
    let datetime2 = UtcDateTime::from_components(2024, 12, 31, 23, 59, 58, 0).unwrap();

    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_file("file1.txt")
        .last_modified(datetime1)
        .create()
        .unwrap();
    archive.write_all(b"File 1").unwrap();
    archive.close_entry().unwrap();
    archive
        .new_file("file2.txt")
        .last_modified(datetime2)
        .create()
        .unwrap();
    archive.write_all(b"File 2").unwrap();
    let output = archive.finish().unwrap();

    assert_eq!(dos_datetime(&output, 0), (2020, 1, 1, 12, 0, 0));
    assert_eq!(dos_datetime(&output, 1), (2024, 12, 31, 23, 59, 58));
}

#[test]
fn test_timestamp_validation() {
    assert!(UtcDateTime::from_components(2023, 2, 30, 0, 0, 0, 0).is_none());
    assert!(UtcDateTime::from_components(2023, 13, 1, 0, 0, 0, 0).is_none());
    assert!(UtcDateTime::from_components(2023, 4, 31, 0, 0, 0, 0).is_none());
    assert!(UtcDateTime::from_components(2020, 2, 29, 0, 0, 0, 0).is_some());
    assert!(UtcDateTime::from_components(2021, 2, 29, 0, 0, 0, 0).is_none());

    let datetime = UtcDateTime::from_unix(1_700_000_000);
    assert_eq!(datetime.to_string(), "2023-11-14T22:13:20Z");
    assert_eq!(datetime.to_unix(), 1_700_000_000);
}
