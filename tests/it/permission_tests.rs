use rstest::rstest;
use std::io::{Cursor, Write};
use streamzip::ZipArchiveWriter;

fn read_mode(output: &[u8], index: usize) -> (bool, Option<u32>) {
    let mut archive = zip::ZipArchive::new(Cursor::new(output)).unwrap();
    let file = archive.by_index(index).unwrap();
    (file.is_dir(), file.unix_mode())
}

#[rstest]
#[case(0o644, 0o100644)]
#[case(0o755, 0o100755)]
#[case(0o600, 0o100600)]
#[case(0o777, 0o100777)]
#[case(0o100644, 0o100644)]
#[case(0o120777, 0o120777)]
#[case(0o4755, 0o104755)]
fn test_unix_permissions_roundtrip(#[case] permissions: u32, #[case] expected_mode: u32) {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive
        .new_file("test_file.txt")
        .unix_permissions(permissions)
        .create()
        .unwrap();
    archive.write_all(b"test content").unwrap();
    let entry = archive.close_entry().unwrap();
    assert_eq!(entry.unix_permissions(), Some(permissions));
    assert_eq!(entry.external_file_attributes() >> 16, expected_mode);

    let output = archive.finish().unwrap();
    let (is_dir, mode) = read_mode(&output, 0);
    assert!(!is_dir);
    assert_eq!(
        mode,
        Some(expected_mode),
        "expected permissions 0o{:o}, got {:?}",
        expected_mode,
        mode.map(|m| format!("0o{:o}", m))
    );
}

#[rstest]
#[case(0o755, 0o040755)]
#[case(0o040700, 0o040700)]
fn test_directory_permissions_roundtrip(#[case] permissions: u32, #[case] expected_mode: u32) {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    let entry = archive
        .new_dir("test_dir/")
        .unix_permissions(permissions)
        .create()
        .unwrap();

    // MS-DOS directory attribute is set alongside the unix mode
    assert_eq!(entry.external_file_attributes() & 0x10, 0x10);

    let output = archive.finish().unwrap();
    let (is_dir, mode) = read_mode(&output, 0);
    assert!(is_dir);
    assert_eq!(mode, Some(expected_mode));
}

#[test]
fn test_no_permissions_recorded_as_dos() {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    archive.new_dir("dir/").create().unwrap();
    archive.new_file("dir/file.txt").create().unwrap();
    archive.write_all(b"test content").unwrap();
    let output = archive.finish().unwrap();

    // Central directory "version made by" host byte is MS-DOS
    let trailer = crate::parse_trailer(&output);
    let offset = trailer.central_dir_offset as usize;
    assert_eq!(&output[offset + 4..offset + 6], &[20, 0]);

    let (is_dir, _) = read_mode(&output, 0);
    assert!(is_dir);

    let (is_dir, mode) = read_mode(&output, 1);
    assert!(!is_dir);
    if let Some(mode) = mode {
        assert_eq!(mode & 0o170000, 0o100000, "got 0o{:o}", mode);
    }
}
