use std::io::Write;
use streamzip::{CompressionMethod, ZipArchiveWriterBuilder};

#[test]
fn test_archive_appended_to_existing_data() {
    let prefix = b"#!/bin/sh\necho self-extracting stub\nexit 0\n";
    let mut output = prefix.to_vec();

    {
        let mut archive = ZipArchiveWriterBuilder::new()
            .at_offset(prefix.len() as u64)
            .build(&mut output);
        assert_eq!(archive.offset(), prefix.len() as u64);

        archive.new_file("a.txt").create().unwrap();
        archive.write_all(b"alpha").unwrap();
        let first = archive.close_entry().unwrap();
        assert_eq!(first.local_header_offset(), prefix.len() as u64);

        archive
            .new_file("b.txt")
            .compression_method(CompressionMethod::Deflate)
            .create()
            .unwrap();
        archive.write_all(b"beta beta beta").unwrap();
        archive.close().unwrap();

        let second = &archive.entries()[1];
        assert_eq!(
            second.local_header_offset(),
            prefix.len() as u64 + 30 + 5 + 5 + 16
        );
    }

    assert_eq!(&output[..prefix.len()], prefix);

    let trailer = crate::parse_trailer(&output);
    let cd_offset = trailer.central_dir_offset as usize;
    assert_eq!(&output[cd_offset..cd_offset + 4], b"PK\x01\x02");
    assert_eq!(crate::count_central_headers(&output, &trailer, 0), 2);

    let decoded = crate::decode_archive(&output);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].data, b"alpha");
    assert_eq!(decoded[1].data, b"beta beta beta");
}

#[test]
fn test_offset_tracks_every_record() {
    let mut archive = ZipArchiveWriterBuilder::new().build(Vec::new());
    archive.new_file("abc").create().unwrap();
    assert_eq!(archive.offset(), 30 + 3);

    archive.write_all(b"0123456789").unwrap();
    assert_eq!(archive.offset(), 30 + 3 + 10);

    archive.close_entry().unwrap();
    assert_eq!(archive.offset(), 30 + 3 + 10 + 16);

    archive.new_dir("d/").create().unwrap();
    assert_eq!(archive.offset(), 30 + 3 + 10 + 16 + 30 + 2);

    let output = archive.finish().unwrap();
    let trailer = crate::parse_trailer(&output);
    assert_eq!(trailer.central_dir_offset, 30 + 3 + 10 + 16 + 30 + 2);
    assert_eq!(trailer.central_dir_size, 46 + 3 + 46 + 2);
}
