#![no_main]
use libfuzzer_sys::fuzz_target;
use streamzip::{CompressionMethod, ZipArchiveWriter};

// Interprets the input as a sequence of writer operations. Whatever the
// sequence, the finished archive must account for every entry that was
// opened or added.
fuzz_target!(|data: &[u8]| {
    let mut archive = ZipArchiveWriter::new(Vec::new());
    for op in data.chunks(2) {
        let arg = op.get(1).copied().unwrap_or(0);
        let result = match op[0] % 5 {
            0 => {
                let method = if arg & 1 == 0 {
                    CompressionMethod::Store
                } else {
                    CompressionMethod::Deflate
                };
                let name = format!("f{}", archive.entries().len());
                archive.new_file(&name).compression_method(method).create()
            }
            1 => archive.write_data(&vec![arg; usize::from(arg)]),
            2 => archive.close_entry().map(|_| ()),
            3 => {
                let name = format!("d{}/", archive.entries().len());
                archive.new_dir(&name).create().map(|_| ())
            }
            _ => archive.write_data(&[]),
        };

        if let Err(e) = result {
            assert!(e.is_protocol_violation(), "{}", e);
        }
    }

    let expected = archive.entries().len() + usize::from(archive.is_entry_open());
    let output = archive.finish().unwrap();
    let eocd = &output[output.len() - 22..];
    assert_eq!(&eocd[..4], b"PK\x05\x06");
    let total = u16::from_le_bytes([eocd[10], eocd[11]]);
    assert_eq!(usize::from(total), expected);
});
