//! Creates a Zip archive from files and directories.
//!
//! Pass `-` as the output to stream the archive to stdout, eg:
//!
//! ```bash
//! cargo run --example write -- - src | cat > src.zip
//! ```
//!
//! Set `RUST_LOG=streamzip=debug` to follow entries as they are written.

use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;
use streamzip::{time::UtcDateTime, CompressionMethod, ZipArchiveWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <output.zip | -> <input_path>...", args[0]);
        eprintln!("Create a ZIP archive from the specified files and directories");
        std::process::exit(1);
    }

    let output_path = &args[1];
    let writer: Box<dyn Write> = if output_path == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(io::BufWriter::new(File::create(output_path)?))
    };
    let mut archive = ZipArchiveWriter::new(writer);

    for input_path in &args[2..] {
        let path = Path::new(input_path);
        if path.is_file() {
            let Some(name) = path.file_name().and_then(|x| x.to_str()) else {
                eprintln!("Warning: skipping '{}' with a non UTF-8 name", input_path);
                continue;
            };
            add_file_to_archive(&mut archive, path, name)?;
        } else if path.is_dir() {
            add_directory_to_archive(&mut archive, path, "")?;
        } else {
            eprintln!(
                "Warning: '{}' does not exist or is not a regular file/directory",
                input_path
            );
        }
    }

    let entries = archive.entries().len();
    archive.finish()?;
    eprintln!("Successfully wrote {} entries to '{}'", entries, output_path);
    Ok(())
}

fn get_modification_time(
    metadata: &fs::Metadata,
) -> Result<UtcDateTime, Box<dyn std::error::Error>> {
    let modified = metadata.modified()?;
    let unix_seconds = modified.duration_since(UNIX_EPOCH)?.as_secs() as i64;
    Ok(UtcDateTime::from_unix(unix_seconds))
}

fn add_file_to_archive<W: Write>(
    archive: &mut ZipArchiveWriter<W>,
    file_path: &Path,
    archive_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = fs::metadata(file_path)?;
    let modification_time = get_modification_time(&metadata)?;

    let mut builder = archive
        .new_file(archive_path)
        .compression_method(CompressionMethod::Deflate)
        .last_modified(modification_time);

    if let Some(permissions) = get_unix_permissions(&metadata) {
        builder = builder.unix_permissions(permissions);
    }

    builder.create()?;

    // Stream the file rather than buffering it whole
    let mut file = File::open(file_path)?;
    io::copy(&mut file, archive)?;
    let entry = archive.close_entry()?;

    eprintln!(
        "  adding: {} (deflated {} -> {} bytes)",
        archive_path,
        entry.uncompressed_size(),
        entry.compressed_size()
    );
    Ok(())
}

fn add_directory_to_archive<W: Write>(
    archive: &mut ZipArchiveWriter<W>,
    dir_path: &Path,
    base_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in fs::read_dir(dir_path)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let Some(name_str) = name.to_str() else {
            eprintln!("Warning: skipping '{}' with a non UTF-8 name", path.display());
            continue;
        };

        let archive_path = if base_path.is_empty() {
            name_str.to_string()
        } else {
            format!("{}/{}", base_path, name_str)
        };

        if path.is_file() {
            add_file_to_archive(archive, &path, &archive_path)?;
        } else if path.is_dir() {
            let metadata = fs::metadata(&path)?;
            let modification_time = get_modification_time(&metadata)?;

            let dir_archive_path = format!("{}/", archive_path);
            let mut builder = archive
                .new_dir(&dir_archive_path)
                .last_modified(modification_time);

            if let Some(permissions) = get_unix_permissions(&metadata) {
                builder = builder.unix_permissions(permissions);
            }

            builder.create()?;
            eprintln!("  adding: {}", dir_archive_path);

            add_directory_to_archive(archive, &path, &archive_path)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn get_unix_permissions(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn get_unix_permissions(_metadata: &fs::Metadata) -> Option<u32> {
    None
}
