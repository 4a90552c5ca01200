/// "Version made by" host id for Unix (APPNOTE 4.4.2.2).
pub(crate) const CREATOR_UNIX: u16 = 3;

/// Unix file type and permission constants
const S_IFMT: u32 = 0o170000; // File type mask
const S_IFREG: u32 = 0o100000; // Regular file
const S_IFDIR: u32 = 0o040000; // Directory
const PERMISSION_MASK: u32 = 0o7777; // rwx plus setuid, setgid, sticky

/// MSDOS directory attribute
const MSDOS_DIR: u32 = 0x10;

/// Computes the external file attributes of an entry.
///
/// The low byte holds MS-DOS attributes, which always flag directories so
/// that readers ignoring the host id still recognize them. Unix modes go in
/// the high 16 bits, defaulting the file type when only permission bits were
/// given.
pub(crate) fn external_attributes(unix_permissions: Option<u32>, is_dir: bool) -> u32 {
    let msdos = if is_dir { MSDOS_DIR } else { 0 };
    match unix_permissions {
        Some(permissions) => (unix_mode(permissions, is_dir) << 16) | msdos,
        None => msdos,
    }
}

fn unix_mode(permissions: u32, is_dir: bool) -> u32 {
    let file_type = match permissions & S_IFMT {
        0 if is_dir => S_IFDIR,
        0 => S_IFREG,
        file_type => file_type,
    };

    file_type | (permissions & PERMISSION_MASK)
}
