//! Entry names as recorded in the archive.
//!
//! Names are normalized before they are written so that extracting readers
//! can't be steered outside of their destination directory:
//!
//! - Path separators: backslashes (`\`) become forward slashes (`/`)
//! - Redundant slashes: `dir//file` becomes `dir/file`
//! - Relative components: `.` and `..` are resolved and can't escape the root
//! - Leading separators: `/etc/passwd` becomes `etc/passwd`
//! - Drive letters: `C:\foo` becomes `foo`
//!
//! ```rust
//! use streamzip::path::EntryName;
//!
//! let name = EntryName::file("dir\\..\\..\\file.txt")?;
//! assert_eq!(name.as_str(), "file.txt");
//!
//! let dir = EntryName::dir("C:/photos//2024/")?;
//! assert_eq!(dir.as_str(), "photos/2024/");
//! # Ok::<(), streamzip::Error>(())
//! ```

use crate::Error;

/// A normalized, non-empty entry name.
///
/// Directory names always end with `/`; file names never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryName {
    data: String,
}

impl EntryName {
    /// Normalizes the name of a file entry. Trailing slashes are dropped.
    ///
    /// # Errors
    ///
    /// Fails if nothing remains after normalization or the name is longer
    /// than a header can record.
    pub fn file(name: &str) -> Result<EntryName, Error> {
        let data = normalize(name);
        Self::validate(data, "file")
    }

    /// Normalizes the name of a directory entry, which must end with a path
    /// separator (`/` or `\`).
    pub fn dir(name: &str) -> Result<EntryName, Error> {
        if !name.ends_with(['/', '\\']) {
            return Err(Error::invalid_input("not a directory"));
        }

        let mut data = normalize(name);
        if !data.is_empty() {
            data.push('/');
        }

        Self::validate(data, "directory")
    }

    fn validate(data: String, what: &str) -> Result<EntryName, Error> {
        if data.is_empty() {
            return Err(Error::invalid_input(format!("{} name is empty", what)));
        }

        if data.len() > usize::from(u16::MAX) {
            return Err(Error::invalid_input(format!("{} name too long", what)));
        }

        Ok(EntryName { data })
    }

    /// Returns true if this names a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.data.ends_with('/')
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Length of the name in bytes.
    #[inline]
    #[allow(clippy::len_without_is_empty)] // never empty
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Determines if the name requires the UTF-8 flag (general purpose bit
    /// 11) because it can't be represented in CP-437.
    pub(crate) fn needs_utf8_encoding(&self) -> bool {
        // 0x5c (\) and 0x7e (~) are excluded since EUC-KR and Shift-JIS map
        // them to currency and overline characters.
        self.data
            .chars()
            .any(|ch| !(0x20..=0x7d).contains(&(ch as u32)) || ch == '\\')
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.data
    }
}

impl AsRef<[u8]> for EntryName {
    fn as_ref(&self) -> &[u8] {
        self.data.as_bytes()
    }
}

impl std::fmt::Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.data)
    }
}

fn normalize(name: &str) -> String {
    // 4.4.17.1 All slashes MUST be forward slashes '/'
    let name = name.replace('\\', "/");

    // 4.4.17.1 MUST NOT contain a drive or device letter
    let name = name.rsplit(':').next().unwrap_or_default();

    let mut result = String::with_capacity(name.len());
    for component in name.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                let parent = result.rfind('/').unwrap_or(0);
                result.truncate(parent);
            }
            _ => {
                if !result.is_empty() {
                    result.push('/');
                }
                result.push_str(component);
            }
        }
    }

    result
}
