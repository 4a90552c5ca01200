/// Compute the CRC32 (IEEE) of a byte slice
///
/// Entries written through a [`ZipArchiveWriter`](crate::ZipArchiveWriter)
/// are checksummed incrementally, so this is mostly useful for verifying
/// payloads that are held entirely in memory.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.value()
}

/// Running CRC32 over the uncompressed bytes of a single entry.
#[derive(Clone)]
pub(crate) struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("value", &format_args!("0x{:08x}", self.value()))
            .finish()
    }
}

impl Crc32 {
    pub(crate) fn new() -> Self {
        Crc32 {
            hasher: crc32fast::Hasher::new(),
        }
    }

    #[inline]
    pub(crate) fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub(crate) fn value(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}
