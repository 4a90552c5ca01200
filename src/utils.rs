/// Little-endian field encoding for record buffers.
pub(crate) trait PutLe {
    fn put_u8(&mut self, value: u8);
    fn put_u16_le(&mut self, value: u16);
    fn put_u32_le(&mut self, value: u32);
}

impl PutLe for Vec<u8> {
    #[inline(always)]
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    #[inline(always)]
    fn put_u16_le(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    #[inline(always)]
    fn put_u32_le(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}
