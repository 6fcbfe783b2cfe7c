//! Key types accepted by [`IndexTree`](super::IndexTree).

use std::fmt::{Debug, Display};

use bytes::{Buf, BufMut};

/// A fixed-width, totally ordered index key.
///
/// The width determines the node order for a given block size, so each key
/// type gets its own derived capacity.
pub trait IndexKey: Copy + Ord + Default + Debug + Display + 'static {
    /// Encoded width in bytes
    const WIDTH: usize;

    fn write_to<B: BufMut>(self, buf: &mut B);

    fn read_from<B: Buf>(buf: &mut B) -> Self;
}

impl IndexKey for i32 {
    const WIDTH: usize = 4;

    fn write_to<B: BufMut>(self, buf: &mut B) {
        buf.put_i32_le(self);
    }

    fn read_from<B: Buf>(buf: &mut B) -> Self {
        buf.get_i32_le()
    }
}

impl IndexKey for i64 {
    const WIDTH: usize = 8;

    fn write_to<B: BufMut>(self, buf: &mut B) {
        buf.put_i64_le(self);
    }

    fn read_from<B: Buf>(buf: &mut B) -> Self {
        buf.get_i64_le()
    }
}
