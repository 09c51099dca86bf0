//! KLV framing layer. GPMF is a stream of 8-byte headers
//! (FourCC + type + size + repeat), each followed by a payload padded to a
//! 4-byte boundary. All multi-byte fields are big-endian.
//!
//! The reader is deliberately permissive: GPMF blobs are cut at arbitrary
//! MP4 sample boundaries, so a truncated final payload is returned clipped
//! and anything shorter than a header simply ends the stream. No input is
//! rejected at this layer.

use byteorder::{BigEndian, ByteOrder};

use super::fourcc::FourCC;
use super::value::DataKind;

/// Fixed KLV header length: FourCC (4) + type (1) + size (1) + repeat (2).
pub const KLV_HEADER_LEN: usize = 8;

/// Closest greater or equal multiple of 4.
pub fn ceil4(x: usize) -> usize {
    if x == 0 {
        0
    } else {
        (((x - 1) >> 2) + 1) << 2
    }
}

/// A single KLV item. The payload is a non-owning view into the input
/// buffer, aligned length, possibly clipped at the end of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct KlvItem<'a> {
    /// Stream identifier.
    pub key: FourCC,
    /// Type character, e.g. `l` for int32. `0x00` marks a nested container.
    pub typ: u8,
    /// Size of a single element in bytes.
    pub size: u8,
    /// Element repeat count.
    pub repeat: u16,
    /// Payload view, `min(ceil4(size * repeat), remaining)` bytes.
    pub payload: &'a [u8],
}

impl<'a> KlvItem<'a> {
    /// Nominal payload length in bytes, before alignment padding.
    pub fn raw_len(&self) -> usize {
        self.size as usize * self.repeat as usize
    }

    /// Total on-wire length of this item, header included.
    pub fn wire_len(&self) -> usize {
        KLV_HEADER_LEN + ceil4(self.raw_len())
    }

    /// Payload with alignment padding trimmed. Shorter than
    /// [`Self::raw_len`] when the input was cut mid-item.
    pub fn data(&self) -> &'a [u8] {
        &self.payload[..self.raw_len().min(self.payload.len())]
    }

    /// A container carries further KLV items as its payload. The nested
    /// marker is a type byte of `0x00`; unrecognized type codes with a zero
    /// element size are treated the same, while unrecognized codes with a
    /// nonzero size stay opaque leaves.
    pub fn is_container(&self) -> bool {
        match DataKind::from_type_char(self.typ) {
            Some(kind) => kind == DataKind::Nested,
            None => self.size == 0,
        }
    }
}

/// Lazy iterator over the KLV items of a byte slice. Terminates when fewer
/// than [`KLV_HEADER_LEN`] bytes remain.
#[derive(Debug, Clone)]
pub struct KlvReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> KlvReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes consumed so far, aligned payloads included.
    pub fn consumed(&self) -> usize {
        self.offset.min(self.data.len())
    }
}

impl<'a> Iterator for KlvReader<'a> {
    type Item = KlvItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.data.len().checked_sub(self.offset)?;
        if remaining < KLV_HEADER_LEN {
            return None;
        }

        let head = &self.data[self.offset..self.offset + KLV_HEADER_LEN];
        let key = FourCC::from_slice(&head[..4]);
        let typ = head[4];
        let size = head[5];
        let repeat = BigEndian::read_u16(&head[6..8]);

        let padded = ceil4(size as usize * repeat as usize);
        let start = self.offset + KLV_HEADER_LEN;
        let end = (start + padded).min(self.data.len());

        // Advance past the nominal payload even when clipped, so the next
        // call returns terminal instead of resyncing mid-payload.
        self.offset = start + padded;

        Some(KlvItem {
            key,
            typ,
            size,
            repeat,
            payload: &self.data[start..end],
        })
    }
}

/// Iterate the KLV items of `data`. Low-level API; most callers want
/// [`crate::project_tree`] or [`crate::parse`].
pub fn read_klv(data: &[u8]) -> KlvReader<'_> {
    KlvReader::new(data)
}
