//! Typed payload decoding. A KLV header's type character selects element
//! width and interpretation; this module maps type characters to widths and
//! decodes big-endian scalar arrays and ASCII strings out of payload views.
//!
//! All reads are bounds-checked against the payload view rather than the
//! nominal `size * repeat`, so a clipped payload yields fewer elements
//! instead of an error.

use byteorder::{BigEndian, ByteOrder};

use super::klv::KlvItem;

/// Element interpretation for a KLV type character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// `d`
    Float64,
    /// `f`
    Float32,
    /// `b`
    Int8,
    /// `B`
    Uint8,
    /// `s`
    Int16,
    /// `S`
    Uint16,
    /// `l`
    Int32,
    /// `L`
    Uint32,
    /// `j`
    Int64,
    /// `J`
    Uint64,
    /// `c`, ASCII character data
    Ascii,
    /// `U`, 16-byte UTC timestamp string (`yymmddhhmmss.sss`)
    Utc,
    /// `?`, complex/heterogeneous layout described by a sibling `TYPE`
    Complex,
    /// `0x00`, nested container
    Nested,
}

impl DataKind {
    pub fn from_type_char(typ: u8) -> Option<Self> {
        match typ {
            b'd' => Some(Self::Float64),
            b'f' => Some(Self::Float32),
            b'b' => Some(Self::Int8),
            b'B' => Some(Self::Uint8),
            b's' => Some(Self::Int16),
            b'S' => Some(Self::Uint16),
            b'l' => Some(Self::Int32),
            b'L' => Some(Self::Uint32),
            b'j' => Some(Self::Int64),
            b'J' => Some(Self::Uint64),
            b'c' => Some(Self::Ascii),
            b'U' => Some(Self::Utc),
            b'?' => Some(Self::Complex),
            0x00 => Some(Self::Nested),
            _ => None,
        }
    }

    /// Element width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::Float64 | Self::Int64 | Self::Uint64 => 8,
            Self::Float32 | Self::Int32 | Self::Uint32 | Self::Complex => 4,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int8 | Self::Uint8 | Self::Ascii => 1,
            Self::Utc => 16,
            Self::Nested => 0,
        }
    }
}

impl<'a> KlvItem<'a> {
    /// Payload as big-endian int16s, regardless of the declared type.
    pub fn to_i16s(&self) -> Vec<i16> {
        self.data()
            .chunks_exact(2)
            .map(BigEndian::read_i16)
            .collect()
    }

    /// Payload as big-endian uint16s.
    pub fn to_u16s(&self) -> Vec<u16> {
        self.data()
            .chunks_exact(2)
            .map(BigEndian::read_u16)
            .collect()
    }

    /// Payload as big-endian int32s.
    pub fn to_i32s(&self) -> Vec<i32> {
        self.data()
            .chunks_exact(4)
            .map(BigEndian::read_i32)
            .collect()
    }

    /// Payload as big-endian uint32s.
    pub fn to_u32s(&self) -> Vec<u32> {
        self.data()
            .chunks_exact(4)
            .map(BigEndian::read_u32)
            .collect()
    }

    /// Payload as big-endian float32s.
    pub fn to_f32s(&self) -> Vec<f32> {
        self.data()
            .chunks_exact(4)
            .map(BigEndian::read_f32)
            .collect()
    }

    /// Payload as big-endian float64s.
    pub fn to_f64s(&self) -> Vec<f64> {
        self.data()
            .chunks_exact(8)
            .map(BigEndian::read_f64)
            .collect()
    }

    /// Decode each element according to the item's own type character and
    /// widen to f64. This is what scale vectors (`SCAL`) go through: the
    /// type varies per device (`s`, `l`, sometimes `f`), the consumer
    /// always wants doubles. Non-numeric and unrecognized types yield an
    /// empty vector.
    pub fn to_f64s_lossy(&self) -> Vec<f64> {
        let kind = match DataKind::from_type_char(self.typ) {
            Some(kind) => kind,
            None => return Vec::new(),
        };
        let data = self.data();
        match kind {
            DataKind::Float64 => data.chunks_exact(8).map(BigEndian::read_f64).collect(),
            DataKind::Float32 => data
                .chunks_exact(4)
                .map(|c| BigEndian::read_f32(c) as f64)
                .collect(),
            DataKind::Int8 => data.iter().map(|&b| b as i8 as f64).collect(),
            DataKind::Uint8 => data.iter().map(|&b| b as f64).collect(),
            DataKind::Int16 => data
                .chunks_exact(2)
                .map(|c| BigEndian::read_i16(c) as f64)
                .collect(),
            DataKind::Uint16 => data
                .chunks_exact(2)
                .map(|c| BigEndian::read_u16(c) as f64)
                .collect(),
            DataKind::Int32 => data
                .chunks_exact(4)
                .map(|c| BigEndian::read_i32(c) as f64)
                .collect(),
            DataKind::Uint32 => data
                .chunks_exact(4)
                .map(|c| BigEndian::read_u32(c) as f64)
                .collect(),
            DataKind::Int64 => data
                .chunks_exact(8)
                .map(|c| BigEndian::read_i64(c) as f64)
                .collect(),
            DataKind::Uint64 => data
                .chunks_exact(8)
                .map(|c| BigEndian::read_u64(c) as f64)
                .collect(),
            DataKind::Ascii | DataKind::Utc | DataKind::Complex | DataKind::Nested => Vec::new(),
        }
    }

    /// Payload as an ASCII string with trailing NUL and space padding
    /// stripped. Leading and interior bytes are untouched.
    pub fn to_ascii(&self) -> String {
        let data = self.data();
        let end = data
            .iter()
            .rposition(|&b| b != 0x00 && b != 0x20)
            .map(|i| i + 1)
            .unwrap_or(0);
        data[..end].iter().map(|&b| b as char).collect()
    }

    /// First element as uint16, for single-value siblings such as `GPSP`.
    pub fn first_u16(&self) -> Option<u16> {
        let data = self.data();
        (data.len() >= 2).then(|| BigEndian::read_u16(data))
    }

    /// First element as uint32, for single-value siblings such as `GPSF`
    /// and `DVID`.
    pub fn first_u32(&self) -> Option<u32> {
        let data = self.data();
        (data.len() >= 4).then(|| BigEndian::read_u32(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpmf::fourcc::FourCC;

    fn item<'a>(typ: u8, size: u8, repeat: u16, payload: &'a [u8]) -> KlvItem<'a> {
        KlvItem {
            key: FourCC::Other(*b"TEST"),
            typ,
            size,
            repeat,
            payload,
        }
    }

    #[test]
    fn int32_is_big_endian() {
        let it = item(b'l', 4, 1, &[0x00, 0x00, 0x00, 0x2A]);
        assert_eq!(it.to_i32s(), vec![42]);
        assert_eq!(it.to_f64s_lossy(), vec![42.0]);
    }

    #[test]
    fn ascii_strips_trailing_padding_only() {
        let it = item(b'c', 1, 16, b"GoPro HERO11 \0\0\0");
        assert_eq!(it.to_ascii(), "GoPro HERO11");

        let inner = item(b'c', 1, 12, b"m/s, m/s\0\0\0\0");
        assert_eq!(inner.to_ascii(), "m/s, m/s");

        let blank = item(b'c', 1, 4, b"\0\0\0\0");
        assert_eq!(blank.to_ascii(), "");
    }

    #[test]
    fn lossy_f64_follows_declared_type() {
        let s16 = item(b's', 2, 2, &[0xFF, 0xFE, 0x00, 0x10]);
        assert_eq!(s16.to_f64s_lossy(), vec![-2.0, 16.0]);

        let u16s = item(b'S', 2, 1, &[0x27, 0x0F]);
        assert_eq!(u16s.to_f64s_lossy(), vec![9999.0]);

        let f32_bytes = 2.5_f32.to_be_bytes();
        let f32s = item(b'f', 4, 1, &f32_bytes);
        assert_eq!(f32s.to_f64s_lossy(), vec![2.5]);

        let u8s = item(b'B', 1, 3, &[1, 2, 3]);
        assert_eq!(u8s.to_f64s_lossy(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_type_yields_empty_numeric_decode() {
        let it = item(0xEE, 4, 1, &[0, 0, 0, 1]);
        assert!(it.to_f64s_lossy().is_empty());
    }

    #[test]
    fn truncated_payload_yields_fewer_elements() {
        // Claims 3 int32s, payload holds 1.5 of them.
        let it = item(b'l', 4, 3, &[0, 0, 0, 5, 0, 0]);
        assert_eq!(it.to_i32s(), vec![5]);
    }

    #[test]
    fn scalar_accessors() {
        let it = item(b'L', 4, 1, &[0x00, 0x00, 0x04, 0xD2]);
        assert_eq!(it.first_u32(), Some(1234));
        assert_eq!(it.first_u16(), Some(0));

        let empty = item(b'L', 4, 1, &[]);
        assert_eq!(empty.first_u32(), None);
    }
}
