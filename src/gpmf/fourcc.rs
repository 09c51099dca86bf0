//! GPMF FourCC, i.e. general stream identifier.
//! Only the structural and GPS identifiers this crate interprets get their
//! own variant; everything else is carried as `FourCC::Other` with the raw
//! bytes intact. `FourCC::Invalid` marks zero padding, which would otherwise
//! be parsed as a valid (empty) container.

use std::fmt;

/// FourCC enum. Descriptions lifted from official GPMF documentation
/// (<https://github.com/gopro/gpmf-parser>).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FourCC {
    // FOURCC RESERVED FOR GPMF STRUCTURE
    /// Unique device source for metadata.
    DEVC,
    /// Device/track ID. Auto generated unique-ID for managing a large
    /// number of connected devices.
    DVID,
    /// Device name. Display name like "Hero11 Black".
    DVNM,
    /// Nested signal stream of metadata/telemetry.
    STRM,
    /// Stream name. Display name for a stream like "GPS RAW".
    STNM,
    /// Comments for any stream.
    RMRK,
    /// Scaling factor (divisor) for the sibling payload.
    SCAL,
    /// Standard units (like SI).
    SIUN,
    /// Display units, e.g. "deg,deg,m,m/s,m/s" for GPS streams.
    UNIT,
    /// Typedef for complex structures, e.g. "lllllSSSSB" for `GPS9`.
    TYPE,
    /// Total samples delivered since record start.
    TSMP,
    /// Empty payload count.
    EMPT,

    // GPS FOURCC
    /// Hero5-Hero10: latitude, longitude, altitude (WGS 84), 2D ground
    /// speed, and 3D speed at up to 18 Hz.
    GPS5,
    /// Hero11+: per-sample position, speeds, UTC time, DOP, and fix.
    GPS9,
    /// Hero5+: GPS fix within the GPS stream. 0 - no lock, 2 or 3 - 2D or
    /// 3D lock.
    GPSF,
    /// Hero5+: GPS precision, Dilution of Precision (DOP x100). Under 500
    /// is good.
    GPSP,
    /// Hero5-Hero10: UTC date and time from GPS, sibling of `GPS5`.
    GPSU,
    /// Hero8+: GPS altitude variant marker (Mean Sea Level).
    GPSA,

    /// Zero padding misread as a FourCC; skipped during projection.
    Invalid,

    /// Any FourCC this crate does not interpret, raw bytes preserved.
    Other([u8; 4]),
}

impl Default for FourCC {
    fn default() -> Self {
        FourCC::Invalid
    }
}

impl FourCC {
    /// FourCC from the first four bytes of a KLV header.
    pub fn from_slice(slice: &[u8]) -> Self {
        match slice {
            // GPMF structural FourCC
            b"DEVC" => FourCC::DEVC,
            b"DVID" => FourCC::DVID,
            b"DVNM" => FourCC::DVNM,
            b"STRM" => FourCC::STRM,
            b"STNM" => FourCC::STNM,
            b"RMRK" => FourCC::RMRK,
            b"SCAL" => FourCC::SCAL,
            b"SIUN" => FourCC::SIUN,
            b"UNIT" => FourCC::UNIT,
            b"TYPE" => FourCC::TYPE,
            b"TSMP" => FourCC::TSMP,
            b"EMPT" => FourCC::EMPT,

            // GPS FourCC
            b"GPS5" => FourCC::GPS5,
            b"GPS9" => FourCC::GPS9,
            b"GPSF" => FourCC::GPSF,
            b"GPSP" => FourCC::GPSP,
            b"GPSU" => FourCC::GPSU,
            b"GPSA" => FourCC::GPSA,

            // Zero padding, used as check for breaking parse loops
            b"\0\0\0\0" => FourCC::Invalid,

            // Uninterpreted FourCC
            _ => {
                let mut raw = [0_u8; 4];
                raw.copy_from_slice(&slice[..4]);
                FourCC::Other(raw)
            }
        }
    }

    /// The raw four bytes, as they appear on the wire.
    pub fn bytes(&self) -> [u8; 4] {
        match self {
            FourCC::DEVC => *b"DEVC",
            FourCC::DVID => *b"DVID",
            FourCC::DVNM => *b"DVNM",
            FourCC::STRM => *b"STRM",
            FourCC::STNM => *b"STNM",
            FourCC::RMRK => *b"RMRK",
            FourCC::SCAL => *b"SCAL",
            FourCC::SIUN => *b"SIUN",
            FourCC::UNIT => *b"UNIT",
            FourCC::TYPE => *b"TYPE",
            FourCC::TSMP => *b"TSMP",
            FourCC::EMPT => *b"EMPT",
            FourCC::GPS5 => *b"GPS5",
            FourCC::GPS9 => *b"GPS9",
            FourCC::GPSF => *b"GPSF",
            FourCC::GPSP => *b"GPSP",
            FourCC::GPSU => *b"GPSU",
            FourCC::GPSA => *b"GPSA",
            FourCC::Invalid => [0, 0, 0, 0],
            FourCC::Other(raw) => *raw,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self == &FourCC::Invalid
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FourCC::Invalid => write!(f, "INVALID_FOURCC"),
            other => write!(f, "{}", String::from_utf8_lossy(&other.bytes())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_fourcc_round_trips() {
        for raw in [b"DEVC", b"STRM", b"GPS5", b"GPS9", b"SCAL", b"GPSU"] {
            let fourcc = FourCC::from_slice(&raw[..]);
            assert_eq!(&fourcc.bytes(), raw);
        }
    }

    #[test]
    fn unknown_fourcc_keeps_raw_bytes() {
        let fourcc = FourCC::from_slice(b"ACCL");
        assert_eq!(fourcc, FourCC::Other(*b"ACCL"));
        assert_eq!(fourcc.to_string(), "ACCL");
    }

    #[test]
    fn zero_padding_is_invalid() {
        assert!(FourCC::from_slice(&[0, 0, 0, 0]).is_invalid());
        assert!(!FourCC::from_slice(b"GPS5").is_invalid());
    }
}
