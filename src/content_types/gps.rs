//! GPS sample model and the `GPS5`/`GPS9` stream decoders.
//!
//! `GPS5` (Hero5-Hero10) logs position clusters against a single `GPSU`
//! datetime plus cluster-wide `GPSP`/`GPSF` siblings; per-sample times are
//! reconstructed from the nominal 18 Hz rate. `GPS9` (Hero11+) embeds
//! time, DOP, and fix in every sample.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use log::warn;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::constants::{
    DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DEFAULT_PRECISION, DEFAULT_UNITS, GPMF_EPOCH,
    GPS5_SAMPLE_RATE_HZ, GPS9_MIN_SAMPLE_LEN,
};
use crate::errors::GpmfError;
use crate::gpmf::fourcc::FourCC;
use crate::gpmf::tree::Tree;

use super::primitivedatetime_to_string;

/// GPS payload flavor of a stream or track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpsFormat {
    /// Hero5-Hero10 cluster format, 5 int32 per sample.
    Gps5,
    /// Hero11+ per-sample format with embedded time/DOP/fix.
    Gps9,
    /// No GPS-bearing stream located.
    #[default]
    Unknown,
}

impl GpsFormat {
    pub fn to_str(&self) -> &str {
        match self {
            Self::Gps5 => "gps5",
            Self::Gps9 => "gps9",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GpsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A single decoded GPS position.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsSample {
    /// Source payload FourCC, `"GPS5"` or `"GPS9"`.
    pub description: String,
    /// UTC datetime of the sample.
    pub datetime: PrimitiveDateTime,
    /// Dilution of precision x100. Under 500 is good.
    pub precision_x100: u16,
    /// GPS fix: 0 - no lock, 2 - 2D lock, 3 - 3D lock.
    pub fix: u32,
    /// Latitude in decimal degrees, WGS 84.
    pub latitude: f64,
    /// Longitude in decimal degrees, WGS 84.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// 2D ground speed in m/s.
    pub speed2d: f64,
    /// 3D speed in m/s.
    pub speed3d: f64,
    /// Display units from `UNIT`, e.g. "deg,deg,m,m/s,m/s".
    pub units: String,
    /// Number of samples decoded from the same GPMF block.
    pub npoints: usize,
}

impl Default for GpsSample {
    fn default() -> Self {
        Self {
            description: String::new(),
            datetime: GPMF_EPOCH,
            precision_x100: DEFAULT_PRECISION,
            fix: 0,
            latitude: f64::default(),
            longitude: f64::default(),
            altitude: f64::default(),
            speed2d: f64::default(),
            speed3d: f64::default(),
            units: DEFAULT_UNITS.to_owned(),
            npoints: 0,
        }
    }
}

impl fmt::Display for GpsSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\
            description: {}
            datetime:    {:?}
            latitude:    {}
            longitude:   {}
            altitude:    {}
            speed2d:     {}
            speed3d:     {}
            fix:         {}
            precision:   {}
            npoints:     {}",
            self.description,
            self.datetime,
            self.latitude,
            self.longitude,
            self.altitude,
            self.speed2d,
            self.speed3d,
            self.fix,
            self.dop(),
            self.npoints,
        )
    }
}

impl GpsSample {
    /// Dilution of precision, i.e. `precision_x100` scaled back down.
    pub fn dop(&self) -> f64 {
        self.precision_x100 as f64 / 100.0
    }

    /// Satellite lock was acquired (2D or 3D). Without lock the device
    /// logs zeros or the last known position, so both position and time
    /// are wrong.
    pub fn has_valid_fix(&self) -> bool {
        self.fix >= 2
    }

    pub fn has_3d_fix(&self) -> bool {
        self.fix >= 3
    }

    pub fn datetime_to_string(&self) -> Result<String, GpmfError> {
        primitivedatetime_to_string(&self.datetime)
    }

    /// Decode a `GPS5` stream into samples.
    ///
    /// Layout is 5 packed int32 per sample: latitude, longitude, altitude,
    /// 2D speed, 3D speed, each divided by the matching `SCAL` entry.
    /// Cluster time comes from `GPSU`, fix from `GPSF`, DOP from `GPSP`.
    /// A stream flagged `EMPT`, or one without a `GPS5` payload, yields no
    /// samples.
    pub(crate) fn from_gps5(strm: &Tree<'_>) -> Vec<Self> {
        if strm.contains(&FourCC::EMPT) {
            return Vec::new();
        }
        let raw = match strm.find_leaf(&FourCC::GPS5) {
            Some(item) => item.to_i32s(),
            None => return Vec::new(),
        };
        let count = raw.len() / 5;
        if count == 0 {
            return Vec::new();
        }

        let scales = scale_vector(strm);
        let scale = |i: usize| scales.get(i).copied().unwrap_or(1.0);
        let base = gpsu_datetime(strm);
        let precision = strm
            .find_leaf(&FourCC::GPSP)
            .and_then(|item| item.first_u16())
            .unwrap_or(DEFAULT_PRECISION);
        let fix = strm
            .find_leaf(&FourCC::GPSF)
            .and_then(|item| item.first_u32())
            .unwrap_or(0);
        let units = units(strm);

        (0..count)
            .map(|i| {
                let v = &raw[i * 5..i * 5 + 5];
                // Spread the cluster over the nominal sample rate; only the
                // cluster start is actually logged.
                let offset_ms = i as i64 * 1000 / GPS5_SAMPLE_RATE_HZ as i64;
                Self {
                    description: FourCC::GPS5.to_string(),
                    datetime: base + Duration::milliseconds(offset_ms),
                    precision_x100: precision,
                    fix,
                    latitude: v[0] as f64 / scale(0),
                    longitude: v[1] as f64 / scale(1),
                    altitude: v[2] as f64 / scale(2),
                    speed2d: v[3] as f64 / scale(3),
                    speed3d: v[4] as f64 / scale(4),
                    units: units.clone(),
                    npoints: count,
                }
            })
            .collect()
    }

    /// Decode a `GPS9` stream into samples.
    ///
    /// The KLV `size` field is the per-sample stride (36 bytes on
    /// Hero11-13). Field offsets within a sample: int32 latitude,
    /// longitude, altitude at 0/4/8; int16 2D and 3D speed at 12/14;
    /// uint16 days since 2000-01-01 at 16; uint32 scaled seconds-of-day at
    /// 18; uint16 DOP x100 at 22; uint8 fix at 24. Samples the payload
    /// cannot fully back are dropped.
    pub(crate) fn from_gps9(strm: &Tree<'_>) -> Vec<Self> {
        let item = match strm.find_leaf(&FourCC::GPS9) {
            Some(item) => item,
            None => return Vec::new(),
        };
        let data = item.data();
        let stride = item.size as usize;
        if stride < GPS9_MIN_SAMPLE_LEN {
            return Vec::new();
        }

        let scales = scale_vector(strm);
        let scale = |i: usize| scales.get(i).copied().unwrap_or(1.0);
        let time_scale = scale(6);
        let units = units(strm);

        let mut samples = Vec::with_capacity(item.repeat as usize);
        for i in 0..item.repeat as usize {
            let start = i * stride;
            if start + GPS9_MIN_SAMPLE_LEN > data.len() {
                break;
            }
            let s = &data[start..];

            let days = BigEndian::read_u16(&s[16..18]);
            let secs = BigEndian::read_u32(&s[18..22]);
            // A zero or garbage time scale must not take the whole block
            // down; the position fields are still good.
            let ms_f = (secs as f64 * 1000.0 / time_scale).floor();
            let ms = if ms_f.is_finite() { ms_f as i64 } else { 0 };
            let datetime = GPMF_EPOCH
                .checked_add(Duration::days(days as i64))
                .and_then(|dt| dt.checked_add(Duration::milliseconds(ms)))
                .unwrap_or(GPMF_EPOCH);

            samples.push(Self {
                description: FourCC::GPS9.to_string(),
                datetime,
                precision_x100: BigEndian::read_u16(&s[22..24]),
                fix: s[24] as u32,
                latitude: BigEndian::read_i32(&s[0..4]) as f64 / scale(0),
                longitude: BigEndian::read_i32(&s[4..8]) as f64 / scale(1),
                altitude: BigEndian::read_i32(&s[8..12]) as f64 / scale(2),
                speed2d: BigEndian::read_i16(&s[12..14]) as f64 / scale(3),
                speed3d: BigEndian::read_i16(&s[14..16]) as f64 / scale(4),
                units: units.clone(),
                npoints: 0,
            });
        }

        let count = samples.len();
        for sample in samples.iter_mut() {
            sample.npoints = count;
        }
        samples
    }
}

/// A decoded GPS track: device identity, payload format, and samples in
/// on-wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTrack {
    /// Decimal `DVID`, `"unknown"` when the blob carries none.
    pub device_id: String,
    /// `DVNM` string, `"GoPro"` when the blob carries none.
    pub device_name: String,
    pub format: GpsFormat,
    pub samples: Vec<GpsSample>,
}

impl Default for GpsTrack {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_owned(),
            device_name: DEFAULT_DEVICE_NAME.to_owned(),
            format: GpsFormat::Unknown,
            samples: Vec::new(),
        }
    }
}

impl GpsTrack {
    /// Returns number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpsSample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&GpsSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&GpsSample> {
        self.samples.last()
    }

    /// The track restricted to samples with satellite lock
    /// ([`GpsSample::has_valid_fix`]).
    pub fn valid_only(&self) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .filter(|s| s.has_valid_fix())
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// `SCAL` divisors widened to f64, empty when the sibling is absent.
/// Consumers substitute 1.0 for entries beyond the vector's end.
fn scale_vector(strm: &Tree<'_>) -> Vec<f64> {
    strm.find_leaf(&FourCC::SCAL)
        .map(|item| item.to_f64s_lossy())
        .unwrap_or_default()
}

fn units(strm: &Tree<'_>) -> String {
    strm.find_leaf(&FourCC::UNIT)
        .map(|item| item.to_ascii())
        .unwrap_or_else(|| DEFAULT_UNITS.to_owned())
}

/// Cluster base time for `GPS5` from the `GPSU` sibling. Missing or
/// unparseable `GPSU` falls back to the current UTC wall clock, which at
/// least keeps relative spacing within the recording intact.
fn gpsu_datetime(strm: &Tree<'_>) -> PrimitiveDateTime {
    let parsed = strm
        .find_leaf(&FourCC::GPSU)
        .map(|item| item.to_ascii())
        .and_then(|s| parse_gpsu(&s));

    match parsed {
        Some(dt) => dt,
        None => {
            warn!("Missing or unparseable GPSU, using current UTC time as GPS5 time base");
            let now = OffsetDateTime::now_utc();
            PrimitiveDateTime::new(now.date(), now.time())
        }
    }
}

/// Parse a `GPSU` timestamp: `yymmddhhmmss`, optionally followed by `.`
/// and up to three fractional-second digits. The two-digit year is offset
/// from 2000; everything is UTC.
fn parse_gpsu(s: &str) -> Option<PrimitiveDateTime> {
    let bytes = s.as_bytes();
    if bytes.len() < 12 || !bytes[..12].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let field = |i: usize| -> u8 { (bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0') };

    let millis = match bytes.get(12) {
        Some(&b'.') => {
            let mut frac: String = s[13..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .take(3)
                .collect();
            while frac.len() < 3 {
                frac.push('0');
            }
            frac.parse::<u16>().ok()?
        }
        _ => 0,
    };

    let date = Date::from_calendar_date(
        2000 + field(0) as i32,
        Month::try_from(field(2)).ok()?,
        field(4),
    )
    .ok()?;
    let time = Time::from_hms_milli(field(6), field(8), field(10), millis).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}
