use time::{macros::datetime, PrimitiveDateTime};

/// GoPro GPS epoch. `GPS9` day counts and the `GPSU` two-digit year
/// are both relative to this date.
pub const GPMF_EPOCH: PrimitiveDateTime = datetime!(2000-1-1 0:0:0);
/// Nominal `GPS5` log rate. Used to spread per-cluster samples over time,
/// since `GPS5` only carries one `GPSU` timestamp per cluster.
pub const GPS5_SAMPLE_RATE_HZ: u32 = 18;
/// Byte offset one past the GPS fix field within a `GPS9` sample.
/// Samples shorter than this are dropped rather than read out of bounds.
pub const GPS9_MIN_SAMPLE_LEN: usize = 25;
/// Reported when a stream carries no `UNIT` sibling.
pub const DEFAULT_UNITS: &str = "deg,deg,m,m/s,m/s";
/// Reported when no `DVNM` is present. Hero5 Black calls itself "Camera",
/// everything later uses a model string.
pub const DEFAULT_DEVICE_NAME: &str = "GoPro";
/// Reported when no `DVID` is present.
pub const DEFAULT_DEVICE_ID: &str = "unknown";
/// DOP x100 substituted when `GPSP` is missing. High enough that any
/// DOP-based pruning will discard the samples.
pub const DEFAULT_PRECISION: u16 = 9999;
/// GPMF nesting is device -> stream -> metadata, depth 3 in practice.
/// Anything deeper than this is a crafted blob.
pub const MAX_NESTING_DEPTH: usize = 16;
/// Upper bound on projected KLV items per blob.
pub const MAX_ITEM_COUNT: usize = 1_000_000;
