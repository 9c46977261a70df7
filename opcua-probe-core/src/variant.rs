//! Values returned by attribute reads

use serde::{Serialize, Serializer};
use std::fmt;

/// 100ns ticks between 1601-01-01 and 1970-01-01
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;
const TICKS_PER_MILLI: i64 = 10_000;

/// OPC UA `DateTime`: 100ns ticks since 1601-01-01T00:00:00Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UaDateTime {
    ticks: i64,
}

impl UaDateTime {
    pub fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub fn from_unix_millis(millis: i64) -> Self {
        Self {
            ticks: millis
                .saturating_mul(TICKS_PER_MILLI)
                .saturating_add(UNIX_EPOCH_TICKS),
        }
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn to_unix_millis(&self) -> i64 {
        self.ticks.saturating_sub(UNIX_EPOCH_TICKS).div_euclid(TICKS_PER_MILLI)
    }
}

/// Gregorian date from days since 1970-01-01 (H. Hinnant's civil_from_days)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

impl fmt::Display for UaDateTime {
    /// ISO-8601 with millisecond precision, always UTC
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.to_unix_millis();
        let days = millis.div_euclid(86_400_000);
        let ms_of_day = millis.rem_euclid(86_400_000);
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            year,
            month,
            day,
            ms_of_day / 3_600_000,
            (ms_of_day / 60_000) % 60,
            (ms_of_day / 1000) % 60,
            ms_of_day % 1000
        )
    }
}

impl Serialize for UaDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Scalar value carried by a `DataValue`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Variant {
    Empty,
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    Double(f64),
    String(String),
    DateTime(UaDateTime),
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => f.write_str("null"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::String(v) => f.write_str(v),
            Variant::DateTime(v) => write!(f, "{}", v),
        }
    }
}

/// Status code severity (top two bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Uncertain,
    Bad,
}

/// 32-bit OPC UA status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    pub const BAD_NOT_READABLE: StatusCode = StatusCode(0x803A_0000);
    pub const BAD_USER_ACCESS_DENIED: StatusCode = StatusCode(0x801F_0000);

    pub fn severity(&self) -> Severity {
        match self.0 >> 30 {
            0 => Severity::Good,
            1 => Severity::Uncertain,
            _ => Severity::Bad,
        }
    }

    pub fn is_bad(&self) -> bool {
        self.severity() == Severity::Bad
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StatusCode::GOOD => f.write_str("Good"),
            StatusCode::BAD_NODE_ID_UNKNOWN => f.write_str("BadNodeIdUnknown"),
            StatusCode::BAD_NOT_READABLE => f.write_str("BadNotReadable"),
            StatusCode::BAD_USER_ACCESS_DENIED => f.write_str("BadUserAccessDenied"),
            StatusCode(code) => write!(f, "0x{:08X}", code),
        }
    }
}

/// Value plus status returned by a read
#[derive(Debug, Clone, PartialEq)]
pub struct DataValue {
    pub value: Variant,
    pub status: StatusCode,
}

impl DataValue {
    pub fn good(value: Variant) -> Self {
        Self {
            value,
            status: StatusCode::GOOD,
        }
    }

    pub fn with_status(value: Variant, status: StatusCode) -> Self {
        Self { value, status }
    }
}
