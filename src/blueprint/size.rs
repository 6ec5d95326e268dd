//! Byte sizes as written in blueprints: `1073741824`, `"1 GiB"`, `"500MB"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

const UNITS: &[(&str, u64)] = &[
    ("B", 1),
    ("kB", 1000),
    ("KB", 1000),
    ("KiB", KIB),
    ("MB", 1000 * 1000),
    ("MiB", MIB),
    ("GB", 1000 * 1000 * 1000),
    ("GiB", GIB),
    ("TB", 1000 * 1000 * 1000 * 1000),
    ("TiB", TIB),
];

/// A size in bytes. Zero means "not specified".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataSize(pub u64);

impl DataSize {
    pub const fn bytes(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for DataSize {
    fn from(value: u64) -> Self {
        DataSize(value)
    }
}

impl fmt::Display for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} B", self.0)
    }
}

impl FromStr for DataSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(format!("invalid size {:?}: missing number", raw));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid size {:?}: number out of range", raw))?;

        let unit = unit.trim();
        if unit.is_empty() {
            return Ok(DataSize(value));
        }
        let multiplier = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, m)| *m)
            .ok_or_else(|| format!("invalid size {:?}: unknown unit {:?}", raw, unit))?;

        value
            .checked_mul(multiplier)
            .map(DataSize)
            .ok_or_else(|| format!("invalid size {:?}: number out of range", raw))
    }
}

impl Serialize for DataSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for DataSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(bytes) => Ok(DataSize(bytes)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
