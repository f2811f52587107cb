//! Unit scaling: smallest on-chain unit to display unit

use std::fmt;

use alloy_primitives::U256;
use serde::{Serialize, Serializer};

/// Decimals of an EVM native coin (wei → ether)
pub const NATIVE_DECIMALS: u8 = 18;
/// Decimals from wei to gwei
pub const GWEI_DECIMALS: u8 = 9;
/// Fractional digits shown by default
pub const DISPLAY_PRECISION: usize = 6;

/// A raw on-chain quantity together with its display scaling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
    pub symbol: String,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            raw,
            decimals,
            symbol: symbol.into(),
        }
    }

    /// Native coin balance (18 decimals)
    pub fn native(raw: U256, symbol: impl Into<String>) -> Self {
        Self::new(raw, NATIVE_DECIMALS, symbol)
    }

    /// Gas price in gwei
    pub fn gwei(raw_wei: u128) -> Self {
        Self::new(U256::from(raw_wei), GWEI_DECIMALS, "gwei")
    }

    /// Display value without the symbol
    pub fn value(&self, precision: usize) -> String {
        format_units(self.raw, self.decimals, precision)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value(DISPLAY_PRECISION), self.symbol)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Amount", 4)?;
        s.serialize_field("raw", &self.raw.to_string())?;
        s.serialize_field("decimals", &self.decimals)?;
        s.serialize_field("display", &self.value(DISPLAY_PRECISION))?;
        s.serialize_field("symbol", &self.symbol)?;
        s.end()
    }
}

/// Scale `raw` down by `10^decimals`, keeping at most `precision`
/// fractional digits (truncated, trailing zeros trimmed).
pub fn format_units(raw: U256, decimals: u8, precision: usize) -> String {
    if raw.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw / divisor;
    let remainder = raw % divisor;

    if remainder.is_zero() || precision == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    let cut = &fraction[..fraction.len().min(precision)];
    let trimmed = cut.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}
