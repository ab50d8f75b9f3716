use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amounts in base units (18 decimals).
pub type Amount = u128;

pub const DECIMALS: u32 = 18;

/// One whole token in base units.
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Whole tokens to base units, saturating on overflow.
pub fn tokens(whole: u64) -> Amount {
    (whole as Amount).saturating_mul(ONE_TOKEN)
}

/// Render base units as a decimal token string, trimming trailing zeros.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / ONE_TOKEN;
    let frac = amount % ONE_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }

    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse a decimal token string ("1", "0.25") into base units.
pub fn parse_units(input: &str) -> Option<Amount> {
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if frac.len() > DECIMALS as usize || (whole.is_empty() && frac.is_empty()) {
        return None;
    }

    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<18}", frac);
        padded.parse().ok()?
    };

    whole.checked_mul(ONE_TOKEN)?.checked_add(frac_units)
}

/// Account identity on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Fresh 20-byte hex address.
    pub fn random() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(tokens(1000)), "1000");
        assert_eq!(format_units(ONE_TOKEN / 4), "0.25");
        assert_eq!(format_units(1), "0.000000000000000001");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1"), Some(ONE_TOKEN));
        assert_eq!(parse_units("0.25"), Some(ONE_TOKEN / 4));
        assert_eq!(parse_units(".5"), Some(ONE_TOKEN / 2));
        assert_eq!(parse_units("abc"), None);
        assert_eq!(parse_units("1.0000000000000000001"), None);
    }

    #[test]
    fn test_random_address_shape() {
        let address = Address::random();
        assert!(address.as_str().starts_with("0x"));
        assert_eq!(address.as_str().len(), 42);
    }
}
