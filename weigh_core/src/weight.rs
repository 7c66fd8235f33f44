//! Exact decimal weights.
//!
//! The scale sends weights as fixed-width ASCII decimals. Readings are kept as
//! an integer number of units at a signed decimal scale (`units * 10^-scale`)
//! so that stability checks compare decimal values exactly; binary floating
//! point is only produced on request for output.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Parsed weights whose scale lies outside `-MAX_SCALE..=MAX_SCALE` are
/// stored normalized.
pub const MAX_SCALE: u32 = 18;

/// Exponents are saturated here; anything beyond is already out of `f64` range.
const EXP_LIMIT: i64 = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct Weight {
    units: i64,
    scale: i32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid weight {0:?}")]
pub struct ParseWeightError(pub String);

/// Whitespace skipped before a number: ASCII whitespace plus vertical tab.
fn is_leading_space(c: u8) -> bool {
    c.is_ascii_whitespace() || c == 0x0B
}

impl Weight {
    /// `units * 10^-scale`; a negative scale multiplies by a power of ten.
    pub const fn new(units: i64, scale: i32) -> Self {
        Self { units, scale }
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Same value with trailing zeros moved into the scale. Zero is `0 * 10^0`.
    pub fn normalized(self) -> Self {
        if self.units == 0 {
            return Self { units: 0, scale: 0 };
        }
        let (mut units, mut scale) = (self.units, self.scale);
        while units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }

    /// Nearest `f64`, for display and serialization.
    pub fn to_f64(self) -> f64 {
        // Correctly rounded, unlike `units * 10^-scale`.
        format!("{}e{}", self.units, -i64::from(self.scale))
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// Parse the longest numeric prefix of `bytes`.
    ///
    /// Leading whitespace is skipped, then an optional sign, digits with at
    /// most one decimal point and an optional exponent. Parsing stops at the
    /// first byte outside that grammar, so `b"12.5kg"` is `12.5`. Digits past
    /// `i64` precision are dropped (integer digits still scale the value).
    /// Values too small for `f64` read as zero.
    ///
    /// Returns the weight and the number of bytes consumed, or `None` when no
    /// digit was found or the value is beyond `f64` range.
    pub fn parse_prefix(bytes: &[u8]) -> Option<(Self, usize)> {
        let mut i = 0;
        while bytes.get(i).copied().is_some_and(is_leading_space) {
            i += 1;
        }

        let negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };

        let mut units: i64 = 0;
        let mut scale: i64 = 0;
        let mut digits = 0usize;
        let mut seen_dot = false;
        while let Some(&c) = bytes.get(i) {
            match c {
                b'0'..=b'9' => {
                    digits += 1;
                    let next = units
                        .checked_mul(10)
                        .and_then(|u| u.checked_add(i64::from(c - b'0')));
                    match next {
                        Some(u) => {
                            units = u;
                            if seen_dot {
                                scale += 1;
                            }
                        }
                        None if !seen_dot => scale -= 1,
                        None => {}
                    }
                }
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            i += 1;
        }
        if digits == 0 {
            return None;
        }

        // Exponent only counts when at least one digit follows it.
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;
            let exp_negative = match bytes.get(j) {
                Some(b'-') => {
                    j += 1;
                    true
                }
                Some(b'+') => {
                    j += 1;
                    false
                }
                _ => false,
            };
            let start = j;
            let mut exp: i64 = 0;
            while let Some(&c) = bytes.get(j) {
                if !c.is_ascii_digit() {
                    break;
                }
                exp = (exp * 10 + i64::from(c - b'0')).min(EXP_LIMIT);
                j += 1;
            }
            if j > start {
                scale = if exp_negative { scale + exp } else { scale - exp };
                i = j;
            }
        }

        let scale = i32::try_from(scale.clamp(-2 * EXP_LIMIT, 2 * EXP_LIMIT)).ok()?;
        let units = if negative { -units } else { units };
        let mut weight = Self { units, scale };
        // Within MAX_SCALE an i64 mantissa is always a finite, non-zero f64.
        if weight.scale.unsigned_abs() > MAX_SCALE {
            weight = weight.normalized();
            let value = weight.to_f64();
            if value.is_infinite() {
                return None;
            }
            if value == 0.0 {
                weight = Self { units: 0, scale: 0 };
            }
        }
        Some((weight, i))
    }
}

impl PartialEq for Weight {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.normalized(), other.normalized());
        a.units == b.units && a.scale == b.scale
    }
}

impl Eq for Weight {}

impl Hash for Weight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let n = self.normalized();
        n.units.hash(state);
        n.scale.hash(state);
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        if self.scale <= 0 {
            let zeros = "0".repeat(self.scale.unsigned_abs() as usize);
            return write!(f, "{sign}{digits}{zeros}");
        }
        let width = self.scale as usize;
        let padded = format!("{digits:0>w$}", w = width + 1);
        let (int, frac) = padded.split_at(padded.len() - width);
        write!(f, "{sign}{int}.{frac}")
    }
}

impl FromStr for Weight {
    type Err = ParseWeightError;

    /// Strict parse: the whole string, apart from surrounding whitespace,
    /// must be a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_prefix(s.as_bytes()) {
            Some((w, used)) if s[used..].trim().is_empty() => Ok(w),
            _ => Err(ParseWeightError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn prefix(s: &str) -> Option<Weight> {
        Weight::parse_prefix(s.as_bytes()).map(|(w, _)| w)
    }

    #[test]
    fn equal_values_at_different_precision_compare_equal() {
        assert_eq!(Weight::new(500, 1), Weight::new(5000, 2));
        assert_eq!(Weight::new(50, 0), Weight::new(500, 1));
        assert_ne!(Weight::new(500, 1), Weight::new(501, 1));
        assert_eq!(Weight::new(0, 3), Weight::new(0, 0));
    }

    #[test]
    fn hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(Weight::new(500, 1));
        assert!(set.contains(&Weight::new(50, 0)));
    }

    #[test]
    fn parses_padded_fields() {
        assert_eq!(prefix("  50.0"), Some(Weight::new(500, 1)));
        assert_eq!(prefix("050.00"), Some(Weight::new(50, 0)));
        assert_eq!(prefix("-1.25 "), Some(Weight::new(-125, 2)));
        assert_eq!(prefix("+.5"), Some(Weight::new(5, 1)));
        assert_eq!(prefix("7."), Some(Weight::new(7, 0)));
    }

    #[test]
    fn trailing_garbage_ends_the_number() {
        assert_eq!(prefix("12.5kg"), Some(Weight::new(125, 1)));
        assert_eq!(prefix("1.2.3"), Some(Weight::new(12, 1)));
        assert_eq!(prefix("3e"), Some(Weight::new(3, 0)));
    }

    #[test]
    fn exponents_shift_the_scale() {
        assert_eq!(prefix("1.5e2"), Some(Weight::new(150, 0)));
        assert_eq!(prefix("15e-1"), Some(Weight::new(15, 1)));
        assert_eq!(prefix("2E+1"), Some(Weight::new(20, 0)));
    }

    #[test]
    fn rejects_non_numbers() {
        for s in ["", "      ", "abc", "-", ".", "+.", "Infinity", "NaN", "e5"] {
            assert_eq!(prefix(s), None, "{s:?} should not parse");
        }
    }

    #[test]
    fn values_beyond_f64_range_are_rejected() {
        assert_eq!(prefix("1e9999"), None);
        assert_eq!(prefix("-2e308"), None);
        assert!(prefix("1e308").is_some());
    }

    #[test]
    fn exponent_fields_keep_their_exact_value() {
        assert_eq!(prefix(" 0e-30"), Some(Weight::new(0, 0)));
        assert_eq!(prefix(" 99e18"), Some(Weight::new(99, -18)));
        assert_eq!(prefix("1e-19"), Some(Weight::new(1, 19)));
        assert_eq!(prefix("5e-400"), Some(Weight::new(0, 0)));
        assert_eq!(prefix("99e-30").map(Weight::to_f64), Some(99e-30));
    }

    #[test]
    fn long_digit_runs_lose_precision_not_magnitude() {
        let w = prefix("123456789012345678901234").unwrap();
        assert_eq!(w.scale(), -5);
        assert!((w.to_f64() - 1.2345678901234568e23).abs() < 1e9);
        assert_eq!(prefix("0.1234567890123456789999"), Some(Weight::new(1234567890123456789, 19)));
    }

    #[test]
    fn vertical_tab_counts_as_leading_space() {
        assert_eq!(prefix("\x0b 7"), Some(Weight::new(7, 0)));
    }

    #[test]
    fn display_keeps_parsed_precision() {
        assert_eq!(prefix(" 50.0 ").map(|w| w.to_string()).as_deref(), Some("50.0"));
        assert_eq!(Weight::new(-5, 1).to_string(), "-0.5");
        assert_eq!(Weight::new(105, 2).to_string(), "1.05");
        assert_eq!(Weight::new(42, 0).to_string(), "42");
        assert_eq!(Weight::new(99, -18).to_string(), "99000000000000000000");
        assert_eq!(Weight::new(1, 19).to_string(), "0.0000000000000000001");
        assert_eq!(Weight::new(-12, 30).to_string().len(), 33);
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!("50.0".parse::<Weight>(), Ok(Weight::new(500, 1)));
        assert_eq!(" 7 ".parse::<Weight>(), Ok(Weight::new(7, 0)));
        assert!("50kg".parse::<Weight>().is_err());
    }

    #[test]
    fn to_f64_is_close() {
        assert!((Weight::new(1234, 2).to_f64() - 12.34).abs() < 1e-9);
    }
}
