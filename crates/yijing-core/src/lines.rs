use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LineError;
use crate::trigram::Trigram;

/// Number of lines (yao) in a hexagram.
pub const LINE_COUNT: usize = 6;

/// A binary key as it appears in source data. The original dataset stores
/// some keys as bare JSON numbers (`0`, `10001`), which read as decimal digit
/// strings before padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinaryInput {
    Number(u64),
    Text(String),
}

impl BinaryInput {
    pub fn as_text(&self) -> String {
        match self {
            BinaryInput::Number(n) => n.to_string(),
            BinaryInput::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for BinaryInput {
    fn from(s: &str) -> Self {
        BinaryInput::Text(s.to_string())
    }
}

impl From<u64> for BinaryInput {
    fn from(n: u64) -> Self {
        BinaryInput::Number(n)
    }
}

/// Six lines of a hexagram, index 0 = bottom line, each 0 (yin) or 1 (yang).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineVector([u8; LINE_COUNT]);

impl LineVector {
    /// Build from raw line values. Every value must be 0 or 1.
    pub fn new(lines: [u8; LINE_COUNT]) -> Result<Self, LineError> {
        for (position, &line) in lines.iter().enumerate() {
            if line > 1 {
                return Err(LineError::InvalidLine {
                    position,
                    found: char::from_digit(u32::from(line), 10).unwrap_or('?'),
                });
            }
        }
        Ok(Self(lines))
    }

    /// Parse a binary key string, left-padding short keys with `0`.
    pub fn parse(key: &str) -> Result<Self, LineError> {
        let key = key.trim();
        let len = key.chars().count();
        if len > LINE_COUNT {
            return Err(LineError::TooLong { len });
        }
        let padded = normalize_key(key);
        let mut lines = [0u8; LINE_COUNT];
        for (position, ch) in padded.chars().enumerate() {
            lines[position] = match ch {
                '0' => 0,
                '1' => 1,
                found => return Err(LineError::InvalidLine { position, found }),
            };
        }
        Ok(Self(lines))
    }

    pub fn lines(&self) -> [u8; LINE_COUNT] {
        self.0
    }

    pub fn is_yang(&self, position: usize) -> bool {
        self.0.get(position).copied() == Some(1)
    }

    /// Flip the single line at `position`. Positions past the top wrap modulo 6.
    pub fn flipped(&self, position: usize) -> Self {
        let mut lines = self.0;
        let index = position % LINE_COUNT;
        lines[index] ^= 1;
        Self(lines)
    }

    /// Every line inverted (yin <-> yang).
    pub fn complement(&self) -> Self {
        let mut lines = self.0;
        for line in &mut lines {
            *line ^= 1;
        }
        Self(lines)
    }

    /// Line order reversed top-to-bottom.
    pub fn reversed(&self) -> Self {
        let mut lines = self.0;
        lines.reverse();
        Self(lines)
    }

    /// Upper sub-trigram (lines 3,4,5 counting from 1 at the bottom, i.e.
    /// indices 2..=4) followed by the lower sub-trigram (indices 1..=3).
    /// Indices 2 and 3 appear in both halves.
    pub fn mutual(&self) -> Self {
        let l = self.0;
        Self([l[2], l[3], l[4], l[1], l[2], l[3]])
    }

    pub fn lower(&self) -> Trigram {
        Trigram::from_lines([self.0[0], self.0[1], self.0[2]])
    }

    pub fn upper(&self) -> Trigram {
        Trigram::from_lines([self.0[3], self.0[4], self.0[5]])
    }

    pub fn to_binary_key(&self) -> String {
        self.0.iter().map(|l| if *l == 1 { '1' } else { '0' }).collect()
    }
}

impl fmt::Display for LineVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_binary_key())
    }
}

impl Serialize for LineVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_binary_key())
    }
}

impl<'de> Deserialize<'de> for LineVector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = BinaryInput::deserialize(deserializer)?;
        to_line_vector(&input).map_err(serde::de::Error::custom)
    }
}

/// Left-pad a key with `0` to six characters. Longer keys are returned as-is.
pub fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let len = key.chars().count();
    if len >= LINE_COUNT {
        return key.to_string();
    }
    let mut padded = "0".repeat(LINE_COUNT - len);
    padded.push_str(key);
    padded
}

pub fn to_line_vector(binary: &BinaryInput) -> Result<LineVector, LineError> {
    LineVector::parse(&binary.as_text())
}

pub fn to_binary_key(lines: &LineVector) -> String {
    lines.to_binary_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_numeric_keys() {
        assert_eq!(to_line_vector(&BinaryInput::Number(0)).unwrap().lines(), [0; 6]);
        assert_eq!(
            to_line_vector(&BinaryInput::Number(10001)).unwrap().to_binary_key(),
            "010001"
        );
        assert_eq!(LineVector::parse("1").unwrap().to_binary_key(), "000001");
    }

    #[test]
    fn rejects_non_binary_characters() {
        let err = LineVector::parse("10a101").unwrap_err();
        assert_eq!(err, LineError::InvalidLine { position: 2, found: 'a' });
        let err = to_line_vector(&BinaryInput::Number(123)).unwrap_err();
        assert_eq!(err, LineError::InvalidLine { position: 4, found: '2' });
    }

    #[test]
    fn rejects_keys_longer_than_six() {
        assert_eq!(
            LineVector::parse("1010101").unwrap_err(),
            LineError::TooLong { len: 7 }
        );
        assert!(LineVector::parse("extraordinary prudence is necessary.").is_err());
    }

    #[test]
    fn new_rejects_values_above_one() {
        assert!(LineVector::new([0, 1, 2, 0, 0, 0]).is_err());
        assert!(LineVector::new([0, 1, 1, 0, 0, 1]).is_ok());
    }

    #[test]
    fn flip_touches_one_line() {
        let v = LineVector::parse("111111").unwrap();
        assert_eq!(v.flipped(1).to_binary_key(), "101111");
        assert_eq!(v.flipped(7).to_binary_key(), "101111");
    }

    #[test]
    fn mutual_recombines_inner_lines() {
        let v = LineVector::parse("010001").unwrap();
        assert_eq!(v.mutual().to_binary_key(), "000100");
    }

    #[test]
    fn complement_and_reverse() {
        let v = LineVector::parse("110100").unwrap();
        assert_eq!(v.complement().to_binary_key(), "001011");
        assert_eq!(v.reversed().to_binary_key(), "001011");
        let v = LineVector::parse("111000").unwrap();
        assert_eq!(v.reversed().to_binary_key(), "000111");
    }

    #[test]
    fn serde_accepts_number_or_string() {
        let v: LineVector = serde_json::from_str("\"101\"").unwrap();
        assert_eq!(v.to_binary_key(), "000101");
        let v: LineVector = serde_json::from_str("0").unwrap();
        assert_eq!(v.to_binary_key(), "000000");
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"000000\"");
    }
}
