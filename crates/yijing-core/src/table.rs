use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::TableError;
use crate::lines::{normalize_key, to_line_vector, BinaryInput, LineVector};
use crate::{Hexagram, HexagramText, TrigramInfo};

pub const TABLE_SIZE: usize = 64;

/// The canonical table shipped with the crate, in King Wen order.
pub const EMBEDDED_TABLE: &str = include_str!("../data/hexagrams.json");

/// What to do with a record whose binary key cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Fail the whole load.
    #[default]
    Strict,
    /// Keep the row in place without lines. It still occupies its index for
    /// user-number selection but never matches a key lookup.
    Quarantine,
}

// --- Source records ---

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTable {
    List(Vec<RawHexagram>),
    Keyed(serde_json::Map<String, serde_json::Value>),
}

impl RawTable {
    fn into_records(self) -> Result<Vec<RawHexagram>, TableError> {
        match self {
            RawTable::List(records) => Ok(records),
            RawTable::Keyed(map) => map
                .into_iter()
                .map(|(_, v)| serde_json::from_value(v).map_err(TableError::from))
                .collect(),
        }
    }
}

/// Display text arrives either structured or as a bare string in damaged rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawText {
    Structured(HexagramText),
    Plain(String),
}

impl From<RawText> for HexagramText {
    fn from(raw: RawText) -> Self {
        match raw {
            RawText::Structured(t) => t,
            RawText::Plain(text) => HexagramText { text, comments: String::new() },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTrigram {
    Structured(TrigramInfo),
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct RawHexagram {
    #[serde(alias = "number")]
    hex: u32,
    binary: BinaryInput,
    #[serde(default)]
    hex_font: String,
    #[serde(default, alias = "chineseName")]
    trad_chinese: String,
    #[serde(default)]
    pinyin: String,
    #[serde(default, alias = "name")]
    english: String,
    #[serde(default)]
    wilhelm_above: Option<RawTrigram>,
    #[serde(default)]
    wilhelm_below: Option<RawTrigram>,
    #[serde(default)]
    wilhelm_symbolic: String,
    #[serde(default)]
    wilhelm_judgment: Option<RawText>,
    #[serde(default)]
    wilhelm_image: Option<RawText>,
    #[serde(default)]
    wilhelm_lines: BTreeMap<String, RawText>,
}

fn trigram_info(raw: Option<RawTrigram>, derived: Option<TrigramInfo>) -> Option<TrigramInfo> {
    match raw {
        Some(RawTrigram::Structured(info)) => Some(info),
        _ => derived,
    }
}

impl RawHexagram {
    fn into_hexagram(self, lines: Option<LineVector>) -> Hexagram {
        // keys are "1".."6"; sort numerically so "10" would not precede "2"
        let mut numbered: Vec<(u32, RawText)> = self
            .wilhelm_lines
            .into_iter()
            .map(|(k, v)| (k.trim().parse().unwrap_or(u32::MAX), v))
            .collect();
        numbered.sort_by_key(|(k, _)| *k);
        let line_texts: Vec<HexagramText> =
            numbered.into_iter().map(|(_, v)| HexagramText::from(v)).collect();
        if !line_texts.is_empty() && line_texts.len() != 6 {
            tracing::warn!(
                number = self.hex,
                count = line_texts.len(),
                "hexagram has an unexpected number of line texts"
            );
        }
        Hexagram {
            number: self.hex,
            lines,
            raw_binary: self.binary.as_text(),
            chinese: self.trad_chinese,
            pinyin: self.pinyin,
            english: self.english,
            symbol: self.hex_font,
            above: trigram_info(self.wilhelm_above, lines.map(|l| l.upper().into())),
            below: trigram_info(self.wilhelm_below, lines.map(|l| l.lower().into())),
            symbolic: self.wilhelm_symbolic,
            judgment: self.wilhelm_judgment.map(HexagramText::from).unwrap_or_default(),
            image: self.wilhelm_image.map(HexagramText::from).unwrap_or_default(),
            line_texts,
        }
    }
}

// --- Table ---

/// The validated 64-entry table. Immutable after construction.
#[derive(Debug, Clone)]
pub struct HexagramTable {
    hexagrams: Vec<Hexagram>,
    by_key: HashMap<String, usize>,
}

impl HexagramTable {
    /// Parse the table shipped with the crate.
    pub fn embedded() -> Result<Self, TableError> {
        Self::from_json_str(EMBEDDED_TABLE, LoadPolicy::Strict)
    }

    /// Read a table file. Accepts a JSON array of records or an object whose
    /// values are records (source order is kept).
    pub fn load(path: &Path, policy: LoadPolicy) -> Result<Self, TableError> {
        let raw = fs::read_to_string(path)?;
        let table = Self::from_json_str(&raw, policy)?;
        tracing::info!(path = %path.display(), "loaded hexagram table");
        Ok(table)
    }

    pub fn from_json_str(json: &str, policy: LoadPolicy) -> Result<Self, TableError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Self::from_records(raw.into_records()?, policy)
    }

    fn from_records(records: Vec<RawHexagram>, policy: LoadPolicy) -> Result<Self, TableError> {
        if records.len() != TABLE_SIZE {
            return Err(TableError::Configuration(format!(
                "expected {} hexagrams, found {}",
                TABLE_SIZE,
                records.len()
            )));
        }

        let mut hexagrams = Vec::with_capacity(TABLE_SIZE);
        let mut by_key: HashMap<String, usize> = HashMap::with_capacity(TABLE_SIZE);

        for (index, raw) in records.into_iter().enumerate() {
            let lines = match to_line_vector(&raw.binary) {
                Ok(lines) => Some(lines),
                Err(source) => match policy {
                    LoadPolicy::Strict => {
                        return Err(TableError::InvalidTableData {
                            number: raw.hex,
                            key: raw.binary.as_text(),
                            source,
                        })
                    }
                    LoadPolicy::Quarantine => {
                        tracing::warn!(
                            number = raw.hex,
                            index,
                            error = %source,
                            "quarantining hexagram with malformed binary key"
                        );
                        None
                    }
                },
            };

            if let Some(lines) = lines {
                if let Some(prev) = by_key.insert(lines.to_binary_key(), index) {
                    let prev_number: u32 = hexagrams
                        .get(prev)
                        .map(|h: &Hexagram| h.number)
                        .unwrap_or_default();
                    return Err(TableError::Configuration(format!(
                        "duplicate binary key {} on hexagrams {} and {}",
                        lines, prev_number, raw.hex
                    )));
                }
            }

            hexagrams.push(raw.into_hexagram(lines));
        }

        tracing::debug!(
            entries = hexagrams.len(),
            keyed = by_key.len(),
            "hexagram table validated"
        );
        Ok(Self { hexagrams, by_key })
    }

    /// All entries in source order.
    pub fn all(&self) -> &[Hexagram] {
        &self.hexagrams
    }

    pub fn len(&self) -> usize {
        self.hexagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexagrams.is_empty()
    }

    /// Entry at `user_number mod 64` (Euclidean, so negatives wrap upward).
    pub fn find_by_user_number(&self, user_number: i64) -> &Hexagram {
        let index = user_number.rem_euclid(TABLE_SIZE as i64) as usize;
        // len is fixed at TABLE_SIZE by from_records
        &self.hexagrams[index]
    }

    /// Exact match on the zero-padded key. A miss is `None`.
    pub fn find_by_binary_key(&self, key: &str) -> Option<&Hexagram> {
        let key = normalize_key(key);
        self.by_key.get(&key).map(|&i| &self.hexagrams[i])
    }

    pub fn find_by_lines(&self, lines: &LineVector) -> Option<&Hexagram> {
        self.by_key
            .get(&lines.to_binary_key())
            .map(|&i| &self.hexagrams[i])
    }

    /// Lookup by King Wen number.
    pub fn find_by_number(&self, number: u32) -> Option<&Hexagram> {
        self.hexagrams.iter().find(|h| h.number == number)
    }

    pub fn quarantined(&self) -> impl Iterator<Item = &Hexagram> {
        self.hexagrams.iter().filter(|h| h.is_quarantined())
    }
}

// --- Process-wide instance ---

static GLOBAL: OnceLock<Result<HexagramTable, String>> = OnceLock::new();

/// The embedded table, parsed on first access. Concurrent first callers
/// block on a single load; a failed load is remembered and reported to
/// every caller as a configuration error.
pub fn global() -> Result<&'static HexagramTable, TableError> {
    GLOBAL
        .get_or_init(|| {
            HexagramTable::embedded().map_err(|e| {
                tracing::error!(error = %e, "embedded hexagram table failed to load");
                e.to_string()
            })
        })
        .as_ref()
        .map_err(|msg| TableError::Configuration(msg.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_records() -> Vec<serde_json::Value> {
        serde_json::from_str(EMBEDDED_TABLE).unwrap()
    }

    fn table_from(records: &[serde_json::Value], policy: LoadPolicy) -> Result<HexagramTable, TableError> {
        HexagramTable::from_json_str(&serde_json::to_string(records).unwrap(), policy)
    }

    #[test]
    fn embedded_table_is_complete() {
        let table = HexagramTable::embedded().unwrap();
        assert_eq!(table.len(), TABLE_SIZE);
        assert_eq!(table.quarantined().count(), 0);
        assert_eq!(table.all()[0].number, 1);
        assert_eq!(table.all()[63].number, 64);
    }

    #[test]
    fn embedded_rows_carry_display_text() {
        let table = HexagramTable::embedded().unwrap();
        for h in table.all() {
            assert_eq!(h.line_texts.len(), 6, "hexagram {}", h.number);
            assert!(!h.image.text.is_empty(), "hexagram {}", h.number);
            assert!(!h.symbolic.is_empty(), "hexagram {}", h.number);
            assert!(!h.judgment.text.is_empty(), "hexagram {}", h.number);
        }
        let tai = table.find_by_number(11).unwrap();
        assert!(tai.line_texts[0].text.starts_with("初九"));
        assert!(tai.line_texts[5].text.starts_with("上六"));
        assert_eq!(tai.image.comments, "Earth above, heaven below.");
    }

    #[test]
    fn fills_trigrams_from_lines_when_missing() {
        let mut records = embedded_records();
        records[10].as_object_mut().unwrap().remove("wilhelm_above");
        records[10]["wilhelm_below"] = serde_json::json!("garbled text");
        let table = table_from(&records, LoadPolicy::Strict).unwrap();
        let tai = table.find_by_number(11).unwrap();
        assert_eq!(tai.above.as_ref().unwrap().alchemical, "EARTH");
        assert_eq!(tai.below.as_ref().unwrap().alchemical, "HEAVEN");
    }

    #[test]
    fn short_table_is_a_configuration_error() {
        let records = embedded_records();
        let err = table_from(&records[..63], LoadPolicy::Strict).unwrap_err();
        assert!(matches!(err, TableError::Configuration(_)), "{err}");
    }

    #[test]
    fn duplicate_key_is_a_configuration_error() {
        let mut records = embedded_records();
        records[5]["binary"] = serde_json::json!("111111");
        let err = table_from(&records, LoadPolicy::Strict).unwrap_err();
        match err {
            TableError::Configuration(msg) => assert!(msg.contains("111111"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_policy_rejects_malformed_key() {
        let mut records = embedded_records();
        records[61]["binary"] = serde_json::json!("extraordinary prudence is necessary.");
        let err = table_from(&records, LoadPolicy::Strict).unwrap_err();
        assert!(
            matches!(err, TableError::InvalidTableData { number: 62, .. }),
            "{err}"
        );
    }

    #[test]
    fn quarantine_policy_keeps_row_position() {
        let mut records = embedded_records();
        records[61]["binary"] = serde_json::json!("'comments': 'When water in a kettle");
        let table = table_from(&records, LoadPolicy::Quarantine).unwrap();
        assert_eq!(table.len(), TABLE_SIZE);
        let quarantined: Vec<u32> = table.quarantined().map(|h| h.number).collect();
        assert_eq!(quarantined, vec![62]);
        assert_eq!(table.find_by_user_number(61).number, 62);
        assert!(table.find_by_binary_key("001100").is_none());
    }

    #[test]
    fn accepts_numeric_keys_and_keyed_objects() {
        let mut records = embedded_records();
        records[1]["binary"] = serde_json::json!(0);
        records[3]["binary"] = serde_json::json!(10001);
        let mut keyed = serde_json::Map::new();
        for r in &records {
            keyed.insert(r["hex"].to_string(), r.clone());
        }
        let json = serde_json::to_string(&keyed).unwrap();
        let table = HexagramTable::from_json_str(&json, LoadPolicy::Strict).unwrap();
        assert_eq!(table.find_by_binary_key("0").unwrap().number, 2);
        assert_eq!(table.find_by_binary_key("10001").unwrap().number, 4);
        assert_eq!(table.all()[9].number, 10);
    }

    #[test]
    fn global_table_is_shared() {
        let a = global().unwrap();
        let b = global().unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
