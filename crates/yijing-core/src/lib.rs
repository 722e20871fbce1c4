pub mod derive;
pub mod error;
pub mod lines;
pub mod settings;
pub mod table;
pub mod trigram;

use serde::{Deserialize, Serialize};

pub use derive::{changing_line_index, Relation};
pub use error::{LineError, TableError};
pub use lines::{normalize_key, to_binary_key, to_line_vector, BinaryInput, LineVector};
pub use settings::{ai_configured, apply_env, data_dir, read_settings, write_settings, AiSettings};
pub use table::{HexagramTable, LoadPolicy, TABLE_SIZE};
pub use trigram::Trigram;

// --- Types ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HexagramText {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
}

impl HexagramText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.comments.is_empty()
    }
}

/// Display description of the upper or lower trigram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrigramInfo {
    pub chinese: String,
    pub symbolic: String,
    pub alchemical: String,
}

impl From<Trigram> for TrigramInfo {
    fn from(t: Trigram) -> Self {
        TrigramInfo {
            chinese: t.romanized().to_string(),
            symbolic: t.attribute().to_string(),
            alchemical: t.image().to_string(),
        }
    }
}

/// One of the 64 canonical hexagrams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hexagram {
    /// King Wen number. Not the table position.
    pub number: u32,
    /// `None` only for rows quarantined at load time.
    #[serde(rename = "binaryKey", skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineVector>,
    /// Key exactly as the source table stored it.
    pub raw_binary: String,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<TrigramInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<TrigramInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub symbolic: String,
    #[serde(default, skip_serializing_if = "HexagramText::is_empty")]
    pub judgment: HexagramText,
    #[serde(default, skip_serializing_if = "HexagramText::is_empty")]
    pub image: HexagramText,
    /// Commentary per line, bottom to top. Six entries or none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_texts: Vec<HexagramText>,
}

impl Hexagram {
    pub fn binary_key(&self) -> Option<String> {
        self.lines.map(|l| l.to_binary_key())
    }

    pub fn is_quarantined(&self) -> bool {
        self.lines.is_none()
    }

    /// "乾 (Initiating)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.chinese, self.english)
    }
}

/// The original hexagram plus its four relatives. A relative is `None` when
/// its derived key is not in the table; that is a normal outcome.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DerivationResult<'t> {
    pub original: &'t Hexagram,
    pub changed: Option<&'t Hexagram>,
    pub mutual: Option<&'t Hexagram>,
    pub opposite: Option<&'t Hexagram>,
    pub inverted: Option<&'t Hexagram>,
}

impl<'t> DerivationResult<'t> {
    pub fn get(&self, relation: Relation) -> Option<&'t Hexagram> {
        match relation {
            Relation::Changed => self.changed,
            Relation::Mutual => self.mutual,
            Relation::Opposite => self.opposite,
            Relation::Inverted => self.inverted,
        }
    }

    /// The four relatives in a fixed order.
    pub fn related(&self) -> [(Relation, Option<&'t Hexagram>); 4] {
        Relation::ALL.map(|r| (r, self.get(r)))
    }
}

// --- Process-wide table ---

/// All 64 hexagrams of the embedded table, in source order.
pub fn get_all_hexagrams() -> Result<&'static [Hexagram], TableError> {
    Ok(table::global()?.all())
}

pub fn find_by_user_number(user_number: i64) -> Result<&'static Hexagram, TableError> {
    Ok(table::global()?.find_by_user_number(user_number))
}

pub fn find_by_binary_key(key: &str) -> Result<Option<&'static Hexagram>, TableError> {
    Ok(table::global()?.find_by_binary_key(key))
}

/// Cast a reading against the embedded table: pick the original by
/// `user_number`, then derive its four relatives with the same number.
pub fn cast(user_number: i64) -> Result<DerivationResult<'static>, TableError> {
    let table = table::global()?;
    let original = table.find_by_user_number(user_number);
    Ok(table.calculate_all_related(original, user_number))
}
