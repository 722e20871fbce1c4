//! The four relatives of a hexagram.
//!
//! Each relation is a pure transform of the original's six lines followed by
//! a key lookup. Only the changed hexagram depends on the user number, which
//! also picks the original, so a given number always yields the same moving
//! line.

use serde::{Deserialize, Serialize};

use crate::lines::{LineVector, LINE_COUNT};
use crate::table::HexagramTable;
use crate::{DerivationResult, Hexagram};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    /// 变卦: the moving line flipped.
    Changed,
    /// 互卦: the inner trigrams recombined.
    Mutual,
    /// 错卦: every line inverted.
    Opposite,
    /// 综卦: turned upside down.
    Inverted,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Changed,
        Relation::Mutual,
        Relation::Opposite,
        Relation::Inverted,
    ];

    pub fn chinese(self) -> &'static str {
        match self {
            Relation::Changed => "变卦",
            Relation::Mutual => "互卦",
            Relation::Opposite => "错卦",
            Relation::Inverted => "综卦",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Relation::Changed => "changed",
            Relation::Mutual => "mutual",
            Relation::Opposite => "opposite",
            Relation::Inverted => "inverted",
        }
    }

    /// The line vector this relation looks up.
    pub fn apply(self, lines: &LineVector, user_number: i64) -> LineVector {
        match self {
            Relation::Changed => lines.flipped(changing_line_index(user_number)),
            Relation::Mutual => lines.mutual(),
            Relation::Opposite => lines.complement(),
            Relation::Inverted => lines.reversed(),
        }
    }
}

/// Index (0 = bottom) of the moving line for `user_number`.
pub fn changing_line_index(user_number: i64) -> usize {
    user_number.rem_euclid(LINE_COUNT as i64) as usize
}

impl HexagramTable {
    fn relative(&self, original: &Hexagram, relation: Relation, user_number: i64) -> Option<&Hexagram> {
        let lines = original.lines?;
        let derived = relation.apply(&lines, user_number);
        let found = self.find_by_lines(&derived);
        tracing::debug!(
            original = original.number,
            relation = relation.label(),
            key = %derived,
            found = found.map(|h| h.number),
            "derived hexagram"
        );
        found
    }

    pub fn calculate_changed(&self, original: &Hexagram, user_number: i64) -> Option<&Hexagram> {
        self.relative(original, Relation::Changed, user_number)
    }

    pub fn calculate_mutual(&self, original: &Hexagram) -> Option<&Hexagram> {
        self.relative(original, Relation::Mutual, 0)
    }

    pub fn calculate_opposite(&self, original: &Hexagram) -> Option<&Hexagram> {
        self.relative(original, Relation::Opposite, 0)
    }

    pub fn calculate_inverted(&self, original: &Hexagram) -> Option<&Hexagram> {
        self.relative(original, Relation::Inverted, 0)
    }

    /// All four relatives. A miss in one leaves the others untouched.
    pub fn calculate_all_related<'t>(
        &'t self,
        original: &'t Hexagram,
        user_number: i64,
    ) -> DerivationResult<'t> {
        DerivationResult {
            original,
            changed: self.calculate_changed(original, user_number),
            mutual: self.calculate_mutual(original),
            opposite: self.calculate_opposite(original),
            inverted: self.calculate_inverted(original),
        }
    }
}
