use serde::{Deserialize, Serialize};

/// The eight trigrams. Line order is bottom-to-top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigram {
    Qian,
    Dui,
    Li,
    Zhen,
    Xun,
    Kan,
    Gen,
    Kun,
}

impl Trigram {
    pub const ALL: [Trigram; 8] = [
        Trigram::Qian,
        Trigram::Dui,
        Trigram::Li,
        Trigram::Zhen,
        Trigram::Xun,
        Trigram::Kan,
        Trigram::Gen,
        Trigram::Kun,
    ];

    pub fn from_lines(lines: [u8; 3]) -> Self {
        match lines {
            [1, 1, 1] => Trigram::Qian,
            [1, 1, 0] => Trigram::Dui,
            [1, 0, 1] => Trigram::Li,
            [1, 0, 0] => Trigram::Zhen,
            [0, 1, 1] => Trigram::Xun,
            [0, 1, 0] => Trigram::Kan,
            [0, 0, 1] => Trigram::Gen,
            _ => Trigram::Kun,
        }
    }

    pub fn lines(self) -> [u8; 3] {
        match self {
            Trigram::Qian => [1, 1, 1],
            Trigram::Dui => [1, 1, 0],
            Trigram::Li => [1, 0, 1],
            Trigram::Zhen => [1, 0, 0],
            Trigram::Xun => [0, 1, 1],
            Trigram::Kan => [0, 1, 0],
            Trigram::Gen => [0, 0, 1],
            Trigram::Kun => [0, 0, 0],
        }
    }

    pub fn chinese(self) -> &'static str {
        match self {
            Trigram::Qian => "乾",
            Trigram::Dui => "兌",
            Trigram::Li => "離",
            Trigram::Zhen => "震",
            Trigram::Xun => "巽",
            Trigram::Kan => "坎",
            Trigram::Gen => "艮",
            Trigram::Kun => "坤",
        }
    }

    /// Wilhelm romanization, as used in the source dataset.
    pub fn romanized(self) -> &'static str {
        match self {
            Trigram::Qian => "CH'IEN",
            Trigram::Dui => "TUI",
            Trigram::Li => "LI",
            Trigram::Zhen => "CHEN",
            Trigram::Xun => "SUN",
            Trigram::Kan => "K'AN",
            Trigram::Gen => "KEN",
            Trigram::Kun => "K'UN",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            Trigram::Qian => "THE CREATIVE",
            Trigram::Dui => "THE JOYOUS",
            Trigram::Li => "THE CLINGING",
            Trigram::Zhen => "THE AROUSING",
            Trigram::Xun => "THE GENTLE",
            Trigram::Kan => "THE ABYSMAL",
            Trigram::Gen => "KEEPING STILL",
            Trigram::Kun => "THE RECEPTIVE",
        }
    }

    pub fn image(self) -> &'static str {
        match self {
            Trigram::Qian => "HEAVEN",
            Trigram::Dui => "LAKE",
            Trigram::Li => "FLAME",
            Trigram::Zhen => "THUNDER",
            Trigram::Xun => "WIND",
            Trigram::Kan => "WATER",
            Trigram::Gen => "MOUNTAIN",
            Trigram::Kun => "EARTH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_roundtrip_for_all_eight() {
        for t in Trigram::ALL {
            assert_eq!(Trigram::from_lines(t.lines()), t);
        }
    }

    #[test]
    fn thunder_has_yang_at_bottom() {
        assert_eq!(Trigram::from_lines([1, 0, 0]), Trigram::Zhen);
        assert_eq!(Trigram::Zhen.image(), "THUNDER");
    }
}
