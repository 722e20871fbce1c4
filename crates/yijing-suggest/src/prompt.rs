use yijing_core::{DerivationResult, Hexagram, Relation};

use crate::Situation;

fn relation_meaning(relation: Relation) -> &'static str {
    match relation {
        Relation::Changed => "the development trend or result",
        Relation::Mutual => "the inner mechanism or intermediate process",
        Relation::Opposite => "the opposite side or contrasting perspective",
        Relation::Inverted => "the reverse perspective or the other party's viewpoint",
    }
}

fn describe_trigrams(out: &mut String, h: &Hexagram) {
    if let (Some(above), Some(below)) = (&h.above, &h.below) {
        out.push_str(&format!(
            "- Trigrams: {} ({}) above {} ({})\n",
            above.alchemical, above.symbolic, below.alchemical, below.symbolic
        ));
    }
}

/// The reading as a compact text block for LLM consumption.
pub fn serialize_reading(result: &DerivationResult<'_>) -> String {
    let mut out = String::with_capacity(1024);
    let original = result.original;

    out.push_str("PRIMARY HEXAGRAM (本卦):\n");
    out.push_str(&format!("- Name: {}\n", original.display_name()));
    if let Some(key) = original.binary_key() {
        out.push_str(&format!("- Lines (bottom to top): {key}\n"));
    }
    describe_trigrams(&mut out, original);
    if !original.judgment.text.is_empty() {
        out.push_str(&format!("- Judgment: {}\n", original.judgment.text));
    }
    if !original.image.text.is_empty() {
        out.push_str(&format!("- Image: {}\n", original.image.text));
    }
    if !original.symbolic.is_empty() {
        out.push_str(&format!("- Symbolic Meaning: {}\n", original.symbolic));
    }

    out.push_str("\nRELATED HEXAGRAMS:\n");
    for (i, (relation, found)) in result.related().iter().enumerate() {
        let name = found
            .map(|h| h.display_name())
            .unwrap_or_else(|| "Not available".to_string());
        out.push_str(&format!(
            "{}. {} HEXAGRAM ({}) - {}\n   Represents {}.\n",
            i + 1,
            relation.label().to_uppercase(),
            relation.chinese(),
            name,
            relation_meaning(*relation)
        ));
    }
    out
}

pub fn analysis_system_prompt() -> &'static str {
    "You are a wise I Ching consultant with deep knowledge of Chinese philosophy and divination. \
Provide thoughtful, practical guidance based on the hexagram and user situation."
}

fn previous_cities(situation: &Situation) -> String {
    let cities: Vec<&str> = situation
        .previous_cities
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if cities.is_empty() {
        "N/A".to_string()
    } else {
        cities.join(", ")
    }
}

pub fn analysis_message(result: &DerivationResult<'_>, situation: &Situation) -> String {
    format!(
        "Based on the I Ching hexagram analysis with 5 related hexagrams, provide a comprehensive \
analysis of the following situation:\n\n\
{}\n\
USER'S SITUATION:\n\
- Location: {}\n\
- Previous Cities: {}\n\
- Personal Experience: {}\n\
- Current Difficulty: {}\n\
- Divination Number: {}\n\n\
Consider how the user's life in the previous cities shapes their mindset, resources, \
social networks and adaptability regarding the current difficulty, and point out contrasts \
between those cities and the current one where relevant.\n\n\
Respond in exactly this format:\n\n\
SUMMARY: [one paragraph on what the five hexagrams mean for the user's situation]\n\n\
INSIGHTS:\n\
- [insight tied to the user's personal experience]\n\
- [insight tied to the user's current difficulty]\n\
- [insight tied to the user's current difficulty]\n\n\
RECOMMENDATIONS:\n\
- [practical recommendation drawing on the personal experience and all hexagrams]\n\
- [practical recommendation drawing on the difficulty and all hexagrams]\n\
- [practical recommendation drawing on the difficulty and all hexagrams]\n\n\
Connect the ancient wisdom to the user's modern situation. Be encouraging but realistic.",
        serialize_reading(result),
        situation.city,
        previous_cities(situation),
        situation.experience,
        situation.difficulty,
        situation.number
    )
}
