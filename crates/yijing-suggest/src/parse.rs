use crate::Analysis;

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Summary,
    Insights,
    Recommendations,
}

/// Parse a model reply. A JSON object (bare, or inside a ``` fence) with
/// `summary`, `insights` and `recommendations` wins; otherwise the
/// SUMMARY / INSIGHTS / RECOMMENDATIONS layout is read. Parts that come back
/// empty are filled with defaults rather than failing.
pub fn parse_analysis(raw: &str) -> Analysis {
    match extract_json(raw) {
        Some(parsed) => with_defaults(parsed.summary, parsed.insights, parsed.recommendations),
        None => parse_sections(raw),
    }
}

/// Body of the first ``` fence, dropping a language tag such as `json`.
fn strip_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let body = &text[start + 3..];
    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => text,
    }
}

fn extract_json(raw: &str) -> Option<Analysis> {
    let candidate = strip_fence(raw.trim());
    let first = candidate.find('{')?;
    let last = candidate.rfind('}')?;
    if last <= first {
        return None;
    }
    match serde_json::from_str::<Analysis>(&candidate[first..=last]) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "reply is not analysis JSON, reading sections");
            None
        }
    }
}

fn parse_sections(raw: &str) -> Analysis {
    let mut summary = String::new();
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();
    let mut section = Section::None;

    for line in raw.lines() {
        let trimmed = line.trim().trim_start_matches(['*', '#']).trim();

        if let Some(rest) = strip_heading(trimmed, "SUMMARY:") {
            section = Section::Summary;
            summary = rest.to_string();
        } else if strip_heading(trimmed, "INSIGHTS:").is_some() {
            section = Section::Insights;
        } else if strip_heading(trimmed, "RECOMMENDATIONS:").is_some() {
            section = Section::Recommendations;
        } else if let Some(item) = bullet(trimmed) {
            match section {
                Section::Insights => insights.push(item.to_string()),
                Section::Recommendations => recommendations.push(item.to_string()),
                _ => {}
            }
        } else if section == Section::Summary && !trimmed.is_empty() {
            // summary paragraphs sometimes wrap onto following lines
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(trimmed);
        }
    }

    with_defaults(summary, insights, recommendations)
}

fn with_defaults(summary: String, insights: Vec<String>, recommendations: Vec<String>) -> Analysis {
    let summary = summary.trim().to_string();
    let defaults = Analysis::default();
    Analysis {
        summary: if summary.is_empty() { defaults.summary } else { summary },
        insights: if insights.is_empty() { defaults.insights } else { insights },
        recommendations: if recommendations.is_empty() {
            defaults.recommendations
        } else {
            recommendations
        },
    }
}

fn strip_heading<'a>(line: &'a str, heading: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(heading)?;
    Some(rest.trim_start_matches('*').trim())
}

fn bullet(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let raw = "SUMMARY: Change is near.\n\nINSIGHTS:\n- First\n- Second\n\nRECOMMENDATIONS:\n- Rest\n- Walk\n- Write\n";
        let a = parse_analysis(raw);
        assert_eq!(a.summary, "Change is near.");
        assert_eq!(a.insights, vec!["First", "Second"]);
        assert_eq!(a.recommendations, vec!["Rest", "Walk", "Write"]);
    }

    #[test]
    fn tolerates_markdown_headings_and_wrapped_summary() {
        let raw = "**SUMMARY:** The Creative rises.\nIt meets the Receptive.\n## INSIGHTS:\n- Keep going\n";
        let a = parse_analysis(raw);
        assert_eq!(a.summary, "The Creative rises. It meets the Receptive.");
        assert_eq!(a.insights, vec!["Keep going"]);
        assert_eq!(a.recommendations, Analysis::default().recommendations);
    }

    #[test]
    fn unstructured_reply_falls_back_to_defaults() {
        let a = parse_analysis("I cannot help with that.");
        assert_eq!(a, Analysis::default());
    }

    #[test]
    fn reads_fenced_json_reply() {
        let raw = "Here is the reading:\n```json\n{\"summary\": \"Stay the course.\", \"insights\": [\"a\", \"b\"], \"recommendations\": [\"c\"]}\n```\nGood luck.";
        let a = parse_analysis(raw);
        assert_eq!(a.summary, "Stay the course.");
        assert_eq!(a.insights, vec!["a", "b"]);
        assert_eq!(a.recommendations, vec!["c"]);
    }

    #[test]
    fn reads_bare_json_with_surrounding_text() {
        let raw = "Sure! {\"summary\":\"Wait.\",\"insights\":[],\"recommendations\":[\"Rest\"]} Hope this helps.";
        let a = parse_analysis(raw);
        assert_eq!(a.summary, "Wait.");
        assert_eq!(a.insights, Analysis::default().insights);
        assert_eq!(a.recommendations, vec!["Rest"]);
    }

    #[test]
    fn json_missing_fields_falls_back_to_sections() {
        let raw = "SUMMARY: Sections win.\n{\"summary\": \"only\"}";
        let a = parse_analysis(raw);
        assert_eq!(a.summary, "Sections win. {\"summary\": \"only\"}");
    }

    #[test]
    fn bullets_before_any_section_are_ignored() {
        let a = parse_analysis("- stray\nINSIGHTS:\n- kept");
        assert_eq!(a.insights, vec!["kept"]);
    }
}
