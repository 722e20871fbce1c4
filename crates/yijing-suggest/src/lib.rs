pub mod city_image;
pub mod engine;
pub mod painting;
mod parse;
pub mod poem;
mod prompt;

use serde::{Deserialize, Serialize};

use yijing_core::{AiSettings, DerivationResult};

pub use engine::{Budget, GenerateError};
pub use parse::parse_analysis;
pub use prompt::serialize_reading;

/// What the user told us about themselves alongside their number.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Situation {
    #[serde(default)]
    pub city: String,
    /// Cities the user lived in before the current one.
    #[serde(default)]
    pub previous_cities: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub difficulty: String,
    pub number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            summary: "The hexagram offers wisdom for your current situation.".to_string(),
            insights: vec!["The hexagram suggests seeking inner guidance".to_string()],
            recommendations: vec![
                "Reflect on the hexagram meanings".to_string(),
                "Consider the guidance provided".to_string(),
            ],
        }
    }
}

impl Analysis {
    /// Returned when no model could be reached. Built from the reading and
    /// the situation so the user still gets something specific.
    pub fn offline(result: &DerivationResult<'_>, situation: &Situation) -> Self {
        let original = result.original;
        let tone = if original.judgment.text.to_lowercase().contains("success") {
            "great potential"
        } else {
            "careful consideration"
        };
        let symbolic = if original.symbolic.is_empty() {
            "a turning point".to_string()
        } else {
            original.symbolic.trim_end_matches('.').to_string()
        };
        let mut summary = format!(
            "The {} hexagram represents {}. This is a time of {tone}.",
            original.display_name(),
            symbolic
        );
        if let Some(changed) = result.changed {
            summary.push_str(&format!(
                " The situation is moving toward {}.",
                changed.display_name()
            ));
        }

        let place = match situation.city.trim() {
            "" => "your current city".to_string(),
            city => city.to_string(),
        };
        let focus = if situation.difficulty.to_lowercase().contains("work") {
            "career development"
        } else {
            "personal growth"
        };

        Self {
            summary,
            insights: vec![
                format!(
                    "Based on your experience in {place} and your current challenges, this hexagram suggests focusing on {focus}."
                ),
                "The difficulty you are facing is part of a larger transformation.".to_string(),
            ],
            recommendations: vec![
                "Take time to reflect on your experiences and learn from them".to_string(),
                "Be patient and persistent in your current endeavors".to_string(),
                "Avoid making hasty decisions".to_string(),
            ],
        }
    }
}

/// Run LLM analysis on a reading. Returns `Analysis::offline` on failure.
pub async fn analyze(
    result: &DerivationResult<'_>,
    situation: &Situation,
    settings: &AiSettings,
) -> Analysis {
    let user_msg = prompt::analysis_message(result, situation);

    tracing::info!(
        provider = %settings.provider,
        model = %settings.model,
        original = result.original.number,
        "requesting reading analysis"
    );

    match engine::generate(
        settings,
        prompt::analysis_system_prompt(),
        &user_msg,
        Budget::default(),
    )
    .await
    {
        Ok(raw) => {
            tracing::debug!(raw = %raw, "raw analysis output");
            parse::parse_analysis(&raw)
        }
        Err(e) => {
            tracing::warn!(error = %e, "analysis unavailable, using fallback");
            Analysis::offline(result, situation)
        }
    }
}
