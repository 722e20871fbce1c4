use serde::{Deserialize, Serialize};

use yijing_core::AiSettings;

use crate::engine::{self, Budget};
use crate::painting::{self, PaintingRequest, PaintingResult};

const CITY_ASPECT: &str = "16:9";

const DESIGNER_SYSTEM: &str = "You are a visual prompt designer who writes evocative, \
production-ready prompts for image generation models. Keep prompts concise yet richly \
descriptive, avoid copyrighted names, and focus on mood, composition, lighting, palette, \
and textures.";

const REFERENCE_STYLE: &str = "Masterpiece, illustration of \"Poetic Modernism\". A nostalgic, \
dreamlike memory of a folded mountain city. Vertical composition is transformed into a \
widescreen 16:9 panorama. Foreground hands releasing a warm amber lantern (key light). \
Mid-ground stone-step path between moss-covered stilt houses; glowing windows; ginger cat on \
sill; blurred chessboard. Background confluence of two rivers as ribbons of sapphire and amber; \
semi-transparent glowing bridges; deep blue night with ethereal clouds. Low saturation, high \
contrast; dominant indigo/navy with high-sat amber. Visible hand-painted strokes; paper grain; \
floating light particles. Optional video feel: slow upward drift of lantern and particles.";

/// Where the image prompt came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PromptSource {
    Model,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityImageResult {
    pub city: String,
    pub prompt_source: PromptSource,
    #[serde(flatten)]
    pub painting: PaintingResult,
}

pub fn designer_message(city: &str) -> String {
    format!(
        "Create a single, self-contained image prompt for an artwork inspired by the city: {city}.

Do not include markdown or section headings in the final output, just a cohesive paragraph \
suitable for an image model. Prioritize a widescreen 16:9 cinematic composition.

Reference example style (for Chongqing): {REFERENCE_STYLE}

Now adapt this level of detail for {city}, with:
- Foreground element(s) with a clear key light.
- Mid-ground showing characteristic local architecture or streets.
- Background featuring iconic geography/landmarks or skyline.
- Cohesive color palette and textures.
- Optional subtle motion cues suitable for a video background.

Output only the final prompt paragraph, no headings, no JSON, no extra text."
    )
}

/// Used when no chat model answers.
pub fn template_prompt(city: &str) -> String {
    format!(
        "Masterpiece, illustration of \"Poetic Modernism\". A nostalgic, dreamlike memory of \
{city} as a widescreen 16:9 cinematic panorama. Foreground hands holding a warm lantern as the \
key light. Mid-ground streets and characteristic local architecture with glowing windows. \
Background iconic geography and skyline under a deep blue night with ethereal clouds. Low \
saturation, high contrast, indigo with amber accents. Visible hand-painted strokes, paper grain \
and floating light particles."
    )
}

/// Ask the chat model for a cinematic prompt about `city`, then paint it at
/// 16:9. Both steps fall back offline: a template prompt and an SVG placeholder.
pub async fn generate_city_image(city: &str, settings: &AiSettings) -> CityImageResult {
    let city = city.trim();
    let budget = Budget {
        max_tokens: 500,
        temperature: 1.0,
    };

    let (prompt, prompt_source) =
        match engine::generate(settings, DESIGNER_SYSTEM, &designer_message(city), budget).await {
            Ok(prompt) => (prompt.trim().to_string(), PromptSource::Model),
            Err(e) => {
                tracing::warn!(city, error = %e, "city prompt unavailable, using template");
                (template_prompt(city), PromptSource::Template)
            }
        };

    let request = PaintingRequest {
        prompt,
        palette: Vec::new(),
        aspect_ratio: Some(CITY_ASPECT.to_string()),
    };
    let painting = painting::generate_painting(&request, settings).await;

    CityImageResult {
        city: city.to_string(),
        prompt_source,
        painting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designer_message_names_city_twice() {
        let msg = designer_message("Lincoln");
        assert!(msg.contains("inspired by the city: Lincoln."));
        assert!(msg.contains("Now adapt this level of detail for Lincoln"));
        assert!(msg.contains("16:9"));
    }

    #[tokio::test]
    async fn offline_city_image_uses_template_and_placeholder() {
        let result = generate_city_image("  Chongqing ", &AiSettings::default()).await;
        assert_eq!(result.city, "Chongqing");
        assert_eq!(result.prompt_source, PromptSource::Template);
        assert!(result.painting.prompt.contains("memory of Chongqing"));
        assert_eq!(result.painting.mime_type, "image/svg+xml");
        assert_eq!(result.painting.meta.size, "1792x1024");
        assert!(result.painting.meta.fallback);
        assert!(result.painting.image_b64.is_some());
    }
}
