//! Four-paragraph poems timed to a five-slide video journey.

use serde::{Deserialize, Serialize};

use yijing_core::AiSettings;

use crate::engine::{self, Budget};

/// Paragraphs per poem: one per transition between five slides.
pub const PARAGRAPH_COUNT: usize = 4;
/// Seconds each paragraph stays on screen.
pub const PARAGRAPH_SECONDS: u32 = 6;
pub const DEFAULT_CITIES: [&str; 4] = ["Chongqing", "New York", "Lincoln", "Shanghai"];

const SYSTEM_INSTRUCTIONS: &str = "You are a skilled multimedia poet. You always craft verse \
that aligns to strict timing requirements for video journeys.\n\n\
CRITICAL RULES:\n\
- Output exactly 4 paragraphs (no more, no less).\n\
- Each paragraph must contain 4-6 poetic lines.\n\
- Maintain strong narrative flow across paragraphs following the provided journey context.\n\
- Return only the poem content formatted as paragraphs separated by blank lines.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Genre {
    VideoJourney,
    Sonnet,
    Ballad,
    FreeVerse,
    Ode,
}

pub struct GenreInfo {
    pub name: &'static str,
    pub structure: &'static str,
    pub emotional_range: &'static [&'static str],
    pub suitable: &'static [&'static str],
    pub mood: &'static [&'static str],
}

impl Genre {
    /// Tie-break order for selection.
    pub const ALL: [Genre; 5] = [
        Genre::VideoJourney,
        Genre::Sonnet,
        Genre::Ballad,
        Genre::FreeVerse,
        Genre::Ode,
    ];

    pub fn info(self) -> GenreInfo {
        match self {
            Genre::VideoJourney => GenreInfo {
                name: "Video Journey Poem",
                structure: "4 paragraphs, each 4-6 lines, synchronized with 6-second intervals",
                emotional_range: &["journey", "exploration", "discovery", "reflection"],
                suitable: &[
                    "accompanying visual narratives",
                    "city exploration",
                    "cultural journey",
                    "emotional progression",
                ],
                mood: &["contemplative", "adventurous", "reflective"],
            },
            Genre::Sonnet => GenreInfo {
                name: "Sonnet",
                structure: "14 lines adapted into 4 paragraphs (4-4-4-2 or 3-4-4-3 lines)",
                emotional_range: &["love", "beauty", "contemplation", "philosophical"],
                suitable: &[
                    "expressing profound love",
                    "philosophical reflection",
                    "capturing beauty",
                ],
                mood: &["romantic", "contemplative", "elegant"],
            },
            Genre::Ballad => GenreInfo {
                name: "Ballad",
                structure: "4 stanzas telling a story progression across cities",
                emotional_range: &["storytelling", "adventure", "tragedy", "heroism"],
                suitable: &[
                    "telling stories",
                    "narrating adventures",
                    "folk tales",
                    "historical events",
                ],
                mood: &["narrative", "dramatic", "folk-like"],
            },
            Genre::FreeVerse => GenreInfo {
                name: "Free Verse Journey",
                structure: "4 free-form paragraphs with flexible rhythm and flow",
                emotional_range: &["any emotion", "personal expression", "modern themes"],
                suitable: &[
                    "raw emotion",
                    "modern experiences",
                    "personal stories",
                    "experimental expression",
                ],
                mood: &["flexible", "contemporary", "personal"],
            },
            Genre::Ode => GenreInfo {
                name: "Ode to Cities",
                structure: "4 stanzas celebrating different aspects of the journey",
                emotional_range: &["praise", "celebration", "admiration", "reverence"],
                suitable: &[
                    "celebrating achievements",
                    "praising cities/cultures",
                    "expressing admiration",
                ],
                mood: &["celebratory", "reverent", "uplifting"],
            },
        }
    }
}

fn situation_genres(situation: &str) -> &'static [Genre] {
    match situation {
        "cultural exploration" => &[Genre::VideoJourney, Genre::Ode, Genre::Ballad],
        "city journey" => &[Genre::VideoJourney, Genre::FreeVerse],
        "travel adventure" => &[Genre::Ballad, Genre::VideoJourney],
        "artistic discovery" => &[Genre::Ode, Genre::FreeVerse],
        "contemplative journey" => &[Genre::Sonnet, Genre::VideoJourney],
        "celebration of diversity" => &[Genre::Ode, Genre::VideoJourney],
        "personal growth" => &[Genre::FreeVerse, Genre::VideoJourney],
        "visual storytelling" => &[Genre::VideoJourney, Genre::Ballad],
        _ => &[],
    }
}

fn intensity_genres(intensity: &str) -> &'static [Genre] {
    match intensity {
        "overwhelming" => &[Genre::Sonnet, Genre::Ode],
        "moderate" => &[Genre::Ballad, Genre::VideoJourney, Genre::FreeVerse],
        "light" | "playful" => &[Genre::VideoJourney],
        "deep" => &[Genre::Sonnet, Genre::FreeVerse],
        "contemplative" => &[Genre::Sonnet, Genre::FreeVerse, Genre::VideoJourney],
        _ => &[],
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoemRequest {
    pub topic: Option<String>,
    pub emotion: Option<String>,
    pub situation: Option<String>,
    pub intensity: Option<String>,
    pub mood: Option<String>,
    pub purpose: Option<String>,
    pub tone: Option<String>,
    /// Skip selection and use this genre.
    pub genre: Option<Genre>,
    pub cities: Option<Vec<String>>,
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl PoemRequest {
    /// Fill unset fields with the video-journey defaults.
    pub fn resolved(&self) -> PoemRequest {
        PoemRequest {
            topic: Some(or_default(&self.topic, "a journey through cities and souls")),
            emotion: Some(or_default(&self.emotion, "contemplative")),
            situation: Some(or_default(&self.situation, "cultural exploration")),
            intensity: Some(or_default(&self.intensity, "moderate")),
            mood: Some(or_default(&self.mood, "reflective")),
            purpose: Some(or_default(&self.purpose, "visual storytelling")),
            tone: Some(or_default(&self.tone, "poetic")),
            genre: self.genre,
            cities: Some(self.cities()),
        }
    }

    pub fn cities(&self) -> Vec<String> {
        match &self.cities {
            Some(c) if !c.is_empty() => c.clone(),
            _ => DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn overlaps(value: &str, candidates: &[&str]) -> bool {
    candidates
        .iter()
        .any(|c| value.contains(c) || c.contains(value))
}

fn lowered(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Score each genre against the request and take the best. Video journey
/// starts one point ahead and wins when nothing else scored.
pub fn select_genre(request: &PoemRequest) -> Genre {
    let mut scores: [u32; 5] = [1, 0, 0, 0, 0];
    let slot = |g: Genre| Genre::ALL.iter().position(|x| *x == g).unwrap_or(0);

    if let Some(situation) = lowered(&request.situation) {
        for g in situation_genres(&situation) {
            scores[slot(*g)] += 3;
        }
    }
    if let Some(intensity) = lowered(&request.intensity) {
        for g in intensity_genres(&intensity) {
            scores[slot(*g)] += 2;
        }
    }

    let emotion = lowered(&request.emotion);
    let mood = lowered(&request.mood);
    let purpose = lowered(&request.purpose);
    for (i, genre) in Genre::ALL.iter().enumerate() {
        let info = genre.info();
        if emotion.as_deref().is_some_and(|e| overlaps(e, info.emotional_range)) {
            scores[i] += 2;
        }
        if mood.as_deref().is_some_and(|m| overlaps(m, info.mood)) {
            scores[i] += 2;
        }
        if purpose.as_deref().is_some_and(|p| overlaps(p, info.suitable)) {
            scores[i] += 3;
        }
    }

    let max = scores.iter().copied().max().unwrap_or(0);
    if max <= 1 {
        return Genre::VideoJourney;
    }
    Genre::ALL
        .iter()
        .zip(scores)
        .find(|(_, s)| *s == max)
        .map(|(g, _)| *g)
        .unwrap_or(Genre::VideoJourney)
}

pub fn build_prompt(genre: Genre, request: &PoemRequest) -> String {
    let info = genre.info();
    let name = info.name.to_lowercase();
    let topic = or_default(&request.topic, "a journey through cities and souls");
    let cities = request.cities().join(", ");

    let mut context = String::new();
    for (label, value) in [
        ("Emotion", &request.emotion),
        ("Life Situation", &request.situation),
        ("Desired Mood", &request.mood),
        ("Tone", &request.tone),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            context.push_str(&format!("- {label}: {v}\n"));
        }
    }

    format!(
        "Write a {name} about \"{topic}\" that will accompany a video journey through these \
cities: {cities}.\n\n\
CRITICAL REQUIREMENTS:\n\
- Write EXACTLY {PARAGRAPH_COUNT} paragraphs (no more, no less)\n\
- Each paragraph should be 4-6 lines long\n\
- Each paragraph will display for exactly {PARAGRAPH_SECONDS} seconds during the video\n\
- The poem should flow as a journey through these locations\n\n\
Genre Requirements:\n\
- Structure: {}\n\
- Emotional Range: {}\n\
- Suitable for: {}\n\n\
Context:\n{context}\
- Cities Featured: {cities}\n\n\
Separate paragraphs with a single blank line and output nothing but the poem.",
        info.structure,
        info.emotional_range.join(", "),
        info.suitable.join(", "),
    )
}

/// Split on blank lines, dropping empties and "Paragraph N:" labels.
pub fn split_paragraphs(poem: &str) -> Vec<String> {
    poem.replace("\r\n", "\n")
        .split("\n\n")
        .map(|p| {
            let p = p.trim();
            match p.split_once(':') {
                Some((label, rest)) if label.starts_with("Paragraph ") && label.len() <= 12 => {
                    rest.trim().to_string()
                }
                _ => p.to_string(),
            }
        })
        .filter(|p| !p.is_empty())
        .collect()
}

const FALLBACK_POEM: &str = "\
Lanterns wake along the river bend,
Steps of stone climb where the mist descends.
A stranger's map unfolds in evening air,
The first page of a road we've yet to share.

Glass towers hum a restless, silver tune,
Their windows borrowing the rising moon.
Between the crowds a quiet question grows:
Which way the current, where the water goes.

Across the plains the wind is slow and wide,
It asks for nothing, has no need to hide.
We count the fields instead of counting days,
And learn the patience of the open ways.

At journey's end the harbor lights burn gold,
New stories waiting where the old are told.
Each city gave a line, a breath, a sign,
And every road returned us to our line.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoemMeta {
    pub model: String,
    pub used_ai: bool,
    pub selected_genre: Genre,
    pub paragraph_count: usize,
    pub expected_paragraphs: usize,
    pub sync_seconds: u32,
    pub cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoemResult {
    pub poem: String,
    pub paragraphs: Vec<String>,
    pub meta: PoemMeta,
}

pub fn fallback_poem(genre: Genre, cities: Vec<String>, reason: String) -> PoemResult {
    let paragraphs = split_paragraphs(FALLBACK_POEM);
    PoemResult {
        poem: FALLBACK_POEM.to_string(),
        meta: PoemMeta {
            model: "fallback".to_string(),
            used_ai: false,
            selected_genre: genre,
            paragraph_count: paragraphs.len(),
            expected_paragraphs: PARAGRAPH_COUNT,
            sync_seconds: PARAGRAPH_SECONDS,
            cities,
            error: Some(reason),
        },
        paragraphs,
    }
}

/// Generate a poem, or the built-in fallback when no model answers.
pub async fn generate_poem(request: &PoemRequest, settings: &AiSettings) -> PoemResult {
    let request = request.resolved();
    let genre = request.genre.unwrap_or_else(|| select_genre(&request));
    let cities = request.cities();

    let prompt = build_prompt(genre, &request);
    let budget = Budget {
        max_tokens: 2000,
        temperature: 0.9,
    };

    match engine::generate(settings, SYSTEM_INSTRUCTIONS, &prompt, budget).await {
        Ok(poem) => {
            let paragraphs = split_paragraphs(&poem);
            if paragraphs.len() != PARAGRAPH_COUNT {
                tracing::warn!(
                    got = paragraphs.len(),
                    expected = PARAGRAPH_COUNT,
                    "poem paragraph count mismatch"
                );
            }
            PoemResult {
                meta: PoemMeta {
                    model: settings.model.clone(),
                    used_ai: true,
                    selected_genre: genre,
                    paragraph_count: paragraphs.len(),
                    expected_paragraphs: PARAGRAPH_COUNT,
                    sync_seconds: PARAGRAPH_SECONDS,
                    cities,
                    error: None,
                },
                poem,
                paragraphs,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "poem generation failed, using fallback");
            fallback_poem(genre, cities, e.to_string())
        }
    }
}
