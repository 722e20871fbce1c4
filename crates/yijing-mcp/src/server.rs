use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Serialize};

use yijing_core::{AiSettings, Hexagram, HexagramTable};
use yijing_suggest::city_image;
use yijing_suggest::painting::{self, PaintingRequest};
use yijing_suggest::poem::{self, PoemRequest};
use yijing_suggest::Situation;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetHexagramRequest {
    /// Six-character line key, bottom line first (e.g. "111111"). Shorter keys are left-padded with zeros.
    pub binary_key: Option<String>,
    /// King Wen number (1-64)
    pub number: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CastRequest {
    /// Any integer. Selects the primary hexagram (modulo 64) and the changing line (modulo 6).
    pub user_number: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeRequest {
    pub user_number: i64,
    /// Where the user is
    #[serde(default)]
    pub city: String,
    /// Cities the user lived in before
    #[serde(default)]
    pub previous_cities: Vec<String>,
    /// Something the user has lived through recently
    #[serde(default)]
    pub experience: String,
    /// What the user is struggling with
    #[serde(default)]
    pub difficulty: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CityImageRequest {
    /// City to portray
    pub city: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PaintRequest {
    /// Scene description
    pub prompt: String,
    /// Up to three hex colors; fewer are padded
    pub palette: Option<Vec<String>>,
    /// "16:9", "9:16", "1:1", "4:3" or "3:4"
    pub aspect_ratio: Option<String>,
}

/// One row of `list_hexagrams`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HexagramSummary {
    pub number: u32,
    pub binary_key: Option<String>,
    pub chinese: String,
    pub english: String,
    pub symbol: String,
}

impl From<&Hexagram> for HexagramSummary {
    fn from(h: &Hexagram) -> Self {
        Self {
            number: h.number,
            binary_key: h.binary_key(),
            chinese: h.chinese.clone(),
            english: h.english.clone(),
            symbol: h.symbol.clone(),
        }
    }
}

const INSTRUCTIONS: &str = r#"Yijing hexagram readings.

A reading starts from a user number. `cast_hexagrams` returns the primary hexagram and its four relatives:
- changed (变卦): the line at position (n mod 6) flipped, bottom line = position 0
- mutual (互卦): lines 2,3,4 over lines 1,2,3 of the primary
- opposite (错卦): every line flipped
- inverted (综卦): line order reversed

Binary keys list lines bottom to top, 1 = yang, 0 = yin.
Use `analyze_reading` for an interpretation, `generate_video_journey_poem`, `generate_html_painting` and `generate_city_image` for creative output. All of them degrade to offline fallbacks when no AI provider is configured."#;

fn json_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!("Serialization error: {e}"))]),
    }
}

/// Resolve `get_hexagram` arguments. The key wins when both are given.
pub fn lookup<'t>(table: &'t HexagramTable, req: &GetHexagramRequest) -> Result<&'t Hexagram, String> {
    if let Some(key) = req.binary_key.as_deref() {
        yijing_core::to_line_vector(&key.into()).map_err(|e| format!("Invalid binary key '{key}': {e}"))?;
        return table
            .find_by_binary_key(key)
            .ok_or_else(|| format!("No hexagram with binary key '{key}'"));
    }
    if let Some(number) = req.number {
        return table
            .find_by_number(number)
            .ok_or_else(|| format!("No hexagram numbered {number}"));
    }
    Err("Provide binary_key or number".to_string())
}

// --- Server ---

#[derive(Clone)]
pub struct YijingServer {
    tool_router: ToolRouter<Self>,
    table: Arc<HexagramTable>,
    settings: AiSettings,
}

#[tool_router]
impl YijingServer {
    pub fn new(table: Arc<HexagramTable>, settings: AiSettings) -> Self {
        Self {
            tool_router: Self::tool_router(),
            table,
            settings,
        }
    }

    #[tool(description = "List all 64 hexagrams in King Wen order with number, binary key (bottom line first), Chinese and English names and the Unicode symbol")]
    fn list_hexagrams(&self) -> Result<CallToolResult, McpError> {
        let rows: Vec<HexagramSummary> = self.table.all().iter().map(HexagramSummary::from).collect();
        Ok(json_result(&rows))
    }

    #[tool(description = "Get one hexagram with trigrams, judgment, image and line texts, by binary_key or by number")]
    fn get_hexagram(
        &self,
        Parameters(req): Parameters<GetHexagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        match lookup(&self.table, &req) {
            Ok(h) => Ok(json_result(h)),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e)])),
        }
    }

    #[tool(description = "Cast a reading from a user number. Returns {original, changed, mutual, opposite, inverted}; a relative is null when it cannot be resolved.")]
    fn cast_hexagrams(
        &self,
        Parameters(req): Parameters<CastRequest>,
    ) -> Result<CallToolResult, McpError> {
        let original = self.table.find_by_user_number(req.user_number);
        let result = self.table.calculate_all_related(original, req.user_number);
        Ok(json_result(&result))
    }

    #[tool(description = "Cast a reading and ask the configured AI provider for SUMMARY / INSIGHTS / RECOMMENDATIONS tailored to the user's situation. Falls back to a generic analysis without AI.")]
    async fn analyze_reading(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let original = self.table.find_by_user_number(req.user_number);
        let result = self.table.calculate_all_related(original, req.user_number);
        let situation = Situation {
            city: req.city,
            previous_cities: req.previous_cities,
            experience: req.experience,
            difficulty: req.difficulty,
            number: req.user_number,
        };
        let analysis = yijing_suggest::analyze(&result, &situation, &self.settings).await;
        Ok(json_result(&serde_json::json!({
            "reading": result,
            "analysis": analysis,
        })))
    }

    #[tool(description = "Write a four-paragraph poem timed to a five-slide video journey through cities. The genre is picked from emotion, situation, intensity, mood and purpose unless given.")]
    async fn generate_video_journey_poem(
        &self,
        Parameters(req): Parameters<PoemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = poem::generate_poem(&req, &self.settings).await;
        Ok(json_result(&result))
    }

    #[tool(description = "Generate a painting from a prompt. Returns base64 image data; without an OpenAI key the image is an SVG gradient placeholder.")]
    async fn generate_html_painting(
        &self,
        Parameters(req): Parameters<PaintRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.prompt.trim().is_empty() {
            return Ok(CallToolResult::error(vec![Content::text("prompt must not be empty")]));
        }
        let request = PaintingRequest {
            prompt: req.prompt,
            palette: req.palette.unwrap_or_default(),
            aspect_ratio: req.aspect_ratio,
        };
        let result = painting::generate_painting(&request, &self.settings).await;
        Ok(json_result(&result))
    }

    #[tool(description = "Paint a widescreen 16:9 (1792x1024) cinematic image of a city. The AI provider writes the image prompt; without one a template prompt and an SVG placeholder are used.")]
    async fn generate_city_image(
        &self,
        Parameters(req): Parameters<CityImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.city.trim().is_empty() {
            return Ok(CallToolResult::error(vec![Content::text("Missing city")]));
        }
        let result = city_image::generate_city_image(&req.city, &self.settings).await;
        Ok(json_result(&result))
    }
}

#[tool_handler]
impl ServerHandler for YijingServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
