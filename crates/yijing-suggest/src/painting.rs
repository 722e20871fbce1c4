use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use yijing_core::AiSettings;

const IMAGES_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";
const IMAGE_MODELS: [&str; 2] = ["dall-e-3", "dall-e-2"];
const DEFAULT_SIZE: &str = "1792x1024";
const DEFAULT_PALETTE: [&str; 3] = ["#0f172a", "#1e293b", "#334155"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaintingRequest {
    pub prompt: String,
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaintingMeta {
    pub used_ai: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fallback: bool,
    pub size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaintingResult {
    pub image_b64: Option<String>,
    pub image_url: Option<String>,
    pub prompt: String,
    pub mime_type: String,
    pub meta: PaintingMeta,
}

pub fn resolve_size(aspect_ratio: Option<&str>) -> &'static str {
    match aspect_ratio.map(str::trim) {
        Some("16:9") => "1792x1024",
        Some("9:16") => "1024x1792",
        Some("1:1") => "1024x1024",
        Some("4:3") => "1536x1152",
        Some("3:4") => "1152x1536",
        _ => DEFAULT_SIZE,
    }
}

fn dimensions(size: &str) -> (u32, u32) {
    size.split_once('x')
        .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
        .unwrap_or((1792, 1024))
}

/// Always three colors: pad short palettes, truncate long ones.
pub fn pick_palette(palette: &[String]) -> [String; 3] {
    match palette {
        [] => DEFAULT_PALETTE.map(String::from),
        [only] => [only.clone(), only.clone(), only.clone()],
        [a, b] => [a.clone(), b.clone(), a.clone()],
        [a, b, c, ..] => [a.clone(), b.clone(), c.clone()],
    }
}

pub fn build_image_prompt(request: &PaintingRequest) -> String {
    let mut prompt = request.prompt.trim().to_string();
    prompt.push_str(
        "\nRender a richly detailed, cinematic digital painting with painterly lighting, \
depth, and atmosphere.",
    );
    if !request.palette.is_empty() {
        prompt.push_str(&format!(
            "\nColor palette emphasis: {}.",
            request.palette.join(", ")
        ));
    }
    if let Some(ratio) = request.aspect_ratio.as_deref().filter(|r| !r.is_empty()) {
        prompt.push_str(&format!("\nAspect ratio target: {ratio}."));
    }
    prompt.push_str("\nExclude any text or typography.");
    prompt
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Gradient SVG with a caption taken from the prompt, base64 encoded.
pub fn fallback_svg(prompt: &str, palette: &[String], aspect_ratio: Option<&str>) -> String {
    let (w, h) = dimensions(resolve_size(aspect_ratio));
    let [primary, secondary, accent] = pick_palette(palette).map(|c| xml_escape(&c));
    let snippet: String = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let snippet = xml_escape(&snippet.chars().take(120).collect::<String>());
    let (wf, hf) = (w as f64, h as f64);
    let font_size = ((hf * 0.035).round() as u32).max(20);

    let svg = format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <defs>
    <linearGradient id="bg" x1="0" x2="1" y1="0" y2="1">
      <stop offset="0%" stop-color="{primary}" />
      <stop offset="70%" stop-color="{secondary}" />
      <stop offset="100%" stop-color="{accent}" />
    </linearGradient>
    <radialGradient id="glow" cx="50%" cy="40%" r="70%">
      <stop offset="0%" stop-color="{accent}" stop-opacity="0.45" />
      <stop offset="100%" stop-color="{accent}" stop-opacity="0" />
    </radialGradient>
  </defs>
  <rect width="{w}" height="{h}" fill="url(#bg)" />
  <rect width="{w}" height="{h}" fill="url(#glow)" />
  <g fill="none" stroke="rgba(255,255,255,0.16)" stroke-width="2">
    <path d="M0 {} Q {} {}, {} {} T {w} {}" />
    <path d="M0 {} Q {} {}, {} {} T {w} {}" />
  </g>
  <text x="5%" y="90%" fill="rgba(255,255,255,0.35)" font-family="sans-serif" font-size="{font_size}" letter-spacing="2">{snippet}</text>
</svg>"##,
        hf * 0.7,
        wf * 0.25,
        hf * 0.6,
        wf * 0.45,
        hf * 0.72,
        hf * 0.62,
        hf * 0.84,
        wf * 0.35,
        hf * 0.78,
        wf * 0.58,
        hf * 0.88,
        hf * 0.82,
    );
    STANDARD.encode(svg)
}

fn fallback_result(
    request: &PaintingRequest,
    prompt: String,
    model: Option<String>,
    error: String,
) -> PaintingResult {
    let size = resolve_size(request.aspect_ratio.as_deref());
    PaintingResult {
        image_b64: Some(fallback_svg(
            &prompt,
            &request.palette,
            request.aspect_ratio.as_deref(),
        )),
        image_url: None,
        prompt,
        mime_type: "image/svg+xml".to_string(),
        meta: PaintingMeta {
            used_ai: false,
            model,
            error: Some(error),
            fallback: true,
            size: size.to_string(),
        },
    }
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

async fn try_model(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    size: &str,
) -> Result<ImageDatum, String> {
    // dall-e-2 only accepts square sizes and no quality flag
    let body = if model == "dall-e-2" {
        serde_json::json!({
            "model": model,
            "prompt": prompt,
            "size": "1024x1024",
            "n": 1,
            "response_format": "b64_json",
        })
    } else {
        serde_json::json!({
            "model": model,
            "prompt": prompt,
            "size": size,
            "n": 1,
            "quality": "hd",
            "response_format": "b64_json",
        })
    };

    let resp = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(format!("HTTP {status}: {text}"));
    }

    let parsed: ImagesResponse = resp.json().await.map_err(|e| e.to_string())?;
    parsed
        .data
        .into_iter()
        .next()
        .filter(|d| d.b64_json.is_some() || d.url.is_some())
        .ok_or_else(|| format!("model {model} returned no image data"))
}

/// Generate a painting via the OpenAI images API, falling back to an SVG
/// gradient when no images key is configured or every model fails. The chat
/// provider does not matter here.
pub async fn generate_painting(request: &PaintingRequest, settings: &AiSettings) -> PaintingResult {
    generate_painting_at(IMAGES_ENDPOINT, request, settings).await
}

async fn generate_painting_at(
    endpoint: &str,
    request: &PaintingRequest,
    settings: &AiSettings,
) -> PaintingResult {
    let Some(api_key) = settings.images_key() else {
        return fallback_result(
            request,
            request.prompt.clone(),
            None,
            "missing OpenAI API key".to_string(),
        );
    };

    let prompt = build_image_prompt(request);
    let size = resolve_size(request.aspect_ratio.as_deref());
    let client = reqwest::Client::new();
    let mut errors = Vec::new();

    for model in IMAGE_MODELS {
        tracing::debug!(model, size, "requesting image");
        match try_model(&client, endpoint, api_key, model, &prompt, size).await {
            Ok(image) => {
                return PaintingResult {
                    image_b64: image.b64_json,
                    image_url: image.url,
                    prompt,
                    mime_type: "image/png".to_string(),
                    meta: PaintingMeta {
                        used_ai: true,
                        model: Some(model.to_string()),
                        error: None,
                        fallback: false,
                        size: size.to_string(),
                    },
                };
            }
            Err(e) => {
                tracing::warn!(model, error = %e, "image model failed");
                errors.push(format!("{model}: {e}"));
            }
        }
    }

    let error = format!("all image models failed. Attempts: {}", errors.join("; "));
    fallback_result(request, prompt, Some(IMAGE_MODELS[0].to_string()), error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratios_map_to_sizes() {
        assert_eq!(resolve_size(Some("9:16")), "1024x1792");
        assert_eq!(resolve_size(Some("3:4")), "1152x1536");
        assert_eq!(resolve_size(Some("21:9")), DEFAULT_SIZE);
        assert_eq!(resolve_size(None), DEFAULT_SIZE);
    }

    #[test]
    fn palettes_normalize_to_three() {
        let p = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(pick_palette(&[]), DEFAULT_PALETTE.map(String::from));
        assert_eq!(pick_palette(&p(&["#fff"])), p(&["#fff", "#fff", "#fff"])[..]);
        assert_eq!(pick_palette(&p(&["#a", "#b"])), p(&["#a", "#b", "#a"])[..]);
        assert_eq!(
            pick_palette(&p(&["#a", "#b", "#c", "#d"])),
            p(&["#a", "#b", "#c"])[..]
        );
    }

    #[test]
    fn prompt_carries_hints() {
        let req = PaintingRequest {
            prompt: "  misty harbor ".into(),
            palette: vec!["#112233".into()],
            aspect_ratio: Some("1:1".into()),
        };
        let prompt = build_image_prompt(&req);
        assert!(prompt.starts_with("misty harbor\n"));
        assert!(prompt.contains("Color palette emphasis: #112233."));
        assert!(prompt.contains("Aspect ratio target: 1:1."));
        assert!(prompt.ends_with("Exclude any text or typography."));
    }

    #[test]
    fn fallback_svg_is_escaped_and_sized() {
        let encoded = fallback_svg("rain & <neon>", &[], Some("9:16"));
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains(r#"width="1024" height="1792""#));
        assert!(svg.contains("rain &amp; &lt;neon&gt;"));
        assert!(svg.contains("#0f172a"));
    }

    #[tokio::test]
    async fn without_key_returns_fallback() {
        let req = PaintingRequest {
            prompt: "temple at dawn".into(),
            ..Default::default()
        };
        let result = generate_painting(&req, &AiSettings::default()).await;
        assert_eq!(result.mime_type, "image/svg+xml");
        assert_eq!(result.prompt, "temple at dawn");
        assert!(result.meta.fallback);
        assert!(!result.meta.used_ai);
        assert_eq!(result.meta.size, DEFAULT_SIZE);
        assert!(result.image_b64.is_some());
    }

    #[tokio::test]
    async fn images_key_is_used_with_another_chat_provider() {
        let settings = AiSettings {
            provider: "anthropic".into(),
            api_key: "ak".into(),
            model: "claude".into(),
            openai_api_key: "sk-images".into(),
            ..Default::default()
        };
        let req = PaintingRequest {
            prompt: "river at night".into(),
            aspect_ratio: Some("16:9".into()),
            ..Default::default()
        };
        // nothing listens here, so both models fail and the fallback records the attempts
        let result = generate_painting_at("http://127.0.0.1:9/v1/images", &req, &settings).await;
        let error = result.meta.error.unwrap();
        assert!(error.starts_with("all image models failed"), "{error}");
        assert!(error.contains("dall-e-3:") && error.contains("dall-e-2:"), "{error}");
        assert!(result.prompt.contains("Aspect ratio target: 16:9."));
        assert_eq!(result.meta.size, "1792x1024");
    }
}
