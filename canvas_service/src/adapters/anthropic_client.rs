use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::{
    configuration::AnthropicSettings,
    domain::{
        entities::{artifact::GeneratedComponent, coordinates::Coordinates},
        services::helpers::extract_json_payload,
    },
    ports::{
        component_generator::{ComponentGenerator, GenerationError},
        embedding_service::{EmbeddingError, EmbeddingService},
    },
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const GENERATION_TEMPERATURE: f32 = 0.9;
const EMBEDDING_MAX_TOKENS: u32 = 200;

const GENERATION_SYSTEM_PROMPT: &str = r#"You are an Autonomous UI Architect for the "Canvas of Infinite Realities".
Read the user's prompt and conceptualize an interactive UI dashboard laid out along a scrolling timeline.
Do not return conversational text. ONLY return a JSON array of UI components.

### TIMELINE
Place components in a linear sequence using the integer 'order' property. The frontend handles the spacing.
Generate 5 to 7 detailed components.

### AESTHETICS
- Theme: cyberpunk / synthwave / hacker HUD.
- Use vibrant, high-contrast hex colors (#FF0055, #00FFCC, #B200FF, #FFFF00) on deep dark backgrounds.
- Write immersive sci-fi content (e.g. "Quantum Decoupling Status", "Neural Link Bandwidth").

### PERMITTED COMPONENTS
1. "text"   - Fields: content (string), style ("h1"|"h2"|"h3"|"body"|"caption"), color (hex).
2. "metric" - Fields: label, value (string|number), trend ("up"|"down"|"neutral"), trendValue (string).
3. "card"   - Fields: title, content, optional items array (nested components).
4. "list"   - Fields: optional title, items (array of strings).
5. "chart"  - Fields: optional title, chartType ("bar"|"radial"|"line"), data (array of {label, value, color?}), optional unit (e.g. "%", "ms", "GB"). 3 to 6 data points.

### RULES
1. Return ONLY a valid JSON array of component objects. No markdown, no extra text.
2. Give every component a "type" among the permitted components.
3. Set 'order' as a sequentially increasing integer starting from the CURRENT_MAX_ORDER provided in the prompt.
4. Set 'w' (width in pixels, at least 450) on cards, metrics and charts.
5. Include 1 or 2 "chart" components per batch, mixing chart types.
"#;

const EMBEDDING_SYSTEM_PROMPT: &str = r#"You are a semantic vectorizer. Return ONLY an array of 10 floats (0.0 to 1.0) representing the input's position across these axes:
1. Urban vs Nature
2. Social vs Quiet
3. Budget vs Luxury
4. Traditional vs Modern
5. Fast vs Slow
6. Indoors vs Outdoors
7. Casual vs Formal
8. Digital vs Physical
9. Known vs Niche
10. Utilitarian vs Whimsical

Output Format: [0.1, 0.2, ...]"#;

/// Client of the Anthropic messages API.
///
/// Serves both as the component generator and as the embedding collaborator,
/// each with its own model.
pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    generation_model: String,
    embedding_model: String,
    generation_max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn try_new(settings: &AnthropicSettings) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            generation_model: settings.generation_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            generation_max_tokens: settings.generation_max_tokens,
        })
    }

    /// Sends a single-turn conversation and returns the text of the first text block
    async fn complete(&self, request: &MessagesRequest<'_>) -> Result<String, String> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("{}: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} answered {}: {}", url, status, body));
        }

        let response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid messages response: {}", e))?;

        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| "no text block in the messages response".to_string())
    }
}

#[async_trait]
impl ComponentGenerator for AnthropicClient {
    #[tracing::instrument(name = "Generating components with Anthropic", skip(self))]
    async fn generate_components(
        &self,
        prompt: &str,
        start_order: i64,
    ) -> Result<Vec<GeneratedComponent>, GenerationError> {
        let request = MessagesRequest {
            model: &self.generation_model,
            max_tokens: self.generation_max_tokens,
            system: GENERATION_SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: format!(
                    "CURRENT_MAX_ORDER: {}\n\nUser Request: {}",
                    start_order, prompt
                ),
            }],
            temperature: Some(GENERATION_TEMPERATURE),
        };

        let answer = self
            .complete(&request)
            .await
            .map_err(GenerationError::RequestFailed)?;

        let components = parse_generated_components(&answer)?;
        info!("{} components generated", components.len());
        Ok(components)
    }
}

#[async_trait]
impl EmbeddingService for AnthropicClient {
    #[tracing::instrument(name = "Embedding text with Anthropic", skip(self))]
    async fn embed(&self, text: &str) -> Result<Coordinates, EmbeddingError> {
        let system = format!("{}\n\nInput: \"{}\"", EMBEDDING_SYSTEM_PROMPT, text);
        let request = MessagesRequest {
            model: &self.embedding_model,
            max_tokens: EMBEDDING_MAX_TOKENS,
            system: &system,
            messages: vec![Message {
                role: "user",
                content: "Vectorize the input.".into(),
            }],
            temperature: None,
        };

        let answer = self
            .complete(&request)
            .await
            .map_err(EmbeddingError::RequestFailed)?;

        parse_embedding(&answer)
    }
}

/// Parses the model answer into the components of a batch, skipping the invalid ones
pub fn parse_generated_components(answer: &str) -> Result<Vec<GeneratedComponent>, GenerationError> {
    let payload = extract_json_payload(answer);

    let values: Vec<JsonValue> = serde_json::from_str(&payload)
        .map_err(|e| GenerationError::UnparseableOutput(format!("{}: {}", e, payload)))?;

    let components = GeneratedComponent::parse_batch(values);
    if components.is_empty() {
        warn!("Generated batch has no valid component");
    }
    Ok(components)
}

/// Parses the model answer into coordinates, padded or truncated to the expected dimensions
pub fn parse_embedding(answer: &str) -> Result<Coordinates, EmbeddingError> {
    let payload = extract_json_payload(answer);

    let values: Vec<f32> = serde_json::from_str(&payload)
        .map_err(|e| EmbeddingError::InvalidVector(format!("{}: {}", e, payload)))?;

    Ok(Coordinates::from_lossy(values))
}
