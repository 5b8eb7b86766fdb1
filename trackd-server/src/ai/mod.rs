//! AI analysis gateway
//!
//! Calls the Anthropic Messages API for competitor and pricing
//! analysis. The model is told to answer with a bare JSON object; we
//! still narrow to the first `{` .. last `}` because models like to
//! wrap answers in prose or code fences. No key configured means the
//! feature reports unavailable, same as a provider outage.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::{AppError, AppResult};

const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 1024;
const SERVICE: &str = "analysis";

/// Structured analysis returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub analysis: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for the model provider's Messages API.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Competitive landscape analysis for the caller's trade and area.
    pub async fn analyze_competitors(
        &self,
        business_type: &str,
        location: &str,
        services: &[String],
    ) -> AppResult<Analysis> {
        let prompt = format!(
            "You are a market analyst for UK trade businesses.\n\n\
             A {business_type} based in {location} offers these services: {}.\n\
             Analyse the local competitive landscape for this business: typical \
             competitor pricing, where the market is crowded, and where demand \
             is underserved.\n\n\
             Respond with ONLY a JSON object in exactly this shape:\n\
             {{\"analysis\": \"two or three sentence overview\", \
             \"keyInsights\": [\"3 to 5 observations\"], \
             \"recommendations\": [\"3 to 5 concrete actions\"]}}",
            services.join(", ")
        );
        self.complete(&prompt).await
    }

    /// Rate benchmarking against the local market.
    pub async fn analyze_pricing(
        &self,
        business_type: &str,
        location: &str,
        current_rate: f64,
        services: &[String],
    ) -> AppResult<Analysis> {
        let prompt = format!(
            "You are a pricing analyst for UK trade businesses.\n\n\
             A {business_type} based in {location} charges {current_rate} per hour \
             and offers these services: {}.\n\
             Assess whether that rate is competitive for the area, how it compares \
             to the likely local range, and what pricing moves would improve \
             profitability without losing work.\n\n\
             Respond with ONLY a JSON object in exactly this shape:\n\
             {{\"analysis\": \"two or three sentence assessment\", \
             \"keyInsights\": [\"3 to 5 observations\"], \
             \"recommendations\": [\"3 to 5 concrete actions\"]}}",
            services.join(", ")
        );
        self.complete(&prompt).await
    }

    async fn complete(&self, prompt: &str) -> AppResult<Analysis> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::upstream(SERVICE, "no API key configured"));
        };

        let request = MessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::upstream(SERVICE, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::upstream(SERVICE, format!("HTTP {status}: {body}")));
        }

        let message: MessageResponse = resp
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("bad response: {e}")))?;

        let text = message
            .content
            .iter()
            .find(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .ok_or_else(|| AppError::upstream(SERVICE, "response has no text content"))?;

        parse_analysis(text)
    }
}

/// Pull the JSON object out of the model's reply, tolerating prose or
/// code fences around it.
fn parse_analysis(text: &str) -> AppResult<Analysis> {
    let start = text
        .find('{')
        .ok_or_else(|| AppError::upstream(SERVICE, "response contains no JSON object"))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| AppError::upstream(SERVICE, "response contains no JSON object"))?;

    serde_json::from_str(&text[start..=end])
        .map_err(|e| AppError::upstream(SERVICE, format!("unparseable analysis: {e}")))
}
