//! AI Enhancement Gateway: chat-completion bridge with a deterministic fallback.
//!
//! The bridge rewrites a phase's base message set into personalized copy.
//! It never fails outward: HTTP errors, timeouts, malformed responses, and a
//! missing API key all resolve to the unmodified `base_messages`, so the
//! Oracle voice is never broken by a technical string.
//!
//! API key priority: `user_config.toml` > `ORACLE_LLM_API_KEY` > `OPENROUTER_API_KEY`.

use crate::config::UserConfig;
use crate::error::{OracleError, OracleResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// What the bridge is asked to do with the base strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    /// Rewrite the base messages with the visitor's numbers woven in.
    Enhance,
    /// Produce an in-character redirect for a rejected input.
    Validation,
    /// Produce short answer suggestions for an oracle question.
    Suggestions,
}

impl EnhanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::Validation => "validation",
            Self::Suggestions => "suggestions",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Self::Enhance => {
                "You are The Oracle: an ancient, knowing, warm voice reading numerology. \
                 Rewrite the given messages in that voice, weaving in the numeric context naturally. \
                 Keep the same number of messages and the same order. \
                 Respond ONLY with a numbered list, one message per line. \
                 Never mention being an AI, never use technical language."
            }
            Self::Validation => {
                "You are The Oracle. A visitor gave input that cannot be read. \
                 Gently redirect them toward the expected input without breaking character. \
                 Never scold, never sound like an error message. \
                 Respond ONLY with a numbered list, one short message per line."
            }
            Self::Suggestions => {
                "You are The Oracle. Offer brief first-person answers a visitor might tap \
                 in reply to your question. Three to six words each. \
                 Respond ONLY with a numbered list, one suggestion per line."
            }
        }
    }
}

/// Numeric and personal context embedded into the user prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_path: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soul_urge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_person_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_life_path: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<String>,
}

/// Details of the rejected input, present in `validation` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetail {
    pub error_code: String,
    pub original_input: String,
    pub expected_input: String,
}

/// Details for `suggestions` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsDetail {
    pub oracle_question: String,
    pub count: usize,
}

/// One enhancement request. Also the wire shape of `POST /api/oracle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    pub mode: EnhanceMode,
    #[serde(default)]
    pub context: EnhanceContext,
    pub phase: String,
    pub base_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<SuggestionsDetail>,
}

// OpenAI-compatible request/response shapes.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\.\s*(.+)$").expect("numbered-line pattern"));

/// Extract `1. ...` lines in order.
fn parse_numbered_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Naive sentence split used when the model ignored the list format.
fn split_sentences(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in content.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let s = current.trim().to_string();
            if !s.is_empty() {
                out.push(s);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Chat-completion bridge. Holds the key, model, and a client with an
/// explicit timeout; all methods degrade to the caller's base strings.
#[derive(Clone)]
pub struct EnhanceClient {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl EnhanceClient {
    /// Build from `user_config.toml` + environment. `None` when no key is
    /// configured, in which case callers use base messages directly.
    pub fn from_env() -> Option<Self> {
        let user = UserConfig::load();
        let api_key = user.resolved_api_key()?;
        let model = user.resolved_model().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = user
            .resolved_api_url()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Some(Self::new(api_key, model, base_url))
    }

    /// Create with explicit wiring (tests, non-env callers).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            api_key: api_key.into().trim().to_string(),
            model: model.into(),
            base_url: base_url.into(),
            timeout,
            client: build_client(timeout),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Replace the request timeout (`ORACLE_ENHANCE_TIMEOUT_SECS`).
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self.client = build_client(self.timeout);
        self
    }

    /// Rewrite `request.base_messages` in the Oracle voice. Never fails:
    /// every error path returns the base set unchanged. One bounded retry
    /// with backoff on transport errors only.
    pub async fn enhance(&self, request: &EnhanceRequest) -> Vec<String> {
        let expected = match request.mode {
            EnhanceMode::Suggestions => request
                .suggestions
                .as_ref()
                .map(|s| s.count)
                .unwrap_or(request.base_messages.len()),
            _ => request.base_messages.len(),
        };
        if expected == 0 {
            return Vec::new();
        }

        let mut attempt = self.try_enhance(request, expected).await;
        if let Err(OracleError::Http(_)) = attempt {
            tokio::time::sleep(Duration::from_millis(300)).await;
            attempt = self.try_enhance(request, expected).await;
        }

        match attempt {
            Ok(lines) => lines,
            Err(e) => {
                warn!(target: "oracle::enhance", "enhancement failed, using base copy: {}", e);
                request.base_messages.clone()
            }
        }
    }

    async fn try_enhance(&self, request: &EnhanceRequest, expected: usize) -> OracleResult<Vec<String>> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.mode.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(request, expected)?,
                },
            ],
            temperature: 0.9,
            max_tokens: 600,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(OracleError::Enhance(format!("upstream status {status}")));
        }
        let parsed: ChatResponse = res.json().await?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| OracleError::UpstreamFormat("no choices in response".into()))?;

        let mut lines = parse_numbered_list(content);
        if lines.is_empty() {
            lines = split_sentences(content);
        }
        if lines.len() >= expected {
            lines.truncate(expected);
            debug!(target: "oracle::enhance", mode = request.mode.as_str(), phase = %request.phase, "enhanced {} messages", lines.len());
            Ok(lines)
        } else {
            Err(OracleError::Enhance(format!(
                "insufficient lines: got {}, expected {expected}",
                lines.len()
            )))
        }
    }
}

fn build_user_prompt(request: &EnhanceRequest, expected: usize) -> OracleResult<String> {
    let context = serde_json::to_string(&request.context)?;
    let mut prompt = format!(
        "Phase: {}\nNumeric context: {}\n",
        request.phase, context
    );
    if let Some(input) = &request.user_input {
        prompt.push_str(&format!("Visitor said: {input}\n"));
    }
    if let Some(v) = &request.validation {
        prompt.push_str(&format!(
            "Rejected input: {:?} (code {}, expected {})\n",
            v.original_input, v.error_code, v.expected_input
        ));
    }
    if let Some(s) = &request.suggestions {
        prompt.push_str(&format!(
            "Oracle question: {:?}\nProduce exactly {} suggestions.\n",
            s.oracle_question, s.count
        ));
    }
    prompt.push_str(&format!(
        "Base messages ({expected}):\n{}",
        request
            .base_messages
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {m}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    ));
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(base: Vec<String>) -> EnhanceRequest {
        EnhanceRequest {
            mode: EnhanceMode::Enhance,
            context: EnhanceContext {
                life_path: Some(7),
                user_name: Some("Ada".into()),
                ..Default::default()
            },
            phase: "first_reveal".into(),
            base_messages: base,
            user_input: None,
            validation: None,
            suggestions: None,
        }
    }

    #[test]
    fn numbered_list_parsing() {
        let content = "1. The stars align.\n2.  Your path is seven.\nnoise\n3. Walk it.";
        assert_eq!(
            parse_numbered_list(content),
            vec!["The stars align.", "Your path is seven.", "Walk it."]
        );
        assert!(parse_numbered_list("no list here").is_empty());
    }

    #[test]
    fn sentence_split_fallback() {
        let s = split_sentences("The stars align. Your path is seven! Walk it");
        assert_eq!(s, vec!["The stars align.", "Your path is seven!", "Walk it"]);
    }

    #[tokio::test]
    async fn unreachable_upstream_returns_base_unchanged() {
        let client = EnhanceClient::new("test-key", DEFAULT_MODEL, "http://127.0.0.1:1");
        let base = vec!["one".to_string(), "two".to_string()];
        let out = client.enhance(&request(base.clone())).await;
        assert_eq!(out, base);
    }

    #[tokio::test]
    async fn empty_base_yields_empty() {
        let client = EnhanceClient::new("test-key", DEFAULT_MODEL, "http://127.0.0.1:1");
        let out = client.enhance(&request(Vec::new())).await;
        assert!(out.is_empty());
    }

    #[test]
    fn configured_timeout_replaces_the_default() {
        let client = EnhanceClient::new("key", DEFAULT_MODEL, DEFAULT_API_BASE).with_timeout(3);
        assert_eq!(client.timeout, Duration::from_secs(3));
    }

    #[test]
    fn user_prompt_embeds_context_and_bases() {
        let req = request(vec!["alpha".into(), "beta".into()]);
        let prompt = build_user_prompt(&req, 2).unwrap();
        assert!(prompt.contains("first_reveal"));
        assert!(prompt.contains("\"lifePath\":7"));
        assert!(prompt.contains("1. alpha"));
        assert!(prompt.contains("2. beta"));
    }
}
