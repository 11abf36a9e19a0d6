//! # Gemini 分类后端
//!
//! 调用 Gemini `generateContent` 接口，一次请求分析整批文件名，
//! 要求返回与输入序号对齐的 JSON 数组。
//!
//! ## 依赖关系
//! - 被 `classify/mod.rs` 导出
//! - 使用 `reqwest` (blocking) 发送请求

use super::{align_by_index, ClassificationMap, Classifier, ClassifyError};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini 分类器
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClassifier {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ClassifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

// ─────────────────────────────────────────────────────────────
// 请求 / 响应结构
// ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// 构造批量分析提示词
pub fn build_prompt(filenames: &[String]) -> String {
    let files_text = filenames
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze these video filenames and identify their media type and metadata.

Files to analyze:
{files_text}

Return a JSON array with exactly one element per file, in the same order:
[
  {{
    "type": "tv" or "movie" or "unknown",
    "name": string,
    "year": int (movies, optional),
    "season": int (tv),
    "episode": int (tv),
    "episode_title": string (optional),
    "is_special": bool (default false),
    "confidence": number between 0 and 1
  }}
]

Guidelines:
- For TV shows extract show name, season, episode number and episode title.
- Prefer the real episode title over generic "Episode X" descriptions.
- For movies extract the title and year if present.
- For remakes or reboots add disambiguation such as "(US)" or "(2020)".
- For specials set is_special to true and use season 0.
- For unrecognisable files set type to "unknown" and leave other fields empty.
"#
    )
}

/// 从模型文本中解析 JSON 数组（容忍 ```json 代码块包裹）
pub fn parse_response_text(
    filenames: &[String],
    text: &str,
) -> Result<ClassificationMap, ClassifyError> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;

    match value {
        Value::Array(items) => {
            if items.len() != filenames.len() {
                tracing::warn!(
                    expected = filenames.len(),
                    got = items.len(),
                    "classifier returned a misaligned array"
                );
            }
            Ok(align_by_index(filenames, &items))
        }
        other => Err(ClassifyError::InvalidResponse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Classifier for GeminiClassifier {
    fn classify(&self, filenames: &[String]) -> Result<ClassificationMap, ClassifyError> {
        if filenames.is_empty() {
            return Ok(ClassificationMap::new());
        }

        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClassifyError::Auth("missing API key".to_string()))?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(filenames),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        tracing::debug!(model = %self.model, files = filenames.len(), "sending classification request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(error_from_status(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .next()
            .ok_or_else(|| ClassifyError::InvalidResponse("no candidates".to_string()))?;

        parse_response_text(filenames, &text)
    }
}

/// 拒绝凭据时接口返回的错误码（出现在 `error.status` 或 `error.details[].reason`）
const AUTH_REASONS: [&str; 3] = ["API_KEY_INVALID", "UNAUTHENTICATED", "PERMISSION_DENIED"];

/// 非成功响应映射为错误；凭据被拒绝时为致命的 `Auth`
///
/// 无效的 key 返回的是 HTTP 400，只能从响应体的错误码区分。
fn error_from_status(status: StatusCode, body: &str) -> ClassifyError {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body_rejects_credentials(body)
    {
        return ClassifyError::Auth(format!("HTTP {}: {}", status, body.trim()));
    }
    ClassifyError::Transport(format!("HTTP {}: {}", status, body.trim()))
}

fn body_rejects_credentials(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let error = &value["error"];
    let status = error["status"].as_str().into_iter();
    let reasons = error["details"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|d| d["reason"].as_str());
    status.chain(reasons).any(|code| AUTH_REASONS.contains(&code))
}
