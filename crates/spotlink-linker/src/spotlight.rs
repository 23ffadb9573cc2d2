//! DBpedia Spotlight client
//!
//! Calls the Spotlight `/annotate` REST endpoint and converts the returned
//! resources (offsets + surface forms) into token-range entities over the
//! local tokenization. Spotlight counts offsets in UTF-16 code units, so
//! token boundaries are re-expressed in those units before matching.
//!
//! Author: hephaex@gmail.com

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use spotlink_core::{LinkerConfig, Span, SpotlinkError};

use crate::tokenizer::tokenize;
use crate::{EntityLinker, LinkerEntity, LinkerError, LinkerOutput, Token};

/// DBpedia Spotlight API client
pub struct SpotlightClient {
    client: Client,
    endpoint: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct SpotlightResponse {
    #[serde(rename = "Resources", default)]
    resources: Vec<SpotlightResource>,
}

/// Spotlight encodes every attribute as a JSON string
#[derive(Debug, Deserialize)]
struct SpotlightResource {
    #[serde(rename = "@URI", default)]
    uri: String,
    #[serde(rename = "@surfaceForm", default)]
    surface_form: Value,
    #[serde(rename = "@offset", default)]
    offset: Value,
    #[serde(rename = "@types", default)]
    types: String,
}

impl SpotlightClient {
    /// Create a new Spotlight client
    pub fn new(endpoint: impl Into<String>, confidence: f32) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            confidence,
        }
    }

    /// Create from config
    pub fn from_config(config: &LinkerConfig) -> spotlink_core::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpotlinkError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            confidence: config.confidence,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn annotate_url(&self) -> String {
        format!("{}/annotate", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl EntityLinker for SpotlightClient {
    async fn link(&self, text: &str) -> Result<LinkerOutput, LinkerError> {
        let tokens = tokenize(text);
        // Spotlight answers 400 on blank input
        if tokens.is_empty() {
            return Ok(LinkerOutput::default());
        }

        let confidence = self.confidence.to_string();
        let response = self
            .client
            .post(self.annotate_url())
            .header(ACCEPT, "application/json")
            .form(&[("text", text), ("confidence", confidence.as_str())])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LinkerError::Transient(format!("Failed to read response: {e}")))?;

        let parsed = parse_response(&body)?;
        let entities = align_resources(text, &tokens, &parsed.resources);
        tracing::debug!(
            endpoint = self.endpoint(),
            resources = parsed.resources.len(),
            entities = entities.len(),
            "Spotlight annotation complete"
        );

        Ok(LinkerOutput { tokens, entities })
    }
}

fn classify_request_error(err: reqwest::Error) -> LinkerError {
    if err.is_builder() {
        LinkerError::Permanent(format!("Invalid request: {err}"))
    } else {
        LinkerError::Transient(format!("Request failed: {err}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> LinkerError {
    let message = format!("Spotlight error {status}: {body}");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        LinkerError::Transient(message)
    } else {
        LinkerError::Permanent(message)
    }
}

fn parse_response(body: &str) -> Result<SpotlightResponse, LinkerError> {
    serde_json::from_str(body)
        .map_err(|e| LinkerError::Permanent(format!("Failed to parse Spotlight response: {e}")))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// UTF-16 offset of every char boundary in `text`, including the end
fn utf16_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(text.len() + 1);
    let mut unit = 0;
    offsets.push(unit);
    for c in text.chars() {
        unit += c.len_utf16();
        offsets.push(unit);
    }
    offsets
}

/// Map resources onto token ranges, then keep a non-overlapping subset
fn align_resources(text: &str, tokens: &[Token], resources: &[SpotlightResource]) -> Vec<LinkerEntity> {
    let units = utf16_offsets(text);
    let mut by_start: HashMap<usize, usize> = HashMap::new();
    let mut by_end: HashMap<usize, usize> = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        let end = token.idx + token.text.chars().count();
        let (Some(&start_unit), Some(&end_unit)) = (units.get(token.idx), units.get(end)) else {
            continue;
        };
        by_start.insert(start_unit, i);
        by_end.insert(end_unit, i);
    }

    let mut candidates = Vec::new();
    for resource in resources {
        let offset = value_as_string(&resource.offset).and_then(|o| o.trim().parse::<usize>().ok());
        let surface = value_as_string(&resource.surface_form);
        let (Some(offset), Some(surface)) = (offset, surface) else {
            tracing::debug!(uri = %resource.uri, "Skipping resource without usable offset");
            continue;
        };

        let len = surface.encode_utf16().count();
        let (Some(&first), Some(&last)) = (by_start.get(&offset), by_end.get(&(offset + len)))
        else {
            tracing::debug!(
                uri = %resource.uri,
                offset,
                surface = %surface,
                "Resource does not align with token boundaries"
            );
            continue;
        };
        if len == 0 || last < first {
            continue;
        }

        candidates.push(LinkerEntity {
            start: first,
            end: last + 1,
            raw_types: Some(resource.types.clone()).filter(|t| !t.is_empty()),
            kb_id: resource.uri.clone(),
        });
    }

    keep_longest_non_overlapping(candidates)
}

/// Longest spans win; among equal lengths the earliest-listed wins
fn keep_longest_non_overlapping(mut candidates: Vec<LinkerEntity>) -> Vec<LinkerEntity> {
    candidates.sort_by(|a, b| (b.end - b.start).cmp(&(a.end - a.start)));

    let mut kept: Vec<LinkerEntity> = Vec::new();
    for candidate in candidates {
        let range = Span::new(candidate.start, candidate.end);
        if kept
            .iter()
            .all(|k| !Span::new(k.start, k.end).overlaps(&range))
        {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|e| e.start);
    kept
}
