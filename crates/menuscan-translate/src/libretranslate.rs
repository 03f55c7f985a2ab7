// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP client for LibreTranslate-compatible translation services.
//
// `POST {endpoint}/translate` with a JSON body
// `{ q, source, target, format: "text", api_key? }`; a successful response
// carries `translatedText`, a failed one usually carries `error`.

use std::time::Duration;

use async_trait::async_trait;
use menuscan_core::config::TranslationConfig;
use menuscan_core::error::{MenuscanError, Result};
use menuscan_core::types::LanguageCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::provider::Translator;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Source code that makes the server detect the language.
const AUTO_SOURCE: &str = "auto";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Translator backed by a LibreTranslate server.
///
/// The underlying connection pool is shared by clones.
#[derive(Debug, Clone)]
pub struct LibreTranslateClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreTranslateClient {
    /// Build a client for `endpoint` (e.g. `http://127.0.0.1:5000`).
    ///
    /// `timeout` bounds each whole HTTP exchange.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(MenuscanError::Config(
                "translation endpoint must not be empty".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| MenuscanError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    /// Build from the `translation` config section.
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn translate_url(&self) -> String {
        format!("{}/translate", self.endpoint)
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    #[instrument(skip_all, fields(chars = text.len(), source = ?source, target = %target))]
    async fn translate(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: source_code(source),
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http_client
            .post(self.translate_url())
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MenuscanError::Provider {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| MenuscanError::Translation(format!("malformed provider response: {e}")))?;

        debug!(chars = parsed.translated_text.len(), "Provider call complete");
        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}

fn source_code(source: Option<LanguageCode>) -> &'static str {
    source.map_or(AUTO_SOURCE, |code| code.code())
}

/// Map a reqwest transport failure onto the error taxonomy.
fn map_transport_error(err: reqwest::Error) -> MenuscanError {
    if err.is_timeout() {
        MenuscanError::Timeout("translation request".into())
    } else if err.is_connect() {
        MenuscanError::Translation(format!("connection to provider failed: {err}"))
    } else {
        MenuscanError::Translation(format!("request failed: {err}"))
    }
}

/// Pull the `error` field out of a failure body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "empty response body".into(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_the_wire_format() {
        let request = TranslateRequest {
            q: "Sopa del día",
            source: "es",
            target: "en",
            format: "text",
            api_key: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "q": "Sopa del día",
                "source": "es",
                "target": "en",
                "format": "text",
            })
        );

        let with_key = TranslateRequest {
            api_key: Some("k"),
            ..request
        };
        assert_eq!(serde_json::to_value(&with_key).unwrap()["api_key"], "k");
    }

    #[test]
    fn unknown_source_is_sent_as_auto() {
        assert_eq!(source_code(None), "auto");
        assert_eq!(source_code(Some(LanguageCode::Ja)), "ja");
    }

    #[test]
    fn response_field_is_camel_case() {
        let parsed: TranslateResponse =
            serde_json::from_str(r#"{"translatedText":"Soup of the day"}"#).unwrap();
        assert_eq!(parsed.translated_text, "Soup of the day");
    }

    #[test]
    fn error_bodies_are_summarised() {
        assert_eq!(
            error_message(r#"{"error":"es is not supported"}"#),
            "es is not supported"
        );
        assert_eq!(error_message("  "), "empty response body");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn endpoint_is_normalised() {
        let client =
            LibreTranslateClient::new("http://localhost:5000/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:5000");
        assert_eq!(client.translate_url(), "http://localhost:5000/translate");
        assert_eq!(client.name(), "libretranslate");
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let err = LibreTranslateClient::new("", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, MenuscanError::Config(_)));
    }

    #[test]
    fn empty_api_key_is_dropped() {
        let client = LibreTranslateClient::new(
            "http://localhost:5000",
            Some(String::new()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transient_error() {
        // Port 9 (discard) on localhost is closed on any sane test host.
        let client =
            LibreTranslateClient::new("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
        let err = client
            .translate("Soup", Some(LanguageCode::Es), LanguageCode::En)
            .await
            .unwrap_err();
        assert_eq!(
            crate::retry::classify_error(&err),
            menuscan_core::types::ErrorClass::Transient,
            "got {err:?}"
        );
    }
}
