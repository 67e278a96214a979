use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::{Translator, TranslatorInfo};
use crate::config::Lang;
use crate::error::{Error, Result};

/// Translator speaking the public Google web translation endpoint
/// (`translate_a/single`, `client=gtx`).
///
/// An unauthenticated GET whose response is a nested JSON array: element 0
/// holds the translated segments, element 2 the detected source language.
/// The endpoint rate-limits aggressively, which is why the flow pipeline
/// paces its requests.
pub struct GoogleWebTranslator {
    client: Client,
    /// Endpoint URL (e.g. "https://translate.googleapis.com/translate_a/single")
    pub endpoint: String,
}

impl GoogleWebTranslator {
    /// Create a new translator with the given endpoint and request timeout.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created, which should only happen
    /// in extreme circumstances (e.g., TLS backend unavailable on the system).
    #[allow(clippy::expect_used)]
    pub fn new(endpoint: String, request_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    fn request_url(&self, text: &str, source: &Lang, target: &Lang) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(source.as_str()),
            urlencoding::encode(target.as_str()),
            urlencoding::encode(text)
        )
    }

    async fn request(&self, text: &str, source: &Lang, target: &Lang) -> Result<Value> {
        let url = self.request_url(text, source, target);
        debug!("Translation request to {}", self.endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::TranslationRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TranslationRequest(format!("HTTP {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))
    }

    /// Concatenate the translated segments from a response.
    ///
    /// The response shape is `[[["translated", "original", ...], ...], _, "lang", ...]`;
    /// long inputs come back split over several segments.
    fn extract_translation(value: &Value) -> Result<String> {
        let segments = value
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::TranslationInvalidResponse("missing segment array".to_string()))?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(Value::as_str) {
                translated.push_str(part);
            }
        }

        if translated.is_empty() && !segments.is_empty() {
            return Err(Error::TranslationInvalidResponse(
                "no translated text in response".to_string(),
            ));
        }

        Ok(translated)
    }

    fn extract_detected_lang(value: &Value) -> Result<Lang> {
        value
            .get(2)
            .and_then(Value::as_str)
            .map(Lang::new)
            .ok_or_else(|| {
                Error::TranslationInvalidResponse("missing detected language".to_string())
            })
    }
}

#[async_trait]
impl Translator for GoogleWebTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "Google Web",
            supports_detection: true,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        // Skip empty text
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // Skip if source and target are the same
        if source.as_str() == target.as_str() && !source.is_auto() {
            return Ok(text.to_string());
        }

        let value = self.request(text, source, target).await?;
        Self::extract_translation(&value)
    }

    async fn detect(&self, sample: &str) -> Result<Lang> {
        let value = self
            .request(sample, &Lang::new("auto"), &Lang::new("en"))
            .await?;
        Self::extract_detected_lang(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_translation_joins_segments() {
        let value = json!([
            [["Hello ", "Bonjour ", null], ["world", "monde", null]],
            null,
            "fr"
        ]);
        assert_eq!(
            GoogleWebTranslator::extract_translation(&value).unwrap(),
            "Hello world"
        );
    }

    #[test]
    fn test_extract_detected_lang() {
        let value = json!([[["Hi", "Salut", null]], null, "fr"]);
        assert_eq!(
            GoogleWebTranslator::extract_detected_lang(&value)
                .unwrap()
                .as_str(),
            "fr"
        );
    }

    #[test]
    fn test_extract_translation_rejects_malformed() {
        let value = json!({"unexpected": "shape"});
        assert!(GoogleWebTranslator::extract_translation(&value).is_err());
    }

    #[test]
    fn test_request_url_encodes_query() {
        let translator =
            GoogleWebTranslator::new("https://example.invalid/translate_a/single".to_string(), 5);
        let url = translator.request_url("a b&c", &Lang::new("en"), &Lang::new("bn"));
        assert!(url.contains("sl=en"));
        assert!(url.contains("tl=bn"));
        assert!(url.contains("q=a%20b%26c"));
    }
}
