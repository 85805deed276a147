//! Translation backend trait and the Cloud Translation v2 implementation.

use anyhow::bail;
use async_trait::async_trait;
use scholyx_common::sandbox::SandboxClient as Client;
use std::time::Duration;

const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const TRANSLATE_TIMEOUT_SECS: u64 = 20;

/// Text in, translated text out. Implementations must preserve UTF-8
/// content and must not reorder anything inside the text.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;
}

/// Cloud Translation v2 REST backend.
pub struct GoogleTranslateClient {
    client: Client,
    api_key: String,
}

impl GoogleTranslateClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let client = Client::with_timeout(Duration::from_secs(TRANSLATE_TIMEOUT_SECS))?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateClient {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text",
        });

        let resp = self.client
            .post(TRANSLATE_URL)?
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!("translation API returned status {}", resp.status());
        }

        let payload: serde_json::Value = resp.json().await?;
        match payload["data"]["translations"][0]["translatedText"].as_str() {
            Some(translated) => Ok(translated.to_string()),
            None => bail!("translation payload missing translatedText"),
        }
    }
}
