// Translation capability: one polymorphic trait, two concrete variants
//
// `HttpTranslator` talks to a remote web endpoint; `CommandTranslator`
// bridges to a local model behind a subprocess. The variant is chosen by
// explicit configuration at pipeline start; failures are soft and the
// pipeline substitutes the source text.

use crate::core::config::{TranslationConfig, TranslatorMode};
use crate::core::errors::{TranslateError, TranslateResult};
use crate::core::types::TranslationResult;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Initial backoff between retry attempts; doubles per attempt
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Translate: Send + Sync {
    /// Translate one region's text. May fail; callers fall back to the
    /// source text rather than aborting the region.
    async fn translate(&self, text: &str) -> TranslateResult<String>;
}

/// Build the configured translator variant
pub fn build_translator(config: &TranslationConfig) -> Arc<dyn Translate> {
    match config.mode {
        TranslatorMode::Remote => Arc::new(HttpTranslator::new(config)),
        TranslatorMode::Command => Arc::new(CommandTranslator::new(config)),
    }
}

/// Run the translator with the original text as the final fallback.
/// Failure is reported in the result, never propagated.
pub async fn translate_with_fallback(
    translator: &dyn Translate,
    text: &str,
) -> TranslationResult {
    match translator.translate(text).await {
        Ok(translated) if !translated.trim().is_empty() => TranslationResult {
            text: translated,
            succeeded: true,
        },
        Ok(_) => {
            warn!("translator returned empty output, keeping source text");
            TranslationResult {
                text: text.to_string(),
                succeeded: false,
            }
        }
        Err(e) => {
            warn!("translation failed ({e}), keeping source text");
            TranslationResult {
                text: text.to_string(),
                succeeded: false,
            }
        }
    }
}

/// Remote web API translator
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.endpoint.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }

    async fn request_once(&self, text: &str) -> TranslateResult<String> {
        let url = format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            urlencoding::encode(&self.source_lang),
            urlencoding::encode(&self.target_lang),
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                TranslateError::TimedOut {
                    seconds: self.timeout_secs,
                }
            } else {
                TranslateError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::BadStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(TranslateError::RequestFailed)?;
        parse_segments(&value)
    }
}

/// Concatenate the translated segments of a gtx-style response:
/// `[[["translated", "source", ...], ...], ...]`
fn parse_segments(value: &serde_json::Value) -> TranslateResult<String> {
    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::InvalidResponse(value.to_string()))?;

    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(|v| v.as_str()) {
            out.push_str(piece);
        }
    }

    if out.is_empty() {
        return Err(TranslateError::InvalidResponse(
            "no translated segments".to_string(),
        ));
    }
    Ok(out)
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        let mut delay = RETRY_BASE_DELAY;
        let mut last = String::new();

        for attempt in 1..=self.max_retries {
            match self.request_once(text).await {
                Ok(translated) => {
                    debug!("translated {} chars on attempt {attempt}", text.len());
                    return Ok(translated);
                }
                Err(e) => {
                    last = e.to_string();
                    if attempt < self.max_retries {
                        warn!(
                            "translation attempt {attempt}/{} failed: {last}; retrying in {:?}",
                            self.max_retries, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        Err(TranslateError::RetriesExhausted {
            attempts: self.max_retries,
            last,
        })
    }
}

/// Local model bridge: text on stdin, translation on stdout
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    source_lang: String,
    target_lang: String,
    timeout: Duration,
}

impl CommandTranslator {
    pub fn new(config: &TranslationConfig) -> Self {
        let command = config.bridge_command.clone().unwrap_or_default();
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();

        Self {
            program,
            args: parts.collect(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Translate for CommandTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .args(["--source", &self.source_lang])
            .args(["--target", &self.target_lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranslateError::SpawnFailed {
                command: self.program.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| TranslateError::SpawnFailed {
                    command: self.program.clone(),
                    source: e,
                })?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TranslateError::TimedOut {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| TranslateError::SpawnFailed {
                command: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(TranslateError::BridgeFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTranslator;

    #[async_trait]
    impl Translate for FailingTranslator {
        async fn translate(&self, _text: &str) -> TranslateResult<String> {
            Err(TranslateError::InvalidResponse("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn fallback_substitutes_source_text_on_failure() {
        let result = translate_with_fallback(&FailingTranslator, "ORIGINAL").await;
        assert!(!result.succeeded);
        assert_eq!(result.text, "ORIGINAL");
    }

    struct UppercaseTranslator;

    #[async_trait]
    impl Translate for UppercaseTranslator {
        async fn translate(&self, text: &str) -> TranslateResult<String> {
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn successful_translation_passes_through() {
        let result = translate_with_fallback(&UppercaseTranslator, "hello").await;
        assert!(result.succeeded);
        assert_eq!(result.text, "HELLO");
    }

    #[test]
    fn gtx_segments_are_concatenated() {
        let value: serde_json::Value = serde_json::from_str(
            r#"[[["Hello ","Hola ",null],["world","mundo",null]],null,"es"]"#,
        )
        .unwrap();
        assert_eq!(parse_segments(&value).unwrap(), "Hello world");
    }

    #[test]
    fn malformed_response_is_an_error() {
        let value = serde_json::json!({"unexpected": true});
        assert!(parse_segments(&value).is_err());
    }
}
