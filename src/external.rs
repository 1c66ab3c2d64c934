use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Service(String),
}

/// Speech-to-text collaborator. A single logical call per audio URL; callers
/// needing retries or deadlines wrap this themselves.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    async fn transcribe(&self, audio_url: &str) -> Result<String, ExternalServiceError>;
}

/// LLM collaborator that turns a raw transcript into a structured report.
#[async_trait]
pub trait TextEnhancer: Send + Sync + 'static {
    async fn enhance(&self, raw_text: &str) -> Result<String, ExternalServiceError>;
}

const TRANSCRIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub struct AssemblyAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AssemblyAiClient {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            api_key: api_key.into(),
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    status: String,
    text: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl SpeechToText for AssemblyAiClient {
    async fn transcribe(&self, audio_url: &str) -> Result<String, ExternalServiceError> {
        let submit_url = format!("{}/v2/transcript", self.base_url);
        let response = self
            .client
            .post(&submit_url)
            .header("authorization", &self.api_key)
            .json(&json!({ "audio_url": audio_url }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ExternalServiceError::Service(format!(
                "transcript submission failed with status {status}"
            )));
        }

        let submitted: SubmitResponse = response.json().await?;
        let poll_url = format!("{}/v2/transcript/{}", self.base_url, submitted.id);

        loop {
            let transcript: TranscriptStatus = self
                .client
                .get(&poll_url)
                .header("authorization", &self.api_key)
                .send()
                .await?
                .json()
                .await?;

            match transcript.status.as_str() {
                "completed" => {
                    return match transcript.text {
                        Some(text) if !text.trim().is_empty() => Ok(text),
                        _ => Err(ExternalServiceError::Service(
                            "transcription text is empty".into(),
                        )),
                    }
                }
                "error" => {
                    let detail = transcript
                        .error
                        .unwrap_or_else(|| "unknown transcription error".into());
                    return Err(ExternalServiceError::Service(detail));
                }
                _ => tokio::time::sleep(TRANSCRIPT_POLL_INTERVAL).await,
            }
        }
    }
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

const ENHANCE_SYSTEM_PROMPT: &str = "You are an AI specialized in generating well-structured \
medical reports. Ensure the report follows a professional format.";

fn enhance_user_prompt(raw_text: &str) -> String {
    format!(
        "Format the following transcription into a structured medical report with these sections:\n\
         1. Patient Information\n\
         2. Patient History\n\
         3. Symptoms\n\
         4. Diagnosis\n\
         5. Treatment Plan\n\
         6. Recommendations\n\nTranscription:\n{raw_text}"
    )
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl TextEnhancer for GroqClient {
    async fn enhance(&self, raw_text: &str) -> Result<String, ExternalServiceError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": ENHANCE_SYSTEM_PROMPT },
                { "role": "user", "content": enhance_user_prompt(raw_text) },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ExternalServiceError::Service(format!(
                "enhancement request failed with status {status}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ExternalServiceError::Service("enhancement response contained no choices".into())
            })
    }
}
