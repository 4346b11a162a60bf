//! Gladia v2 pre-recorded transcription over HTTP.
//!
//! | Step | Request |
//! |------|---------|
//! | Upload | `POST {base}/v2/upload` multipart field `audio` |
//! | Start job | `POST {base}/v2/pre-recorded` `{audio_url, diarization, translation}` |
//! | Status | `GET {base}/v2/pre-recorded/{id}` |
//!
//! Every request carries the `x-gladia-key` header.  A `404` on the status
//! endpoint means the job is not visible yet and is reported as pending.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::config::TranscriptionConfig;

use super::provider::{
    AudioHandle, JobHandle, JobOptions, JobStatus, TranscriptionError, TranscriptionProvider,
};
use super::transcript::Transcript;

const KEY_HEADER: &str = "x-gladia-key";

// ---------------------------------------------------------------------------
// GladiaClient
// ---------------------------------------------------------------------------

/// [`TranscriptionProvider`] backed by the Gladia REST API.
///
/// Connection details come from [`TranscriptionConfig`]; the key is resolved
/// from `GLADIA_API_KEY` first, then the config file.
pub struct GladiaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GladiaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GladiaClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GladiaClient {
    /// Build a client with the per-request timeout from `config`.
    ///
    /// # Errors
    ///
    /// [`TranscriptionError::MissingApiKey`] when no key is configured.
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let api_key = config
            .resolved_api_key()
            .ok_or(TranscriptionError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The job's advertised `result_url`, or the job path under `base_url`.
    fn status_url(&self, job: &JobHandle) -> String {
        match &job.result_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => self.url(&format!("/v2/pre-recorded/{}", job.id)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: Option<String>,
    result_url: Option<String>,
}

/// Turn a non-success response into [`TranscriptionError::Http`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TranscriptionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TranscriptionError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TranscriptionProvider for GladiaClient {
    async fn upload(&self, wav: Vec<u8>, file_name: &str) -> Result<AudioHandle, TranscriptionError> {
        let size = wav.len();
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(self.url("/v2/upload"))
            .header(KEY_HEADER, self.api_key.as_str())
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        let audio_url = body
            .audio_url
            .ok_or_else(|| TranscriptionError::Parse("upload response has no audio_url".into()))?;
        log::debug!("transcription: uploaded {size} bytes -> {audio_url}");
        Ok(AudioHandle { audio_url })
    }

    async fn start_job(
        &self,
        audio: &AudioHandle,
        options: JobOptions,
    ) -> Result<JobHandle, TranscriptionError> {
        let body = serde_json::json!({
            "audio_url":   audio.audio_url,
            "diarization": options.diarization,
            "translation": options.translation,
        });
        let response = self
            .client
            .post(self.url("/v2/pre-recorded"))
            .header(KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let job: JobResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        let id = job
            .id
            .ok_or_else(|| TranscriptionError::Parse("job response has no id".into()))?;
        log::debug!("transcription: job {id} started");
        Ok(JobHandle {
            id,
            result_url: job.result_url,
        })
    }

    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus, TranscriptionError> {
        let response = self
            .client
            .get(self.status_url(job))
            .header(KEY_HEADER, self.api_key.as_str())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(JobStatus::Pending);
        }
        let response = ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;
        Ok(parse_job_status(body))
    }
}

// ---------------------------------------------------------------------------
// Status payload parsing
// ---------------------------------------------------------------------------

/// Classify a status payload.
///
/// The state is read from `status`, falling back to `event`.  `done` and
/// `completed` are success, `error` and `failed` are terminal failures, and
/// anything else (including a missing field) is still pending.
pub fn parse_job_status(body: Value) -> JobStatus {
    let state = body
        .get("status")
        .and_then(Value::as_str)
        .or_else(|| body.get("event").and_then(Value::as_str))
        .unwrap_or("")
        .to_ascii_lowercase();

    match state.as_str() {
        "done" | "completed" => JobStatus::Completed(extract_transcript(&body)),
        "error" | "failed" => JobStatus::Failed(body),
        _ => JobStatus::Pending,
    }
}

fn extract_transcript(body: &Value) -> Transcript {
    let transcription = &body["result"]["transcription"];
    let text = transcription["full_transcript"]
        .as_str()
        .or_else(|| body["prediction"].as_str())
        .unwrap_or("")
        .to_string();

    let metadata = transcription
        .get("utterances")
        .filter(|u| !u.is_null())
        .cloned();
    let transcript = Transcript::new(text);
    match metadata {
        Some(m) => transcript.with_metadata(m),
        None => transcript,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
