//! HTTP scoring client.
//!
//! Talks to the remote scoring collaborator in two modes: feature-payload
//! JSON POST and multipart media submission. Each mode parses its own
//! upstream DTO and hands it to the normalization layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{debug, instrument};

use contracts::{
    ClipData, FeaturePayload, MediaMetadata, MovementAnalysisResponse, ScoringApi, ScoringConfig,
    ScreenError,
};

use crate::normalize::{normalize, FeatureScoreDto, MediaScoreDto, RawScoringResponse};

/// Feature-mode request body.
#[derive(Debug, Serialize)]
struct FeatureScoreRequest<'a> {
    payload: &'a FeaturePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    variation_override: Option<&'a str>,
}

/// HTTP client for the scoring collaborator.
#[derive(Debug)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    /// Build a client from the scoring configuration.
    ///
    /// # Errors
    /// - Missing endpoint (remote scoring selected without a URL)
    /// - HTTP client construction failure
    pub fn new(config: &ScoringConfig) -> Result<Self, ScreenError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ScreenError::config_validation("scoring.endpoint", "required for remote scoring")
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScreenError::analysis_failed(format!("http client init: {e}")))?;

        Ok(Self {
            http,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ScreenError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ScreenError::analysis_failed(format!(
                "scoring endpoint returned {status}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ScoringApi for ScoringClient {
    #[instrument(
        name = "scoring_submit_features",
        skip(self, payload),
        fields(pattern = %payload.pattern, reps = payload.reps.len())
    )]
    async fn score_features(
        &self,
        payload: &FeaturePayload,
        variation_override: Option<&str>,
    ) -> Result<MovementAnalysisResponse, ScreenError> {
        let body = FeatureScoreRequest {
            payload,
            variation_override,
        };

        let response = self
            .http
            .post(self.url("/v1/screens/score"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScreenError::analysis_failed(e.to_string()))?;

        let dto: FeatureScoreDto = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ScreenError::analysis_failed(format!("response decode: {e}")))?;

        debug!(kpis = dto.kpis.len(), "feature scoring response received");
        normalize(RawScoringResponse::Feature(dto))
    }

    #[instrument(
        name = "scoring_submit_media",
        skip(self, clip, meta),
        fields(pattern = %meta.pattern, bytes = clip.data.len())
    )]
    async fn score_media(
        &self,
        clip: &ClipData,
        meta: &MediaMetadata,
    ) -> Result<MovementAnalysisResponse, ScreenError> {
        let meta_json = serde_json::to_string(meta)
            .map_err(|e| ScreenError::analysis_failed(format!("metadata encode: {e}")))?;

        let clip_part = Part::bytes(clip.data.to_vec())
            .file_name("clip.mp4")
            .mime_str(&clip.content_type)
            .map_err(|e| ScreenError::analysis_failed(format!("clip content type: {e}")))?;

        let form = Form::new().part("clip", clip_part).text("meta", meta_json);

        let response = self
            .http
            .post(self.url("/v1/screens/score-media"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScreenError::analysis_failed(e.to_string()))?;

        let dto: MediaScoreDto = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ScreenError::analysis_failed(format!("response decode: {e}")))?;

        debug!(criteria = dto.criteria.len(), "media scoring response received");
        normalize(RawScoringResponse::Media(dto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraView, MovementPattern};

    #[test]
    fn test_missing_endpoint_is_a_config_error() {
        let config = ScoringConfig {
            endpoint: None,
            ..Default::default()
        };
        let err = ScoringClient::new(&config).unwrap_err();
        assert!(matches!(err, ScreenError::ConfigValidation { .. }));
    }

    #[test]
    fn test_trailing_slash_trimmed_from_endpoint() {
        let config = ScoringConfig {
            endpoint: Some("https://scoring.example.com/".into()),
            ..Default::default()
        };
        let client = ScoringClient::new(&config).unwrap();
        assert_eq!(
            client.url("/v1/screens/score"),
            "https://scoring.example.com/v1/screens/score"
        );
    }

    #[test]
    fn test_feature_request_omits_absent_override() {
        let payload = FeaturePayload::from_reps(
            MovementPattern::Squat,
            "client-1",
            10.0,
            CameraView::Front,
            vec![],
        );
        let body = FeatureScoreRequest {
            payload: &payload,
            variation_override: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("variation_override").is_none());

        let body = FeatureScoreRequest {
            payload: &payload,
            variation_override: Some("goblet"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variation_override"], "goblet");
    }
}
