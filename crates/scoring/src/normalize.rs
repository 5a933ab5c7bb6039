//! Response normalization.
//!
//! The two upstream collaborators return structurally different payloads;
//! both are parsed into shape-specific DTOs and funneled through one tagged
//! variant here, so the rest of the system only ever sees the canonical
//! `MovementAnalysisResponse`.

use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

use contracts::{
    KpiResult, LoadReadiness, MovementAnalysisResponse, MovementPattern, Override, RepInsight,
    RepStatus, ScreenError,
};

use crate::insight::aggregate_insights;

/// Feature-payload mode response (shape A).
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureScoreDto {
    pub pattern: String,
    pub kpis: Vec<FeatureKpiDto>,
    pub overall_score: u8,
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub variation: String,
    #[serde(default)]
    pub load_readiness: Option<String>,
    #[serde(default)]
    pub rep_insights: Option<Vec<RepInsightDto>>,
    #[serde(default)]
    pub coach_briefing: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureKpiDto {
    pub key: String,
    pub pass: bool,
    pub score: u8,
    pub rationale: String,
    #[serde(default)]
    pub cues: Vec<String>,
    #[serde(default)]
    pub regression: Option<String>,
    #[serde(default)]
    pub progression: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepInsightDto {
    #[serde(default)]
    pub rep: u32,
    pub status: String,
    pub finding: String,
    #[serde(default)]
    pub focus: Option<String>,
}

/// Media mode response (shape B): different field names, verdict strings
/// and a 0-100 grading scale.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaScoreDto {
    pub movement: String,
    pub criteria: Vec<MediaCriterionDto>,
    pub grade: f64,
    #[serde(default)]
    pub ranked_focus: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub loading_advice: Option<String>,
    #[serde(default)]
    pub reps: Option<Vec<MediaRepDto>>,
    #[serde(default)]
    pub briefing: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaCriterionDto {
    pub name: String,
    pub verdict: String,
    pub grade: f64,
    pub reason: String,
    #[serde(default)]
    pub cues: Vec<String>,
    #[serde(default)]
    pub easier: Option<String>,
    #[serde(default)]
    pub harder: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaRepDto {
    #[serde(default)]
    pub index: u32,
    pub outcome: String,
    pub note: String,
    #[serde(default)]
    pub next_cue: Option<String>,
}

fn default_confidence() -> f64 {
    0.5
}

/// Tagged union of the upstream response shapes.
#[derive(Debug, Clone)]
pub enum RawScoringResponse {
    Feature(FeatureScoreDto),
    Media(MediaScoreDto),
}

/// Collapse either upstream shape into the canonical response.
///
/// Exactly four KPIs are required; anything else is a malformed response,
/// never a partial success. Missing optional sections degrade gracefully.
pub fn normalize(raw: RawScoringResponse) -> Result<MovementAnalysisResponse, ScreenError> {
    let mut response = match raw {
        RawScoringResponse::Feature(dto) => normalize_feature(dto)?,
        RawScoringResponse::Media(dto) => normalize_media(dto)?,
    };
    response.ensure_kpi_count()?;

    // Derive the whole-set summary whenever rep findings are present
    if response.rep_summary.is_none() {
        if let Some(insights) = &response.rep_insights {
            if !insights.is_empty() {
                response.rep_summary = Some(aggregate_insights(insights));
            }
        }
    }

    // Fall back to a score-ordered priority when the collaborator gave none
    if response.priority.is_empty() {
        let mut keyed: Vec<(&String, u8)> =
            response.kpis.iter().map(|k| (&k.key, k.score)).collect();
        keyed.sort_by_key(|(_, score)| *score);
        response.priority = keyed.into_iter().map(|(key, _)| key.clone()).collect();
    }

    Ok(response)
}

fn normalize_feature(dto: FeatureScoreDto) -> Result<MovementAnalysisResponse, ScreenError> {
    let pattern = parse_pattern(&dto.pattern)?;

    let kpis = dto
        .kpis
        .into_iter()
        .map(|kpi| KpiResult {
            key: kpi.key,
            pass: Override::new(kpi.pass),
            score: kpi.score.min(3),
            rationale: kpi.rationale,
            cues: kpi.cues,
            regression: kpi.regression,
            progression: kpi.progression,
            confidence: kpi.confidence.clamp(0.0, 1.0),
        })
        .collect();

    let rep_insights = dto.rep_insights.map(|insights| {
        insights
            .into_iter()
            .map(|dto| RepInsight {
                rep_index: dto.rep,
                status: parse_status(&dto.status),
                finding: dto.finding,
                focus_cue: dto.focus,
            })
            .collect()
    });

    Ok(MovementAnalysisResponse {
        pattern,
        kpis,
        overall_score: dto.overall_score.min(3),
        priority: dto.priority,
        notes: dto.notes,
        variation: Override::new(dto.variation),
        load_readiness: parse_load_readiness(dto.load_readiness.as_deref()),
        rep_insights,
        rep_summary: None,
        coach_briefing: dto.coach_briefing,
    })
}

fn normalize_media(dto: MediaScoreDto) -> Result<MovementAnalysisResponse, ScreenError> {
    let pattern = parse_pattern(&dto.movement)?;

    let kpis = dto
        .criteria
        .into_iter()
        .map(|criterion| KpiResult {
            key: criterion.name,
            pass: Override::new(criterion.verdict.eq_ignore_ascii_case("pass")),
            score: grade_to_score(criterion.grade),
            rationale: criterion.reason,
            cues: criterion.cues,
            regression: criterion.easier,
            progression: criterion.harder,
            confidence: criterion.confidence.unwrap_or_else(default_confidence),
        })
        .collect();

    let rep_insights = dto.reps.map(|reps| {
        reps.into_iter()
            .map(|rep| RepInsight {
                rep_index: rep.index,
                status: parse_media_outcome(&rep.outcome),
                finding: rep.note,
                focus_cue: rep.next_cue,
            })
            .collect()
    });

    Ok(MovementAnalysisResponse {
        pattern,
        kpis,
        overall_score: grade_to_score(dto.grade),
        priority: dto.ranked_focus,
        notes: dto.summary,
        variation: Override::new(dto.variant.unwrap_or_else(|| "standard".to_string())),
        load_readiness: parse_load_readiness(dto.loading_advice.as_deref()),
        rep_insights,
        rep_summary: None,
        coach_briefing: dto.briefing,
    })
}

fn parse_pattern(raw: &str) -> Result<MovementPattern, ScreenError> {
    MovementPattern::from_str(raw)
        .map_err(|e| ScreenError::analysis_failed(format!("malformed response: {e}")))
}

fn parse_status(raw: &str) -> RepStatus {
    match raw.to_lowercase().as_str() {
        "ok" => RepStatus::Ok,
        "warn" => RepStatus::Warn,
        "fail" => RepStatus::Fail,
        other => {
            warn!(status = other, "unknown rep status, treating as warn");
            RepStatus::Warn
        }
    }
}

fn parse_media_outcome(raw: &str) -> RepStatus {
    match raw.to_lowercase().as_str() {
        "good" => RepStatus::Ok,
        "caution" => RepStatus::Warn,
        "fault" => RepStatus::Fail,
        other => {
            warn!(outcome = other, "unknown rep outcome, treating as warn");
            RepStatus::Warn
        }
    }
}

fn parse_load_readiness(raw: Option<&str>) -> LoadReadiness {
    let Some(raw) = raw else {
        return LoadReadiness::default();
    };
    match raw.to_lowercase().as_str() {
        "not_ready" => LoadReadiness::NotReady,
        "bodyweight" => LoadReadiness::Bodyweight,
        "light" => LoadReadiness::Light,
        "moderate" => LoadReadiness::Moderate,
        "full" => LoadReadiness::Full,
        other => {
            warn!(load_readiness = other, "unknown load readiness, defaulting to not_ready");
            LoadReadiness::NotReady
        }
    }
}

/// Map the media collaborator's 0-100 grade onto the 0-3 scale.
fn grade_to_score(grade: f64) -> u8 {
    ((grade.clamp(0.0, 100.0) / 100.0) * 3.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_dto(kpi_count: usize) -> FeatureScoreDto {
        FeatureScoreDto {
            pattern: "squat".into(),
            kpis: (0..kpi_count)
                .map(|i| FeatureKpiDto {
                    key: format!("kpi_{i}"),
                    pass: i % 2 == 0,
                    score: i as u8,
                    rationale: "because".into(),
                    cues: vec![],
                    regression: None,
                    progression: None,
                    confidence: 0.9,
                })
                .collect(),
            overall_score: 2,
            priority: vec![],
            notes: None,
            variation: "bodyweight".into(),
            load_readiness: Some("light".into()),
            rep_insights: None,
            coach_briefing: None,
        }
    }

    fn media_dto() -> MediaScoreDto {
        MediaScoreDto {
            movement: "hinge".into(),
            criteria: (0..4)
                .map(|i| MediaCriterionDto {
                    name: format!("crit_{i}"),
                    verdict: if i == 0 { "FAIL".into() } else { "pass".into() },
                    grade: 75.0,
                    reason: "seen in clip".into(),
                    cues: vec![],
                    easier: None,
                    harder: None,
                    confidence: None,
                })
                .collect(),
            grade: 66.0,
            ranked_focus: vec!["crit_0".into()],
            summary: Some("overall fine".into()),
            variant: None,
            loading_advice: Some("moderate".into()),
            reps: Some(vec![
                MediaRepDto {
                    index: 1,
                    outcome: "good".into(),
                    note: "clean".into(),
                    next_cue: None,
                },
                MediaRepDto {
                    index: 2,
                    outcome: "fault".into(),
                    note: "hips shot up".into(),
                    next_cue: Some("brace first".into()),
                },
            ]),
            briefing: None,
        }
    }

    #[test]
    fn test_feature_shape_normalizes() {
        let response = normalize(RawScoringResponse::Feature(feature_dto(4))).unwrap();
        assert_eq!(response.pattern, MovementPattern::Squat);
        assert_eq!(response.kpis.len(), 4);
        assert_eq!(response.load_readiness, LoadReadiness::Light);
        assert_eq!(*response.variation.effective(), "bodyweight".to_string());
    }

    #[test]
    fn test_three_kpis_rejected() {
        let err = normalize(RawScoringResponse::Feature(feature_dto(3))).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedResponse { kpi_count: 3 }));
    }

    #[test]
    fn test_five_kpis_rejected() {
        let err = normalize(RawScoringResponse::Feature(feature_dto(5))).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedResponse { kpi_count: 5 }));
    }

    #[test]
    fn test_media_shape_normalizes_to_same_canonical_form() {
        let response = normalize(RawScoringResponse::Media(media_dto())).unwrap();
        assert_eq!(response.pattern, MovementPattern::Hinge);
        assert_eq!(response.kpis.len(), 4);
        assert_eq!(*response.kpis[0].pass.effective(), false);
        assert_eq!(response.kpis[1].score, 2); // 75/100 -> 2.25 -> 2
        assert_eq!(response.overall_score, 2);
        assert_eq!(response.load_readiness, LoadReadiness::Moderate);
        assert_eq!(*response.variation.effective(), "standard".to_string());

        // Rep insights mapped and summary derived
        let insights = response.rep_insights.as_ref().unwrap();
        assert_eq!(insights[1].status, RepStatus::Fail);
        assert!(response.rep_summary.is_some());
    }

    #[test]
    fn test_missing_optional_fields_degrade_gracefully() {
        let mut dto = feature_dto(4);
        dto.rep_insights = None;
        dto.load_readiness = None;
        let response = normalize(RawScoringResponse::Feature(dto)).unwrap();
        assert!(response.rep_insights.is_none());
        assert!(response.rep_summary.is_none());
        assert_eq!(response.load_readiness, LoadReadiness::Bodyweight);
    }

    #[test]
    fn test_priority_defaults_to_score_order() {
        let response = normalize(RawScoringResponse::Feature(feature_dto(4))).unwrap();
        assert_eq!(
            response.priority,
            vec!["kpi_0", "kpi_1", "kpi_2", "kpi_3"]
        );
    }

    #[test]
    fn test_unknown_pattern_is_an_error() {
        let mut dto = feature_dto(4);
        dto.pattern = "backflip".into();
        assert!(normalize(RawScoringResponse::Feature(dto)).is_err());
    }

    #[test]
    fn test_grade_scale_mapping() {
        assert_eq!(grade_to_score(0.0), 0);
        assert_eq!(grade_to_score(50.0), 2); // 1.5 rounds up
        assert_eq!(grade_to_score(100.0), 3);
        assert_eq!(grade_to_score(140.0), 3);
    }
}
