//! Rep insight aggregator.
//!
//! Buckets the ordered rep-level findings into early/middle/late segments
//! and derives one dominant status per segment plus a whole-set narrative.

use std::collections::HashMap;

use contracts::{RepInsight, RepStatus, RepSummary, RepSummarySegment};

const SEGMENT_LABELS: [&str; 3] = ["early", "middle", "late"];
const EMPTY_SEGMENT_NARRATIVE: &str = "no reps captured";

/// Derive the three-segment summary from raw per-rep findings.
///
/// Tolerant of missing or out-of-range rep indices: the 1-based position in
/// the list is used whenever the reported index is unusable.
pub fn aggregate_insights(insights: &[RepInsight]) -> RepSummary {
    let n = insights.len();
    let size = (n / 3).max(1);

    let bounds = [
        (0, size.min(n)),
        (size.min(n), (2 * size).min(n)),
        ((2 * size).min(n), n),
    ];

    let segments: Vec<RepSummarySegment> = bounds
        .iter()
        .zip(SEGMENT_LABELS)
        .map(|(&(lo, hi), label)| summarize_segment(label, &insights[lo..hi], lo))
        .collect();

    let overall = segments
        .iter()
        .map(|seg| format!("{}: {}", seg.label, status_description(seg.dominant)))
        .collect::<Vec<_>>()
        .join("; ");

    RepSummary { overall, segments }
}

fn summarize_segment(label: &str, insights: &[RepInsight], offset: usize) -> RepSummarySegment {
    if insights.is_empty() {
        return RepSummarySegment {
            label: label.to_string(),
            dominant: RepStatus::Ok,
            narrative: EMPTY_SEGMENT_NARRATIVE.to_string(),
        };
    }

    let narrative = insights
        .iter()
        .enumerate()
        .map(|(i, insight)| {
            let index = display_index(insight, offset + i);
            format!("Rep {}: {}", index, insight.finding)
        })
        .collect::<Vec<_>>()
        .join("; ");

    RepSummarySegment {
        label: label.to_string(),
        dominant: dominant_status(insights),
        narrative,
    }
}

/// Reported rep index when plausible, positional index otherwise.
fn display_index(insight: &RepInsight, position: usize) -> u32 {
    if insight.rep_index >= 1 {
        insight.rep_index
    } else {
        position as u32 + 1
    }
}

/// Highest occurrence count wins; ties break toward the more severe status.
fn dominant_status(insights: &[RepInsight]) -> RepStatus {
    let mut counts: HashMap<RepStatus, usize> = HashMap::new();
    for insight in insights {
        *counts.entry(insight.status).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by_key(|(status, count)| (*count, status.severity()))
        .map(|(status, _)| status)
        .unwrap_or(RepStatus::Ok)
}

fn status_description(status: RepStatus) -> &'static str {
    match status {
        RepStatus::Ok => "reps held the movement standard",
        RepStatus::Warn => "form drift crept in",
        RepStatus::Fail => "technique broke down",
    }
}
