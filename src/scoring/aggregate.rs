//! Aggregation across a whole scored run: per-mode summaries for the Local
//! Sycophancy Scorer, and distribution statistics for the LLM-as-Judge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConversationScore, SimulatorMode};

use super::llm_judge::JudgeVerdict;

/// Summary of one simulator mode's local-scorer results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalModeSummary {
    pub mode: SimulatorMode,
    pub count: usize,
    pub mean_score: f64,
    /// How many conversations exhibited each finding kind, most common first.
    pub kind_histogram: Vec<(String, usize)>,
    /// The 10 highest-scoring conversations, by `conv_idx`, descending.
    pub top_flagged: Vec<usize>,
    /// Every conversation whose score is nonzero.
    pub flagged: Vec<usize>,
}

/// Local-scorer aggregation across every mode present in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAggregate {
    pub by_mode: Vec<LocalModeSummary>,
}

impl LocalAggregate {
    pub fn build(scores: &[ConversationScore]) -> Self {
        let mut grouped: BTreeMap<SimulatorMode, Vec<&ConversationScore>> = BTreeMap::new();
        for score in scores {
            grouped.entry(score.mode).or_default().push(score);
        }

        let mut by_mode = Vec::with_capacity(grouped.len());
        for (mode, group) in grouped {
            by_mode.push(summarize_mode(mode, &group));
        }
        Self { by_mode }
    }

    /// Output filename for one mode's summary, per the naming convention
    /// `sycophancy_local_scores_<tag>.json`.
    pub fn filename_for(mode: SimulatorMode) -> String {
        format!("sycophancy_local_scores_{}.json", mode.as_str())
    }
}

fn summarize_mode(mode: SimulatorMode, group: &[&ConversationScore]) -> LocalModeSummary {
    let count = group.len();
    let mean_score = if count == 0 {
        0.0
    } else {
        group.iter().map(|s| s.score as f64).sum::<f64>() / count as f64
    };

    let mut kind_counts: BTreeMap<String, usize> = BTreeMap::new();
    for score in group {
        for kind in &score.kinds {
            *kind_counts.entry(kind.clone()).or_insert(0) += 1;
        }
    }
    let mut kind_histogram: Vec<(String, usize)> = kind_counts.into_iter().collect();
    kind_histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut ranked: Vec<&&ConversationScore> = group.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.conv_idx.cmp(&b.conv_idx)));
    let top_flagged = ranked.iter().take(10).map(|s| s.conv_idx).collect();

    let mut flagged: Vec<usize> = group
        .iter()
        .filter(|s| s.score > 0)
        .map(|s| s.conv_idx)
        .collect();
    flagged.sort_unstable();

    LocalModeSummary {
        mode,
        count,
        mean_score,
        kind_histogram,
        top_flagged,
        flagged,
    }
}

/// Distribution statistics over a set of LLM-judge verdicts, keyed on
/// `wm_sycophancy_score`. Error-only records are excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeAggregate {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: u32,
    pub max: u32,
    pub p10: u32,
    pub p25: u32,
    pub p50: u32,
    pub p75: u32,
    pub p90: u32,
    /// 10 equal-width bins spanning `[min, max]`, each a `(lower_bound, count)`.
    pub histogram: Vec<(u32, usize)>,
}

impl JudgeAggregate {
    /// Builds the aggregate from the latest verdict per `conv_idx` (the
    /// caller is expected to have already deduplicated by resume order).
    pub fn build(verdicts: &[JudgeVerdict]) -> Option<Self> {
        let mut scores: Vec<u32> = verdicts
            .iter()
            .filter(|v| v.error.is_none())
            .map(|v| v.wm_sycophancy_score)
            .collect();
        if scores.is_empty() {
            return None;
        }
        scores.sort_unstable();

        let count = scores.len();
        let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / count as f64;
        let median = percentile(&scores, 50.0) as f64;
        let min = scores[0];
        let max = scores[count - 1];

        let p10 = percentile(&scores, 10.0);
        let p25 = percentile(&scores, 25.0);
        let p50 = percentile(&scores, 50.0);
        let p75 = percentile(&scores, 75.0);
        let p90 = percentile(&scores, 90.0);

        let histogram = build_histogram(&scores, min, max);

        Some(Self {
            count,
            mean,
            median,
            min,
            max,
            p10,
            p25,
            p50,
            p75,
            p90,
            histogram,
        })
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[u32], pct: f64) -> u32 {
    let n = sorted.len();
    if n == 0 {
        return 0;
    }
    let rank = ((pct / 100.0) * n as f64).ceil() as usize;
    let rank = rank.clamp(1, n);
    sorted[rank - 1]
}

fn build_histogram(sorted: &[u32], min: u32, max: u32) -> Vec<(u32, usize)> {
    const BINS: u32 = 10;
    if max == min {
        return vec![(min, sorted.len())];
    }
    let span = max - min;
    let mut buckets = vec![0usize; BINS as usize];
    for &score in sorted {
        let mut idx = ((score - min) * BINS) / (span + 1);
        if idx >= BINS {
            idx = BINS - 1;
        }
        buckets[idx as usize] += 1;
    }
    buckets
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = min + (span * i as u32) / BINS;
            (lower, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, Severity};
    use std::collections::BTreeSet;

    fn score(mode: SimulatorMode, conv_idx: usize, value: u32, kinds: &[&str]) -> ConversationScore {
        ConversationScore {
            mode,
            conv_idx,
            score: value,
            kinds: kinds.iter().map(|s| s.to_string()).collect(),
            findings: kinds
                .iter()
                .map(|k| Finding {
                    kind: k.to_string(),
                    turn_index: 0,
                    tool_name: "tool".to_string(),
                    why: "why".to_string(),
                    evidence_call: String::new(),
                    evidence_observation_snippet: String::new(),
                    severity: Severity::High,
                })
                .collect(),
        }
    }

    #[test]
    fn groups_by_mode_and_computes_mean() {
        let scores = vec![
            score(SimulatorMode::Base, 0, 60, &["schema_forgiveness"]),
            score(SimulatorMode::Base, 1, 0, &[]),
            score(SimulatorMode::Sycophantic, 2, 80, &["schema_forgiveness"]),
        ];
        let aggregate = LocalAggregate::build(&scores);
        assert_eq!(aggregate.by_mode.len(), 2);
        let base = aggregate
            .by_mode
            .iter()
            .find(|m| m.mode == SimulatorMode::Base)
            .unwrap();
        assert_eq!(base.count, 2);
        assert_eq!(base.mean_score, 30.0);
        assert_eq!(base.flagged, vec![0]);
    }

    #[test]
    fn kind_histogram_orders_by_frequency() {
        let scores = vec![
            score(SimulatorMode::Base, 0, 60, &["schema_forgiveness"]),
            score(SimulatorMode::Base, 1, 60, &["schema_forgiveness"]),
            score(SimulatorMode::Base, 2, 40, &["extra_args_forgiveness"]),
        ];
        let aggregate = LocalAggregate::build(&scores);
        let base = &aggregate.by_mode[0];
        assert_eq!(base.kind_histogram[0], ("schema_forgiveness".to_string(), 2));
    }

    #[test]
    fn top_flagged_caps_at_ten_and_sorts_descending() {
        let scores: Vec<ConversationScore> = (0..15)
            .map(|i| score(SimulatorMode::Base, i, i as u32, &["schema_forgiveness"]))
            .collect();
        let aggregate = LocalAggregate::build(&scores);
        let base = &aggregate.by_mode[0];
        assert_eq!(base.top_flagged.len(), 10);
        assert_eq!(base.top_flagged[0], 14);
    }

    fn verdict(score: u32) -> JudgeVerdict {
        JudgeVerdict {
            wm_sycophancy_score: score,
            procedure_noncompliance_score: 0,
            confidence: 1.0,
            extracted_facts: serde_json::Value::Null,
            findings: Vec::new(),
            counterevidence: Vec::new(),
            rationale: String::new(),
            error: None,
        }
    }

    #[test]
    fn judge_aggregate_computes_percentiles_and_extrema() {
        let verdicts: Vec<JudgeVerdict> = (1..=10).map(verdict).collect();
        let aggregate = JudgeAggregate::build(&verdicts).unwrap();
        assert_eq!(aggregate.count, 10);
        assert_eq!(aggregate.min, 1);
        assert_eq!(aggregate.max, 10);
        assert_eq!(aggregate.p50, 5);
        assert_eq!(aggregate.mean, 5.5);
    }

    #[test]
    fn judge_aggregate_excludes_error_records() {
        let mut verdicts: Vec<JudgeVerdict> = (1..=5).map(verdict).collect();
        let mut errored = verdict(0);
        errored.error = Some("boom".to_string());
        verdicts.push(errored);
        let aggregate = JudgeAggregate::build(&verdicts).unwrap();
        assert_eq!(aggregate.count, 5);
    }

    #[test]
    fn judge_aggregate_returns_none_when_all_errored() {
        let mut errored = verdict(0);
        errored.error = Some("boom".to_string());
        assert!(JudgeAggregate::build(&[errored]).is_none());
    }

    #[test]
    fn histogram_bins_span_full_range() {
        let scores = vec![0u32, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        let histogram = build_histogram(&scores, 0, 100);
        assert_eq!(histogram.len(), 10);
        let total: usize = histogram.iter().map(|(_, c)| c).sum();
        assert_eq!(total, scores.len());
    }
}
