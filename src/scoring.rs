use rustc_hash::FxHashMap;

use crate::judgment::{JudgeGrade, Judgment};

/// Scoring aggregator boundary. Each finalized judgment is delivered here
/// exactly once; the sink must not assume any particular delivery order
/// beyond per-object uniqueness.
pub trait ScoreSink {
    fn apply(&mut self, judgment: &Judgment);
}

/// Minimal aggregator: per-grade counts, the shape scoring and HUD layers
/// usually start from.
#[derive(Debug, Default)]
pub struct JudgmentTally {
    counts: FxHashMap<JudgeGrade, u32>,
    total: u32,
}

impl JudgmentTally {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn count(&self, grade: JudgeGrade) -> u32 {
        self.counts.get(&grade).copied().unwrap_or(0)
    }

    #[inline(always)]
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl ScoreSink for JudgmentTally {
    fn apply(&mut self, judgment: &Judgment) {
        *self.counts.entry(judgment.grade).or_insert(0) += 1;
        self.total += 1;
    }
}
