use std::sync::{Arc, Weak};

use crate::spec::HitObjectSpec;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Great,
    Good,
    Miss,
}

impl JudgeGrade {
    /// Whether this grade counts as a successful hit.
    #[inline(always)]
    pub fn is_hit(self) -> bool {
        self != JudgeGrade::Miss
    }
}

/// Ruleset-specific payload on a judgment, one variant per hit-object family.
/// The base record stays the same across families; a family's factory picks
/// the variant and fills in its extra fields.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultDetail {
    Tap,
    Hold { ticks_hit: u32, ticks_total: u32 },
}

/// Finalized outcome of one hit object. Created exactly once, then immutable;
/// the spec back-reference is weak because the scoring aggregator may outlive
/// the object (and its spec) and only needs it for lookup.
#[derive(Clone, Debug)]
pub struct Judgment {
    pub grade: JudgeGrade,
    /// Simulation time at which the result was locked in.
    pub judged_at_ms: f32,
    /// Signed offset from the nominal start time (late is positive).
    pub time_error_ms: f32,
    pub detail: ResultDetail,
    pub spec: Weak<HitObjectSpec>,
}

/// Constructs the immutable result record when a judgment is finalized.
/// Pure and deterministic given its inputs. Ruleset hit-object families
/// supply their own factory to populate family-specific detail.
pub trait ResultFactory {
    fn create(&self, spec: &Arc<HitObjectSpec>, grade: JudgeGrade, time_ms: f32) -> Judgment;
}

/// Default factory for plain tap objects.
pub struct TapResultFactory;

impl ResultFactory for TapResultFactory {
    fn create(&self, spec: &Arc<HitObjectSpec>, grade: JudgeGrade, time_ms: f32) -> Judgment {
        Judgment {
            grade,
            judged_at_ms: time_ms,
            time_error_ms: time_ms - spec.start_time_ms(),
            detail: ResultDetail::Tap,
            spec: Arc::downgrade(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JudgeGrade, ResultDetail, ResultFactory, TapResultFactory};
    use crate::spec::HitObjectSpec;
    use std::sync::Arc;

    #[test]
    fn miss_is_the_only_non_hit_grade() {
        assert!(JudgeGrade::Perfect.is_hit());
        assert!(JudgeGrade::Great.is_hit());
        assert!(JudgeGrade::Good.is_hit());
        assert!(!JudgeGrade::Miss.is_hit());
    }

    #[test]
    fn tap_factory_records_signed_timing_error() {
        let spec = Arc::new(HitObjectSpec::new(1000.0, 256.0, 400.0).unwrap());
        let early = TapResultFactory.create(&spec, JudgeGrade::Great, 980.0);
        assert_eq!(early.time_error_ms, -20.0);
        assert_eq!(early.detail, ResultDetail::Tap);
        let late = TapResultFactory.create(&spec, JudgeGrade::Good, 1050.0);
        assert_eq!(late.time_error_ms, 50.0);
        assert_eq!(late.judged_at_ms, 1050.0);
    }

    #[test]
    fn result_back_reference_is_weak() {
        let spec = Arc::new(HitObjectSpec::new(1000.0, 256.0, 400.0).unwrap());
        let result = TapResultFactory.create(&spec, JudgeGrade::Perfect, 1000.0);
        assert!(result.spec.upgrade().is_some(), "spec still alive");
        drop(spec);
        assert!(
            result.spec.upgrade().is_none(),
            "result must not keep the spec alive"
        );
    }
}
