use serde::{Deserialize, Serialize};
use thiserror::Error;

// All times are in milliseconds. f32 keeps the math cheap and is exact for
// the integer-millisecond values charts actually carry.

/// Nominal playfield width. Horizontal positions are normalized against this
/// to produce a stereo pan for sample playback.
pub const FIELD_WIDTH: f32 = 512.0;

#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("invalid timing: {0}")]
    InvalidTiming(String),
}

/// Immutable description of a single scheduled hit object, as supplied by the
/// chart. Everything derived at runtime (windows, lifetime, judgment state)
/// lives elsewhere.
///
/// `new` is the only construction path; deserialization runs the same
/// validation, so a value of this type always satisfies the timing rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHitObjectSpec")]
pub struct HitObjectSpec {
    start_time_ms: f32,
    x: f32,
    preempt_ms: f32,
}

/// Unvalidated wire shape; `HitObjectSpec` is deserialized through this so
/// malformed timing fails with `InvalidTiming` instead of producing a value.
#[derive(Deserialize)]
struct RawHitObjectSpec {
    start_time_ms: f32,
    x: f32,
    preempt_ms: f32,
}

impl TryFrom<RawHitObjectSpec> for HitObjectSpec {
    type Error = SpecError;

    fn try_from(raw: RawHitObjectSpec) -> Result<Self, SpecError> {
        HitObjectSpec::new(raw.start_time_ms, raw.x, raw.preempt_ms)
    }
}

impl HitObjectSpec {
    pub fn new(start_time_ms: f32, x: f32, preempt_ms: f32) -> Result<Self, SpecError> {
        if !start_time_ms.is_finite() || start_time_ms < 0.0 {
            return Err(SpecError::InvalidTiming(format!(
                "start time must be finite and non-negative, got {start_time_ms}"
            )));
        }
        if !preempt_ms.is_finite() || preempt_ms < 0.0 {
            return Err(SpecError::InvalidTiming(format!(
                "preempt duration must be finite and non-negative, got {preempt_ms}"
            )));
        }
        Ok(HitObjectSpec { start_time_ms, x, preempt_ms })
    }

    /// Nominal time the object should be acted on.
    #[inline(always)]
    pub fn start_time_ms(&self) -> f32 {
        self.start_time_ms
    }

    /// Horizontal position on the playfield, in [0, FIELD_WIDTH].
    #[inline(always)]
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Lead time before `start_time_ms` at which the object begins appearing.
    #[inline(always)]
    pub fn preempt_ms(&self) -> f32 {
        self.preempt_ms
    }

    /// Normalized horizontal position used for stereo panning at sample
    /// playback time, clamped to [0, 1].
    #[inline(always)]
    pub fn sample_pan(&self) -> f32 {
        (self.x / FIELD_WIDTH).clamp(0.0, 1.0)
    }
}

/// Timing bounds derived from a spec: when the object becomes visible, when
/// it is nominally due, and (optionally) when the external scheduler will
/// force-miss it. The deadline policy itself belongs to the scheduler; this
/// type only stores the value it was given.
///
/// Invariant: `visible_from_ms <= start_time_ms <= resolve_deadline_ms`
/// whenever the deadline is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindow {
    pub visible_from_ms: f32,
    pub start_time_ms: f32,
    pub resolve_deadline_ms: Option<f32>,
}

impl TimingWindow {
    #[inline(always)]
    pub fn from_spec(spec: &HitObjectSpec) -> Self {
        TimingWindow {
            visible_from_ms: spec.start_time_ms() - spec.preempt_ms(),
            start_time_ms: spec.start_time_ms(),
            resolve_deadline_ms: None,
        }
    }

    /// Attach a resolve deadline. Rejects deadlines before the nominal start
    /// so the window invariant can never be violated after construction.
    pub fn with_deadline(mut self, deadline_ms: f32) -> Result<Self, SpecError> {
        if !deadline_ms.is_finite() || deadline_ms < self.start_time_ms {
            return Err(SpecError::InvalidTiming(format!(
                "resolve deadline {deadline_ms} precedes start time {}",
                self.start_time_ms
            )));
        }
        self.resolve_deadline_ms = Some(deadline_ms);
        Ok(self)
    }
}
