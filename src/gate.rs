use thiserror::Error;

use crate::spec::{HitObjectSpec, TimingWindow};

/// A custom hittability predicate failed. Recovered locally: the attempt is
/// treated as not hittable (fail-safe, never fail-open) and the error is
/// logged at the collaborator boundary.
#[derive(Debug, Error)]
#[error("eligibility check failed: {0}")]
pub struct GateError(pub String);

/// Read-only view of the object a gate is deciding about. Kept separate from
/// the object itself so a gate stored on the object can be called while the
/// object is mutably borrowed.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub spec: &'a HitObjectSpec,
    pub window: &'a TimingWindow,
}

/// Decides, per attempt, whether an object may currently register a judgment.
/// Installed per object; the default allows everything.
pub trait HittabilityGate {
    fn can_hit(&self, ctx: &GateContext<'_>, time_ms: f32) -> Result<bool, GateError>;
}

/// Adapter turning any plain predicate over (context, time) into a gate.
pub struct FnGate<F>(pub F);

impl<F> HittabilityGate for FnGate<F>
where
    F: Fn(&GateContext<'_>, f32) -> Result<bool, GateError>,
{
    fn can_hit(&self, ctx: &GateContext<'_>, time_ms: f32) -> Result<bool, GateError> {
        (self.0)(ctx, time_ms)
    }
}

/// Default gate: always hittable.
pub struct AlwaysHittable;

impl HittabilityGate for AlwaysHittable {
    fn can_hit(&self, _ctx: &GateContext<'_>, _time_ms: f32) -> Result<bool, GateError> {
        Ok(true)
    }
}

/// Gate that only allows judgments inside a fixed time interval, inclusive
/// on both ends.
#[derive(Debug, Clone, Copy)]
pub struct WindowGate {
    pub from_ms: f32,
    pub until_ms: f32,
}

impl HittabilityGate for WindowGate {
    fn can_hit(&self, _ctx: &GateContext<'_>, time_ms: f32) -> Result<bool, GateError> {
        Ok(time_ms >= self.from_ms && time_ms <= self.until_ms)
    }
}
