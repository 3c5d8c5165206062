//! Hit-object lifecycle and judgment core for rhythm-game rulesets.
//!
//! Each scheduled object appears, can be acted on inside a timing window,
//! resolves to exactly one judgment, and is retired. The crate owns the
//! timing-window math, the hittability gate, the one-way `Idle -> Armed`
//! judgment latch, the feedback shake, and the lifetime bounds that keep the
//! active working set small. Rendering, input routing, sample playback, and
//! score aggregation are collaborators reached through small traits.
//!
//! The model is single-threaded and cooperative: one simulation loop drives
//! `WorkingSet::tick`, and no two threads ever mutate the same object. Within
//! a tick, routed judge events are processed before the resolve-deadline
//! sweep, so a late input in the deadline tick beats the forced miss.

pub mod gate;
pub mod judgment;
pub mod lifetime;
pub mod object;
pub mod scoring;
pub mod shake;
pub mod spec;
pub mod tuning;
pub mod working_set;

pub use gate::{AlwaysHittable, FnGate, GateContext, GateError, HittabilityGate, WindowGate};
pub use judgment::{JudgeGrade, Judgment, ResultDetail, ResultFactory, TapResultFactory};
pub use lifetime::Lifetime;
pub use object::{ArmedState, HitObject, InputContext, JudgeAttempt};
pub use scoring::{JudgmentTally, ScoreSink};
pub use shake::{Container, SHAKE_DURATION_MS, ShakeNode, ShakeState};
pub use spec::{FIELD_WIDTH, HitObjectSpec, SpecError, TimingWindow};
pub use tuning::Tuning;
pub use working_set::{JudgeEvent, ObjectId, WorkingSet};
