use std::sync::Arc;

use log::{debug, warn};

use crate::gate::{AlwaysHittable, GateContext, HittabilityGate};
use crate::judgment::{JudgeGrade, Judgment, ResultFactory, TapResultFactory};
use crate::lifetime::Lifetime;
use crate::scoring::ScoreSink;
use crate::shake::{Container, ShakeNode};
use crate::spec::{HitObjectSpec, SpecError, TimingWindow};
use crate::tuning::Tuning;

/// Externally visible judgment phase. `Armed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmedState {
    Idle,
    Armed,
}

/// Internal latch. `Armed` carries the locked-in result, so an armed object
/// without a result is unrepresentable and the latch can never regress.
#[derive(Debug)]
enum JudgeState {
    Idle,
    Armed(Judgment),
}

/// What a judge attempt did. Rejections are not errors; late and duplicate
/// events are expected traffic in a rhythm game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeAttempt {
    /// Result locked in with this grade.
    Judged(JudgeGrade),
    /// The hittability gate denied the attempt.
    NotHittable,
    /// The gate predicate failed; treated as not hittable.
    GateFailed,
    /// A result was already locked in; nothing changed.
    AlreadyArmed,
}

/// Currently active input context, cached on the object once the owning
/// scene attaches it. Absent until then; absence is not an error.
pub trait InputContext {
    fn is_active(&self) -> bool;
}

/// One scheduled interactive object: timing window, judgment latch, lifetime
/// bounds, feedback shake, and the content it carries. `C` is the
/// collaborator-defined child handle type composited under this object.
pub struct HitObject<C = ()> {
    spec: Arc<HitObjectSpec>,
    window: TimingWindow,
    state: JudgeState,
    lifetime: Lifetime,
    node: ShakeNode<C>,
    gate: Box<dyn HittabilityGate>,
    factory: Box<dyn ResultFactory>,
    input: Option<Arc<dyn InputContext>>,
    tuning: Tuning,
}

impl<C> HitObject<C> {
    pub fn new(spec: Arc<HitObjectSpec>, tuning: Tuning) -> Self {
        let window = TimingWindow::from_spec(&spec);
        HitObject {
            spec,
            window,
            state: JudgeState::Idle,
            lifetime: Lifetime::initial(&window),
            node: ShakeNode::new(),
            gate: Box::new(AlwaysHittable),
            factory: Box::new(TapResultFactory),
            input: None,
            tuning,
        }
    }

    /// Install a custom hittability predicate, replacing the default
    /// always-hittable gate.
    pub fn set_gate(&mut self, gate: Box<dyn HittabilityGate>) {
        self.gate = gate;
    }

    /// Install a family-specific result factory.
    pub fn set_factory(&mut self, factory: Box<dyn ResultFactory>) {
        self.factory = factory;
    }

    /// Attach a resolve deadline for the external scheduler's miss sweep.
    pub fn set_resolve_deadline(&mut self, deadline_ms: f32) -> Result<(), SpecError> {
        self.window = self.window.with_deadline(deadline_ms)?;
        Ok(())
    }

    #[inline(always)]
    pub fn spec(&self) -> &Arc<HitObjectSpec> {
        &self.spec
    }

    #[inline(always)]
    pub fn window(&self) -> &TimingWindow {
        &self.window
    }

    #[inline(always)]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    #[inline(always)]
    pub fn armed_state(&self) -> ArmedState {
        match self.state {
            JudgeState::Idle => ArmedState::Idle,
            JudgeState::Armed(_) => ArmedState::Armed,
        }
    }

    /// The locked-in result, once armed.
    #[inline(always)]
    pub fn result(&self) -> Option<&Judgment> {
        match &self.state {
            JudgeState::Idle => None,
            JudgeState::Armed(result) => Some(result),
        }
    }

    /// Try to lock in a result at `time_ms`. No-ops (with a feedback shake)
    /// when a result is already locked or the gate denies the attempt. On
    /// success the result is emitted to `sink` exactly once and retention is
    /// shrunk.
    pub fn attempt_judge(
        &mut self,
        time_ms: f32,
        grade: JudgeGrade,
        sink: &mut dyn ScoreSink,
    ) -> JudgeAttempt {
        if matches!(self.state, JudgeState::Armed(_)) {
            self.shake(time_ms);
            return JudgeAttempt::AlreadyArmed;
        }

        let ctx = GateContext { spec: &self.spec, window: &self.window };
        match self.gate.can_hit(&ctx, time_ms) {
            Ok(true) => {}
            Ok(false) => {
                self.shake(time_ms);
                return JudgeAttempt::NotHittable;
            }
            Err(e) => {
                // Fail-safe: a broken predicate never lets a judgment through.
                warn!("hittability gate failed at t={time_ms}: {e}");
                self.shake(time_ms);
                return JudgeAttempt::GateFailed;
            }
        }

        self.arm(grade, time_ms, sink);
        JudgeAttempt::Judged(grade)
    }

    /// Resolve to a miss, disregarding the hittability gate and every other
    /// eligibility condition. Idempotent: on an already-armed object this is
    /// a no-op and nothing is re-emitted. Returns whether the miss was
    /// recorded by this call.
    pub fn force_miss(&mut self, now_ms: f32, sink: &mut dyn ScoreSink) -> bool {
        if matches!(self.state, JudgeState::Armed(_)) {
            return false;
        }
        self.arm(JudgeGrade::Miss, now_ms, sink);
        true
    }

    /// The one-way `Idle -> Armed` transition: create the result, emit it,
    /// latch it, shrink retention. Callers must have checked the latch.
    fn arm(&mut self, grade: JudgeGrade, time_ms: f32, sink: &mut dyn ScoreSink) {
        debug_assert!(matches!(self.state, JudgeState::Idle));
        let result = self.factory.create(&self.spec, grade, time_ms);
        sink.apply(&result);
        self.state = JudgeState::Armed(result);
        self.lifetime.on_armed(time_ms, self.tuning.retention_tail_ms);
        debug!(
            "object start={} armed {:?} at t={time_ms}",
            self.spec.start_time_ms(), grade
        );
    }

    /// Trigger the feedback shake, restarting any decay in progress.
    pub fn shake(&mut self, now_ms: f32) {
        self.node
            .shake
            .trigger(now_ms, self.tuning.shake_magnitude, self.tuning.shake_duration_ms);
    }

    /// Per-frame upkeep: advances the shake decay clock.
    pub fn update(&mut self, now_ms: f32) {
        self.node.shake.update(now_ms);
    }

    #[inline(always)]
    pub fn shake_offset_at(&self, now_ms: f32) -> f32 {
        self.node.shake.offset_at(now_ms)
    }

    #[inline(always)]
    pub fn node(&self) -> &ShakeNode<C> {
        &self.node
    }

    /// Called by the owning scene when this object enters it.
    pub fn attach_input(&mut self, input: Arc<dyn InputContext>) {
        self.input = Some(input);
    }

    /// Called by the owning scene when this object leaves it.
    pub fn detach_input(&mut self) {
        self.input = None;
    }

    /// The cached input context, if a scene has attached one yet.
    #[inline(always)]
    pub fn input_context(&self) -> Option<&Arc<dyn InputContext>> {
        self.input.as_ref()
    }

    /// Stereo pan for any sample played on behalf of this object.
    #[inline(always)]
    pub fn sample_pan(&self) -> f32 {
        self.spec.sample_pan()
    }
}

// Content mutations on a hit object are forwarded through its single owned
// wrapper node, never applied to the outer container directly. Deliberate
// indirection: it keeps the feedback shake composable with arbitrary content.
impl<C: PartialEq> Container for HitObject<C> {
    type Child = C;

    fn add_child(&mut self, child: C) {
        self.node.add_child(child);
    }

    fn remove_child(&mut self, child: &C) -> bool {
        self.node.remove_child(child)
    }

    fn clear_children(&mut self) {
        self.node.clear_children()
    }
}

#[cfg(test)]
mod tests {
    use super::{ArmedState, HitObject, InputContext, JudgeAttempt};
    use crate::gate::{FnGate, GateContext, GateError, WindowGate};
    use crate::judgment::{JudgeGrade, Judgment};
    use crate::scoring::ScoreSink;
    use crate::shake::Container;
    use crate::spec::HitObjectSpec;
    use crate::tuning::Tuning;
    use std::sync::Arc;

    #[derive(Default)]
    struct VecSink(Vec<Judgment>);

    impl ScoreSink for VecSink {
        fn apply(&mut self, judgment: &Judgment) {
            self.0.push(judgment.clone());
        }
    }

    fn object() -> HitObject<&'static str> {
        let spec = Arc::new(HitObjectSpec::new(1000.0, 256.0, 400.0).unwrap());
        HitObject::new(spec, Tuning::default())
    }

    #[test]
    fn in_window_attempt_arms_with_the_proposed_grade() {
        let mut obj = object();
        obj.set_gate(Box::new(WindowGate { from_ms: 900.0, until_ms: 1000.0 }));
        let mut sink = VecSink::default();

        let attempt = obj.attempt_judge(950.0, JudgeGrade::Perfect, &mut sink);
        assert_eq!(attempt, JudgeAttempt::Judged(JudgeGrade::Perfect));
        assert_eq!(obj.armed_state(), ArmedState::Armed);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].grade, JudgeGrade::Perfect);
        assert_eq!(obj.result().unwrap().time_error_ms, -50.0);
    }

    #[test]
    fn gated_attempt_stays_idle_and_shakes() {
        let mut obj = object();
        obj.set_gate(Box::new(WindowGate { from_ms: 900.0, until_ms: 1000.0 }));
        let mut sink = VecSink::default();

        let attempt = obj.attempt_judge(500.0, JudgeGrade::Perfect, &mut sink);
        assert_eq!(attempt, JudgeAttempt::NotHittable);
        assert_eq!(obj.armed_state(), ArmedState::Idle);
        assert!(sink.0.is_empty(), "rejected attempt must not emit a result");
        assert!(obj.node().shake.is_active());
        assert_eq!(obj.node().shake.ends_at_ms(), 530.0);
    }

    #[test]
    fn rejected_retrigger_restarts_shake_decay() {
        let mut obj = object();
        obj.set_gate(Box::new(WindowGate { from_ms: 900.0, until_ms: 1000.0 }));
        let mut sink = VecSink::default();

        obj.attempt_judge(500.0, JudgeGrade::Perfect, &mut sink);
        obj.attempt_judge(510.0, JudgeGrade::Perfect, &mut sink);
        assert_eq!(
            obj.node().shake.ends_at_ms(),
            540.0,
            "second rejection restarts decay to 540, never 530"
        );
        assert!(sink.0.is_empty());
    }

    #[test]
    fn gate_error_is_treated_as_not_hittable() {
        let mut obj = object();
        obj.set_gate(Box::new(FnGate(
            |_: &GateContext<'_>, _: f32| -> Result<bool, GateError> {
                Err(GateError("input manager unavailable".into()))
            },
        )));
        let mut sink = VecSink::default();

        let attempt = obj.attempt_judge(950.0, JudgeGrade::Perfect, &mut sink);
        assert_eq!(attempt, JudgeAttempt::GateFailed);
        assert_eq!(obj.armed_state(), ArmedState::Idle);
        assert!(sink.0.is_empty());
        assert!(obj.node().shake.is_active());
    }

    #[test]
    fn force_miss_bypasses_the_gate_and_is_idempotent() {
        let mut obj = object();
        // Gate that never allows anything.
        obj.set_gate(Box::new(WindowGate { from_ms: 0.0, until_ms: 0.0 }));
        let mut sink = VecSink::default();

        assert_eq!(
            obj.attempt_judge(950.0, JudgeGrade::Perfect, &mut sink),
            JudgeAttempt::NotHittable
        );
        assert!(obj.force_miss(1180.0, &mut sink));
        assert!(!obj.force_miss(1180.0, &mut sink), "second call is a no-op");
        assert_eq!(sink.0.len(), 1, "exactly one result emitted");
        assert_eq!(sink.0[0].grade, JudgeGrade::Miss);
        assert_eq!(obj.result().unwrap().grade, JudgeGrade::Miss);
    }

    #[test]
    fn armed_latch_never_remits_or_mutates() {
        let mut obj = object();
        let mut sink = VecSink::default();

        obj.attempt_judge(990.0, JudgeGrade::Great, &mut sink);
        let locked_at = obj.result().unwrap().judged_at_ms;

        for t in [991.0, 1005.0, 2000.0] {
            assert_eq!(
                obj.attempt_judge(t, JudgeGrade::Perfect, &mut sink),
                JudgeAttempt::AlreadyArmed
            );
            assert!(!obj.force_miss(t, &mut sink));
        }
        assert_eq!(sink.0.len(), 1, "observed result count must stay 1");
        assert_eq!(obj.result().unwrap().grade, JudgeGrade::Great);
        assert_eq!(obj.result().unwrap().judged_at_ms, locked_at);
    }

    #[test]
    fn arming_shrinks_retention() {
        let mut obj = object();
        let mut sink = VecSink::default();
        assert_eq!(obj.lifetime().alive_until_ms, f32::INFINITY);

        obj.attempt_judge(1010.0, JudgeGrade::Good, &mut sink);
        let lifetime = obj.lifetime();
        assert!(lifetime.alive_until_ms.is_finite());
        assert!(
            lifetime.alive_until_ms >= 1010.0,
            "retention must extend past the arming time"
        );
    }

    #[test]
    fn content_mutations_flow_through_the_wrapper_node() {
        let mut obj = object();
        obj.add_child("approach_circle");
        obj.add_child("circle_piece");
        assert_eq!(obj.node().children(), &["approach_circle", "circle_piece"]);
        assert!(obj.remove_child(&"approach_circle"));
        obj.clear_children();
        assert!(obj.node().children().is_empty());
    }

    #[test]
    fn input_context_is_absent_until_attached() {
        struct StubInput;
        impl InputContext for StubInput {
            fn is_active(&self) -> bool {
                true
            }
        }

        let mut obj = object();
        assert!(obj.input_context().is_none(), "unattached lookup yields None");
        obj.attach_input(Arc::new(StubInput));
        assert!(obj.input_context().unwrap().is_active());
        obj.detach_input();
        assert!(obj.input_context().is_none());
    }

    #[test]
    fn sample_pan_follows_spec_position() {
        let obj = object();
        assert_eq!(obj.sample_pan(), 0.5);
    }
}
