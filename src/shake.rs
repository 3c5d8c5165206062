// Feedback shake for rejected or ignored input, and the wrapper node every
// piece of hit-object content hangs off so the shake composes with it.

/// Reference shake duration in milliseconds. A tuning value; see
/// `Tuning::shake_duration_ms`.
pub const SHAKE_DURATION_MS: f32 = 30.0;

/// Number of left-right oscillations over one full shake.
const SHAKE_CYCLES: f32 = 4.0;

/// Bounded, time-limited visual perturbation. Owned exclusively by one hit
/// object; resets itself to zero once the decay clock runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShakeState {
    magnitude: f32,
    started_at_ms: f32,
    ends_at_ms: f32,
    active: bool,
}

impl ShakeState {
    /// Start (or restart) a shake. Re-triggering while a previous shake is
    /// decaying restarts the decay clock; magnitudes never stack.
    pub fn trigger(&mut self, now_ms: f32, max_magnitude: f32, duration_ms: f32) {
        self.magnitude = max_magnitude;
        self.started_at_ms = now_ms;
        self.ends_at_ms = now_ms + duration_ms;
        self.active = true;
    }

    /// Advance the decay clock; past the end, the state zeroes itself.
    pub fn update(&mut self, now_ms: f32) {
        if self.active && now_ms >= self.ends_at_ms {
            *self = ShakeState::default();
        }
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline(always)]
    pub fn ends_at_ms(&self) -> f32 {
        self.ends_at_ms
    }

    #[inline(always)]
    pub fn remaining_ms(&self, now_ms: f32) -> f32 {
        if self.active { (self.ends_at_ms - now_ms).max(0.0) } else { 0.0 }
    }

    /// Current horizontal offset: a sine burst whose envelope decays linearly
    /// to zero over the shake duration.
    pub fn offset_at(&self, now_ms: f32) -> f32 {
        if !self.active || now_ms >= self.ends_at_ms {
            return 0.0;
        }
        let duration = self.ends_at_ms - self.started_at_ms;
        if duration <= 0.0 {
            return 0.0;
        }
        let elapsed = (now_ms - self.started_at_ms).max(0.0);
        let envelope = 1.0 - elapsed / duration;
        let phase = elapsed / duration * SHAKE_CYCLES * std::f32::consts::TAU;
        self.magnitude * envelope * phase.sin()
    }
}

/// Structural mutations the compositing container exposes. The hit object
/// never calls the outer container with its own content; everything goes
/// through its single owned `ShakeNode` so the shake offset applies to
/// whatever content a ruleset adds.
pub trait Container {
    type Child;

    fn add_child(&mut self, child: Self::Child);
    fn remove_child(&mut self, child: &Self::Child) -> bool;
    fn clear_children(&mut self);
}

/// The one internal wrapper node of a hit object: holds the object's content
/// children and the shake state that perturbs them as a group.
#[derive(Debug, Default)]
pub struct ShakeNode<C> {
    children: Vec<C>,
    pub shake: ShakeState,
}

impl<C> ShakeNode<C> {
    pub fn new() -> Self {
        ShakeNode { children: Vec::new(), shake: ShakeState::default() }
    }

    #[inline(always)]
    pub fn children(&self) -> &[C] {
        &self.children
    }
}

impl<C: PartialEq> Container for ShakeNode<C> {
    type Child = C;

    fn add_child(&mut self, child: C) {
        self.children.push(child);
    }

    fn remove_child(&mut self, child: &C) -> bool {
        match self.children.iter().position(|c| c == child) {
            Some(i) => {
                self.children.remove(i);
                true
            }
            None => false,
        }
    }

    fn clear_children(&mut self) {
        self.children.clear();
    }
}
