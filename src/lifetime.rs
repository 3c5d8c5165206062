use crate::spec::TimingWindow;

/// Interval during which a hit object should be materialized in the active
/// working set. Starts conservative (open-ended) and is shrunk once the
/// object resolves, to bound how many objects stay alive at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub alive_from_ms: f32,
    pub alive_until_ms: f32,
}

impl Lifetime {
    /// Conservative initial bounds: alive from first visibility, no upper
    /// bound until the object resolves.
    #[inline(always)]
    pub fn initial(window: &TimingWindow) -> Self {
        Lifetime {
            alive_from_ms: window.visible_from_ms,
            alive_until_ms: f32::INFINITY,
        }
    }

    /// Shrink retention after the object resolves. Only the Armed transition
    /// may call this; shrinking earlier could destroy an object before it
    /// can be judged.
    #[inline(always)]
    pub fn on_armed(&mut self, now_ms: f32, retention_tail_ms: f32) {
        self.alive_until_ms = now_ms + retention_tail_ms;
    }

    #[inline(always)]
    pub fn contains(&self, now_ms: f32) -> bool {
        now_ms >= self.alive_from_ms && now_ms <= self.alive_until_ms
    }
}
