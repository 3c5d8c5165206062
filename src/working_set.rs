use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::judgment::JudgeGrade;
use crate::object::HitObject;
use crate::scoring::ScoreSink;
use crate::spec::{HitObjectSpec, SpecError, TimingWindow};
use crate::tuning::Tuning;

/// Stable handle for a scheduled object, valid across materialization and
/// retirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

/// A routed judge attempt, targeting one object. Input plumbing (which
/// device event maps to which object) stays outside the core.
#[derive(Debug, Clone, Copy)]
pub struct JudgeEvent {
    pub target: ObjectId,
    pub time_ms: f32,
    pub grade: JudgeGrade,
}

struct PendingObject {
    id: ObjectId,
    spec: Arc<HitObjectSpec>,
    visible_from_ms: f32,
    deadline_ms: Option<f32>,
}

/// The active working set: owns scheduled specs and the objects currently
/// materialized from them, and advances both against simulation time.
///
/// Per-tick processing order is fixed:
///   1. materialize objects whose visibility window has come due,
///   2. route judge events,
///   3. sweep resolve deadlines with a forced miss,
///   4. decay feedback shakes,
///   5. retire objects past their retention bound.
/// Events run before the deadline sweep, so a late input landing in the same
/// tick as the deadline wins over the forced miss; the one-way latch then
/// makes the sweep a no-op for that object.
pub struct WorkingSet<C = ()> {
    tuning: Tuning,
    next_id: u32,
    // Sorted by visible_from descending; the earliest object sits at the
    // back so materialization pops from the end.
    pending: Vec<PendingObject>,
    active: Vec<(ObjectId, HitObject<C>)>,
    index: FxHashMap<ObjectId, usize>,
    materialize_hook: Option<Box<dyn Fn(&mut HitObject<C>)>>,
    retired: u32,
}

impl<C> WorkingSet<C> {
    pub fn new(tuning: Tuning) -> Self {
        WorkingSet {
            tuning,
            next_id: 0,
            pending: Vec::new(),
            active: Vec::new(),
            index: FxHashMap::default(),
            materialize_hook: None,
            retired: 0,
        }
    }

    /// Hook run on every freshly materialized object; this is where a
    /// playfield installs per-object gates, factories, and content.
    pub fn set_materialize_hook(&mut self, hook: Box<dyn Fn(&mut HitObject<C>)>) {
        self.materialize_hook = Some(hook);
    }

    /// Schedule a spec, optionally with the resolve deadline the external
    /// deadline policy computed for it. The deadline is validated up front
    /// so a malformed schedule fails at push, not mid-play.
    pub fn push(
        &mut self,
        spec: Arc<HitObjectSpec>,
        deadline_ms: Option<f32>,
    ) -> Result<ObjectId, SpecError> {
        let window = TimingWindow::from_spec(&spec);
        if let Some(d) = deadline_ms {
            window.with_deadline(d)?;
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let entry = PendingObject {
            id,
            spec,
            visible_from_ms: window.visible_from_ms,
            deadline_ms,
        };
        let pos = self
            .pending
            .partition_point(|p| p.visible_from_ms > entry.visible_from_ms);
        self.pending.insert(pos, entry);
        Ok(id)
    }

    /// Advance the working set to `now_ms`, applying this tick's routed
    /// judge events. Finalized results go to `sink`, each exactly once.
    pub fn tick(&mut self, now_ms: f32, events: &[JudgeEvent], sink: &mut dyn ScoreSink) {
        self.materialize(now_ms);

        for event in events {
            match self.index.get(&event.target) {
                Some(&i) => {
                    self.active[i].1.attempt_judge(event.time_ms, event.grade, sink);
                }
                None => {
                    // Input for objects not (or no longer) materialized is
                    // expected late traffic; drop it.
                    debug!("judge event for inactive object {:?} dropped", event.target);
                }
            }
        }

        // Deadline sweep. The miss is recorded at the deadline itself, not
        // at the (possibly coarser) tick time, keeping results deterministic
        // across tick rates.
        for (_, obj) in &mut self.active {
            if let Some(deadline) = obj.window().resolve_deadline_ms {
                if now_ms >= deadline {
                    obj.force_miss(deadline, sink);
                }
            }
            obj.update(now_ms);
        }

        self.retire(now_ms);
    }

    fn materialize(&mut self, now_ms: f32) {
        let margin = self.tuning.materialize_margin_ms;
        loop {
            let due = matches!(
                self.pending.last(),
                Some(next) if now_ms >= next.visible_from_ms - margin
            );
            if !due {
                break;
            }
            let Some(entry) = self.pending.pop() else { break };
            let mut obj = HitObject::new(entry.spec, self.tuning);
            if let Some(d) = entry.deadline_ms {
                // Already validated at push.
                if let Err(e) = obj.set_resolve_deadline(d) {
                    debug!("dropping stale deadline for {:?}: {e}", entry.id);
                }
            }
            if let Some(hook) = &self.materialize_hook {
                hook(&mut obj);
            }
            self.index.insert(entry.id, self.active.len());
            self.active.push((entry.id, obj));
        }
    }

    fn retire(&mut self, now_ms: f32) {
        // Only the post-resolution retention bound retires an object;
        // destroying one mid-window is a caller error the set never commits.
        let mut drop_list: SmallVec<[usize; 8]> = SmallVec::new();
        for (i, (_, obj)) in self.active.iter().enumerate() {
            if now_ms > obj.lifetime().alive_until_ms {
                drop_list.push(i);
            }
        }
        for &i in drop_list.iter().rev() {
            let (id, _) = self.active.swap_remove(i);
            self.index.remove(&id);
            if let Some((moved_id, _)) = self.active.get(i) {
                self.index.insert(*moved_id, i);
            }
            self.retired += 1;
        }
    }

    /// Drop everything, pending and active, e.g. when the round terminates.
    /// Counters reset with it; `retired_count` is per-round.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
        self.index.clear();
        self.retired = 0;
    }

    #[inline(always)]
    pub fn get(&self, id: ObjectId) -> Option<&HitObject<C>> {
        self.index.get(&id).map(|&i| &self.active[i].1)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HitObject<C>> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.active[i].1),
            None => None,
        }
    }

    #[inline(always)]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    #[inline(always)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[inline(always)]
    pub fn retired_count(&self) -> u32 {
        self.retired
    }
}
