//! Host abstraction for the emitter
//!
//! The emitter never touches the DOM or the event loop directly. A `Stage`
//! owns the overlay, the flake nodes and the timers, and hands timers back to
//! the emitter when they fire.

use crate::config::SnowSettings;
use crate::error::SnowError;
use crate::flake::{Flake, FlakeId, Viewport};

/// One-shot timer events, tagged with the run generation that scheduled them.
/// Events from an earlier generation are ignored when they fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    Spawn { generation: u64 },
    Retire { generation: u64, flake: FlakeId },
}

pub trait Stage {
    /// Milliseconds on a monotonic-enough clock.
    fn now(&self) -> f64;

    fn viewport(&self) -> Viewport;

    /// Uniform value in `[0, 1)`.
    fn random(&mut self) -> f64;

    fn mount_overlay(&mut self, settings: &SnowSettings) -> Result<(), SnowError>;

    /// Removes the overlay together with every flake still inside it.
    fn unmount_overlay(&mut self);

    /// Attaches a flake and starts its fall on the next frame.
    fn add_flake(&mut self, flake: &Flake, settings: &SnowSettings) -> Result<(), SnowError>;

    fn remove_flake(&mut self, id: FlakeId);

    /// Delivers `timer` back to the emitter after `delay_ms`.
    fn schedule(&mut self, delay_ms: u32, timer: Timer) -> Result<(), SnowError>;
}

#[cfg(test)]
pub(crate) mod manual {
    use std::collections::BTreeMap;

    use super::*;

    /// Deterministic stage: virtual clock, ordered timer queue, seeded LCG.
    pub struct ManualStage {
        pub now: f64,
        pub viewport: Viewport,
        pub overlay_mounted: bool,
        pub overlay_mounts: usize,
        pub nodes: BTreeMap<FlakeId, Flake>,
        pub added: usize,
        pub removed: usize,
        pub fail_mount: bool,
        pub fail_add: bool,
        pub fail_schedule: bool,
        queue: Vec<(f64, u64, Timer)>,
        seq: u64,
        rng: u32,
    }

    impl ManualStage {
        pub fn new() -> Self {
            Self {
                now: 0.0,
                viewport: Viewport {
                    width: 1280.0,
                    height: 720.0,
                },
                overlay_mounted: false,
                overlay_mounts: 0,
                nodes: BTreeMap::new(),
                added: 0,
                removed: 0,
                fail_mount: false,
                fail_add: false,
                fail_schedule: false,
                queue: Vec::new(),
                seq: 0,
                rng: 0x2545_F491,
            }
        }

        pub fn pending(&self) -> usize {
            self.queue.len()
        }

        /// Pops the earliest timer due strictly before `until`, advancing the clock to it.
        pub fn pop_before(&mut self, until: f64) -> Option<Timer> {
            let (idx, _) = self
                .queue
                .iter()
                .enumerate()
                .filter(|(_, (due, _, _))| *due < until)
                .min_by(|(_, a), (_, b)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))?;
            let (due, _, timer) = self.queue.remove(idx);
            self.now = due;
            Some(timer)
        }
    }

    impl Stage for ManualStage {
        fn now(&self) -> f64 {
            self.now
        }

        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn random(&mut self) -> f64 {
            self.rng = self.rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (self.rng >> 8) as f64 / (1u32 << 24) as f64
        }

        fn mount_overlay(&mut self, _settings: &SnowSettings) -> Result<(), SnowError> {
            assert!(!self.overlay_mounted, "overlay mounted twice");
            if self.fail_mount {
                return Err(SnowError::Dom("document has no body".into()));
            }
            self.overlay_mounted = true;
            self.overlay_mounts += 1;
            Ok(())
        }

        fn unmount_overlay(&mut self) {
            self.overlay_mounted = false;
            self.nodes.clear();
        }

        fn add_flake(&mut self, flake: &Flake, _settings: &SnowSettings) -> Result<(), SnowError> {
            if self.fail_add || !self.overlay_mounted {
                return Err(SnowError::Dom("no overlay".into()));
            }
            self.added += 1;
            self.nodes.insert(flake.id, flake.clone());
            Ok(())
        }

        fn remove_flake(&mut self, id: FlakeId) {
            if self.nodes.remove(&id).is_some() {
                self.removed += 1;
            }
        }

        fn schedule(&mut self, delay_ms: u32, timer: Timer) -> Result<(), SnowError> {
            if self.fail_schedule {
                return Err(SnowError::Dom("setTimeout rejected".into()));
            }
            self.seq += 1;
            self.queue.push((self.now + delay_ms as f64, self.seq, timer));
            Ok(())
        }
    }
}
