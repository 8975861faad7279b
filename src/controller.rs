//! Session controller
//!
//! Owns the live session, the storage backend and the restore token. Every
//! placement runs mutate -> recompute -> persist, once each and in that order.
//! Persistence is best effort: a failed write is logged and play continues.

use crate::persistence::{RestoreTask, Snapshot, Storage, SurfaceWait, reconstruct};
use crate::platform::CancelToken;
use crate::settings::Settings;
use crate::sim::{PhysicsState, PlacedObject, SessionState, Side, compute_state_with};
use crate::weights::{WeightDealer, WeightVisual};
use crate::click_to_offset;

/// What a single drop did
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub object: PlacedObject,
    pub side: Side,
    /// Where the ball sits on the plank (px from its left edge)
    pub click_x: f32,
    /// Physics after the drop
    pub state: PhysicsState,
    /// Click positions of stored objects this drop laid out first, in order.
    /// Empty unless a restore was still pending.
    pub relaid: Vec<f32>,
}

/// How a restore ended
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Objects were placed; one click position per object, in order
    Restored {
        positions: Vec<f32>,
        state: PhysicsState,
    },
    /// The plank never got a width; objects stay pending until the next drop
    Skipped { attempts: u32 },
    /// A reset happened first
    Cancelled,
}

/// The seesaw session
pub struct Seesaw<S: Storage> {
    storage: S,
    settings: Settings,
    session: SessionState,
    dealer: WeightDealer,
    readout: PhysicsState,
    /// Stored objects still waiting to be laid out
    restore_pending: bool,
    /// Token of the restore in flight, if any
    restore_token: Option<CancelToken>,
}

impl<S: Storage> Seesaw<S> {
    /// Start a session, picking up whatever snapshot `storage` holds
    pub fn new(storage: S, settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut dealer = WeightDealer::new(seed);

        let session = match Snapshot::load(&storage) {
            Some(snapshot) => snapshot.into_session(&settings.physics, &mut dealer),
            None => SessionState::new(dealer.deal()),
        };

        // Show the saved tilt straight away; loads follow once objects are laid out
        let readout = PhysicsState {
            angle: session.last_angle,
            ..Default::default()
        };
        let restore_pending = !session.is_empty();

        Self {
            storage,
            settings,
            session,
            dealer,
            readout,
            restore_pending,
            restore_token: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Loads and tilt to display
    pub fn readout(&self) -> PhysicsState {
        self.readout
    }

    /// The ball waiting to be dropped
    pub fn preview(&self) -> WeightVisual {
        WeightVisual::of(self.session.queued_weight)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.session)
    }

    pub fn has_pending_restore(&self) -> bool {
        self.restore_pending
    }

    /// Drop the queued weight at `x` px from the plank's left edge.
    ///
    /// Stored objects still waiting for a restore are laid out against
    /// `plank_width` first, so the new physics covers exactly what is drawn.
    pub fn place(&mut self, x: f32, plank_width: f32) -> Placement {
        let relaid = if self.restore_pending && plank_width.is_finite() && plank_width > 0.0 {
            self.lay_out_pending(plank_width)
        } else {
            Vec::new()
        };

        let (click_x, offset) = click_to_offset(x, plank_width);
        let object = PlacedObject::new(self.session.queued_weight, offset);
        let side = object.side(self.settings.physics.center_threshold);

        self.session.objects.push(object);
        self.session.queued_weight = self.dealer.deal();
        let state = self.recompute();
        self.persist();

        log::info!(
            "{}kg dropped on {} side at {:.0}px from center",
            object.weight,
            side.as_str(),
            object.distance()
        );

        Placement {
            object,
            side,
            click_x,
            state,
            relaid,
        }
    }

    /// Clear the plank and forget the stored session
    pub fn reset(&mut self) {
        if let Some(token) = self.restore_token.take() {
            token.cancel();
        }
        self.restore_pending = false;
        self.session = SessionState::new(self.dealer.deal());
        self.readout = PhysicsState::default();

        if let Err(e) = Snapshot::clear(&self.storage) {
            log::warn!("Could not clear stored session: {}", e);
        }
        log::info!("Seesaw reset");
    }

    /// Start laying out restored objects. `None` if there is nothing to restore.
    ///
    /// Starting again supersedes any restore already in flight.
    pub fn begin_restore(&mut self) -> Option<RestoreTask> {
        if !self.restore_pending {
            return None;
        }
        if let Some(old) = self.restore_token.take() {
            old.cancel();
        }
        let token = CancelToken::new();
        self.restore_token = Some(token.clone());
        Some(RestoreTask::new(self.settings.restore, token))
    }

    /// Apply the result of waiting for the surface
    pub fn complete_restore(&mut self, task: &RestoreTask, wait: SurfaceWait) -> RestoreOutcome {
        let current = self
            .restore_token
            .as_ref()
            .is_some_and(|t| t.same(task.token()));
        if !current || task.is_cancelled() {
            log::debug!("Restore cancelled");
            return RestoreOutcome::Cancelled;
        }

        match wait {
            SurfaceWait::Cancelled => RestoreOutcome::Cancelled,
            SurfaceWait::Exhausted { attempts } => {
                // Still pending: the next drop has a real width and lays them out
                self.restore_token = None;
                log::warn!(
                    "Plank never reported a width after {} attempts, restore deferred to next drop",
                    attempts
                );
                RestoreOutcome::Skipped { attempts }
            }
            SurfaceWait::Ready { width } => {
                let positions = self.lay_out_pending(width);
                let state = self.recompute();
                self.persist();
                log::info!("Restored {} objects at width {:.0}px", positions.len(), width);
                RestoreOutcome::Restored { positions, state }
            }
        }
    }

    /// Pull the stored objects onto a plank of `width`, ending any restore in flight
    fn lay_out_pending(&mut self, width: f32) -> Vec<f32> {
        if let Some(token) = self.restore_token.take() {
            token.cancel();
        }
        self.restore_pending = false;
        reconstruct(&mut self.session.objects, width)
    }

    fn recompute(&mut self) -> PhysicsState {
        let state = compute_state_with(&self.session.objects, &self.settings.physics);
        self.session.last_angle = state.angle;
        self.readout = state;
        state
    }

    fn persist(&self) {
        if let Err(e) = self.snapshot().save(&self.storage) {
            log::warn!("Session not saved: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStorage, RestoreStep, STORAGE_KEY};
    use crate::weights::is_valid_weight;

    const SCENARIO: &str = r#"{"queuedWeight":3,"lastAngle":-16.0,
        "objects":[{"weight":6,"offset":-40.0},{"weight":4,"offset":20.0}]}"#;

    fn stored(json: &str) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, json).unwrap();
        storage
    }

    fn measure(task: &mut RestoreTask, width: f32) -> SurfaceWait {
        match task.step(width) {
            RestoreStep::Done(wait) => wait,
            RestoreStep::Retry { .. } => panic!("expected a final answer"),
        }
    }

    fn restore_at(seesaw: &mut Seesaw<MemoryStorage>, width: f32) -> RestoreOutcome {
        let mut task = seesaw.begin_restore().expect("restore pending");
        let wait = measure(&mut task, width);
        seesaw.complete_restore(&task, wait)
    }

    #[test]
    fn test_fresh_session() {
        let mut seesaw = Seesaw::new(MemoryStorage::new(), Settings::default(), 1);
        assert!(seesaw.session().is_empty());
        assert!(is_valid_weight(seesaw.session().queued_weight));
        assert_eq!(seesaw.readout(), PhysicsState::default());
        assert!(!seesaw.has_pending_restore());
        assert!(seesaw.begin_restore().is_none());
    }

    #[test]
    fn test_place_recomputes_and_persists() {
        let mut seesaw = Seesaw::new(stored(r#"{"queuedWeight":6,"objects":[]}"#), Settings::default(), 1);

        let placement = seesaw.place(160.0, 400.0);
        assert_eq!(placement.object, PlacedObject::new(6, -40.0));
        assert_eq!(placement.side, Side::Left);
        assert_eq!(placement.click_x, 160.0);
        assert_eq!(placement.state.angle, -24.0);
        assert_eq!(seesaw.readout(), placement.state);
        assert_eq!(seesaw.session().last_angle, -24.0);

        let saved = Snapshot::load(seesaw.storage()).unwrap();
        assert_eq!(saved.objects, vec![PlacedObject::new(6, -40.0)]);
        assert_eq!(saved.last_angle, Some(-24.0));
        // The persisted queued weight is the one for the next drop
        assert_eq!(saved.queued_weight, Some(seesaw.session().queued_weight));
    }

    #[test]
    fn test_out_of_range_click_is_clamped() {
        let mut seesaw = Seesaw::new(MemoryStorage::new(), Settings::default(), 4);
        let placement = seesaw.place(-75.0, 300.0);
        assert_eq!(placement.click_x, 0.0);
        assert_eq!(placement.object.offset, -150.0);

        let placement = seesaw.place(1e6, 300.0);
        assert_eq!(placement.click_x, 300.0);
        assert_eq!(placement.object.offset, 150.0);
    }

    #[test]
    fn test_restore_scenario() {
        let mut seesaw = Seesaw::new(stored(SCENARIO), Settings::default(), 1);
        assert_eq!(seesaw.session().queued_weight, 3);
        assert!(seesaw.has_pending_restore());
        // Saved tilt shows before the objects are laid out
        assert_eq!(seesaw.readout().angle, -16.0);
        assert_eq!(seesaw.readout().left_load, 0.0);

        let RestoreOutcome::Restored { positions, state } = restore_at(&mut seesaw, 400.0) else {
            panic!("restore should succeed");
        };
        assert_eq!(positions, vec![160.0, 220.0]);
        assert_eq!(state.angle, -16.0);
        assert_eq!(state.left_load, 6.0);
        assert_eq!(state.right_load, 4.0);
        assert_eq!(seesaw.readout(), state);
        assert!(!seesaw.has_pending_restore());
    }

    #[test]
    fn test_reload_round_trip() {
        let mut seesaw = Seesaw::new(MemoryStorage::new(), Settings::default(), 11);
        for x in [12.0, 88.5, 199.0, 203.0, 340.25, 400.0] {
            seesaw.place(x, 400.0);
        }
        let before = seesaw.readout();
        let objects = seesaw.session().objects.clone();

        let mut reloaded = Seesaw::new(seesaw.into_storage(), Settings::default(), 12);
        let RestoreOutcome::Restored { state, .. } = restore_at(&mut reloaded, 400.0) else {
            panic!("restore should succeed");
        };

        assert_eq!(reloaded.session().objects, objects);
        assert_eq!(state.left_load, before.left_load);
        assert_eq!(state.right_load, before.right_load);
        assert!((state.angle - before.angle).abs() < 1e-4);
    }

    #[test]
    fn test_reload_on_narrower_plank() {
        let mut seesaw = Seesaw::new(MemoryStorage::new(), Settings::default(), 5);
        for x in [0.0, 30.0, 390.0, 800.0] {
            seesaw.place(x, 800.0);
        }

        let mut reloaded = Seesaw::new(seesaw.into_storage(), Settings::default(), 6);
        let RestoreOutcome::Restored { positions, .. } = restore_at(&mut reloaded, 200.0) else {
            panic!("restore should succeed");
        };
        assert_eq!(positions.len(), 4);
        assert!(positions.iter().all(|x| (0.0..=200.0).contains(x)));
        assert!(reloaded.session().objects.iter().all(|o| o.offset.abs() <= 100.0));

        // The clamped layout is what gets stored now
        let saved = Snapshot::load(reloaded.storage()).unwrap();
        assert_eq!(saved.objects, reloaded.session().objects);
    }

    #[test]
    fn test_reset_cancels_restore_in_flight() {
        let mut seesaw = Seesaw::new(stored(SCENARIO), Settings::default(), 1);
        let mut task = seesaw.begin_restore().unwrap();
        assert!(matches!(task.step(0.0), RestoreStep::Retry { .. }));

        seesaw.reset();
        assert!(task.is_cancelled());
        assert_eq!(measure(&mut task, 400.0), SurfaceWait::Cancelled);
        assert_eq!(
            seesaw.complete_restore(&task, SurfaceWait::Ready { width: 400.0 }),
            RestoreOutcome::Cancelled
        );
        assert!(seesaw.session().is_empty());
        assert!(!seesaw.storage().contains(STORAGE_KEY));
    }

    #[test]
    fn test_reset_twice() {
        let mut seesaw = Seesaw::new(stored(SCENARIO), Settings::default(), 1);
        restore_at(&mut seesaw, 400.0);

        seesaw.reset();
        let first = seesaw.snapshot();
        assert!(!seesaw.storage().contains(STORAGE_KEY));

        seesaw.reset();
        let second = seesaw.snapshot();
        assert!(!seesaw.storage().contains(STORAGE_KEY));

        assert!(first.objects.is_empty() && second.objects.is_empty());
        assert_eq!(first.last_angle, Some(0.0));
        assert_eq!(second.last_angle, Some(0.0));
        assert_eq!(seesaw.readout(), PhysicsState::default());
    }

    #[test]
    fn test_malformed_snapshot_starts_fresh() {
        let storage = stored(r#"{"queuedWeight":3,"lastAngle":12,"objects":"nope"}"#);
        let seesaw = Seesaw::new(storage, Settings::default(), 1);
        assert!(seesaw.session().is_empty());
        assert_eq!(seesaw.session().last_angle, 0.0);
        assert!(!seesaw.has_pending_restore());
    }

    #[test]
    fn test_full_storage_does_not_interrupt_play() {
        let storage = stored(SCENARIO);
        storage.set_full(true);
        let mut seesaw = Seesaw::new(storage, Settings::default(), 1);
        restore_at(&mut seesaw, 400.0);

        let placement = seesaw.place(390.0, 400.0);
        assert_eq!(seesaw.session().objects.len(), 3);
        assert_eq!(seesaw.readout(), placement.state);

        // Still the snapshot from before the writes started failing
        let saved = Snapshot::load(seesaw.storage()).unwrap();
        assert_eq!(saved.objects.len(), 2);
    }

    fn skip_restore(seesaw: &mut Seesaw<MemoryStorage>) -> RestoreOutcome {
        let mut task = seesaw.begin_restore().unwrap();
        let wait = loop {
            match task.step(0.0) {
                RestoreStep::Retry { .. } => continue,
                RestoreStep::Done(wait) => break wait,
            }
        };
        seesaw.complete_restore(&task, wait)
    }

    #[test]
    fn test_restore_skipped_when_plank_never_lays_out() {
        let mut settings = Settings::default();
        settings.restore.max_attempts = 3;
        let mut seesaw = Seesaw::new(stored(SCENARIO), settings, 1);

        assert_eq!(skip_restore(&mut seesaw), RestoreOutcome::Skipped { attempts: 3 });

        // Nothing is lost: the objects stay stored and still wait for a layout
        assert_eq!(seesaw.session().objects.len(), 2);
        assert!(seesaw.storage().contains(STORAGE_KEY));
        assert!(seesaw.has_pending_restore());
        assert_eq!(seesaw.readout().left_load, 0.0);
        assert_eq!(seesaw.readout().right_load, 0.0);
    }

    #[test]
    fn test_drop_after_skipped_restore_lays_out_stored_objects() {
        let mut settings = Settings::default();
        settings.restore.max_attempts = 2;
        let mut seesaw = Seesaw::new(stored(SCENARIO), settings, 1);
        assert_eq!(skip_restore(&mut seesaw), RestoreOutcome::Skipped { attempts: 2 });

        // 100px plank: -40 and 20 both fit, the new 3kg ball lands on the pivot
        let placement = seesaw.place(50.0, 100.0);
        assert!(!seesaw.has_pending_restore());
        assert_eq!(placement.relaid, vec![10.0, 70.0]);
        assert_eq!(placement.object, PlacedObject::new(3, 0.0));
        assert_eq!(placement.state.left_load, 7.5);
        assert_eq!(placement.state.right_load, 5.5);
        assert_eq!(placement.state.left_torque, 240.0);
        assert_eq!(placement.state.angle, -16.0);
        assert_eq!(seesaw.readout(), placement.state);

        // Only the first drop lays anything out
        let next = seesaw.place(50.0, 100.0);
        assert!(next.relaid.is_empty());
    }

    #[test]
    fn test_drop_after_skipped_restore_clamps_to_plank() {
        let mut settings = Settings::default();
        settings.restore.max_attempts = 2;
        let mut seesaw = Seesaw::new(stored(SCENARIO), settings, 1);
        skip_restore(&mut seesaw);

        // 60px plank: the ball stored at -40 no longer fits and is pulled to the edge
        let placement = seesaw.place(30.0, 60.0);
        assert_eq!(placement.relaid, vec![0.0, 50.0]);
        assert_eq!(seesaw.session().objects[0], PlacedObject::new(6, -30.0));
        assert_eq!(placement.state.left_torque, 180.0);
        assert_eq!(placement.state.right_torque, 80.0);

        let saved = Snapshot::load(seesaw.storage()).unwrap();
        assert_eq!(saved.objects[0].offset, -30.0);
    }

    #[test]
    fn test_zero_width_drop_keeps_restore_pending() {
        let mut settings = Settings::default();
        settings.restore.max_attempts = 2;
        let mut seesaw = Seesaw::new(stored(SCENARIO), settings, 1);
        skip_restore(&mut seesaw);

        let placement = seesaw.place(0.0, 0.0);
        assert!(placement.relaid.is_empty());
        assert!(seesaw.has_pending_restore());
    }

    #[test]
    fn test_superseded_restore_is_ignored() {
        let mut seesaw = Seesaw::new(stored(SCENARIO), Settings::default(), 1);
        let stale = seesaw.begin_restore().unwrap();
        let fresh = seesaw.begin_restore().unwrap();
        assert!(stale.is_cancelled());

        assert_eq!(
            seesaw.complete_restore(&stale, SurfaceWait::Ready { width: 400.0 }),
            RestoreOutcome::Cancelled
        );
        assert!(matches!(
            seesaw.complete_restore(&fresh, SurfaceWait::Ready { width: 400.0 }),
            RestoreOutcome::Restored { .. }
        ));
    }

    #[test]
    fn test_drop_while_restore_pending() {
        let mut seesaw = Seesaw::new(stored(SCENARIO), Settings::default(), 1);
        let mut task = seesaw.begin_restore().unwrap();

        let placement = seesaw.place(200.0, 400.0);
        assert_eq!(placement.object, PlacedObject::new(3, 0.0));
        assert_eq!(placement.side, Side::Center);
        assert_eq!(placement.relaid, vec![160.0, 220.0]);
        assert_eq!(placement.state.left_load, 7.5);
        assert_eq!(placement.state.right_load, 5.5);
        assert_eq!(Snapshot::load(seesaw.storage()).unwrap().objects.len(), 3);

        // The drop already laid everything out, so the in-flight restore stands down
        assert!(task.is_cancelled());
        let wait = measure(&mut task, 400.0);
        assert_eq!(seesaw.complete_restore(&task, wait), RestoreOutcome::Cancelled);
        assert_eq!(seesaw.session().objects.len(), 3);
    }
}
