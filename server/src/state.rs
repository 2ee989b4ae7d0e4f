use crate::config::ServerConfig;
use crate::history::History;
use crate::options::{OptionError, OptionSet, Preset};
use crate::planner::{self, SpinTrajectory};
use crate::scheduler::FairnessScheduler;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::Instant;
use wheel_shared::angle::{locate, normalize};
use wheel_shared::config::WheelSettings;
use wheel_shared::document::{parse_document, DocumentError, WheelDocument};
use wheel_shared::protocol::WheelSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Options(#[from] OptionError),
}

/// The spin currently being animated
#[derive(Debug, Clone)]
struct ActiveSpin {
    trajectory: SpinTrajectory,
    winner: usize,
    started_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub winner_index: usize,
    pub winner: String,
    /// Resting rotation, normalized to `[0, 2π)`
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinEvent {
    /// Animation still running; render at this rotation
    Frame { rotation: f64 },
    /// Animation finished; render once more at `outcome.rotation`
    Finished(SpinOutcome),
}

/// Central wheel state owned by the spin loop task.
pub struct WheelState {
    pub settings: WheelSettings,
    options: OptionSet,
    pub history: History,
    rotation: f64,
    scheduler: FairnessScheduler,
    active: Option<ActiveSpin>,
    rng: ChaCha20Rng,
}

impl WheelState {
    pub fn new(rng: ChaCha20Rng) -> Self {
        Self {
            settings: WheelSettings::default(),
            options: OptionSet::new(),
            history: History::new(),
            rotation: 0.0,
            scheduler: FairnessScheduler::new(),
            active: None,
            rng,
        }
    }

    /// Seeded from OS entropy unless the config pins a seed.
    pub fn from_config(config: &ServerConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self::new(rng)
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_spinning(&self) -> bool {
        self.active.is_some()
    }

    pub fn scheduler(&self) -> &FairnessScheduler {
        &self.scheduler
    }

    /// Swap in a new option list. Indices no longer mean the same labels,
    /// so fairness starts over.
    fn replace_options(&mut self, options: OptionSet) {
        self.options = options;
        self.reset_fairness();
    }

    pub fn reset_fairness(&mut self) {
        self.scheduler.reset();
    }

    /// Changes that reindex the wheel wait until the spin has landed.
    fn ensure_idle(&self) -> Result<(), OptionError> {
        if self.is_spinning() {
            return Err(OptionError::Spinning);
        }
        Ok(())
    }

    pub fn add_item(&mut self, text: &str) -> Result<(), OptionError> {
        self.ensure_idle()?;
        let options = self.options.with_added(text)?;
        self.replace_options(options);
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<(), OptionError> {
        self.ensure_idle()?;
        let options = self.options.without(index)?;
        self.replace_options(options);
        Ok(())
    }

    /// Rename in place. Indices are unchanged, so the shuffle bag is kept and
    /// a running spin is unaffected.
    pub fn edit_item(&mut self, index: usize, text: &str) -> Result<(), OptionError> {
        self.options = self.options.with_edited(index, text)?;
        Ok(())
    }

    pub fn clear_items(&mut self) -> Result<(), OptionError> {
        self.ensure_idle()?;
        self.replace_options(OptionSet::new());
        Ok(())
    }

    pub fn load_preset(&mut self, preset: Preset) -> Result<(), OptionError> {
        self.ensure_idle()?;
        self.replace_options(OptionSet::from_preset(preset));
        Ok(())
    }

    pub fn set_wheel_size(&mut self, size: u32) -> Result<(), String> {
        let settings = WheelSettings {
            wheel_size: size,
            ..self.settings
        };
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Takes effect from the next spin; a spin in flight keeps its duration.
    pub fn set_spin_duration(&mut self, ms: u32) -> Result<(), String> {
        let settings = WheelSettings {
            spin_duration: ms,
            ..self.settings
        };
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.settings.dark_mode = !self.settings.dark_mode;
        self.settings.dark_mode
    }

    /// Restore items, history and settings from the persisted document.
    pub fn apply_document(&mut self, document: WheelDocument) -> Result<(), OptionError> {
        let options = OptionSet::from_labels(&document.items)?;
        self.replace_options(options);
        self.history = History::from_entries(document.history);
        self.settings = document.settings;
        Ok(())
    }

    /// Apply an imported file. All or nothing: on error nothing changes.
    /// History is left alone; returns the fields that took defaults.
    pub fn import_document(&mut self, text: &str) -> Result<Vec<&'static str>, ImportError> {
        self.ensure_idle()?;
        let parsed = parse_document(text)?;
        let options = OptionSet::from_labels(&parsed.document.items)?;
        self.replace_options(options);
        self.settings = parsed.document.settings;
        Ok(parsed.defaulted)
    }

    /// Put the wheel back at a previously saved resting rotation. Ignored
    /// while a spin is running or for a non-finite angle.
    pub fn restore_rotation(&mut self, rotation: f64) -> bool {
        if self.is_spinning() || !rotation.is_finite() {
            return false;
        }
        self.rotation = normalize(rotation);
        true
    }

    /// Sector currently under the pointer
    pub fn pointer_index(&self) -> Option<usize> {
        locate(self.rotation, self.options.len())
    }

    /// Start a spin. A no-op (None) with fewer than two options or while a
    /// spin is already running.
    pub fn request_spin(&mut self, now: Instant) -> Option<SpinTrajectory> {
        if self.active.is_some() || self.options.len() < 2 {
            return None;
        }
        let count = self.options.len();
        let winner = self.scheduler.next(count, &mut self.rng)?;
        let trajectory = planner::plan(
            winner,
            self.rotation,
            count,
            self.settings.spin_duration(),
            &mut self.rng,
        )?;

        tracing::debug!(
            "Spin planned: winner {} of {}, {:.2} rad over {:?}",
            winner,
            count,
            trajectory.total_delta,
            trajectory.duration
        );

        self.active = Some(ActiveSpin {
            trajectory: trajectory.clone(),
            winner,
            started_at: now,
        });
        Some(trajectory)
    }

    /// Advance the running spin to wall-clock time `now`.
    pub fn tick(&mut self, now: Instant) -> Option<SpinEvent> {
        let active = self.active.as_ref()?;
        let elapsed = now.saturating_duration_since(active.started_at);

        if !active.trajectory.is_complete(elapsed) {
            self.rotation = active.trajectory.sample(elapsed);
            return Some(SpinEvent::Frame {
                rotation: self.rotation,
            });
        }

        let active = self.active.take()?;
        Some(SpinEvent::Finished(self.finish(active)))
    }

    fn finish(&mut self, active: ActiveSpin) -> SpinOutcome {
        self.rotation = normalize(active.trajectory.final_angle());

        // reindexing is refused while spinning, so the count is the planned one
        let count = self.options.len();
        let landed = locate(self.rotation, count);
        if landed != Some(active.winner) {
            tracing::error!(
                "Wheel landed on {:?} but winner was {} (rotation {}, {} options)",
                landed,
                active.winner,
                self.rotation,
                count
            );
        }

        let winner = self
            .options
            .get(active.winner)
            .unwrap_or_default()
            .to_string();
        self.history.record(&winner);

        SpinOutcome {
            winner_index: active.winner,
            winner,
            rotation: self.rotation,
        }
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            items: self.options.labels().to_vec(),
            history: self.history.to_vec(),
            settings: self.settings,
            rotation: self.rotation,
            spinning: self.is_spinning(),
        }
    }

    /// Full persisted document
    pub fn document(&self) -> WheelDocument {
        WheelDocument {
            items: self.options.labels().to_vec(),
            history: self.history.to_vec(),
            settings: self.settings,
        }
    }

    /// Export file: items and settings only
    pub fn export_document(&self) -> WheelDocument {
        WheelDocument {
            history: Vec::new(),
            ..self.document()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn test_state() -> WheelState {
        WheelState::new(ChaCha20Rng::seed_from_u64(12345))
    }

    /// Run a spin to completion with a 60 Hz clock.
    fn spin_to_end(state: &mut WheelState, start: Instant) -> Option<SpinOutcome> {
        let trajectory = state.request_spin(start)?;
        let mut now = start;
        loop {
            now += Duration::from_millis(16);
            match state.tick(now) {
                Some(SpinEvent::Frame { .. }) => {}
                Some(SpinEvent::Finished(outcome)) => return Some(outcome),
                None => panic!("spin vanished after {:?}", trajectory.duration),
            }
        }
    }

    #[test]
    fn spin_needs_two_options() {
        let mut state = test_state();
        assert!(state.request_spin(Instant::now()).is_none());
        state.add_item("Only").unwrap();
        assert!(state.request_spin(Instant::now()).is_none());
        assert!(!state.is_spinning());
        assert!(state.scheduler().is_fresh());
    }

    #[test]
    fn second_spin_rejected_while_active() {
        let mut state = test_state();
        state.load_preset(Preset::Colors).unwrap();
        let t0 = Instant::now();
        assert!(state.request_spin(t0).is_some());
        assert!(state.is_spinning());
        assert!(state.request_spin(t0).is_none());
        // only one winner was drawn
        assert_eq!(state.scheduler().remaining_count(), 5);
    }

    #[test]
    fn finished_spin_lands_on_winner() {
        let mut state = test_state();
        state.load_preset(Preset::Food).unwrap();
        let mut t = Instant::now();
        for _ in 0..30 {
            let outcome = spin_to_end(&mut state, t).unwrap();
            assert_eq!(locate(outcome.rotation, 6), Some(outcome.winner_index));
            assert_eq!(state.pointer_index(), Some(outcome.winner_index));
            assert_eq!(
                state.options().get(outcome.winner_index),
                Some(outcome.winner.as_str())
            );
            assert!(!state.is_spinning());
            t += Duration::from_secs(10);
        }
    }

    #[test]
    fn full_cycle_of_spins_covers_every_option() {
        let mut state = test_state();
        state.load_preset(Preset::Numbers).unwrap();
        let t = Instant::now();
        let winners: HashSet<usize> = (0..10)
            .map(|_| spin_to_end(&mut state, t).unwrap().winner_index)
            .collect();
        assert_eq!(winners.len(), 10);
    }

    #[test]
    fn paused_ticks_resume_by_elapsed_time() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        let t0 = Instant::now();
        let trajectory = state.request_spin(t0).unwrap();

        // one frame, then nothing for most of the duration
        state.tick(t0 + Duration::from_millis(16));
        let resumed = state.tick(t0 + Duration::from_millis(3000)).unwrap();
        match resumed {
            SpinEvent::Frame { rotation } => {
                let expected = trajectory.sample(Duration::from_millis(3000));
                assert!((rotation - expected).abs() < 1e-9);
            }
            other => panic!("Expected Frame, got {:?}", other),
        }

        // a single late tick finishes the spin
        assert!(matches!(
            state.tick(t0 + Duration::from_secs(60)),
            Some(SpinEvent::Finished(_))
        ));
        assert!(state.tick(t0 + Duration::from_secs(61)).is_none());
    }

    #[test]
    fn history_records_winners_and_survives_edits() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        let t = Instant::now();
        let outcome = spin_to_end(&mut state, t).unwrap();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.latest().unwrap().item, outcome.winner);

        state.clear_items().unwrap();
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn mutations_reset_fairness_but_edit_does_not() {
        let mut state = test_state();
        state.load_preset(Preset::Colors).unwrap();
        let t = Instant::now();
        spin_to_end(&mut state, t).unwrap();
        assert_eq!(state.scheduler().remaining_count(), 5);

        state.edit_item(0, "Crimson").unwrap();
        assert_eq!(state.scheduler().remaining_count(), 5);
        assert!(!state.scheduler().is_fresh());

        state.add_item("Pink").unwrap();
        assert!(state.scheduler().is_fresh());

        spin_to_end(&mut state, t).unwrap();
        state.remove_item(0).unwrap();
        assert!(state.scheduler().is_fresh());

        spin_to_end(&mut state, t).unwrap();
        state.load_preset(Preset::Food).unwrap();
        assert!(state.scheduler().is_fresh());

        spin_to_end(&mut state, t).unwrap();
        state.clear_items().unwrap();
        assert!(state.scheduler().is_fresh());
    }

    #[test]
    fn rejected_mutations_leave_state_alone() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        spin_to_end(&mut state, Instant::now()).unwrap();

        assert_eq!(state.add_item("Yes"), Err(OptionError::Duplicate("Yes".into())));
        assert_eq!(state.add_item(" "), Err(OptionError::Empty));
        assert_eq!(state.remove_item(9), Err(OptionError::OutOfRange(9)));
        assert_eq!(state.options().len(), 2);
        assert!(!state.scheduler().is_fresh());
    }

    #[test]
    fn reindexing_changes_rejected_while_spinning() {
        for seed in 0..50 {
            let mut state = WheelState::new(ChaCha20Rng::seed_from_u64(seed));
            state.load_preset(Preset::Food).unwrap();
            let t0 = Instant::now();
            state.request_spin(t0).unwrap();

            assert_eq!(state.add_item("Ramen"), Err(OptionError::Spinning));
            assert_eq!(state.remove_item(0), Err(OptionError::Spinning));
            assert_eq!(state.clear_items(), Err(OptionError::Spinning));
            assert_eq!(state.load_preset(Preset::YesNo), Err(OptionError::Spinning));
            assert!(matches!(
                state.import_document(r#"{"items": ["A", "B"]}"#),
                Err(ImportError::Options(OptionError::Spinning))
            ));
            assert!(!state.restore_rotation(1.0));
            assert_eq!(state.options().len(), 6);

            let outcome = match state.tick(t0 + Duration::from_secs(5)) {
                Some(SpinEvent::Finished(outcome)) => outcome,
                other => panic!("Expected Finished, got {:?}", other),
            };
            let under_pointer = locate(outcome.rotation, state.options().len())
                .and_then(|i| state.options().get(i));
            assert_eq!(under_pointer, Some(outcome.winner.as_str()));

            // once landed, the wheel is editable again
            state.add_item("Ramen").unwrap();
        }
    }

    #[test]
    fn rename_during_spin_announces_new_label() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        let t0 = Instant::now();
        state.request_spin(t0).unwrap();
        state.edit_item(0, "Sure").unwrap();
        state.edit_item(1, "Nope").unwrap();
        match state.tick(t0 + Duration::from_secs(5)) {
            Some(SpinEvent::Finished(outcome)) => {
                assert!(outcome.winner == "Sure" || outcome.winner == "Nope");
                assert_eq!(
                    state.options().get(outcome.winner_index),
                    Some(outcome.winner.as_str())
                );
            }
            other => panic!("Expected Finished, got {:?}", other),
        }
    }

    #[test]
    fn duration_change_applies_to_next_spin() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        let t0 = Instant::now();
        let first = state.request_spin(t0).unwrap();
        state.set_spin_duration(1000).unwrap();
        assert_eq!(first.duration, Duration::from_millis(4000));
        assert!(matches!(
            state.tick(t0 + Duration::from_millis(1500)),
            Some(SpinEvent::Frame { .. })
        ));
        state.tick(t0 + Duration::from_millis(4000));
        let second = state.request_spin(t0).unwrap();
        assert_eq!(second.duration, Duration::from_millis(1000));
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut state = test_state();
        assert!(state.set_spin_duration(0).is_err());
        assert!(state.set_wheel_size(0).is_err());
        assert_eq!(state.settings, WheelSettings::default());
        state.set_wheel_size(600).unwrap();
        assert_eq!(state.settings.wheel_size, 600);
        assert!(state.toggle_dark_mode());
        assert!(!state.toggle_dark_mode());
    }

    #[test]
    fn import_applies_items_and_settings_keeps_history() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        spin_to_end(&mut state, Instant::now()).unwrap();

        let defaulted = state
            .import_document(r#"{"items": ["A", "B", "C"], "settings": {"spinDuration": 2000}}"#)
            .unwrap();
        assert!(defaulted.contains(&"settings.wheelSize"));
        assert_eq!(state.options().len(), 3);
        assert_eq!(state.settings.spin_duration, 2000);
        assert_eq!(state.settings.wheel_size, 400);
        assert_eq!(state.history.len(), 1);
        assert!(state.scheduler().is_fresh());
    }

    #[test]
    fn invalid_import_changes_nothing() {
        let mut state = test_state();
        state.load_preset(Preset::Colors).unwrap();
        state.set_wheel_size(500).unwrap();
        spin_to_end(&mut state, Instant::now()).unwrap();

        for text in ["not json", r#"{"items": ["A", "A"]}"#, r#"{"settings": {"wheelSize": -1}}"#] {
            assert!(state.import_document(text).is_err());
        }
        assert_eq!(state.options().len(), 6);
        assert_eq!(state.settings.wheel_size, 500);
        assert!(!state.scheduler().is_fresh());
    }

    #[test]
    fn document_roundtrip_through_apply() {
        let mut state = test_state();
        state.load_preset(Preset::Food).unwrap();
        state.toggle_dark_mode();
        spin_to_end(&mut state, Instant::now()).unwrap();

        let doc = state.document();
        assert_eq!(doc.history.len(), 1);
        assert!(state.export_document().history.is_empty());

        let mut restored = test_state();
        restored.apply_document(doc.clone()).unwrap();
        assert_eq!(restored.document(), doc);
        assert!(restored.settings.dark_mode);
    }

    #[test]
    fn restore_rotation_reports_pointer_sector() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        // 3π/2 - π/2 = π puts the center of sector 0 under the pointer
        assert!(state.restore_rotation(std::f64::consts::PI));
        assert_eq!(state.pointer_index(), Some(0));
        assert!(state.restore_rotation(-std::f64::consts::TAU));
        assert_eq!(state.rotation(), 0.0);
        assert_eq!(state.pointer_index(), Some(1));
        assert!(!state.restore_rotation(f64::NAN));
        assert_eq!(state.rotation(), 0.0);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut state = test_state();
        state.load_preset(Preset::YesNo).unwrap();
        let t0 = Instant::now();
        state.request_spin(t0).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.items, vec!["Yes", "No"]);
        assert!(snap.spinning);
    }
}
