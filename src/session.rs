use tracing::debug;

use crate::constants::{
    phase_durations_ms, MOUTH_TOGGLE_MS, PHASE_TABLE, POWER_DURATION_MS, STARTING_LIVES,
};
use crate::types::{BehaviorMode, HudView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    ModeSwitched {
        mode: BehaviorMode,
        phase_index: usize,
    },
    PowerExpired,
    MouthToggled,
}

/// Score, lives, and the behaviour-mode clock of one session. All timers are
/// deadlines on the simulation clock, checked by `advance_timers` once per
/// tick.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub score: u32,
    pub lives: u32,
    pub mode: BehaviorMode,
    pub power_active: bool,
    pub phase_index: usize,
    pub won: bool,
    mode_deadline_ms: u64,
    power_deadline_ms: Option<u64>,
    mouth_deadline_ms: u64,
}

impl SessionState {
    pub fn new(now_ms: u64) -> Self {
        let (scatter_ms, _) = phase_durations_ms(0);
        Self {
            score: 0,
            lives: STARTING_LIVES,
            mode: BehaviorMode::Scatter,
            power_active: false,
            phase_index: 0,
            won: false,
            mode_deadline_ms: now_ms.saturating_add(scatter_ms),
            power_deadline_ms: None,
            mouth_deadline_ms: now_ms.saturating_add(MOUTH_TOGGLE_MS),
        }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Returns false, changing nothing, while a power period is already
    /// running.
    pub fn activate_power(&mut self, now_ms: u64) -> bool {
        if self.power_active {
            return false;
        }
        self.power_active = true;
        self.mode = BehaviorMode::Scatter;
        self.power_deadline_ms = Some(now_ms.saturating_add(POWER_DURATION_MS));
        true
    }

    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn set_won(&mut self) {
        self.won = true;
    }

    pub fn is_pursuit_active(&self) -> bool {
        self.mode == BehaviorMode::Chase && !self.power_active
    }

    pub fn mode_deadline_ms(&self) -> u64 {
        self.mode_deadline_ms
    }

    pub fn power_deadline_ms(&self) -> Option<u64> {
        self.power_deadline_ms
    }

    pub fn advance_timers(&mut self, now_ms: u64) -> Vec<TimerEvent> {
        let mut fired = Vec::new();

        while now_ms >= self.mode_deadline_ms {
            self.skip_whole_cycles(now_ms);
            let duration_ms = self.switch_mode();
            let next_deadline_ms = self.mode_deadline_ms.saturating_add(duration_ms);
            fired.push(TimerEvent::ModeSwitched {
                mode: self.mode,
                phase_index: self.phase_index,
            });
            if next_deadline_ms == self.mode_deadline_ms {
                break;
            }
            self.mode_deadline_ms = next_deadline_ms;
        }

        if let Some(deadline) = self.power_deadline_ms {
            if now_ms >= deadline {
                self.power_active = false;
                self.power_deadline_ms = None;
                fired.push(TimerEvent::PowerExpired);
            }
        }

        if now_ms >= self.mouth_deadline_ms {
            // Only the parity of elapsed periods matters for a toggle.
            let periods = (now_ms - self.mouth_deadline_ms) / MOUTH_TOGGLE_MS + 1;
            self.mouth_deadline_ms = self
                .mouth_deadline_ms
                .saturating_add(periods.saturating_mul(MOUTH_TOGGLE_MS));
            if periods % 2 == 1 {
                fired.push(TimerEvent::MouthToggled);
            }
        }

        fired
    }

    pub fn hud(&self, game_over: bool) -> HudView {
        HudView {
            score: self.score,
            lives: self.lives,
            mode: self.mode,
            power_active: self.power_active,
            phase_index: self.phase_index,
            won: self.won,
            game_over,
        }
    }

    /// Once the last phase repeats forever, a full scatter+chase cycle leaves
    /// the mode where it was, so whole cycles behind `now_ms` are skipped.
    fn skip_whole_cycles(&mut self, now_ms: u64) {
        if self.phase_index < PHASE_TABLE.len() - 1 {
            return;
        }
        let (scatter_ms, chase_ms) = phase_durations_ms(self.phase_index);
        let cycle_ms = scatter_ms + chase_ms;
        let cycles = (now_ms - self.mode_deadline_ms) / cycle_ms;
        self.mode_deadline_ms = self
            .mode_deadline_ms
            .saturating_add(cycles.saturating_mul(cycle_ms));
    }

    fn switch_mode(&mut self) -> u64 {
        let duration_ms = match self.mode {
            BehaviorMode::Chase => {
                self.phase_index = (self.phase_index + 1).min(PHASE_TABLE.len() - 1);
                self.mode = BehaviorMode::Scatter;
                phase_durations_ms(self.phase_index).0
            }
            BehaviorMode::Scatter => {
                self.mode = BehaviorMode::Chase;
                phase_durations_ms(self.phase_index).1
            }
        };
        debug!(
            mode = ?self.mode,
            phase = self.phase_index,
            duration_ms,
            "behaviour mode switched"
        );
        duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_scatter_phase_zero() {
        let session = SessionState::new(0);
        assert_eq!(session.mode, BehaviorMode::Scatter);
        assert_eq!(session.phase_index, 0);
        assert_eq!(session.lives, 3);
        assert_eq!(session.score, 0);
        assert!(!session.power_active);
        assert!(!session.won);
        assert_eq!(session.mode_deadline_ms(), 7_000);
    }

    #[test]
    fn scatter_then_chase_then_scatter_advances_phase() {
        let mut session = SessionState::new(0);
        assert!(!session
            .advance_timers(6_999)
            .iter()
            .any(|e| matches!(e, TimerEvent::ModeSwitched { .. })));
        assert_eq!(session.mode, BehaviorMode::Scatter);

        let fired = session.advance_timers(7_000);
        assert!(fired.contains(&TimerEvent::ModeSwitched {
            mode: BehaviorMode::Chase,
            phase_index: 0
        }));
        assert_eq!(session.mode, BehaviorMode::Chase);
        assert_eq!(session.phase_index, 0);

        session.advance_timers(7_000 + 99_999_000 - 1);
        assert_eq!(session.mode, BehaviorMode::Chase);

        session.advance_timers(7_000 + 99_999_000);
        assert_eq!(session.mode, BehaviorMode::Scatter);
        assert_eq!(session.phase_index, 1);
        assert_eq!(session.mode_deadline_ms(), 7_000 + 99_999_000 + 7_000);
    }

    #[test]
    fn phase_index_clamps_at_last_entry() {
        let mut session = SessionState::new(0);
        let mut now = 0;
        for _ in 0..12 {
            now = session.mode_deadline_ms();
            session.advance_timers(now);
        }
        assert!(now > 0);
        assert_eq!(session.phase_index, PHASE_TABLE.len() - 1);
    }

    #[test]
    fn huge_time_jump_fires_a_bounded_number_of_switches() {
        let mut session = SessionState::new(0);
        let now = 1_000_000_000_000_000_000;
        let switches = session
            .advance_timers(now)
            .iter()
            .filter(|e| matches!(e, TimerEvent::ModeSwitched { .. }))
            .count();
        assert!(switches <= 10, "{switches} switches");
        assert_eq!(session.phase_index, PHASE_TABLE.len() - 1);
        assert!(session.mode_deadline_ms() > now);
        assert!(session.advance_timers(now).is_empty());
    }

    #[test]
    fn skipping_cycles_matches_stepping_deadline_by_deadline() {
        let jump = 50_000_000_000;
        let mut jumped = SessionState::new(0);
        jumped.advance_timers(jump);

        let mut stepped = SessionState::new(0);
        while stepped.mode_deadline_ms() <= jump {
            let deadline = stepped.mode_deadline_ms();
            stepped.advance_timers(deadline);
        }
        assert_eq!(jumped.mode, stepped.mode);
        assert_eq!(jumped.phase_index, stepped.phase_index);
        assert_eq!(jumped.mode_deadline_ms(), stepped.mode_deadline_ms());
    }

    #[test]
    fn power_forces_scatter_without_touching_mode_clock() {
        let mut session = SessionState::new(0);
        session.advance_timers(7_000);
        assert_eq!(session.mode, BehaviorMode::Chase);
        let deadline = session.mode_deadline_ms();

        assert!(session.activate_power(8_000));
        assert_eq!(session.mode, BehaviorMode::Scatter);
        assert_eq!(session.phase_index, 0);
        assert_eq!(session.mode_deadline_ms(), deadline);
        assert!(!session.is_pursuit_active());

        assert!(!session.activate_power(9_000));
        assert_eq!(session.power_deadline_ms(), Some(18_000));
    }

    #[test]
    fn power_expiry_clears_flag_but_keeps_mode() {
        let mut session = SessionState::new(0);
        assert!(session.activate_power(1_000));
        assert!(!session.advance_timers(10_999).contains(&TimerEvent::PowerExpired));
        assert!(session.power_active);

        let fired = session.advance_timers(11_000);
        assert!(fired.contains(&TimerEvent::PowerExpired));
        assert!(!session.power_active);
        assert_eq!(session.mode, BehaviorMode::Chase);
    }

    #[test]
    fn mouth_timer_toggles_once_per_period() {
        let mut session = SessionState::new(0);
        let toggled = |events: Vec<TimerEvent>| events.contains(&TimerEvent::MouthToggled);
        assert!(!toggled(session.advance_timers(199)));
        assert!(toggled(session.advance_timers(200)));
        assert!(!toggled(session.advance_timers(399)));
        assert!(toggled(session.advance_timers(400)));
        // Four whole periods elapse at once: an even count leaves the flag as is.
        assert!(!toggled(session.advance_timers(1_200)));
        assert!(toggled(session.advance_timers(1_400)));
    }

    #[test]
    fn lives_never_underflow() {
        let mut session = SessionState::new(0);
        assert_eq!(session.lose_life(), 2);
        assert_eq!(session.lose_life(), 1);
        assert_eq!(session.lose_life(), 0);
        assert_eq!(session.lose_life(), 0);
    }
}
