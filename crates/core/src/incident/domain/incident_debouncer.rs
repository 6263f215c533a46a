use std::time::Duration;

use crate::classification::domain::direction::Direction;
use crate::tracking::domain::subject_state::SubjectState;

/// Per-subject debounce phase, derived from [`SubjectState`].
///
/// Cycles `Clear → Deviating → Alerted → Clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    /// Facing forward; no timer running.
    Clear,
    /// Deviating, threshold not reached yet.
    Deviating,
    /// Incident fired for the current episode.
    Alerted,
}

impl DebouncePhase {
    pub fn of(state: &SubjectState) -> Self {
        match (state.violation_started_at, state.alert_active) {
            (None, _) => DebouncePhase::Clear,
            (Some(_), false) => DebouncePhase::Deviating,
            (Some(_), true) => DebouncePhase::Alerted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOutcome {
    pub phase: DebouncePhase,
    /// Time spent in the current episode, if one is running.
    pub elapsed: Option<Duration>,
    /// This tick crossed the threshold; exactly one incident must be raised.
    pub fired: bool,
}

/// Turns per-tick classifications into at most one incident per episode.
///
/// Any FORWARD tick ends the episode and discards the timer, so repeated
/// short glances never add up. Once fired, the episode stays alerted for as
/// long as the subject keeps deviating, whatever the direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentDebouncer {
    turn_duration: Duration,
    alert_display: Duration,
}

impl IncidentDebouncer {
    pub fn new(turn_duration: Duration, alert_display: Duration) -> Self {
        Self {
            turn_duration,
            alert_display,
        }
    }

    pub fn evaluate(
        &self,
        state: &mut SubjectState,
        direction: Direction,
        now: Duration,
    ) -> DebounceOutcome {
        if !direction.is_deviation() {
            state.violation_started_at = None;
            state.alert_active = false;
            return DebounceOutcome {
                phase: DebouncePhase::Clear,
                elapsed: None,
                fired: false,
            };
        }

        let started = *state.violation_started_at.get_or_insert(now);
        let elapsed = now.saturating_sub(started);
        let fired = !state.alert_active && elapsed >= self.turn_duration;
        if fired {
            state.alert_active = true;
            state.alerted_at = Some(now);
        }

        DebounceOutcome {
            phase: DebouncePhase::of(state),
            elapsed: Some(elapsed),
            fired,
        }
    }

    /// The alert banner stays up for the display window after the most
    /// recent incident, even if the subject has since turned back.
    pub fn banner_visible(&self, state: &SubjectState, now: Duration) -> bool {
        state
            .alerted_at
            .is_some_and(|at| now.saturating_sub(at) < self.alert_display)
    }
}
