//! Proximity evaluation.
//!
//! The evaluator is a pure, single-pass filter: given the current fix, the
//! time of day and the alarm list, it decides which alarms cross their
//! trigger condition. Side effects (notification, deactivation, persistence)
//! belong to the trigger handler; the evaluator only returns ids.
//!
//! De-duplication uses hysteresis: once an alarm fires, its id stays in the
//! [`FiredSet`] for as long as the position remains inside the radius, and
//! leaving the radius re-arms it. One-shot alarms never re-arm because the
//! trigger handler deactivates them.

use std::collections::BTreeSet;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::Alarm;
use crate::geo::distance_m;
use crate::location::LocationFix;

const SECS_PER_DAY: i64 = 86_400;

/// Tuning knobs for the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalPolicy {
    /// Half-width of the time-of-day gate window, in seconds.
    pub time_tolerance_secs: u32,
    /// Whether leaving the radius re-arms an already-fired alarm.
    pub rearm_on_exit: bool,
}

impl Default for EvalPolicy {
    fn default() -> Self {
        Self {
            time_tolerance_secs: 60,
            rearm_on_exit: true,
        }
    }
}

/// Ids of alarms that have fired and are still inside their radius.
///
/// Shared between the foreground watch loop and background check passes
/// through the store, so neither context re-fires the other's alarms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiredSet {
    inside: BTreeSet<String>,
}

impl FiredSet {
    pub fn contains(&self, id: &str) -> bool {
        self.inside.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.inside.insert(id.into());
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inside.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inside.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Ids to trigger, in store order. Each id appears at most once.
    pub triggered: Vec<String>,
    /// Ids that left their radius this pass and are armed again.
    pub rearmed: Vec<String>,
    /// The fired set to persist for the next pass.
    pub fired: FiredSet,
}

/// Decides which alarms should fire for a given position and time of day.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    policy: EvalPolicy,
}

impl Evaluator {
    pub fn new(policy: EvalPolicy) -> Self {
        Self { policy }
    }

    /// Run one pass over the alarm list.
    ///
    /// Pure: the store is only read, never mutated. Inactive alarms are
    /// skipped entirely, so a deactivated one-shot drops out of the fired
    /// set here and still cannot re-fire (it fails the `active` filter).
    pub fn evaluate(
        &self,
        fix: &LocationFix,
        now: NaiveTime,
        alarms: &[Alarm],
        fired: &FiredSet,
    ) -> Evaluation {
        let mut triggered = Vec::new();
        let mut rearmed = Vec::new();
        let mut next = FiredSet::default();

        for alarm in alarms.iter().filter(|a| a.active) {
            let d = distance_m(fix.coordinates(), alarm.coordinates());
            let within = d < alarm.radius_m;

            if !within {
                if fired.contains(&alarm.id) {
                    if self.policy.rearm_on_exit {
                        rearmed.push(alarm.id.clone());
                    } else {
                        next.insert(alarm.id.clone());
                    }
                }
                continue;
            }

            if fired.contains(&alarm.id) {
                // Still inside and already fired; hold until exit.
                next.insert(alarm.id.clone());
                continue;
            }

            let gate_open = !alarm.time_based
                || alarm
                    .time
                    .map(|t| self.within_tolerance(now, t))
                    .unwrap_or(false);

            if gate_open {
                triggered.push(alarm.id.clone());
                next.insert(alarm.id.clone());
            }
        }

        Evaluation {
            triggered,
            rearmed,
            fired: next,
        }
    }

    /// Circular time-of-day comparison: the gap is measured the shorter way
    /// around midnight, so a 23:59:30 alarm matches a 00:00:10 fix.
    fn within_tolerance(&self, now: NaiveTime, gate: NaiveTime) -> bool {
        let a = now.num_seconds_from_midnight() as i64;
        let b = gate.num_seconds_from_midnight() as i64;
        let gap = (a - b).abs();
        gap.min(SECS_PER_DAY - gap) <= self.policy.time_tolerance_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn istanbul_alarm() -> Alarm {
        Alarm::new("Taksim", 41.0082, 28.9784, 100.0)
    }

    #[test]
    fn fires_at_the_target_location() {
        let alarm = istanbul_alarm();
        let fix = LocationFix::new(41.0082, 28.9784);
        let eval = Evaluator::default().evaluate(&fix, t(12, 0, 0), &[alarm.clone()], &FiredSet::default());
        assert_eq!(eval.triggered, vec![alarm.id.clone()]);
        assert!(eval.fired.contains(&alarm.id));
    }

    #[test]
    fn does_not_fire_500m_away() {
        let alarm = istanbul_alarm();
        // ~500 m north of the target.
        let fix = LocationFix::new(41.0127, 28.9784);
        let eval = Evaluator::default().evaluate(&fix, t(12, 0, 0), &[alarm], &FiredSet::default());
        assert!(eval.triggered.is_empty());
        assert!(eval.fired.is_empty());
    }

    #[test]
    fn inactive_alarm_never_fires() {
        let mut alarm = istanbul_alarm();
        alarm.active = false;
        let fix = LocationFix::new(41.0082, 28.9784);
        let eval = Evaluator::default().evaluate(&fix, t(12, 0, 0), &[alarm], &FiredSet::default());
        assert!(eval.triggered.is_empty());
    }

    #[test]
    fn time_gate_blocks_outside_window() {
        let alarm = istanbul_alarm().with_time(t(8, 30, 0));
        let fix = LocationFix::new(41.0082, 28.9784);
        let evaluator = Evaluator::default();

        let blocked = evaluator.evaluate(&fix, t(9, 15, 0), &[alarm.clone()], &FiredSet::default());
        assert!(blocked.triggered.is_empty());
        // Not in the fired set either: it can still fire when the gate opens.
        assert!(blocked.fired.is_empty());

        let open = evaluator.evaluate(&fix, t(8, 30, 45), &[alarm.clone()], &FiredSet::default());
        assert_eq!(open.triggered, vec![alarm.id]);
    }

    #[test]
    fn time_gate_wraps_around_midnight() {
        let alarm = istanbul_alarm().with_time(t(23, 59, 30));
        let fix = LocationFix::new(41.0082, 28.9784);
        let eval = Evaluator::default().evaluate(&fix, t(0, 0, 10), &[alarm.clone()], &FiredSet::default());
        assert_eq!(eval.triggered, vec![alarm.id]);
    }

    #[test]
    fn fired_alarm_holds_until_exit_then_rearms() {
        let alarm = istanbul_alarm();
        let evaluator = Evaluator::default();
        let inside = LocationFix::new(41.0082, 28.9784);
        let outside = LocationFix::new(41.0200, 28.9784);

        let first = evaluator.evaluate(&inside, t(12, 0, 0), &[alarm.clone()], &FiredSet::default());
        assert_eq!(first.triggered.len(), 1);

        // Still inside: no duplicate firing.
        let second = evaluator.evaluate(&inside, t(12, 0, 30), &[alarm.clone()], &first.fired);
        assert!(second.triggered.is_empty());
        assert!(second.fired.contains(&alarm.id));

        // Exit re-arms.
        let third = evaluator.evaluate(&outside, t(12, 5, 0), &[alarm.clone()], &second.fired);
        assert!(third.triggered.is_empty());
        assert_eq!(third.rearmed, vec![alarm.id.clone()]);
        assert!(third.fired.is_empty());

        // Re-entry fires again.
        let fourth = evaluator.evaluate(&inside, t(12, 10, 0), &[alarm.clone()], &third.fired);
        assert_eq!(fourth.triggered, vec![alarm.id]);
    }

    #[test]
    fn rearm_can_be_disabled_by_policy() {
        let alarm = istanbul_alarm();
        let evaluator = Evaluator::new(EvalPolicy {
            rearm_on_exit: false,
            ..EvalPolicy::default()
        });
        let inside = LocationFix::new(41.0082, 28.9784);
        let outside = LocationFix::new(41.0200, 28.9784);

        let first = evaluator.evaluate(&inside, t(12, 0, 0), &[alarm.clone()], &FiredSet::default());
        let second = evaluator.evaluate(&outside, t(12, 5, 0), &[alarm.clone()], &first.fired);
        assert!(second.rearmed.is_empty());
        assert!(second.fired.contains(&alarm.id));

        // Back inside: still held, no second firing.
        let third = evaluator.evaluate(&inside, t(12, 10, 0), &[alarm.clone()], &second.fired);
        assert!(third.triggered.is_empty());
    }

    #[test]
    fn ids_are_unique_within_a_pass() {
        let a = istanbul_alarm();
        let b = Alarm::new("Nearby", 41.0083, 28.9785, 200.0);
        let fix = LocationFix::new(41.0082, 28.9784);
        let eval = Evaluator::default().evaluate(
            &fix,
            t(12, 0, 0),
            &[a.clone(), b.clone()],
            &FiredSet::default(),
        );
        assert_eq!(eval.triggered.len(), 2);
        let mut sorted = eval.triggered.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn removed_alarm_drops_out_of_fired_set() {
        let alarm = istanbul_alarm();
        let fix = LocationFix::new(41.0082, 28.9784);
        let evaluator = Evaluator::default();

        let first = evaluator.evaluate(&fix, t(12, 0, 0), &[alarm], &FiredSet::default());
        assert_eq!(first.fired.len(), 1);

        let second = evaluator.evaluate(&fix, t(12, 1, 0), &[], &first.fired);
        assert!(second.fired.is_empty());
    }
}
