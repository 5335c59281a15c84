//! One-shot timers keyed by slot.
//!
//! Every NPC owns a handful of independent timers (cooldown, animation end,
//! dialog auto-close, walk resume). Each slot holds at most one pending timer;
//! scheduling into an occupied slot replaces whatever was there.

use std::time::Duration;

use bevy::prelude::*;

/// Longest delay a timer will hold; anything longer, infinite included, waits
/// this long instead.
pub const MAX_DELAY_SECS: f32 = 1.0e9;

/// Seconds as a [`Duration`], clamped to `0..=MAX_DELAY_SECS`. NaN is zero.
pub fn duration_from_secs(secs: f32) -> Duration {
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f32(secs.clamp(0.0, MAX_DELAY_SECS))
}

/// Pending timers for a set of slots, fired in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct DelayScheduler<K, A> {
    pending: Vec<PendingDelay<K, A>>,
}

#[derive(Debug, Clone)]
struct PendingDelay<K, A> {
    slot: K,
    timer: Timer,
    payload: A,
}

impl<K, A> Default for DelayScheduler<K, A> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<K: PartialEq + Copy, A> DelayScheduler<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `slot` to hand back `payload` once `seconds` have elapsed.
    pub fn schedule(&mut self, slot: K, seconds: f32, payload: A) {
        self.cancel(slot);
        self.pending.push(PendingDelay {
            slot,
            timer: Timer::new(duration_from_secs(seconds), TimerMode::Once),
            payload,
        });
    }

    /// Removes the timer in `slot`, returning its payload if one was pending.
    pub fn cancel(&mut self, slot: K) -> Option<A> {
        let index = self.pending.iter().position(|delay| delay.slot == slot)?;
        Some(self.pending.remove(index).payload)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_scheduled(&self, slot: K) -> bool {
        self.pending.iter().any(|delay| delay.slot == slot)
    }

    pub fn remaining_secs(&self, slot: K) -> Option<f32> {
        self.pending
            .iter()
            .find(|delay| delay.slot == slot)
            .map(|delay| delay.timer.remaining_secs())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advances every timer by `dt` seconds and returns the payloads that came due.
    pub fn tick(&mut self, dt: f32) -> Vec<(K, A)> {
        let delta = duration_from_secs(dt);
        let mut fired = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            let delay = &mut self.pending[index];
            delay.timer.tick(delta);
            if delay.timer.is_finished() {
                let done = self.pending.remove(index);
                fired.push((done.slot, done.payload));
            } else {
                index += 1;
            }
        }
        fired
    }
}
