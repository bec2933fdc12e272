// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::UserId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A source of the current time, injected so tests can drive the clock.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A per-user gate on how often an action may be triggered.
///
/// The map is volatile and process-local: it resets on restart and the
/// check-then-set is not atomic across interleaved invocations for the same
/// user. It is a best-effort control, not a persisted invariant.
pub struct CooldownGate {
	duration: Duration,
	clock: Arc<dyn Clock>,
	last_triggered: Mutex<HashMap<UserId, DateTime<Utc>>>,
}

impl CooldownGate {
	pub fn new(duration_seconds: i64, clock: Arc<dyn Clock>) -> Self {
		Self {
			duration: Duration::seconds(duration_seconds),
			clock,
			last_triggered: Mutex::new(HashMap::new()),
		}
	}

	/// Passes the gate if the user isn't on cooldown, recording the trigger
	/// time. On rejection, returns how long the user still has to wait.
	pub fn try_pass(&self, user: UserId) -> Result<(), Duration> {
		let now = self.clock.now();
		let mut last_triggered = self
			.last_triggered
			.lock()
			.expect("cooldown map lock is never poisoned");
		if let Some(last) = last_triggered.get(&user) {
			let elapsed = now - *last;
			if elapsed < self.duration {
				return Err(self.duration - elapsed);
			}
		}
		last_triggered.insert(user, now);
		Ok(())
	}
}


#[cfg(test)]
mod tests {
	use super::testing::ManualClock;
	use super::*;

	#[test]
	fn second_trigger_within_window_is_rejected() {
		let clock = Arc::new(ManualClock::new());
		let gate = CooldownGate::new(180, clock.clone());

		assert!(gate.try_pass(UserId(1)).is_ok());
		let remaining = gate.try_pass(UserId(1)).expect_err("second trigger should be on cooldown");
		assert!(remaining.num_seconds() <= 180);
		assert!(remaining.num_seconds() > 0);
	}

	#[test]
	fn gate_reopens_after_the_window() {
		let clock = Arc::new(ManualClock::new());
		let gate = CooldownGate::new(180, clock.clone());

		assert!(gate.try_pass(UserId(1)).is_ok());
		clock.advance_seconds(181);
		assert!(gate.try_pass(UserId(1)).is_ok());
	}

	#[test]
	fn users_do_not_share_cooldowns() {
		let clock = Arc::new(ManualClock::new());
		let gate = CooldownGate::new(180, clock);

		assert!(gate.try_pass(UserId(1)).is_ok());
		assert!(gate.try_pass(UserId(2)).is_ok());
	}
}
