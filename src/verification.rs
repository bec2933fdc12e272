// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::VerificationConfig;
use crate::cooldown::{Clock, CooldownGate};
use crate::error::WardenError;
use crate::model::{FinalizedVerification, PendingVerification, RoleId, UserId};
use crate::platform::{CodeNotifier, GuildService};
use crate::store::RecordStore;
use rand::Rng;
use std::sync::Arc;

/// A selectable major and the short form used in nicknames.
#[derive(Clone, Debug)]
pub struct Major {
	pub name: String,
	pub short_name: String,
}

#[derive(Clone, Debug)]
pub struct VerificationSettings {
	/// The suffix institutional email addresses must carry.
	pub email_suffix: String,
	pub min_class_year: u16,
	pub max_class_year: u16,
	/// Verified users of this class year get [Self::new_member_role]; all
	/// other years get [Self::continuing_member_role].
	pub admission_year: u16,
	pub new_member_role: RoleId,
	pub continuing_member_role: RoleId,
	pub request_cooldown_seconds: i64,
	/// When non-empty, redemption pauses at [RedeemOutcome::CodeConfirmed]
	/// until the user picks a major; when empty, redemption finalizes
	/// directly.
	pub majors: Vec<Major>,
}

impl VerificationSettings {
	pub fn from_config(config: &VerificationConfig) -> Self {
		Self {
			email_suffix: config.email_suffix.clone(),
			min_class_year: config.min_class_year,
			max_class_year: config.max_class_year,
			admission_year: config.admission_year,
			new_member_role: RoleId(config.new_member_role),
			continuing_member_role: RoleId(config.continuing_member_role),
			request_cooldown_seconds: config.request_cooldown_seconds,
			majors: config
				.majors
				.iter()
				.map(|major| Major {
					name: major.name.clone(),
					short_name: major.short_name.clone(),
				})
				.collect(),
		}
	}
}

/// A redemption that matched but still needs a major selection before the
/// verification can be finalized.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeConfirmed {
	pub user_id: UserId,
	pub email: String,
	pub class_year: u16,
}

/// The result of a completed verification.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedMember {
	/// The tier role that was granted.
	pub tier_role: RoleId,
	/// The nickname the platform adapter should apply, when a major was
	/// chosen ("First (CS, '28)").
	pub nickname: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RedeemOutcome {
	Verified(VerifiedMember),
	CodeConfirmed(CodeConfirmed),
}

/// The two-phase email verification workflow: Unverified -> CodeIssued ->
/// Verified, with Verified terminal.
///
/// The email-to-user uniqueness invariant is checked both at request time and
/// again at redemption, covering the race where two users request codes for
/// the same address before either redeems.
pub struct Verifier {
	store: Arc<dyn RecordStore>,
	guild: Arc<dyn GuildService>,
	notifier: Arc<dyn CodeNotifier>,
	request_gate: CooldownGate,
	settings: VerificationSettings,
}

impl Verifier {
	pub fn new(
		store: Arc<dyn RecordStore>,
		guild: Arc<dyn GuildService>,
		notifier: Arc<dyn CodeNotifier>,
		clock: Arc<dyn Clock>,
		settings: VerificationSettings,
	) -> Self {
		let request_gate = CooldownGate::new(settings.request_cooldown_seconds, clock);
		Self {
			store,
			guild,
			notifier,
			request_gate,
			settings,
		}
	}

	/// Gates the action that triggers a code request (button press). This is
	/// a volatile, best-effort control; it resets on restart.
	pub fn gate_request(&self, user: UserId) -> Result<(), WardenError> {
		match self.request_gate.try_pass(user) {
			Ok(()) => Ok(()),
			Err(remaining) => Err(WardenError::Validation(format!(
				"Please wait {} seconds before clicking again.",
				remaining.num_seconds()
			))),
		}
	}

	/// Issues a fresh verification code for the user and dispatches it to the
	/// given address.
	///
	/// Any prior pending code for the user is superseded; only the newest
	/// request is redeemable. The pending row is committed before dispatch,
	/// so a dispatch failure leaves the code on file for a manual resend and
	/// surfaces as a recoverable error.
	pub async fn request_code(&self, user: UserId, email: &str, class_year: u16) -> Result<(), WardenError> {
		if self.is_verified(user).await? {
			return Err(WardenError::Conflict(String::from("You are already verified.")));
		}
		if !email.ends_with(&self.settings.email_suffix) {
			return Err(WardenError::Validation(format!(
				"Please use a valid {} email address.",
				self.settings.email_suffix
			)));
		}
		self.reject_email_claimed_by_other(user, email).await?;
		if class_year < self.settings.min_class_year || class_year > self.settings.max_class_year {
			return Err(WardenError::Validation(String::from(
				"Invalid class year. Please use the format 20XX.",
			)));
		}

		self.store.delete_pending_verifications_for_user(user).await?;
		let code = generate_code();
		self.store
			.put_pending_verification(PendingVerification {
				user_id: user,
				email: email.to_string(),
				code: code.clone(),
				issued_at: chrono::Utc::now(),
				class_year,
			})
			.await?;

		if let Err(error) = self.notifier.notify(email, &code).await {
			tracing::error!(source = ?error, user = %user, "failed to dispatch verification code");
			return Err(WardenError::ExternalService(String::from(
				"The verification email could not be sent.",
			)));
		}
		Ok(())
	}

	/// Redeems a submitted code.
	///
	/// On a match, either finalizes directly (no major catalog configured) or
	/// returns [RedeemOutcome::CodeConfirmed] so the adapter can collect a
	/// major via [Self::finalize]. On a mismatch, nothing changes.
	pub async fn redeem_code(&self, user: UserId, submitted_code: &str) -> Result<RedeemOutcome, WardenError> {
		if self.is_verified(user).await? {
			return Err(WardenError::Conflict(String::from("You are already verified.")));
		}

		// Only one pending row should exist, but tolerate duplicates by
		// checking membership across all of them.
		let pending = self.store.pending_verifications_for_user(user).await?;
		if pending.is_empty() {
			return Err(WardenError::NotFound(String::from(
				"No verification is in progress. Request a code first.",
			)));
		}
		let Some(matched) = pending.iter().find(|record| record.code == submitted_code) else {
			return Err(WardenError::Validation(String::from(
				"Invalid verification code. Please try again.",
			)));
		};
		let email = matched.email.clone();
		let class_year = matched.class_year;

		// Re-check uniqueness: another user may have finalized this address
		// after our code was issued.
		self.reject_email_claimed_by_other(user, &email).await?;

		self.store.delete_pending_verifications_for_user(user).await?;

		if self.settings.majors.is_empty() {
			let member = self.finalize_verified(user, &email, class_year, None).await?;
			return Ok(RedeemOutcome::Verified(member));
		}
		Ok(RedeemOutcome::CodeConfirmed(CodeConfirmed {
			user_id: user,
			email,
			class_year,
		}))
	}

	/// Completes a [RedeemOutcome::CodeConfirmed] verification once the user
	/// has chosen a major, reporting the nickname the adapter should apply.
	pub async fn finalize(
		&self,
		confirmed: CodeConfirmed,
		first_name: &str,
		major_name: &str,
	) -> Result<VerifiedMember, WardenError> {
		let Some(major) = self
			.settings
			.majors
			.iter()
			.find(|major| major.name == major_name)
		else {
			return Err(WardenError::Validation(format!("Unknown major: {}", major_name)));
		};

		self.reject_email_claimed_by_other(confirmed.user_id, &confirmed.email).await?;

		let nickname = format!(
			"{} ({}, '{:02})",
			first_name,
			major.short_name,
			confirmed.class_year % 100
		);
		self.finalize_verified(confirmed.user_id, &confirmed.email, confirmed.class_year, Some(nickname))
			.await
	}

	/// Grants the tier role and writes the finalized marker. The row is only
	/// committed after the role grant succeeds.
	async fn finalize_verified(
		&self,
		user: UserId,
		email: &str,
		class_year: u16,
		nickname: Option<String>,
	) -> Result<VerifiedMember, WardenError> {
		let tier_role = if class_year == self.settings.admission_year {
			self.settings.new_member_role
		} else {
			self.settings.continuing_member_role
		};
		self.guild.add_role_to_user(user, tier_role).await?;
		self.store
			.put_finalized_verification(FinalizedVerification {
				user_id: user,
				email: email.to_string(),
				class_year,
			})
			.await?;
		tracing::info!(user = %user, class_year, "verification finalized");
		Ok(VerifiedMember { tier_role, nickname })
	}

	async fn is_verified(&self, user: UserId) -> Result<bool, WardenError> {
		if self.store.finalized_verification_for_user(user).await?.is_some() {
			return Ok(true);
		}
		let live_roles = self.guild.get_user_roles(user).await?;
		Ok(live_roles.contains(&self.settings.new_member_role)
			|| live_roles.contains(&self.settings.continuing_member_role))
	}

	async fn reject_email_claimed_by_other(&self, user: UserId, email: &str) -> Result<(), WardenError> {
		if let Some(finalized) = self.store.finalized_verification_for_email(email).await? {
			if finalized.user_id != user {
				return Err(WardenError::Conflict(String::from(
					"This email has already been used for verification. Please use a different email.",
				)));
			}
		}
		Ok(())
	}
}

fn generate_code() -> String {
	let code: u32 = rand::rng().random_range(100_000..=999_999);
	code.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cooldown::testing::ManualClock;
	use crate::platform::RoleAttributes;
	use crate::store::MemoryStore;
	use async_trait::async_trait;
	use std::sync::Mutex;

	const NEW_MEMBER: RoleId = RoleId(28);
	const CONTINUING: RoleId = RoleId(27);

	struct FakeGuild {
		user_roles: Mutex<Vec<(UserId, RoleId)>>,
	}

	impl FakeGuild {
		fn new() -> Self {
			Self {
				user_roles: Mutex::new(Vec::new()),
			}
		}

		fn roles_of(&self, user: UserId) -> Vec<RoleId> {
			self.user_roles
				.lock()
				.unwrap()
				.iter()
				.filter(|(member, _)| *member == user)
				.map(|(_, role)| *role)
				.collect()
		}
	}

	#[async_trait]
	impl GuildService for FakeGuild {
		async fn get_role(&self, _role: RoleId) -> Result<Option<RoleAttributes>, WardenError> {
			Ok(None)
		}

		async fn create_role(&self, _attributes: RoleAttributes, _above: Option<RoleId>) -> Result<RoleId, WardenError> {
			Err(WardenError::ExternalService(String::from(
				"verification never creates roles",
			)))
		}

		async fn edit_role(&self, _role: RoleId, _attributes: RoleAttributes) -> Result<(), WardenError> {
			Ok(())
		}

		async fn add_role_to_user(&self, user: UserId, role: RoleId) -> Result<(), WardenError> {
			let mut user_roles = self.user_roles.lock().unwrap();
			if !user_roles.contains(&(user, role)) {
				user_roles.push((user, role));
			}
			Ok(())
		}

		async fn remove_role_from_user(&self, user: UserId, role: RoleId) -> Result<(), WardenError> {
			let mut user_roles = self.user_roles.lock().unwrap();
			user_roles.retain(|entry| *entry != (user, role));
			Ok(())
		}

		async fn get_user_roles(&self, user: UserId) -> Result<Vec<RoleId>, WardenError> {
			Ok(self.roles_of(user))
		}
	}

	struct FakeNotifier {
		sent: Mutex<Vec<(String, String)>>,
		fail_dispatch: Mutex<bool>,
	}

	impl FakeNotifier {
		fn new() -> Self {
			Self {
				sent: Mutex::new(Vec::new()),
				fail_dispatch: Mutex::new(false),
			}
		}
	}

	#[async_trait]
	impl CodeNotifier for FakeNotifier {
		async fn notify(&self, email: &str, code: &str) -> Result<(), WardenError> {
			if *self.fail_dispatch.lock().unwrap() {
				return Err(WardenError::ExternalService(String::from("mail API is down")));
			}
			self.sent.lock().unwrap().push((email.to_string(), code.to_string()));
			Ok(())
		}
	}

	fn settings(majors: Vec<Major>) -> VerificationSettings {
		VerificationSettings {
			email_suffix: String::from("@rpi.edu"),
			min_class_year: 2022,
			max_class_year: 2030,
			admission_year: 2028,
			new_member_role: NEW_MEMBER,
			continuing_member_role: CONTINUING,
			request_cooldown_seconds: 180,
			majors,
		}
	}

	struct Harness {
		store: Arc<MemoryStore>,
		guild: Arc<FakeGuild>,
		notifier: Arc<FakeNotifier>,
		clock: Arc<ManualClock>,
		verifier: Verifier,
	}

	fn harness(majors: Vec<Major>) -> Harness {
		let store = Arc::new(MemoryStore::new());
		let guild = Arc::new(FakeGuild::new());
		let notifier = Arc::new(FakeNotifier::new());
		let clock = Arc::new(ManualClock::new());
		let verifier = Verifier::new(
			store.clone(),
			guild.clone(),
			notifier.clone(),
			clock.clone(),
			settings(majors),
		);
		Harness {
			store,
			guild,
			notifier,
			clock,
			verifier,
		}
	}

	async fn issued_code(store: &MemoryStore, user: UserId) -> String {
		let pending = store.pending_verifications_for_user(user).await.unwrap();
		assert_eq!(pending.len(), 1);
		pending[0].code.clone()
	}

	#[tokio::test]
	async fn request_then_redeem_round_trip() {
		let h = harness(Vec::new());
		let user = UserId(1);

		h.verifier.request_code(user, "a@rpi.edu", 2028).await.unwrap();
		let code = issued_code(&h.store, user).await;
		assert_eq!(code.len(), 6);
		{
			let sent = h.notifier.sent.lock().unwrap();
			assert_eq!(sent.len(), 1);
			assert_eq!(sent[0], (String::from("a@rpi.edu"), code.clone()));
		}

		// A wrong code leaves everything untouched.
		let wrong = h.verifier.redeem_code(user, "000000").await;
		assert!(matches!(wrong, Err(WardenError::Validation(_))));
		assert_eq!(h.store.pending_verifications_for_user(user).await.unwrap().len(), 1);
		assert!(h.store.finalized_verification_for_user(user).await.unwrap().is_none());

		let outcome = h.verifier.redeem_code(user, &code).await.unwrap();
		let RedeemOutcome::Verified(member) = outcome else {
			panic!("expected direct finalization without a major catalog");
		};
		assert_eq!(member.tier_role, NEW_MEMBER);
		assert!(h.guild.roles_of(user).contains(&NEW_MEMBER));
		let finalized = h.store.finalized_verification_for_user(user).await.unwrap().unwrap();
		assert_eq!(finalized.email, "a@rpi.edu");
		assert_eq!(finalized.class_year, 2028);
		assert!(h.store.pending_verifications_for_user(user).await.unwrap().is_empty());

		// Verified is terminal.
		let again = h.verifier.request_code(user, "a@rpi.edu", 2028).await;
		assert!(matches!(again, Err(WardenError::Conflict(_))));
		let redeem_again = h.verifier.redeem_code(user, &code).await;
		assert!(matches!(redeem_again, Err(WardenError::Conflict(_))));
	}

	#[tokio::test]
	async fn earlier_class_years_get_the_continuing_tier() {
		let h = harness(Vec::new());
		let user = UserId(1);

		h.verifier.request_code(user, "b@rpi.edu", 2026).await.unwrap();
		let code = issued_code(&h.store, user).await;
		let outcome = h.verifier.redeem_code(user, &code).await.unwrap();
		let RedeemOutcome::Verified(member) = outcome else {
			panic!("expected direct finalization");
		};
		assert_eq!(member.tier_role, CONTINUING);
	}

	#[tokio::test]
	async fn rejects_bad_email_and_class_year() {
		let h = harness(Vec::new());
		let user = UserId(1);

		let bad_email = h.verifier.request_code(user, "a@gmail.com", 2028).await;
		assert!(matches!(bad_email, Err(WardenError::Validation(_))));

		let bad_year = h.verifier.request_code(user, "a@rpi.edu", 2031).await;
		assert!(matches!(bad_year, Err(WardenError::Validation(_))));
		let bad_year = h.verifier.request_code(user, "a@rpi.edu", 2021).await;
		assert!(matches!(bad_year, Err(WardenError::Validation(_))));

		assert!(h.store.pending_verifications_for_user(user).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn reissue_supersedes_prior_code() {
		let h = harness(Vec::new());
		let user = UserId(1);

		h.verifier.request_code(user, "a@rpi.edu", 2028).await.unwrap();
		let first_code = issued_code(&h.store, user).await;
		h.verifier.request_code(user, "a@rpi.edu", 2028).await.unwrap();
		let second_code = issued_code(&h.store, user).await;

		if first_code != second_code {
			let stale = h.verifier.redeem_code(user, &first_code).await;
			assert!(matches!(stale, Err(WardenError::Validation(_))));
		}
		let outcome = h.verifier.redeem_code(user, &second_code).await.unwrap();
		assert!(matches!(outcome, RedeemOutcome::Verified(_)));
	}

	#[tokio::test]
	async fn email_finalizes_for_at_most_one_user() {
		let h = harness(Vec::new());
		let first = UserId(1);
		let second = UserId(2);

		// Both users get codes issued for the same address before either
		// redeems; the uniqueness re-check at redemption catches the loser.
		h.verifier.request_code(first, "shared@rpi.edu", 2028).await.unwrap();
		h.verifier.request_code(second, "shared@rpi.edu", 2028).await.unwrap();

		let first_code = issued_code(&h.store, first).await;
		let outcome = h.verifier.redeem_code(first, &first_code).await.unwrap();
		assert!(matches!(outcome, RedeemOutcome::Verified(_)));

		let second_code = issued_code(&h.store, second).await;
		let rejected = h.verifier.redeem_code(second, &second_code).await;
		assert!(matches!(rejected, Err(WardenError::Conflict(_))));
		assert!(h.store.finalized_verification_for_user(second).await.unwrap().is_none());

		// And any later request for the same address is rejected up front.
		let request = h.verifier.request_code(second, "shared@rpi.edu", 2028).await;
		assert!(matches!(request, Err(WardenError::Conflict(_))));
	}

	#[tokio::test]
	async fn dispatch_failure_keeps_the_pending_row() {
		let h = harness(Vec::new());
		let user = UserId(1);
		*h.notifier.fail_dispatch.lock().unwrap() = true;

		let result = h.verifier.request_code(user, "a@rpi.edu", 2028).await;
		assert!(matches!(result, Err(WardenError::ExternalService(_))));
		// The code stays on file so it can be resent manually.
		assert_eq!(h.store.pending_verifications_for_user(user).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn major_catalog_adds_a_confirmation_step() {
		let majors = vec![
			Major {
				name: String::from("Computer Science"),
				short_name: String::from("CS"),
			},
			Major {
				name: String::from("Other"),
				short_name: String::from("Other"),
			},
		];
		let h = harness(majors);
		let user = UserId(1);

		h.verifier.request_code(user, "a@rpi.edu", 2028).await.unwrap();
		let code = issued_code(&h.store, user).await;
		let outcome = h.verifier.redeem_code(user, &code).await.unwrap();
		let RedeemOutcome::CodeConfirmed(confirmed) = outcome else {
			panic!("expected the major selection step");
		};
		// Confirmed but not yet finalized.
		assert!(h.store.finalized_verification_for_user(user).await.unwrap().is_none());

		let unknown = h
			.verifier
			.finalize(confirmed.clone(), "First", "Underwater Basket Weaving")
			.await;
		assert!(matches!(unknown, Err(WardenError::Validation(_))));

		let member = h.verifier.finalize(confirmed, "First", "Computer Science").await.unwrap();
		assert_eq!(member.tier_role, NEW_MEMBER);
		assert_eq!(member.nickname.as_deref(), Some("First (CS, '28)"));
		assert!(h.store.finalized_verification_for_user(user).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn request_trigger_is_cooldown_gated() {
		let h = harness(Vec::new());
		let user = UserId(1);

		assert!(h.verifier.gate_request(user).is_ok());
		let blocked = h.verifier.gate_request(user);
		assert!(matches!(blocked, Err(WardenError::Validation(_))));

		h.clock.advance_seconds(181);
		assert!(h.verifier.gate_request(user).is_ok());
	}
}
