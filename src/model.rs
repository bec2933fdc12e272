// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The platform-assigned ID of a guild member.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct UserId(pub u64);

/// The platform-assigned ID of a guild role.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RoleId(pub u64);

/// The platform-assigned ID of a channel.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ChannelId(pub u64);

/// The platform-assigned ID of a message.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MessageId(pub u64);

impl RoleId {
	/// The sentinel value meaning "no role"; selecting it clears a category.
	pub const NONE: RoleId = RoleId(0);

	pub fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl fmt::Display for RoleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl fmt::Display for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// The role a user currently holds within one exclusive category.
///
/// At most one binding exists per (user, category) pair; re-selection replaces
/// [Self::role_id] rather than adding a second row.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UserRoleBinding {
	/// The user holding the role.
	pub user_id: UserId,
	/// The category the role belongs to, as named in the configuration.
	pub category: String,
	/// The currently bound role.
	pub role_id: RoleId,
}

/// An issued, not-yet-redeemed verification code.
///
/// At most one of these is live per user; issuing a new code deletes any
/// superseded rows, so only the newest request is redeemable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PendingVerification {
	/// The user who requested verification.
	pub user_id: UserId,
	/// The institutional email address the code was sent to.
	pub email: String,
	/// The six-digit code the user must submit to redeem.
	pub code: String,
	/// When the code was issued. No TTL is enforced; the row lives until it's
	/// redeemed or superseded.
	pub issued_at: DateTime<Utc>,
	/// The class year the user claimed when requesting the code.
	pub class_year: u16,
}

/// The terminal, immutable record marking an email as verified for a user.
///
/// An email address may be finalized for at most one user; a second user
/// attempting to claim an already-finalized address is rejected.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FinalizedVerification {
	/// The user the email was verified for.
	pub user_id: UserId,
	/// The verified email address.
	pub email: String,
	/// The class year recorded at verification time.
	pub class_year: u16,
}

/// An open support ticket.
///
/// The row exists only while the ticket is open; closing a ticket deletes the
/// row and archives the channel externally.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Ticket {
	/// The channel created for this ticket.
	pub channel_id: ChannelId,
	/// The user who opened the ticket.
	pub author_id: UserId,
	/// The guild-wide ticket number, allocated from a monotonic counter.
	pub sequence_number: u64,
}

/// A message that has been copied to the starboard.
///
/// Created when a message's star count crosses the threshold, updated as the
/// count changes, and removed when the count drops back below the threshold.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StarboardEntry {
	/// The message that was starred.
	pub original_message_id: MessageId,
	/// The copy posted in the starboard channel.
	pub starboard_message_id: MessageId,
	/// The star count as of the last recompute.
	pub star_count: u32,
}
