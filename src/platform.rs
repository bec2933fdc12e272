// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::WardenError;
use crate::model::{ChannelId, MessageId, RoleId, Ticket, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The externally visible attributes of a guild role.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoleAttributes {
	pub name: String,
	/// RGB color packed as 0xRRGGBB.
	pub color: u32,
}

/// Role and membership operations against the chat platform.
///
/// All calls may fail with a permission or rate limit error, surfaced as
/// [WardenError::ExternalService], or with [WardenError::NotFound] when the
/// referenced role or member no longer exists.
#[async_trait]
pub trait GuildService: Send + Sync {
	/// Gets a role's current attributes, or None if it was deleted
	/// out-of-band.
	async fn get_role(&self, role: RoleId) -> Result<Option<RoleAttributes>, WardenError>;
	/// Creates a role, positioned directly above `above` when given.
	async fn create_role(&self, attributes: RoleAttributes, above: Option<RoleId>) -> Result<RoleId, WardenError>;
	async fn edit_role(&self, role: RoleId, attributes: RoleAttributes) -> Result<(), WardenError>;
	async fn add_role_to_user(&self, user: UserId, role: RoleId) -> Result<(), WardenError>;
	/// Removes a role from a user's membership. Implementations may report
	/// an already-absent role as [WardenError::NotFound]; callers treat that
	/// as a no-op.
	async fn remove_role_from_user(&self, user: UserId, role: RoleId) -> Result<(), WardenError>;
	async fn get_user_roles(&self, user: UserId) -> Result<Vec<RoleId>, WardenError>;
}

/// Dispatches a verification code to an external identity.
#[async_trait]
pub trait CodeNotifier: Send + Sync {
	async fn notify(&self, email: &str, code: &str) -> Result<(), WardenError>;
}

/// A rendered transcript of a ticket channel's content, ready for the
/// archival sink.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TranscriptDocument {
	pub file_name: String,
	pub content: String,
}

impl TranscriptDocument {
	/// Renders the document in the archival sink's JSON envelope.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

/// Exports a durable transcript of a channel's content.
#[async_trait]
pub trait TranscriptExporter: Send + Sync {
	/// Returns None when the channel had nothing exportable; ticket close
	/// treats that as a failure so no content is lost silently.
	async fn export(&self, channel: ChannelId) -> Result<Option<TranscriptDocument>, WardenError>;
}

/// Channel-side operations the ticket lifecycle needs from the platform.
#[async_trait]
pub trait TicketChannels: Send + Sync {
	async fn create_channel(&self, name: &str, author: UserId) -> Result<ChannelId, WardenError>;
	/// Posts the control surface (close button and friends) into a freshly
	/// created ticket channel.
	async fn post_control_panel(&self, channel: ChannelId) -> Result<MessageId, WardenError>;
	/// Swaps the control surface for its disabled rendition so repeated close
	/// presses are rejected at the UI layer.
	async fn disable_control_panel(&self, channel: ChannelId) -> Result<(), WardenError>;
	/// Posts the close log entry, referencing the archived transcript.
	async fn post_close_log(
		&self,
		closed_by: UserId,
		ticket: &Ticket,
		transcript: &TranscriptDocument,
	) -> Result<(), WardenError>;
	async fn delete_channel(&self, channel: ChannelId) -> Result<(), WardenError>;
}

/// Starboard-side operations: reading live reaction state and maintaining the
/// posted copies.
#[async_trait]
pub trait StarboardHost: Send + Sync {
	/// Counts the star reactions currently on a message, from the platform's
	/// source of truth rather than any cached tally.
	async fn star_count(&self, message: MessageId) -> Result<u32, WardenError>;
	async fn post_entry(&self, original: MessageId, star_count: u32) -> Result<MessageId, WardenError>;
	async fn edit_entry(&self, starboard_message: MessageId, star_count: u32) -> Result<(), WardenError>;
	async fn delete_entry(&self, starboard_message: MessageId) -> Result<(), WardenError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transcript_document_serializes_with_both_fields() {
		let document = TranscriptDocument {
			file_name: String::from("transcript-ticket-alice-3.html"),
			content: String::from("<html></html>"),
		};
		let json = document.to_json().unwrap();
		assert!(json.contains("transcript-ticket-alice-3.html"));
		assert!(json.contains("<html></html>"));
	}
}
