// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::TicketConfig;
use crate::cooldown::{Clock, CooldownGate};
use crate::error::WardenError;
use crate::model::{ChannelId, Ticket, UserId};
use crate::platform::{TicketChannels, TranscriptExporter};
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

#[derive(Clone, Debug)]
pub struct TicketSettings {
	pub open_cooldown_seconds: i64,
	/// How long to wait after a close before deleting the channel, letting
	/// in-flight acknowledgements land first.
	pub close_grace_seconds: u64,
}

impl TicketSettings {
	pub fn from_config(config: &TicketConfig) -> Self {
		Self {
			open_cooldown_seconds: config.open_cooldown_seconds,
			close_grace_seconds: config.close_grace_seconds,
		}
	}
}

/// The support ticket lifecycle: None -> Open -> Closed, with Closed terminal
/// (the channel is deleted).
pub struct TicketManager {
	store: Arc<dyn RecordStore>,
	channels: Arc<dyn TicketChannels>,
	exporter: Arc<dyn TranscriptExporter>,
	open_gate: CooldownGate,
	close_grace: Duration,
}

impl TicketManager {
	pub fn new(
		store: Arc<dyn RecordStore>,
		channels: Arc<dyn TicketChannels>,
		exporter: Arc<dyn TranscriptExporter>,
		clock: Arc<dyn Clock>,
		settings: TicketSettings,
	) -> Self {
		let open_gate = CooldownGate::new(settings.open_cooldown_seconds, clock);
		Self {
			store,
			channels,
			exporter,
			open_gate,
			close_grace: Duration::from_secs(settings.close_grace_seconds),
		}
	}

	/// Opens a ticket for a user: allocates the next sequence number, creates
	/// the channel, posts the control surface, and records the ticket.
	pub async fn open(&self, author: UserId, author_name: &str) -> Result<Ticket, WardenError> {
		if let Err(remaining) = self.open_gate.try_pass(author) {
			return Err(WardenError::Validation(format!(
				"Please wait {} seconds before clicking again.",
				remaining.num_seconds()
			)));
		}

		let sequence_number = self.store.next_ticket_sequence().await?;
		let channel_name = format!("ticket-{}-{}", author_name, sequence_number);
		let channel_id = self.channels.create_channel(&channel_name, author).await?;
		self.channels.post_control_panel(channel_id).await?;

		let ticket = Ticket {
			channel_id,
			author_id: author,
			sequence_number,
		};
		self.store.put_ticket(ticket.clone()).await?;
		tracing::info!(author = %author, channel = %channel_id, sequence = sequence_number, "ticket opened");
		Ok(ticket)
	}

	/// Closes a ticket: disables the control surface, exports the transcript,
	/// deletes the row, posts the close log, and deletes the channel after
	/// the grace delay.
	///
	/// A second close of the same channel is rejected as [WardenError::NotFound].
	/// If the transcript export comes back empty, the close aborts before any
	/// row or channel is deleted so nothing is lost silently.
	pub async fn close(&self, channel: ChannelId, closed_by: UserId) -> Result<(), WardenError> {
		let Some(ticket) = self.store.ticket_for_channel(channel).await? else {
			return Err(WardenError::NotFound(String::from(
				"This channel doesn't have an open ticket.",
			)));
		};

		// Disable the close affordance first so repeated presses are
		// rejected at the UI layer while the export runs.
		self.channels.disable_control_panel(channel).await?;

		let Some(transcript) = self.exporter.export(channel).await? else {
			tracing::warn!(channel = %channel, "transcript export was empty, leaving ticket open");
			return Err(WardenError::ExternalService(String::from(
				"The ticket transcript could not be exported.",
			)));
		};

		self.store.delete_ticket(channel).await?;
		self.channels.post_close_log(closed_by, &ticket, &transcript).await?;

		sleep(self.close_grace).await;
		self.channels.delete_channel(channel).await?;
		tracing::info!(closed_by = %closed_by, channel = %channel, "ticket closed");
		Ok(())
	}
}
