// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::StarboardConfig;
use crate::error::WardenError;
use crate::model::{MessageId, StarboardEntry};
use crate::platform::StarboardHost;
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct StarboardSettings {
	/// The star count at which a message earns a starboard entry.
	pub threshold: u32,
	/// The emoji that counts as a star.
	pub emoji: String,
}

impl StarboardSettings {
	pub fn from_config(config: &StarboardConfig) -> Self {
		Self {
			threshold: config.threshold,
			emoji: config.emoji.clone(),
		}
	}
}

/// Maintains the starboard from reaction events.
///
/// Every event triggers a recompute of the star count from the platform's
/// current reaction state rather than an incremental tally, so missed or
/// duplicated events can't make the board drift from the source of truth.
pub struct Starboard {
	store: Arc<dyn RecordStore>,
	host: Arc<dyn StarboardHost>,
	settings: StarboardSettings,
}

impl Starboard {
	pub fn new(store: Arc<dyn RecordStore>, host: Arc<dyn StarboardHost>, settings: StarboardSettings) -> Self {
		Self { store, host, settings }
	}

	/// Handles a reaction being added to or removed from a message. Both
	/// event directions run the same reconciliation.
	pub async fn handle_reaction_event(&self, emoji: &str, message: MessageId) -> Result<(), WardenError> {
		if emoji != self.settings.emoji {
			return Ok(());
		}

		let star_count = self.host.star_count(message).await?;
		let entry = self.store.starboard_entry(message).await?;

		if star_count >= self.settings.threshold {
			match entry {
				Some(mut entry) => {
					self.host.edit_entry(entry.starboard_message_id, star_count).await?;
					entry.star_count = star_count;
					self.store.put_starboard_entry(entry).await?;
				}
				None => {
					let starboard_message_id = self.host.post_entry(message, star_count).await?;
					self.store
						.put_starboard_entry(StarboardEntry {
							original_message_id: message,
							starboard_message_id,
							star_count,
						})
						.await?;
					tracing::info!(message = %message, star_count, "message promoted to starboard");
				}
			}
		} else if let Some(entry) = entry {
			self.host.delete_entry(entry.starboard_message_id).await?;
			self.store.delete_starboard_entry(message).await?;
		}

		Ok(())
	}
}
