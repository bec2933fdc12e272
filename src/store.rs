// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::WardenError;
use crate::model::{ChannelId, FinalizedVerification, MessageId, PendingVerification, StarboardEntry, Ticket, UserId, UserRoleBinding};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// The persistence capability all components share.
///
/// Backends provide read-your-writes consistency per call but no multi-row
/// transactions; the components enforce their invariants by read-then-write
/// sequencing. Backend failures surface as [WardenError::ExternalService].
#[async_trait]
pub trait RecordStore: Send + Sync {
	async fn get_role_binding(&self, user: UserId, category: &str) -> Result<Option<UserRoleBinding>, WardenError>;
	/// Inserts or replaces the binding for (binding.user_id, binding.category).
	async fn put_role_binding(&self, binding: UserRoleBinding) -> Result<(), WardenError>;
	async fn delete_role_binding(&self, user: UserId, category: &str) -> Result<(), WardenError>;

	/// Loads every pending verification for a user. Only one should exist,
	/// but callers must tolerate duplicates.
	async fn pending_verifications_for_user(&self, user: UserId) -> Result<Vec<PendingVerification>, WardenError>;
	async fn put_pending_verification(&self, pending: PendingVerification) -> Result<(), WardenError>;
	async fn delete_pending_verifications_for_user(&self, user: UserId) -> Result<(), WardenError>;

	async fn finalized_verification_for_email(&self, email: &str) -> Result<Option<FinalizedVerification>, WardenError>;
	async fn finalized_verification_for_user(&self, user: UserId) -> Result<Option<FinalizedVerification>, WardenError>;
	async fn put_finalized_verification(&self, finalized: FinalizedVerification) -> Result<(), WardenError>;

	/// Allocates the next ticket sequence number from the singleton counter
	/// row, creating the counter at 1 on first use. The read-modify-write is
	/// atomic with respect to concurrent opens.
	async fn next_ticket_sequence(&self) -> Result<u64, WardenError>;
	async fn ticket_for_channel(&self, channel: ChannelId) -> Result<Option<Ticket>, WardenError>;
	async fn put_ticket(&self, ticket: Ticket) -> Result<(), WardenError>;
	async fn delete_ticket(&self, channel: ChannelId) -> Result<(), WardenError>;

	async fn starboard_entry(&self, original: MessageId) -> Result<Option<StarboardEntry>, WardenError>;
	/// Inserts or replaces the entry for entry.original_message_id.
	async fn put_starboard_entry(&self, entry: StarboardEntry) -> Result<(), WardenError>;
	async fn delete_starboard_entry(&self, original: MessageId) -> Result<(), WardenError>;
}

#[derive(Default)]
struct MemoryStoreData {
	role_bindings: HashMap<(UserId, String), UserRoleBinding>,
	pending_verifications: Vec<PendingVerification>,
	finalized_verifications: Vec<FinalizedVerification>,
	ticket_counter: Option<u64>,
	tickets: HashMap<ChannelId, Ticket>,
	starboard_entries: HashMap<MessageId, StarboardEntry>,
}

/// An in-process [RecordStore]. Individual operations are serialized behind a
/// lock, but logical read-then-write sequences across calls are not, matching
/// the consistency a relational backend would give the components.
#[derive(Default)]
pub struct MemoryStore {
	data: Mutex<MemoryStoreData>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl RecordStore for MemoryStore {
	async fn get_role_binding(&self, user: UserId, category: &str) -> Result<Option<UserRoleBinding>, WardenError> {
		let data = self.data.lock().await;
		Ok(data.role_bindings.get(&(user, category.to_string())).cloned())
	}

	async fn put_role_binding(&self, binding: UserRoleBinding) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.role_bindings
			.insert((binding.user_id, binding.category.clone()), binding);
		Ok(())
	}

	async fn delete_role_binding(&self, user: UserId, category: &str) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.role_bindings.remove(&(user, category.to_string()));
		Ok(())
	}

	async fn pending_verifications_for_user(&self, user: UserId) -> Result<Vec<PendingVerification>, WardenError> {
		let data = self.data.lock().await;
		Ok(data
			.pending_verifications
			.iter()
			.filter(|pending| pending.user_id == user)
			.cloned()
			.collect())
	}

	async fn put_pending_verification(&self, pending: PendingVerification) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.pending_verifications.push(pending);
		Ok(())
	}

	async fn delete_pending_verifications_for_user(&self, user: UserId) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.pending_verifications.retain(|pending| pending.user_id != user);
		Ok(())
	}

	async fn finalized_verification_for_email(&self, email: &str) -> Result<Option<FinalizedVerification>, WardenError> {
		let data = self.data.lock().await;
		Ok(data
			.finalized_verifications
			.iter()
			.find(|finalized| finalized.email == email)
			.cloned())
	}

	async fn finalized_verification_for_user(&self, user: UserId) -> Result<Option<FinalizedVerification>, WardenError> {
		let data = self.data.lock().await;
		Ok(data
			.finalized_verifications
			.iter()
			.find(|finalized| finalized.user_id == user)
			.cloned())
	}

	async fn put_finalized_verification(&self, finalized: FinalizedVerification) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.finalized_verifications.push(finalized);
		Ok(())
	}

	async fn next_ticket_sequence(&self) -> Result<u64, WardenError> {
		let mut data = self.data.lock().await;
		let counter = data.ticket_counter.get_or_insert(1);
		let sequence = *counter;
		*counter += 1;
		Ok(sequence)
	}

	async fn ticket_for_channel(&self, channel: ChannelId) -> Result<Option<Ticket>, WardenError> {
		let data = self.data.lock().await;
		Ok(data.tickets.get(&channel).cloned())
	}

	async fn put_ticket(&self, ticket: Ticket) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.tickets.insert(ticket.channel_id, ticket);
		Ok(())
	}

	async fn delete_ticket(&self, channel: ChannelId) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.tickets.remove(&channel);
		Ok(())
	}

	async fn starboard_entry(&self, original: MessageId) -> Result<Option<StarboardEntry>, WardenError> {
		let data = self.data.lock().await;
		Ok(data.starboard_entries.get(&original).cloned())
	}

	async fn put_starboard_entry(&self, entry: StarboardEntry) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.starboard_entries.insert(entry.original_message_id, entry);
		Ok(())
	}

	async fn delete_starboard_entry(&self, original: MessageId) -> Result<(), WardenError> {
		let mut data = self.data.lock().await;
		data.starboard_entries.remove(&original);
		Ok(())
	}
}
