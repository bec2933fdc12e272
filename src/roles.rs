// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use crate::error::WardenError;
use crate::model::{RoleId, UserId, UserRoleBinding};
use crate::platform::{GuildService, RoleAttributes};
use crate::store::RecordStore;
use miette::bail;
use std::collections::HashMap;
use std::sync::Arc;

/// How the roles of a category come to exist.
#[derive(Clone, Debug)]
pub enum CategoryKind {
	/// A fixed, configured set of roles the user picks one of (dorm halls,
	/// class years).
	Palette {
		roles: Vec<RoleId>,
		/// The user must hold at least one of these before selecting from the
		/// palette. Empty means no prerequisite.
		requires_any: Vec<RoleId>,
	},
	/// A per-user role created on demand and customized in place (color
	/// roles). New roles are positioned directly above the reference role.
	Custom { reference_role: RoleId },
	/// A single opt-in role the user grants and revokes for themselves.
	Toggle { role: RoleId },
}

/// A configured category of mutually exclusive roles.
#[derive(Clone, Debug)]
pub struct CategoryDefinition {
	pub name: String,
	pub kind: CategoryKind,
}

impl CategoryDefinition {
	/// Builds the typed category set from the configuration document,
	/// rejecting duplicate names and zero role IDs (zero is the clear
	/// sentinel and can't name a real role).
	pub fn from_config(config: &ConfigDocument) -> miette::Result<Vec<CategoryDefinition>> {
		let mut definitions: Vec<CategoryDefinition> = Vec::new();

		for palette in &config.palette_categories {
			let mut roles: Vec<RoleId> = Vec::new();
			for role in &palette.roles {
				if role.id == 0 {
					bail!("Role {} in category {} has the reserved ID 0", role.name, palette.name);
				}
				roles.push(RoleId(role.id));
			}
			let requires_any = palette.requires_any.iter().map(|id| RoleId(*id)).collect();
			definitions.push(CategoryDefinition {
				name: palette.name.clone(),
				kind: CategoryKind::Palette { roles, requires_any },
			});
		}
		for custom in &config.custom_categories {
			definitions.push(CategoryDefinition {
				name: custom.name.clone(),
				kind: CategoryKind::Custom {
					reference_role: RoleId(custom.reference_role),
				},
			});
		}
		for toggle in &config.toggle_roles {
			definitions.push(CategoryDefinition {
				name: toggle.name.clone(),
				kind: CategoryKind::Toggle { role: RoleId(toggle.id) },
			});
		}

		let mut seen: Vec<&str> = Vec::new();
		for definition in &definitions {
			if seen.contains(&definition.name.as_str()) {
				bail!("Duplicate category name: {}", definition.name);
			}
			seen.push(&definition.name);
		}

		Ok(definitions)
	}
}

/// Enforces "at most one active role per user per category" against the
/// guild's eventually consistent role state.
///
/// Binding rows are committed only after the corresponding external mutation
/// succeeds, so a failed platform call never leaves a committed-but-unapplied
/// binding behind.
pub struct RoleManager {
	store: Arc<dyn RecordStore>,
	guild: Arc<dyn GuildService>,
	categories: HashMap<String, CategoryKind>,
}

impl RoleManager {
	pub fn new(
		store: Arc<dyn RecordStore>,
		guild: Arc<dyn GuildService>,
		definitions: Vec<CategoryDefinition>,
	) -> Self {
		let categories = definitions
			.into_iter()
			.map(|definition| (definition.name, definition.kind))
			.collect();
		Self {
			store,
			guild,
			categories,
		}
	}

	fn category(&self, name: &str) -> Result<&CategoryKind, WardenError> {
		self.categories
			.get(name)
			.ok_or_else(|| WardenError::NotFound(format!("Unknown role category: {}", name)))
	}

	/// Creates or updates the user's role in a custom category.
	///
	/// If a binding exists and its role survives, the role's attributes are
	/// edited in place and the binding is returned unchanged in identity. If
	/// the role was deleted out-of-band, a fresh role is created and rebound.
	pub async fn assign(
		&self,
		user: UserId,
		category: &str,
		attributes: RoleAttributes,
	) -> Result<UserRoleBinding, WardenError> {
		let CategoryKind::Custom { reference_role } = self.category(category)? else {
			return Err(WardenError::Validation(format!(
				"Category {} doesn't support custom roles.",
				category
			)));
		};
		let reference_role = *reference_role;

		if let Some(binding) = self.store.get_role_binding(user, category).await? {
			if self.guild.get_role(binding.role_id).await?.is_some() {
				self.guild.edit_role(binding.role_id, attributes).await?;
				return Ok(binding);
			}
			// The bound role was deleted out from under us; recreate it.
			tracing::info!(user = %user, category, "bound role is gone, recreating");
			let role_id = self.guild.create_role(attributes, Some(reference_role)).await?;
			self.guild.add_role_to_user(user, role_id).await?;
			let binding = UserRoleBinding {
				user_id: user,
				category: category.to_string(),
				role_id,
			};
			self.store.put_role_binding(binding.clone()).await?;
			return Ok(binding);
		}

		let role_id = self.guild.create_role(attributes, Some(reference_role)).await?;
		self.guild.add_role_to_user(user, role_id).await?;
		let binding = UserRoleBinding {
			user_id: user,
			category: category.to_string(),
			role_id,
		};
		self.store.put_role_binding(binding.clone()).await?;
		Ok(binding)
	}

	/// Selects one role from a palette category, stripping every other role
	/// of the category from the user's live role set first so drifted state
	/// converges back to a single role. [RoleId::NONE] clears the category.
	pub async fn select(
		&self,
		user: UserId,
		category: &str,
		role: RoleId,
	) -> Result<Option<UserRoleBinding>, WardenError> {
		let CategoryKind::Palette { roles, requires_any } = self.category(category)? else {
			return Err(WardenError::Validation(format!(
				"Category {} doesn't use a fixed role set.",
				category
			)));
		};
		let palette = roles.clone();
		let requires_any = requires_any.clone();

		let live_roles = self.guild.get_user_roles(user).await?;
		if !requires_any.is_empty() && !live_roles.iter().any(|role| requires_any.contains(role)) {
			return Err(WardenError::Validation(String::from(
				"You must verify your email before selecting a role from this category.",
			)));
		}

		if role.is_none() {
			for live_role in &live_roles {
				if palette.contains(live_role) {
					self.remove_role_idempotent(user, *live_role).await?;
				}
			}
			self.store.delete_role_binding(user, category).await?;
			return Ok(None);
		}

		if !palette.contains(&role) {
			return Err(WardenError::Validation(format!(
				"That role isn't part of the {} category.",
				category
			)));
		}

		for live_role in &live_roles {
			if *live_role != role && palette.contains(live_role) {
				self.remove_role_idempotent(user, *live_role).await?;
			}
		}
		self.guild.add_role_to_user(user, role).await?;

		let binding = UserRoleBinding {
			user_id: user,
			category: category.to_string(),
			role_id: role,
		};
		self.store.put_role_binding(binding.clone()).await?;
		Ok(Some(binding))
	}

	/// Grants the toggle role if the user lacks it, revokes it otherwise.
	/// Returns whether the user holds the role afterward.
	pub async fn toggle(&self, user: UserId, category: &str) -> Result<bool, WardenError> {
		let CategoryKind::Toggle { role } = self.category(category)? else {
			return Err(WardenError::Validation(format!("Category {} isn't a toggle role.", category)));
		};
		let role = *role;

		let live_roles = self.guild.get_user_roles(user).await?;
		if live_roles.contains(&role) {
			self.remove_role_idempotent(user, role).await?;
			Ok(false)
		} else {
			self.guild.add_role_to_user(user, role).await?;
			Ok(true)
		}
	}

	/// The platform reporting a role as already absent is a no-op, not an
	/// error.
	async fn remove_role_idempotent(&self, user: UserId, role: RoleId) -> Result<(), WardenError> {
		match self.guild.remove_role_from_user(user, role).await {
			Ok(()) | Err(WardenError::NotFound(_)) => Ok(()),
			Err(error) => Err(error),
		}
	}
}
