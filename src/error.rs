// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::Diagnostic;
use thiserror::Error;

const GENERIC_FAILURE_MESSAGE: &str = "Oops! Something went wrong. Please try again later.";

/// The failure taxonomy shared by all of the components.
///
/// Every variant carries the message shown to the user who initiated the
/// operation; the platform adapter decides presentation and logs the error for
/// operator diagnosis.
#[derive(Debug, Diagnostic, Error)]
pub enum WardenError {
	/// The user's input was malformed or out of range. Nothing was mutated,
	/// and retrying with the same input will fail the same way.
	#[error("{0}")]
	#[diagnostic(code(warden::validation))]
	Validation(String),

	/// The operation conflicts with state already committed for another user
	/// (or the same user). Nothing was mutated.
	#[error("{0}")]
	#[diagnostic(code(warden::conflict))]
	Conflict(String),

	/// An external collaborator (role API, mail dispatch, transcript export)
	/// failed. The local operation aborted before committing its state row;
	/// the user may retry the whole operation.
	#[error("{0}")]
	#[diagnostic(code(warden::external_service))]
	ExternalService(String),

	/// A referenced record or resource doesn't exist. Callers recover where
	/// possible (recreating a stale role) and reject otherwise.
	#[error("{0}")]
	#[diagnostic(code(warden::not_found))]
	NotFound(String),
}

impl WardenError {
	/// The message to show the initiating user. External failures get a
	/// generic message; the underlying error is for the operator log only.
	pub fn user_message(&self) -> String {
		match self {
			Self::ExternalService(_) => String::from(GENERIC_FAILURE_MESSAGE),
			other => other.to_string(),
		}
	}

	/// Whether it makes sense to tell the user to retry. There is no
	/// automatic retry loop anywhere; all retries are user-initiated.
	pub fn retry_may_succeed(&self) -> bool {
		matches!(self, Self::ExternalService(_))
	}
}
