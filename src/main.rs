// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hearth_warden::config::parse_config;
use hearth_warden::roles::CategoryDefinition;
use hearth_warden::starboard::StarboardSettings;
use hearth_warden::tickets::TicketSettings;
use hearth_warden::verification::VerificationSettings;

#[tokio::main]
async fn main() -> miette::Result<()> {
	tracing_subscriber::fmt::init();

	let config = parse_config("config.kdl").await?;
	let categories = CategoryDefinition::from_config(&config)?;
	let verification = VerificationSettings::from_config(&config.verification);
	let tickets = TicketSettings::from_config(&config.tickets);
	let starboard = StarboardSettings::from_config(&config.starboard);

	tracing::info!(
		categories = categories.len(),
		majors = verification.majors.len(),
		email_suffix = %verification.email_suffix,
		ticket_cooldown = tickets.open_cooldown_seconds,
		star_threshold = starboard.threshold,
		"configuration OK"
	);

	Ok(())
}
