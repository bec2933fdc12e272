// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use knus::Decode;
use miette::{IntoDiagnostic, Result};
use tokio::fs::read_to_string;

pub async fn parse_config(config_path: &str) -> Result<ConfigDocument> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	let config = knus::parse(config_path, &config_file_contents)?;
	Ok(config)
}

#[derive(Debug, Decode)]
pub struct ConfigDocument {
	#[knus(child)]
	pub verification: VerificationConfig,
	#[knus(child)]
	pub tickets: TicketConfig,
	#[knus(child)]
	pub starboard: StarboardConfig,
	#[knus(children(name = "palette-category"))]
	pub palette_categories: Vec<PaletteCategoryConfig>,
	#[knus(children(name = "custom-category"))]
	pub custom_categories: Vec<CustomCategoryConfig>,
	#[knus(children(name = "toggle-role"))]
	pub toggle_roles: Vec<ToggleRoleConfig>,
}

#[derive(Debug, Decode)]
pub struct VerificationConfig {
	/// The suffix institutional email addresses must carry, e.g. "@rpi.edu".
	#[knus(child, unwrap(argument))]
	pub email_suffix: String,
	#[knus(child, unwrap(argument))]
	pub min_class_year: u16,
	#[knus(child, unwrap(argument))]
	pub max_class_year: u16,
	/// The class year of the current admission cycle; verified users of this
	/// year get the new member role rather than the continuing member role.
	#[knus(child, unwrap(argument))]
	pub admission_year: u16,
	#[knus(child, unwrap(argument))]
	pub new_member_role: u64,
	#[knus(child, unwrap(argument))]
	pub continuing_member_role: u64,
	#[knus(child, unwrap(argument))]
	pub request_cooldown_seconds: i64,
	/// The major catalog offered after code confirmation. Leave empty to
	/// finalize verification directly on redemption.
	#[knus(children(name = "major"))]
	pub majors: Vec<MajorConfig>,
}

#[derive(Debug, Decode)]
pub struct MajorConfig {
	#[knus(argument)]
	pub name: String,
	#[knus(argument)]
	pub short_name: String,
}

#[derive(Debug, Decode)]
pub struct TicketConfig {
	#[knus(child, unwrap(argument))]
	pub open_cooldown_seconds: i64,
	/// How long to wait after closing before the ticket channel is deleted,
	/// letting in-flight acknowledgements land first.
	#[knus(child, unwrap(argument))]
	pub close_grace_seconds: u64,
}

#[derive(Debug, Decode)]
pub struct StarboardConfig {
	#[knus(child, unwrap(argument))]
	pub threshold: u32,
	#[knus(child, unwrap(argument))]
	pub emoji: String,
}

/// A category whose roles are a fixed, configured palette (dorm halls, class
/// years). Users pick one; the manager keeps it exclusive.
#[derive(Debug, Decode)]
pub struct PaletteCategoryConfig {
	#[knus(argument)]
	pub name: String,
	#[knus(children(name = "role"))]
	pub roles: Vec<PaletteRoleConfig>,
	/// Roles of which the user must hold at least one before selecting from
	/// this palette (e.g. a verified tier before picking a dorm).
	#[knus(child, unwrap(arguments), default)]
	pub requires_any: Vec<u64>,
}

#[derive(Debug, Decode)]
pub struct PaletteRoleConfig {
	#[knus(argument)]
	pub name: String,
	#[knus(argument)]
	pub id: u64,
}

/// A category whose role is created per user on demand (custom color roles).
#[derive(Debug, Decode)]
pub struct CustomCategoryConfig {
	#[knus(argument)]
	pub name: String,
	/// New roles are positioned directly above this role so the custom color
	/// wins over the default member colors.
	#[knus(child, unwrap(argument))]
	pub reference_role: u64,
}

/// A single opt-in role users can freely grant and revoke for themselves.
#[derive(Debug, Decode)]
pub struct ToggleRoleConfig {
	#[knus(argument)]
	pub name: String,
	#[knus(argument)]
	pub id: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE_CONFIG: &str = r#"
verification {
	email-suffix "@rpi.edu"
	min-class-year 2022
	max-class-year 2030
	admission-year 2028
	new-member-role 1161340010822385694
	continuing-member-role 1161340460242063557
	request-cooldown-seconds 180
	major "Computer Science" "CS"
	major "Other" "Other"
}
tickets {
	open-cooldown-seconds 180
	close-grace-seconds 4
}
starboard {
	threshold 5
	emoji "⭐"
}
palette-category "dorm" {
	role "Bray" 1260475859664633957
	role "Warren" 1260475864165122071
	requires-any 1161340010822385694 1161340460242063557
}
palette-category "class-year" {
	role "Class of 2028" 1260117774059962450
	role "Class of 2029" 1260117774059962451
}
custom-category "color" {
	reference-role 1216596310619328642
}
toggle-role "Roblox" 1239657271143698564
"#;

	#[test]
	fn sample_config_parses() {
		let config: ConfigDocument = knus::parse("sample.kdl", SAMPLE_CONFIG).expect("sample config parses");
		assert_eq!(config.verification.email_suffix, "@rpi.edu");
		assert_eq!(config.verification.majors.len(), 2);
		assert_eq!(config.starboard.threshold, 5);
		assert_eq!(config.palette_categories.len(), 2);
		assert_eq!(config.palette_categories[0].requires_any.len(), 2);
		assert!(config.palette_categories[1].requires_any.is_empty());
		assert_eq!(config.custom_categories[0].reference_role, 1216596310619328642);
		assert_eq!(config.toggle_roles[0].name, "Roblox");
	}
}
