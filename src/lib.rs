// © 2025-2026 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod config;
pub mod cooldown;
pub mod error;
pub mod model;
pub mod platform;
pub mod roles;
pub mod starboard;
pub mod store;
pub mod tickets;
pub mod verification;
