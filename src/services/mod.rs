// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

pub mod agent;
pub mod llm;
pub mod prompt;
pub mod safety;
pub mod settings;
pub mod tools;
