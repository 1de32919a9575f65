// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod message;
mod suggestion;
mod transcript;

pub use message::*;
pub use suggestion::*;
pub use transcript::*;
