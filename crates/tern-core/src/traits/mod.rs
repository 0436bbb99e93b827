// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the runtime and its I/O.

pub mod transport;

pub use transport::{Connector, Transport};
