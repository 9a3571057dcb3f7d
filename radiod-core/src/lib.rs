// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod error;

pub use error::{EngineError, ExitCode};

/// Error-boxing alias used at the few seams where heterogeneous error types
/// legitimately meet (plugin loading, top-level `main`).
pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
