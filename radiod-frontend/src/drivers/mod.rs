// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod sig_gen;

#[cfg(feature = "soapysdr")]
pub mod soapysdr;
