// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Explicit driver registry, replacing the source's dlopen/dlsym-by-name-
//! pattern dynamic loading with a `HashMap<String, DriverFactory>` — the
//! redesign `spec.md` §9 calls for. Mirrors
//! `trx-backend`'s `RegistrationContext`.

use std::collections::HashMap;

use radiod_app::normalize_name;
use radiod_core::EngineError;

use crate::driver::FrontendDriver;

pub type DriverFactory = fn() -> Box<dyn FrontendDriver>;

#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: DriverFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn build(&self, name: &str) -> Result<Box<dyn FrontendDriver>, EngineError> {
        let key = normalize_name(name);
        let factory = self.factories.get(&key).ok_or_else(|| {
            EngineError::HardwareSetup(format!("no driver registered for {:?}", name))
        })?;
        Ok(factory())
    }

    pub fn extend_from(&mut self, other: &DriverRegistry) {
        for (name, factory) in &other.factories {
            self.factories.insert(name.clone(), *factory);
        }
    }
}

/// Registers the drivers compiled directly into this binary: `sig_gen`
/// always, `soapysdr`-backed `rtlsdr` when the `soapysdr` feature is
/// enabled. Matches `trx-backend::register_builtin_backends_on`'s shape.
pub fn register_builtin_drivers(registry: &mut DriverRegistry) {
    registry.register("sig_gen", || Box::new(crate::drivers::sig_gen::SigGenDriver::new()));

    #[cfg(feature = "soapysdr")]
    registry.register("rtlsdr", || {
        Box::new(crate::drivers::soapysdr::SoapySdrDriver::new("driver=rtlsdr"))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sig_gen_is_always_registered() {
        let mut registry = DriverRegistry::new();
        register_builtin_drivers(&mut registry);
        assert!(registry.is_registered("SIG_GEN"));
        assert!(registry.build("sig_gen").is_ok());
    }

    #[test]
    fn unknown_driver_is_an_error() {
        let registry = DriverRegistry::new();
        assert!(registry.build("rx888").is_err());
    }
}
