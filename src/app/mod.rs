//! Binary-side application modules.

pub(crate) mod config;
pub(crate) mod instance;
pub(crate) mod runtime;
pub(crate) mod tags;
