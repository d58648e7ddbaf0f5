use std::collections::HashMap;
use std::fmt;

use odl_types::PASSTHROUGH_CONVERTER;
use tracing::debug;

use super::builtin::{INT2IP_CONVERTER, Int2Ip, Passthrough, SUM_CONVERTER, Sum};
use super::{Converter, ConverterKind};
use crate::error::RegistryError;
use crate::value::{StagedRow, StagedValue};

/// Named converters available to queries.
///
/// [`ConverterRegistry::default`] includes the built-ins; [`ConverterRegistry::new`]
/// starts empty.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registry with `none`, `int2ip` and `sum`.
    pub fn with_builtins() -> Self {
        let mut converters = HashMap::new();
        converters.insert(PASSTHROUGH_CONVERTER.to_string(), Converter::per_row(Passthrough));
        converters.insert(INT2IP_CONVERTER.to_string(), Converter::per_row(Int2Ip));
        converters.insert(SUM_CONVERTER.to_string(), Converter::aggregate(Sum));
        Self { converters }
    }

    pub fn register(&mut self, name: impl Into<String>, converter: Converter) -> Result<(), RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.converters.contains_key(&name) {
            return Err(RegistryError::DuplicateConverter(name));
        }
        debug!(converter = %name, kind = ?converter.kind(), "registered converter");
        self.converters.insert(name, converter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.converters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ConverterKind> {
        self.get(name).map(Converter::kind)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the per-row step of converter `name` on one staged value.
    ///
    /// Null and error values pass through untouched. A failing converter
    /// yields [`StagedValue::Error`]. Aggregates are deferred: the value is
    /// returned as-is and replaced once every row is built.
    pub fn convert(&self, name: &str, value: &StagedValue, row: &StagedRow) -> Result<StagedValue, RegistryError> {
        self.get(name)
            .map(|converter| converter.apply(value, row))
            .ok_or_else(|| RegistryError::UnknownConverter(name.to_string()))
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry").field("converters", &self.names()).finish()
    }
}
