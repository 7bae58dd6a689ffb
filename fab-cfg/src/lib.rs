//! Configuration flags for `fab` itself.
//!
//! A [`Config`] is declared once as a `static`, registered into a [`ConfigSetBuilder`], and then
//! read from the resulting [`ConfigSet`]. Values can be overridden at runtime, e.g. from the
//! command line, either with a typed value or by parsing a string.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use compact_str::CompactString;
use fab_ore::assert_none;

/// A single configuration setting.
pub struct Config<V: ConfigType> {
    name: &'static str,
    desc: &'static str,
    default: V,
}

impl<V: ConfigType> Config<V> {
    /// Define a new [`Config`] with a default value.
    pub const fn new(name: &'static str, desc: &'static str, default: V) -> Self {
        Config {
            name,
            desc,
            default,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the value of this [`Config`] from the provided [`ConfigSet`].
    ///
    /// # Panics
    /// * If this [`Config`] was never registered with the [`ConfigSetBuilder`].
    pub fn read(&self, set: &ConfigSet) -> V::Owned {
        let Some(entry) = set.configs.get(self.name) else {
            panic!("tried to read unregistered config {}", self.name);
        };
        let value = entry.value.read().expect("config lock poisoned");
        V::from_value(&value)
    }
}

/// A shareable set of [`Config`]s. Clones observe each other's updates.
#[derive(Clone, Debug)]
pub struct ConfigSet {
    configs: Arc<BTreeMap<CompactString, ConfigSetEntry>>,
}

impl ConfigSet {
    /// Returns a new [`ConfigSetBuilder`].
    pub fn builder() -> ConfigSetBuilder {
        ConfigSetBuilder::default()
    }

    /// Update [`Config`] in this [`ConfigSet`] with the specified value.
    ///
    /// # Panics
    /// * If [`Config`] was not previously registered with the [`ConfigSetBuilder`] this set was built from.
    pub fn update<V: ConfigType>(&self, config: &'static Config<V>, value: V) {
        let entry = self
            .configs
            .get(config.name)
            .expect("tried to update unregistered config");
        *entry.value.write().expect("config lock poisoned") = value.into_value();
    }

    /// Update the [`Config`] in this [`ConfigSet`] with `name` to `value`.
    ///
    /// # Errors
    ///
    /// * If no config named `name` exists in this set.
    /// * If the config specified by `name` cannot parse `value`.
    ///
    pub fn try_update(&self, name: &str, value: &str) -> Result<(), anyhow::Error> {
        let entry = self
            .configs
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("no config named '{name}' found"))?;
        let mut current = entry.value.write().expect("config lock poisoned");
        let parsed = current.parse_same_kind(value)?;
        *current = parsed;
        Ok(())
    }

    /// Parse a `name=value` override and apply it with [`ConfigSet::try_update`].
    pub fn try_update_pair(&self, pair: &str) -> Result<(), anyhow::Error> {
        let Some((name, value)) = pair.split_once('=') else {
            anyhow::bail!("expected 'name=value', found '{pair}'");
        };
        self.try_update(name.trim(), value.trim())
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in &*self.configs {
            let value = entry.value.read().expect("config lock poisoned");
            writeln!(f, "{} => {}\n\t└─ '{}'", name, value, entry.desc)?;
        }
        Ok(())
    }
}

/// Single entry within a [`ConfigSet`].
#[derive(Debug)]
struct ConfigSetEntry {
    value: RwLock<ConfigValue>,
    desc: &'static str,
}

/// A builder for a [`ConfigSet`].
#[derive(Default, Debug)]
pub struct ConfigSetBuilder {
    configs: BTreeMap<CompactString, ConfigSetEntry>,
}

impl ConfigSetBuilder {
    /// Register a [`Config`] into this [`ConfigSetBuilder`] with its default value.
    ///
    /// # Panics
    /// * If a config with the same name was already registered.
    pub fn register<V: ConfigType>(&mut self, config: &'static Config<V>) -> &mut Self {
        let entry = ConfigSetEntry {
            value: RwLock::new(config.default.into_value()),
            desc: config.desc,
        };
        let prev = self
            .configs
            .insert(CompactString::const_new(config.name), entry);
        assert_none!(prev, "config '{}' registered more than once", config.name);
        self
    }

    /// Consumes this [`ConfigSetBuilder`] constructing a [`ConfigSet`].
    pub fn build(self) -> ConfigSet {
        ConfigSet {
            configs: Arc::new(self.configs),
        }
    }
}

/// Types that can be stored in a [`Config`].
pub trait ConfigType {
    /// What a read of the config hands back.
    type Owned;

    fn into_value(&self) -> ConfigValue;
    fn from_value(value: &ConfigValue) -> Self::Owned;
}

impl ConfigType for bool {
    type Owned = bool;

    fn into_value(&self) -> ConfigValue {
        ConfigValue::Bool(*self)
    }

    fn from_value(value: &ConfigValue) -> bool {
        let ConfigValue::Bool(val) = value else {
            panic!("programming error, found {value:?} for bool")
        };
        *val
    }
}

impl ConfigType for &'static str {
    type Owned = CompactString;

    fn into_value(&self) -> ConfigValue {
        ConfigValue::String(CompactString::new(self))
    }

    fn from_value(value: &ConfigValue) -> CompactString {
        let ConfigValue::String(val) = value else {
            panic!("programming error, found {value:?} for string")
        };
        val.clone()
    }
}

/// "Type erased" configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    String(CompactString),
}

impl ConfigValue {
    /// Parse `raw` into a value of the same kind as `self`.
    fn parse_same_kind(&self, raw: &str) -> Result<ConfigValue, anyhow::Error> {
        match self {
            ConfigValue::Bool(_) => {
                let val: bool = raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("expected 'true' or 'false', found '{raw}'"))?;
                Ok(ConfigValue::Bool(val))
            }
            ConfigValue::String(_) => Ok(ConfigValue::String(CompactString::new(raw))),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(val) => write!(f, "{val}"),
            ConfigValue::String(val) => write!(f, "{val}"),
        }
    }
}
