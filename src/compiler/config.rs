//! Configuration of a pass pipeline.
//!
//! Configuration is an in-memory value built by the embedder; nothing here reads files.

use std::{collections::HashMap, fmt};

use log::warn;

/// A single pass option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// Boolean switch
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Free-form text
    Str(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Str(value) => write!(f, "\"{value}\""),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

/// Options of one pass, keyed by option name.
///
/// Typed getters fall back to the given default when a key is absent, and log a
/// warning when it holds a value of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassConfig {
    values: HashMap<String, ConfigValue>,
}

impl PassConfig {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` and returns the updated set.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// The raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Reads a boolean option.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None => default,
            Some(ConfigValue::Bool(value)) => *value,
            Some(other) => {
                warn!("Option {key} expects a boolean, got {other}; using {default}");
                default
            }
        }
    }

    /// Reads a non-negative integer option.
    #[must_use]
    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        match self.values.get(key) {
            None => default,
            Some(ConfigValue::Int(value)) => match usize::try_from(*value) {
                Ok(value) => value,
                Err(_) => {
                    warn!("Option {key} must not be negative, got {value}; using {default}");
                    default
                }
            },
            Some(other) => {
                warn!("Option {key} expects an integer, got {other}; using {default}");
                default
            }
        }
    }

    /// Reads a text option.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Configuration handed to every pass of a [`crate::compiler::PassManager`] run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Walk method bodies on the rayon thread pool (default: `true`)
    pub parallel: bool,
    /// Per-pass options keyed by pass name
    pub passes: HashMap<String, PassConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            parallel: true,
            passes: HashMap::new(),
        }
    }
}

impl Config {
    /// Enables or disables parallel method walks.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the options of the pass named `pass`.
    #[must_use]
    pub fn with_pass_config(mut self, pass: &str, config: PassConfig) -> Self {
        self.passes.insert(pass.to_string(), config);
        self
    }

    /// The options of the pass named `pass`, empty if none were set.
    #[must_use]
    pub fn pass_config(&self, pass: &str) -> PassConfig {
        self.passes.get(pass).cloned().unwrap_or_default()
    }
}
