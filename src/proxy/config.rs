//! Settings shared by all proxy requests of a [`Proxetta`](super::Proxetta).

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

/// Suffix of subclass proxies when none is configured.
pub const SUBCLASS_SUFFIX: &str = "$$Proxetta";

/// Suffix of wrappers when none is configured.
pub const WRAPPER_SUFFIX: &str = "$$Clonetou";

static CLASS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns the next value of the process-wide counter used for variable class names.
pub(crate) fn next_class_number() -> u64 {
    CLASS_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Configuration of a [`Proxetta`](super::Proxetta).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxettaConfig {
    /// Suffix appended to the name of every produced class. `None` selects
    /// [`SUBCLASS_SUFFIX`] or [`WRAPPER_SUFFIX`] depending on the mode.
    pub class_name_suffix: Option<String>,
    /// Appends a process-wide increasing number to the suffix, so that the same target can be
    /// proxied more than once in a single class loader.
    pub variable_class_name: bool,
    /// Produces a class even if no method is woven.
    pub forced: bool,
    /// Folder in which every produced class is written, for inspection.
    pub debug_folder: Option<PathBuf>,
    /// The names of the members generated in proxies.
    pub names: ProxyNames,
}

impl ProxettaConfig {
    /// Sets [`Self::class_name_suffix`].
    #[must_use]
    pub fn with_class_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_name_suffix = Some(suffix.into());
        self
    }

    /// Sets [`Self::variable_class_name`].
    #[must_use]
    pub fn with_variable_class_name(mut self, variable_class_name: bool) -> Self {
        self.variable_class_name = variable_class_name;
        self
    }

    /// Sets [`Self::forced`].
    #[must_use]
    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    /// Sets [`Self::debug_folder`].
    #[must_use]
    pub fn with_debug_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.debug_folder = Some(folder.into());
        self
    }

    /// Sets [`Self::names`].
    #[must_use]
    pub fn with_names(mut self, names: ProxyNames) -> Self {
        self.names = names;
        self
    }
}

/// Naming conventions of the members generated in proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyNames {
    /// The name of the advice method holding the woven code.
    pub execute_method: String,
    /// Prefix of chain methods.
    pub method_prefix: String,
    /// Prefix of copied advice methods.
    pub advice_method_prefix: String,
    /// Separates the method name from the aspect index.
    pub method_divider: String,
    /// Prefix of copied advice fields.
    pub field_prefix: String,
    /// Separates the field name from the aspect index.
    pub field_divider: String,
    /// The method called by every constructor of the proxy to initialize the advices.
    pub init_method: String,
    /// The base name of copied advice constructors.
    pub advice_init_method: String,
    /// The base name of copied advice static initializers.
    pub advice_clinit_method: String,
    /// The field holding the target in wrappers.
    pub wrapper_target_field: String,
}

impl Default for ProxyNames {
    fn default() -> Self {
        Self {
            execute_method: "execute".to_owned(),
            method_prefix: String::new(),
            advice_method_prefix: "$__".to_owned(),
            method_divider: "$".to_owned(),
            field_prefix: "$__".to_owned(),
            field_divider: "$".to_owned(),
            init_method: "$__init".to_owned(),
            advice_init_method: "$__init".to_owned(),
            advice_clinit_method: "$__clinit".to_owned(),
            wrapper_target_field: "_target".to_owned(),
        }
    }
}

impl ProxyNames {
    /// The name of a chain method.
    #[must_use]
    pub fn method_name(&self, name: &str, aspect_index: usize) -> String {
        format!(
            "{}{name}{}{aspect_index}",
            self.method_prefix, self.method_divider
        )
    }

    /// The name of a copied advice method.
    #[must_use]
    pub fn advice_method_name(&self, name: &str, aspect_index: usize) -> String {
        format!(
            "{}{name}{}{aspect_index}",
            self.advice_method_prefix, self.method_divider
        )
    }

    /// The name of a copied advice field.
    #[must_use]
    pub fn field_name(&self, name: &str, aspect_index: usize) -> String {
        format!(
            "{}{name}{}{aspect_index}",
            self.field_prefix, self.field_divider
        )
    }

    /// The name of the copy of the constructor of an advice.
    #[must_use]
    pub fn advice_init_name(&self, aspect_index: usize) -> String {
        format!(
            "{}{}{aspect_index}",
            self.advice_init_method, self.method_divider
        )
    }

    /// The name of the copy of the static initializer of an advice.
    #[must_use]
    pub fn advice_clinit_name(&self, aspect_index: usize) -> String {
        format!(
            "{}{}{aspect_index}",
            self.advice_clinit_method, self.method_divider
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names() {
        let names = ProxyNames::default();
        assert_eq!(names.method_name("find", 2), "find$2");
        assert_eq!(names.advice_method_name("find", 2), "$__find$2");
        assert_eq!(names.field_name("counter", 0), "$__counter$0");
        assert_eq!(names.advice_init_name(1), "$__init$1");
        assert_eq!(names.advice_clinit_name(3), "$__clinit$3");
    }

    #[test]
    fn builder_setters() {
        let config = ProxettaConfig::default()
            .with_class_name_suffix("$$Woven")
            .with_variable_class_name(true)
            .with_forced(true)
            .with_debug_folder("/tmp/proxies");
        assert_eq!(config.class_name_suffix.as_deref(), Some("$$Woven"));
        assert!(config.variable_class_name);
        assert!(config.forced);
        assert_eq!(config.debug_folder, Some(PathBuf::from("/tmp/proxies")));
    }

    #[test]
    fn class_numbers_increase() {
        let first = next_class_number();
        let second = next_class_number();
        assert!(second > first);
    }
}
