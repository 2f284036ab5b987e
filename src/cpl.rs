//! Common Portability Library helpers
//!
//! `KEY=VALUE` option lists and the functions that send messages through the
//! error channel configured in [`crate::config`].

use std::fmt::{Debug, Formatter};

use crate::config;
use crate::errors::{CplErrType, GdalError, Result};

/// An ordered list of `KEY=VALUE` options, the way GDAL passes driver,
/// creation and open options around.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CslStringList {
    entries: Vec<(String, String)>,
}

impl CslStringList {
    /// Creates an empty string list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s (case-insensitively, as GDAL does).
    ///
    /// Returns `Ok<()>` on success, `Err<GdalError>` if `name` has non alphanumeric
    /// characters, or `value` has newline characters.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r', '\0']) {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }

        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }

        Ok(())
    }

    /// Looks up the value corresponding to `key`, ignoring case.
    pub fn fetch_name_value(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
    }

    /// Looks up `key` and interprets it as a boolean, falling back to `default`.
    pub fn fetch_bool(&self, key: &str, default: bool) -> bool {
        self.fetch_name_value(key)
            .map(|v| test_bool(&v))
            .unwrap_or(default)
    }

    /// Determine the number of entries in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if the list has any values
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an iterator over the name/value elements of the list.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Emit a warning for every key not in `known`, naming `context`.
    pub(crate) fn warn_unknown_keys(&self, known: &[&str], context: &str) {
        for (key, _) in self.iter() {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                warning(&format!("{context} does not support option {key}"));
            }
        }
    }
}

impl Debug for CslStringList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (k, v) in self.iter() {
            f.write_fmt(format_args!("{k}={v}\n"))?;
        }
        Ok(())
    }
}

/// Convenience shorthand for specifying an empty `CslStringList` to functions accepting
/// `Into<CslStringList>`.
impl From<()> for CslStringList {
    fn from(_: ()) -> Self {
        CslStringList::default()
    }
}

/// Creates a [`CslStringList`] from a slice of _key_/_value_ tuples.
impl<const N: usize> From<&[(&str, &str); N]> for CslStringList {
    fn from(pairs: &[(&str, &str); N]) -> Self {
        let mut result = Self::default();
        for (k, v) in pairs {
            result.set_name_value(k, v).expect("valid key/value pair");
        }
        result
    }
}

/// GDAL's `CPLTestBool`: everything except `NO`, `OFF`, `FALSE` and `0` is true.
pub fn test_bool(value: &str) -> bool {
    !(value.eq_ignore_ascii_case("NO")
        || value.eq_ignore_ascii_case("OFF")
        || value.eq_ignore_ascii_case("FALSE")
        || value == "0")
}

/// Report `err` as a failure on the error channel and hand it back.
pub(crate) fn report(err: GdalError) -> GdalError {
    config::emit(CplErrType::Failure, err.error_num(), &err.to_string());
    err
}

pub(crate) fn warning(msg: &str) {
    config::emit(CplErrType::Warning, crate::errors::CPLE_APP_DEFINED, msg);
}

/// Emit a debug message when `CPL_DEBUG` is enabled, either globally or for `category`.
pub(crate) fn debug(category: &str, msg: &str) {
    let setting = config::get_config_option("CPL_DEBUG", "OFF").unwrap_or_default();
    let enabled_for_all = ["ON", "YES", "TRUE", "1"]
        .iter()
        .any(|v| setting.eq_ignore_ascii_case(v));
    if enabled_for_all || setting.eq_ignore_ascii_case(category) {
        config::emit(
            CplErrType::Debug,
            crate::errors::CPLE_NONE,
            &format!("{category}: {msg}"),
        );
    }
}
