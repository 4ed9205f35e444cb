use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cache entry type as understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConfigType {
    FilePath,
    Path,
    Bool,
    #[default]
    String,
    Internal,
    /// Untyped entry, rendered without a `:TYPE` suffix
    Static,
}

impl ConfigType {
    /// The generator's spelling of this type
    pub fn as_generator_str(self) -> &'static str {
        match self {
            ConfigType::FilePath => "FILEPATH",
            ConfigType::Path => "PATH",
            ConfigType::Bool => "BOOL",
            ConfigType::String => "STRING",
            ConfigType::Internal => "INTERNAL",
            ConfigType::Static => "STATIC",
        }
    }

    fn from_generator_str(s: &str) -> Self {
        match s {
            "FILEPATH" => ConfigType::FilePath,
            "PATH" => ConfigType::Path,
            "BOOL" => ConfigType::Bool,
            "INTERNAL" => ConfigType::Internal,
            "STATIC" => ConfigType::Static,
            _ => ConfigType::String,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigItemParseError {
    #[error("Configuration entry has no key: {0:?}")]
    MissingKey(String),

    #[error("Configuration entry has no value assignment: {0:?}")]
    MissingAssignment(String),
}

/// A single generator configuration entry (`KEY:TYPE=VALUE`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigItem {
    pub key: String,
    pub kind: ConfigType,
    pub value: String,
    pub is_advanced: bool,
    pub documentation: String,
}

impl ConfigItem {
    pub fn new(key: impl Into<String>, kind: ConfigType, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            value: value.into(),
            is_advanced: false,
            documentation: String::new(),
        }
    }

    /// Render as a generator define argument, e.g. `-DCMAKE_BUILD_TYPE:STRING=Debug`.
    ///
    /// Static entries carry no type suffix.
    pub fn to_argument(&self) -> String {
        match self.kind {
            ConfigType::Static => format!("-D{}={}", self.key, self.value),
            kind => format!("-D{}:{}={}", self.key, kind.as_generator_str(), self.value),
        }
    }
}

impl fmt::Display for ConfigItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.key, self.kind.as_generator_str(), self.value)
    }
}

impl ConfigItem {
    /// Parse one `KEY[:TYPE]=VALUE` entry verbatim. Everything after the first
    /// `=` is the value, comment markers included.
    pub fn parse_entry(entry: &str) -> Result<Self, ConfigItemParseError> {
        let (lhs, value) = entry
            .trim_start()
            .split_once('=')
            .ok_or_else(|| ConfigItemParseError::MissingAssignment(entry.to_string()))?;
        let (key, kind) = match lhs.split_once(':') {
            Some((key, kind)) => (key, ConfigType::from_generator_str(kind.trim())),
            None => (lhs, ConfigType::String),
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigItemParseError::MissingKey(entry.to_string()));
        }

        Ok(ConfigItem::new(key, kind, value))
    }
}

/// Free-form input: `#` and `//` start a comment that runs to the end.
impl FromStr for ConfigItem {
    type Err = ConfigItemParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let end = [s.find('#'), s.find("//")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(s.len());
        ConfigItem::parse_entry(&s[..end])
    }
}

/// Settings-file form, which is written by `Display` and kept verbatim.
impl TryFrom<String> for ConfigItem {
    type Error = ConfigItemParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConfigItem::parse_entry(&value)
    }
}

impl From<ConfigItem> for String {
    fn from(item: ConfigItem) -> Self {
        item.to_string()
    }
}

/// Ordered collection of [`ConfigItem`]s.
///
/// After [`ConfigSet::remove_duplicates`] keys are unique and entries are sorted
/// by key, which keeps serialized output and argument lists deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSet {
    items: Vec<ConfigItem>,
}

impl ConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ConfigItem) {
        self.items.push(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value of the last entry with `key`, if any
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }

    /// Keep one entry per key (the last one) and sort by key.
    pub fn remove_duplicates(&self) -> ConfigSet {
        let mut seen = HashSet::new();
        let mut items: Vec<ConfigItem> = self
            .items
            .iter()
            .rev()
            .filter(|item| seen.insert(item.key.as_str()))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        ConfigSet { items }
    }

    /// Append `other` and deduplicate; entries from `other` win on key clashes.
    pub fn merge(&self, other: &ConfigSet) -> ConfigSet {
        let mut combined = self.clone();
        combined.items.extend(other.items.iter().cloned());
        combined.remove_duplicates()
    }

    /// Drop every entry whose key appears in `sub`. Advanced entries are kept.
    pub fn remove_sub_list(&self, sub: &ConfigSet) -> ConfigSet {
        let keys: HashSet<&str> = sub.items.iter().map(|item| item.key.as_str()).collect();
        let items = self
            .items
            .iter()
            .filter(|item| item.is_advanced || !keys.contains(item.key.as_str()))
            .cloned()
            .collect();
        ConfigSet { items }
    }

    pub fn to_arguments(&self) -> Vec<String> {
        self.items.iter().map(ConfigItem::to_argument).collect()
    }
}

impl FromIterator<ConfigItem> for ConfigSet {
    fn from_iter<I: IntoIterator<Item = ConfigItem>>(iter: I) -> Self {
        ConfigSet {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConfigSet {
    type Item = &'a ConfigItem;
    type IntoIter = std::slice::Iter<'a, ConfigItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, value: &str) -> ConfigItem {
        ConfigItem::new(key, ConfigType::String, value)
    }

    #[test]
    fn test_to_argument_typed() {
        let item = ConfigItem::new("CMAKE_BUILD_TYPE", ConfigType::String, "Debug");
        assert_eq!(item.to_argument(), "-DCMAKE_BUILD_TYPE:STRING=Debug");

        let item = ConfigItem::new("CMAKE_CXX_COMPILER", ConfigType::FilePath, "/usr/bin/g++");
        assert_eq!(item.to_argument(), "-DCMAKE_CXX_COMPILER:FILEPATH=/usr/bin/g++");
    }

    #[test]
    fn test_to_argument_static_omits_type() {
        let item = ConfigItem::new("FOO", ConfigType::Static, "bar");
        assert_eq!(item.to_argument(), "-DFOO=bar");
    }

    #[test]
    fn test_parse_typed_entry() {
        let item: ConfigItem = "WITH_TESTS:BOOL=ON".parse().unwrap();
        assert_eq!(item.key, "WITH_TESTS");
        assert_eq!(item.kind, ConfigType::Bool);
        assert_eq!(item.value, "ON");
    }

    #[test]
    fn test_parse_untyped_entry_defaults_to_string() {
        let item: ConfigItem = "  NAME=a=b".parse().unwrap();
        assert_eq!(item.key, "NAME");
        assert_eq!(item.kind, ConfigType::String);
        assert_eq!(item.value, "a=b");
    }

    #[test]
    fn test_parse_strips_comments() {
        let item: ConfigItem = "X:PATH=/opt # install prefix".parse().unwrap();
        assert_eq!(item.value, "/opt ");

        let item: ConfigItem = "Y=1// trailing".parse().unwrap();
        assert_eq!(item.value, "1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "=value".parse::<ConfigItem>(),
            Err(ConfigItemParseError::MissingKey(_))
        ));
        assert!(matches!(
            "JUSTAKEY".parse::<ConfigItem>(),
            Err(ConfigItemParseError::MissingAssignment(_))
        ));
    }

    #[test]
    fn test_remove_duplicates_last_wins_and_sorted() {
        let set: ConfigSet = vec![item("B", "1"), item("A", "1"), item("B", "2"), item("C", "1")]
            .into_iter()
            .collect();

        let result = set.remove_duplicates();
        let pairs: Vec<(&str, &str)> = result
            .iter()
            .map(|i| (i.key.as_str(), i.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "2"), ("C", "1")]);
    }

    #[test]
    fn test_merge_prefers_other() {
        let base: ConfigSet = vec![item("A", "old"), item("B", "keep")].into_iter().collect();
        let extra: ConfigSet = vec![item("A", "new")].into_iter().collect();

        let merged = base.merge(&extra);
        assert_eq!(merged.value_of("A"), Some("new"));
        assert_eq!(merged.value_of("B"), Some("keep"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_remove_sub_list_keeps_advanced() {
        let mut advanced = item("ADV", "1");
        advanced.is_advanced = true;
        let set: ConfigSet = vec![item("A", "1"), advanced, item("B", "1")]
            .into_iter()
            .collect();
        let sub: ConfigSet = vec![item("A", "x"), item("ADV", "x")].into_iter().collect();

        let result = set.remove_sub_list(&sub);
        let keys: Vec<&str> = result.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["ADV", "B"]);
    }

    #[test]
    fn test_serde_roundtrip_as_strings() {
        let set: ConfigSet = vec![
            ConfigItem::new("A", ConfigType::Path, "/x"),
            ConfigItem::new("B", ConfigType::Static, "y"),
        ]
        .into_iter()
        .collect();

        let yaml = serde_yaml_ng::to_string(&set).unwrap();
        assert!(yaml.contains("A:PATH=/x"));
        assert!(yaml.contains("B:STATIC=y"));

        let back: ConfigSet = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_comment_markers_kept_in_settings_values() {
        let set: ConfigSet = vec![
            ConfigItem::new("URL", ConfigType::String, "https://example.com"),
            ConfigItem::new("FLAGS", ConfigType::String, "-DCOLOR=#fff"),
        ]
        .into_iter()
        .collect();

        let yaml = serde_yaml_ng::to_string(&set).unwrap();
        let back: ConfigSet = serde_yaml_ng::from_str(&yaml).unwrap();

        assert_eq!(back.value_of("URL"), Some("https://example.com"));
        assert_eq!(back.value_of("FLAGS"), Some("-DCOLOR=#fff"));
        assert_eq!(back, set);
    }

    #[test]
    fn test_parse_entry_is_verbatim() {
        let item = ConfigItem::parse_entry("  FLAGS:STRING=-DX=1 // not a comment").unwrap();
        assert_eq!(item.key, "FLAGS");
        assert_eq!(item.value, "-DX=1 // not a comment");

        assert!(matches!(
            ConfigItem::parse_entry("NO_VALUE"),
            Err(ConfigItemParseError::MissingAssignment(_))
        ));
    }
}
