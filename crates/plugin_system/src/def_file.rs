//! Definition trees: static configuration read once at startup.
//!
//! A definition tree is a nest of named groups carrying typed attributes
//! (entity type catalogs, articulation mappings, view layouts ...). It is
//! read from TOML where tables become groups, arrays of tables become
//! repeated groups and everything else becomes an attribute:
//!
//! ```toml
//! [[entity]]
//! type = 100
//! name = "F-16"
//! extent = [15.0, 10.0, 5.0]
//!
//! [[entity]]
//! type = 200
//! name = "Tanker"
//! ```

use crate::error::{PluginError, Result};
use compact_str::CompactString;
use std::collections::BTreeMap;
use std::path::Path;
use toml::{Table, Value};

/// Blackboard key of the root [`DefFileGroup`].
pub const DEF_FILE_ROOT_KEY: &str = "deffile.root";

#[derive(Debug, Clone, PartialEq)]
pub enum DefAttribute {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    FloatArray(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefFileGroup {
    name: CompactString,
    attributes: BTreeMap<CompactString, DefAttribute>,
    groups: Vec<DefFileGroup>,
}

impl DefFileGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: CompactString::new(name),
            ..Self::default()
        }
    }

    /// Builds a group named `name` from a parsed TOML table.
    pub fn from_toml(name: &str, table: &Table) -> Result<Self> {
        let mut group = DefFileGroup::new(name);
        for (key, value) in table {
            match value {
                Value::Table(child) => group.groups.push(DefFileGroup::from_toml(key, child)?),
                Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_table) => {
                    for item in items {
                        if let Value::Table(child) = item {
                            group.groups.push(DefFileGroup::from_toml(key, child)?);
                        }
                    }
                }
                other => {
                    let attribute = attribute_from_toml(name, key, other)?;
                    group.attributes.insert(CompactString::new(key), attribute);
                }
            }
        }
        Ok(group)
    }

    /// Parses TOML text into a group named `name`.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let table: Table = toml::from_str(text)
            .map_err(|e| PluginError::Definition(format!("{name}: {e}")))?;
        Self::from_toml(name, &table)
    }

    /// Reads and parses a definition file. The root group is named after the
    /// file stem.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Definition(format!("{}: {e}", path.display())))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        Self::parse(&name, &text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_attribute(&mut self, key: &str, attribute: DefAttribute) {
        self.attributes.insert(CompactString::new(key), attribute);
    }

    pub fn add_group(&mut self, group: DefFileGroup) {
        self.groups.push(group);
    }

    pub fn attribute(&self, key: &str) -> Option<&DefAttribute> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &DefAttribute)> {
        self.attributes.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Child groups; repeated groups keep their file order.
    pub fn children(&self) -> &[DefFileGroup] {
        &self.groups
    }

    /// First child group called `name`.
    pub fn group(&self, name: &str) -> Option<&DefFileGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// All child groups called `name`.
    pub fn groups<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DefFileGroup> + 'a {
        self.groups.iter().filter(move |group| group.name == name)
    }

    /// Follows a dotted path of group names, e.g. `"views.main"`.
    pub fn find(&self, path: &str) -> Option<&DefFileGroup> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |group, segment| group.group(segment))
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.attribute(key)? {
            DefAttribute::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.attribute(key)? {
            DefAttribute::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floating point attribute; integer attributes convert.
    pub fn float(&self, key: &str) -> Option<f64> {
        match self.attribute(key)? {
            DefAttribute::Float(value) => Some(*value),
            DefAttribute::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.attribute(key)? {
            DefAttribute::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float_array(&self, key: &str) -> Option<&[f64]> {
        match self.attribute(key)? {
            DefAttribute::FloatArray(values) => Some(values),
            _ => None,
        }
    }

    /// Integer attribute that must be present and fit in `T`.
    pub fn require_int<T: TryFrom<i64>>(&self, key: &str) -> Result<T> {
        let value = self
            .int(key)
            .ok_or_else(|| self.missing(key, "an integer"))?;
        T::try_from(value).map_err(|_| {
            PluginError::Definition(format!("{}.{key}: {value} is out of range", self.name))
        })
    }

    pub fn require_string(&self, key: &str) -> Result<&str> {
        self.string(key).ok_or_else(|| self.missing(key, "a string"))
    }

    fn missing(&self, key: &str, expected: &str) -> PluginError {
        PluginError::Definition(format!("{}.{key} must be {expected}", self.name))
    }
}

fn attribute_from_toml(group: &str, key: &str, value: &Value) -> Result<DefAttribute> {
    let attribute = match value {
        Value::String(value) => DefAttribute::String(value.clone()),
        Value::Integer(value) => DefAttribute::Int(*value),
        Value::Float(value) => DefAttribute::Float(*value),
        Value::Boolean(value) => DefAttribute::Bool(*value),
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| match item {
                    Value::Float(value) => Some(*value),
                    Value::Integer(value) => Some(*value as f64),
                    _ => None,
                })
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| {
                    PluginError::Definition(format!("{group}.{key}: arrays must hold numbers only"))
                })?;
            DefAttribute::FloatArray(values)
        }
        Value::Datetime(_) | Value::Table(_) => {
            return Err(PluginError::Definition(format!(
                "{group}.{key}: unsupported attribute type"
            )))
        }
    };
    Ok(attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"
        version = 2

        [[entity]]
        type = 100
        name = "F-16"
        extent = [15, 10.5, 5]

        [[entity]]
        type = 200
        name = "Tanker"

        [views.main]
        group = 0
        fov = 60.0
        fullscreen = false
    "#;

    #[test]
    fn parses_groups_and_attributes() {
        let root = DefFileGroup::parse("catalog", CATALOG).unwrap();
        assert_eq!(root.name(), "catalog");
        assert_eq!(root.int("version"), Some(2));

        let entities: Vec<_> = root.groups("entity").collect();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].string("name"), Some("F-16"));
        assert_eq!(entities[0].float_array("extent"), Some(&[15.0, 10.5, 5.0][..]));
        assert_eq!(entities[1].require_int::<u16>("type"), Ok(200));

        let main = root.find("views.main").unwrap();
        assert_eq!(main.float("fov"), Some(60.0));
        assert_eq!(main.float("group"), Some(0.0));
        assert_eq!(main.bool("fullscreen"), Some(false));
        assert!(root.find("views.missing").is_none());
    }

    #[test]
    fn typed_accessors_reject_other_types() {
        let root = DefFileGroup::parse("catalog", CATALOG).unwrap();
        let entity = root.group("entity").unwrap();
        assert_eq!(entity.string("type"), None);
        assert!(entity.require_string("missing").is_err());
        assert_eq!(entity.require_int::<u8>("type"), Ok(100));
        let tanker = root.groups("entity").nth(1).unwrap();
        assert!(matches!(
            tanker.require_int::<i8>("type"),
            Err(PluginError::Definition(_))
        ));
        assert!(root.group("entity").is_some_and(|group| group.int("type") == Some(100)));
    }

    #[test]
    fn malformed_definitions() {
        assert!(matches!(
            DefFileGroup::parse("bad", "values = [1, \"two\"]"),
            Err(PluginError::Definition(_))
        ));
        assert!(matches!(
            DefFileGroup::parse("bad", "[unterminated"),
            Err(PluginError::Definition(_))
        ));
        assert!(DefFileGroup::load("/nonexistent/definitions.toml").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let root = DefFileGroup::load(file.path()).unwrap();
        assert_eq!(root.groups("entity").count(), 2);
        assert!(!root.name().is_empty());
    }
}
