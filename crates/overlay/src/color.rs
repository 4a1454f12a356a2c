//! Overlay colors and name lookup

use deepwater_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// The fixed overlay colors, one per highlighted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpec {
    Red,
    Green,
    Blue,
}

impl ColorSpec {
    pub const ALL: [ColorSpec; 3] = [Self::Red, Self::Green, Self::Blue];

    pub fn rgb(&self) -> Rgb {
        match self {
            Self::Red => Rgb::new(255, 0, 0),
            Self::Green => Rgb::new(0, 255, 0),
            Self::Blue => Rgb::new(0, 0, 255),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl FromStr for ColorSpec {
    type Err = Error;

    /// Exact, lowercase names only; anything else is a lookup error
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownColor(s.to_string()))
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ColorSpec> for Rgb {
    fn from(spec: ColorSpec) -> Self {
        spec.rgb()
    }
}

/// Name -> color mapping seeded with the [`ColorSpec`] entries.
///
/// Extra names can be registered; looking up an unregistered name fails
/// the same way [`ColorSpec::from_str`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: BTreeMap<String, Rgb>,
}

impl ColorTable {
    pub fn new() -> Self {
        let colors = ColorSpec::ALL
            .into_iter()
            .map(|c| (c.name().to_string(), c.rgb()))
            .collect();
        Self { colors }
    }

    /// Register or replace a named color
    pub fn insert(&mut self, name: impl Into<String>, color: impl Into<Rgb>) -> Option<Rgb> {
        self.colors.insert(name.into(), color.into())
    }

    pub fn get(&self, name: &str) -> Result<Rgb> {
        self.colors
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownColor(name.to_string()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_triples() {
        assert_eq!(ColorSpec::Red.rgb(), Rgb::new(255, 0, 0));
        assert_eq!(ColorSpec::Green.rgb(), Rgb::new(0, 255, 0));
        assert_eq!(ColorSpec::Blue.rgb(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn parse_known_names() {
        for spec in ColorSpec::ALL {
            assert_eq!(spec.name().parse::<ColorSpec>().unwrap(), spec);
        }
    }

    #[test]
    fn unknown_name_is_lookup_error() {
        assert!(matches!("purple".parse::<ColorSpec>(), Err(Error::UnknownColor(name)) if name == "purple"));
        assert!(matches!("Blue".parse::<ColorSpec>(), Err(Error::UnknownColor(_))));
    }

    #[test]
    fn table_is_extendable() {
        let mut table = ColorTable::new();
        assert_eq!(table.get("blue").unwrap(), Rgb::new(0, 0, 255));
        assert!(table.get("cyan").is_err());

        table.insert("cyan", (0, 255, 255));
        assert_eq!(table.get("cyan").unwrap(), Rgb::new(0, 255, 255));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["blue", "cyan", "green", "red"]);
    }
}
