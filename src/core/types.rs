//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation turn counter
pub type Turn = u32;

/// Biological class of an entity
///
/// Catalog files spell these loosely ("RNA", "rna", "Protein"), so parsing is
/// case-insensitive and anything unrecognised becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityClass {
    Virion,
    Protein,
    Rna,
    Dna,
    Complex,
    Unknown,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Virion => "virion",
            EntityClass::Protein => "protein",
            EntityClass::Rna => "RNA",
            EntityClass::Dna => "DNA",
            EntityClass::Complex => "complex",
            EntityClass::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "virion" => EntityClass::Virion,
            "protein" => EntityClass::Protein,
            "rna" => EntityClass::Rna,
            "dna" => EntityClass::Dna,
            "complex" => EntityClass::Complex,
            _ => EntityClass::Unknown,
        }
    }
}

impl Default for EntityClass {
    fn default() -> Self {
        EntityClass::Unknown
    }
}

impl From<String> for EntityClass {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EntityClass> for String {
    fn from(class: EntityClass) -> Self {
        class.as_str().to_string()
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cellular compartment an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    Extracellular,
    Membrane,
    Endosome,
    Cytoplasm,
    Nucleus,
    Unknown,
}

impl Location {
    /// Order in which compartments are listed in turn reports
    pub const DISPLAY_ORDER: [Location; 5] = [
        Location::Extracellular,
        Location::Membrane,
        Location::Endosome,
        Location::Cytoplasm,
        Location::Nucleus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Extracellular => "extracellular",
            Location::Membrane => "membrane",
            Location::Endosome => "endosome",
            Location::Cytoplasm => "cytoplasm",
            Location::Nucleus => "nucleus",
            Location::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "extracellular" => Location::Extracellular,
            "membrane" => Location::Membrane,
            "endosome" => Location::Endosome,
            "cytoplasm" => Location::Cytoplasm,
            "nucleus" => Location::Nucleus,
            _ => Location::Unknown,
        }
    }

    /// Upper-case label used as a section header
    pub fn label(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::Unknown
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.as_str().to_string()
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
