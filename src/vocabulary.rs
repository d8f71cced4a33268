//! Fixed vocabulary shared with the upstream report generator.
//!
//! Everything here must match the literal text the movements reports carry:
//! Spanish month names, the twelve livestock category codes and the two site
//! header literals. Parsing is explicit and returns `Option` so that callers
//! decide what an unknown value means.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper-cases, trims and strips Spanish accents so that `Participación` and
/// `PARTICIPACION` compare equal.
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            'Á' | 'á' => 'A',
            'É' | 'é' => 'E',
            'Í' | 'í' => 'I',
            'Ó' | 'ó' => 'O',
            'Ú' | 'ú' | 'Ü' | 'ü' => 'U',
            other => other,
        })
        .flat_map(char::to_uppercase)
        .collect()
}

/// The twelve Spanish month names, indexed by month number minus one.
pub const MONTH_NAMES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// Maps a Spanish month name to 1..=12.
pub fn parse_month(name: &str) -> Option<u32> {
    let name = normalize(name);
    if name == "SETIEMBRE" {
        return Some(9);
    }
    MONTH_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .map(|index| index as u32 + 1)
}

/// One of the two ranch properties tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Site {
    Primary,
    Secondary,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::Primary, Site::Secondary];
}

/// How a site is written in report headers and how it is shown to people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteName {
    /// Literal searched for (case-insensitively) in the row under an inventory header
    pub header: String,
    /// Name stored on inventory records
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteNames {
    pub primary: SiteName,
    pub secondary: SiteName,
}

impl Default for SiteNames {
    fn default() -> Self {
        Self {
            primary: SiteName {
                header: "EL ROSARIO".to_string(),
                display: "El Rosario".to_string(),
            },
            secondary: SiteName {
                header: "SANTA FE".to_string(),
                display: "Santa Fe".to_string(),
            },
        }
    }
}

impl SiteNames {
    pub fn get(&self, site: Site) -> &SiteName {
        match site {
            Site::Primary => &self.primary,
            Site::Secondary => &self.secondary,
        }
    }

    pub fn display(&self, site: Site) -> &str {
        &self.get(site).display
    }

    /// Finds the site whose header literal occurs in `text`.
    pub fn find_in(&self, text: &str) -> Option<Site> {
        let text = normalize(text);
        Site::ALL.into_iter().find(|site| {
            let header = normalize(&self.get(*site).header);
            !header.is_empty() && text.contains(&header)
        })
    }
}

/// Livestock sub-population codes used as row labels in the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryCode {
    Vp,
    Cm,
    Ch,
    Vh,
    Nas,
    T,
    Hd,
    Hl,
    Md,
    Ml,
    Mc,
    Buey,
}

impl CategoryCode {
    /// All codes in report order.
    pub const ALL: [CategoryCode; 12] = [
        CategoryCode::Vp,
        CategoryCode::Cm,
        CategoryCode::Ch,
        CategoryCode::Vh,
        CategoryCode::Nas,
        CategoryCode::T,
        CategoryCode::Hd,
        CategoryCode::Hl,
        CategoryCode::Md,
        CategoryCode::Ml,
        CategoryCode::Mc,
        CategoryCode::Buey,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vp => "vp",
            Self::Cm => "cm",
            Self::Ch => "ch",
            Self::Vh => "vh",
            Self::Nas => "nas",
            Self::T => "t",
            Self::Hd => "hd",
            Self::Hl => "hl",
            Self::Md => "md",
            Self::Ml => "ml",
            Self::Mc => "mc",
            Self::Buey => "buey",
        }
    }

    /// Parses a row label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "VP" => Some(Self::Vp),
            "CM" => Some(Self::Cm),
            "CH" => Some(Self::Ch),
            "VH" => Some(Self::Vh),
            "NAS" => Some(Self::Nas),
            "T" => Some(Self::T),
            "HD" => Some(Self::Hd),
            "HL" => Some(Self::Hl),
            "MD" => Some(Self::Md),
            "ML" => Some(Self::Ml),
            "MC" => Some(Self::Mc),
            "BUEY" => Some(Self::Buey),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
