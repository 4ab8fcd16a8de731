use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::container::Container;
use crate::error::{Error, ErrorKind};

/// Size variant the archive can render an asset into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Rendition {
    /// "Liten JPG"
    SmallJpg,
    /// "Stor JPG"
    BigJpg,
    /// "Originalfil (tif)", the archival master.
    #[default]
    Tif,
}
impl Rendition {
    /// Path suffix appended to an asset reference when requesting this rendition.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Rendition::SmallJpg => "/__renditions/Liten%20JPG",
            Rendition::BigJpg => "/__renditions/Stor%20JPG",
            Rendition::Tif => "/__renditions/Originalfil%20(tif)",
        }
    }

    /// File extension (including the dot) used for the destination filename.
    pub fn extension(&self) -> &'static str {
        match self {
            Rendition::SmallJpg | Rendition::BigJpg => ".jpg",
            Rendition::Tif => ".tif",
        }
    }

    /// Container format the archive is expected to return for this rendition.
    pub fn container(&self) -> Container {
        match self {
            Rendition::SmallJpg | Rendition::BigJpg => Container::Jpeg,
            Rendition::Tif => Container::Tiff,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rendition::SmallJpg => "small_jpg",
            Rendition::BigJpg => "big_jpg",
            Rendition::Tif => "tif",
        }
    }
}
impl FromStr for Rendition {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small_jpg" | "small" => Ok(Self::SmallJpg),
            "big_jpg" | "big" => Ok(Self::BigJpg),
            "tif" | "tiff" => Ok(Self::Tif),
            _ => exn::bail!(ErrorKind::UnsupportedRendition(s.to_string())),
        }
    }
}
impl TryFrom<String> for Rendition {
    type Error = Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().parse()
    }
}
impl From<Rendition> for String {
    fn from(value: Rendition) -> Self {
        value.as_str().to_string()
    }
}
impl Display for Rendition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
