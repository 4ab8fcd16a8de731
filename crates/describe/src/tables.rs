//! Lookup tables. Keys are lowercase.

use std::collections::HashMap;
use std::sync::LazyLock;

pub(crate) const CREATOR_UNKNOWN: &str = "{{creator:unknown}}";
pub(crate) const PD_OLD: &str = "falt i det fri";
pub(crate) const PD_NORWAY: &str = "{{PD-Norway70}}";
pub(crate) const NORWAY: &str = "norge";
pub(crate) const FALLBACK_CATEGORY: &str = "[[Category:Media from the National Archives of Norway]]";

/// Values meaning "we don't know", for place fields.
pub(crate) const UNKNOWN_PLACES: [&str; 4] = ["ukjent", "unknown", "ukjent land", "unknown country"];
/// Characters MediaWiki refuses or rewrites in file names.
pub(crate) const FILENAME_REPLACED: [char; 11] = ['#', '<', '>', '[', ']', '|', '{', '}', ':', '/', '\\'];
/// Restriction field values that keep an asset off the repository.
pub(crate) const RESTRICTED: [&str; 2] = ["ja", "yes"];

/// Archive rights statement → license template.
pub(crate) static LICENSES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (PD_OLD, "{{PD-old-70}}"),
        ("cc0", "{{CC0}}"),
        ("cc-0", "{{CC0}}"),
        ("cc-by", "{{CC BY 4.0}}"),
        ("cc by", "{{CC BY 4.0}}"),
        ("cc-by-sa", "{{CC BY-SA 4.0}}"),
        ("cc by-sa", "{{CC BY-SA 4.0}}"),
    ])
});

/// Norwegian country name → English name used in "<year> in <Country>" categories.
pub(crate) static COUNTRIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([("norge", "Norway"), ("sverige", "Sweden"), ("finland", "Finland"), ("danmark", "Denmark")])
});

/// Creator names replaced by a fixed attribution fragment instead of being
/// flipped. The only entry is the "unknown" placeholder, in both spellings the
/// archive uses; its presence also replaces the whole author line.
pub(crate) static CREATORS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from([("ukjent", CREATOR_UNKNOWN), ("unknown", CREATOR_UNKNOWN)]));
