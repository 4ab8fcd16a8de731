//! Field clean-up applied before anything reaches a template.

use time::macros::format_description;
use time::{Date, Month};

use crate::tables;

/// Place field, or empty when it holds an "unknown" sentinel.
pub fn place(value: &str) -> &str {
    let trimmed = value.trim();
    if tables::UNKNOWN_PLACES.contains(&trimmed.to_lowercase().as_str()) { "" } else { trimmed }
}

/// Best-effort `YYYY-MM-DD`. Short values (bare years) and anything that
/// doesn't parse come back verbatim.
pub fn date(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= 4 {
        return trimmed.to_string();
    }
    parse_date(trimmed)
        .and_then(|date| date.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| trimmed.to_string())
}

fn parse_date(value: &str) -> Option<Date> {
    // Drop any time-of-day part.
    let value = value.split(['T', ' ']).next().unwrap_or(value);
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse().ok()?;
        let month = Month::try_from(value[4..6].parse::<u8>().ok()?).ok()?;
        return Date::from_calendar_date(year, month, value[6..8].parse().ok()?).ok();
    }
    [
        format_description!("[year]-[month]-[day]"),
        format_description!("[year]:[month]:[day]"),
        format_description!("[day].[month].[year]"),
    ]
    .into_iter()
    .find_map(|format| Date::parse(value, format).ok())
}

/// `true` if any creator is the "unknown" placeholder.
pub fn has_unknown_creator(creators: &[String]) -> bool {
    creators.iter().any(|name| tables::CREATORS.contains_key(name.trim().to_lowercase().as_str()))
}

/// A single creator: override fragment, or "Last, First" flipped to "First Last".
pub fn creator(name: &str) -> String {
    let name = name.trim();
    if let Some(fragment) = tables::CREATORS.get(name.to_lowercase().as_str()) {
        return fragment.to_string();
    }
    match name.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()).trim().to_string(),
        None => name.to_string(),
    }
}

/// The `|author` value for a list of creators.
pub fn author_line(creators: &[String]) -> String {
    if has_unknown_creator(creators) {
        return tables::CREATOR_UNKNOWN.to_string();
    }
    creators.iter().map(|name| creator(name)).filter(|name| !name.is_empty()).collect::<Vec<_>>().join(", ")
}

/// First keyword as-is, the rest lowercased. Positions are kept, so empty
/// keywords stay in place and are skipped when the list is joined.
pub fn keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.trim())
        .enumerate()
        .map(|(index, keyword)| if index == 0 { keyword.to_string() } else { keyword.to_lowercase() })
        .collect()
}

/// License templates for the recognised rights statements, in order.
/// Unrecognised statements are dropped.
pub fn licenses(rights: &[String], country: &str) -> Vec<&'static str> {
    let norwegian = country.trim().eq_ignore_ascii_case(tables::NORWAY);
    rights
        .iter()
        .filter_map(|statement| {
            let key = statement.trim().to_lowercase();
            match tables::LICENSES.get(key.as_str()) {
                Some(_) if key == tables::PD_OLD && norwegian => Some(tables::PD_NORWAY),
                found => found.copied(),
            }
        })
        .collect()
}

/// English country name for category purposes.
pub fn country_name(country: &str) -> Option<&'static str> {
    tables::COUNTRIES.get(country.trim().to_lowercase().as_str()).copied()
}

pub fn is_restricted(value: &str) -> bool {
    tables::RESTRICTED.contains(&value.trim().to_lowercase().as_str())
}

/// Replaces characters MediaWiki refuses or rewrites in file names with `-`
/// and collapses runs of whitespace. The result is the name the file is
/// stored under, so existence checks match across runs.
pub fn filename(name: &str) -> String {
    name.chars()
        .map(|c| if tables::FILENAME_REPLACED.contains(&c) { '-' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
