//! Reads back the element the in-page extraction script injects

use domain::markers::{
    MARKER_METRO_ATTR, MARKER_OPTION_ATTR, MARKER_ROUTES_ATTR, MARKER_STOPS_ATTR,
};
use domain::{StopCode, normalize_metro_line};
use scraper::Html;

use super::patterns::MARKER;

/// Findings the page script wrote into the marker element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marker {
    /// Option the script ran against, if it said
    pub option: Option<usize>,
    /// Stop codes in itinerary order
    pub stops: Vec<StopCode>,
    /// Canonical metro lines
    pub metro_lines: Vec<String>,
    /// Route numbers as the page printed them, upper-cased
    pub routes: Vec<String>,
}

impl Marker {
    /// Read the last marker element on the page
    ///
    /// The script replaces its element on every run, but a cached snapshot may
    /// hold more than one; the last one written wins.
    pub fn find(page: &Html) -> Option<Self> {
        let element = page.select(&MARKER).last()?;
        let attr = |name: &str| element.value().attr(name).unwrap_or_default();

        Some(Self {
            option: attr(MARKER_OPTION_ATTR).trim().parse().ok(),
            stops: dedup(split_list(attr(MARKER_STOPS_ATTR)).filter_map(|s| StopCode::parse(s).ok())),
            metro_lines: dedup(split_list(attr(MARKER_METRO_ATTR)).filter_map(normalize_metro_line)),
            routes: dedup(split_list(attr(MARKER_ROUTES_ATTR)).map(str::to_uppercase)),
        })
    }

    /// Whether this marker describes `index`; a marker without an option applies to any
    pub fn describes(&self, index: usize) -> bool {
        self.option.is_none_or(|option| option == index)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn dedup<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
