//! Lightweight itinerary option

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize_metro_line;

/// A summary-only itinerary alternative, cheap to produce and suited to voice
///
/// Built purely from scraped page text; carries no geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightweightOption {
    /// Stable ordinal used to select this option in the detailed phase
    pub index: usize,
    /// Bus route numbers and metro lines, in riding order
    pub route_numbers: Vec<String>,
    /// Total journey duration in minutes, when the page showed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_minutes: Option<u32>,
    /// Spoken-friendly one-line summary
    pub summary: String,
    /// Minutes spent walking
    pub walking_minutes: u32,
    /// Number of vehicle changes
    pub transfers: u32,
}

impl LightweightOption {
    /// Build an option and derive its transfer count and spoken summary
    #[must_use]
    pub fn new(
        index: usize,
        route_numbers: Vec<String>,
        total_duration_minutes: Option<u32>,
        walking_minutes: u32,
    ) -> Self {
        let transfers = u32::try_from(route_numbers.len().saturating_sub(1)).unwrap_or(u32::MAX);
        let summary = spoken_summary(
            index,
            &route_numbers,
            total_duration_minutes,
            walking_minutes,
            transfers,
        );
        Self {
            index,
            route_numbers,
            total_duration_minutes,
            summary,
            walking_minutes,
            transfers,
        }
    }
}

impl fmt::Display for LightweightOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

fn spoken_summary(
    index: usize,
    routes: &[String],
    duration: Option<u32>,
    walking: u32,
    transfers: u32,
) -> String {
    let vehicles = if routes.is_empty() {
        "walking only".to_string()
    } else {
        routes
            .iter()
            .map(|r| match normalize_metro_line(r) {
                Some(line) => format!("metro {line}"),
                None => format!("bus {r}"),
            })
            .collect::<Vec<_>>()
            .join(", then ")
    };

    let duration = duration.map_or_else(
        || "Duration unknown".to_string(),
        |d| format!("{d} {}", plural(d, "minute", "minutes")),
    );
    let transfers = match transfers {
        0 => "no transfers".to_string(),
        n => format!("{n} {}", plural(n, "transfer", "transfers")),
    };

    format!(
        "Option {}: {vehicles}. {duration}, {walking} {} walking, {transfers}.",
        index + 1,
        plural(walking, "minute", "minutes"),
    )
}

const fn plural(n: u32, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}
