//! Pattern tables for every extracted fact, most specific first
//!
//! Santiago conventions: bus services look like `506`, `210v`, `D09`; stop
//! codes like `PA433`; metro lines like `L1` or `Línea 4A`. Spanish and
//! English page copy are both recognised.

use std::sync::LazyLock;

use domain::StopCode;
use domain::markers::EXTRACTION_MARKER_ID;
use domain::normalize_metro_line;
use regex::{Captures, Regex};
use scraper::Selector;

use super::strategy::{Source, Strategy, first_group};

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction pattern must compile")
}

#[allow(clippy::expect_used)]
fn select(css: &str) -> Selector {
    Selector::parse(css).expect("extraction selector must parse")
}

/// Class selectors for every `{stem}{joiner}{kind}` token
fn class_tokens(stems: &[&str], joiners: &[&str], kinds: &[&str]) -> Vec<String> {
    let mut classes = Vec::new();
    for stem in stems {
        for joiner in joiners {
            for kind in kinds {
                classes.push(format!(".{stem}{joiner}{kind}"));
            }
        }
    }
    classes
}

/// Container of one itinerary alternative in the results list
pub(super) static OPTION_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    let mut alternatives = vec!["[data-option-index]".to_string()];
    alternatives.extend(class_tokens(
        &["itinerary", "route", "trip", "journey"],
        &["-", "_"],
        &["option", "card", "item"],
    ));
    select(&alternatives.join(", "))
});

/// The element the in-page script injects
pub(super) static MARKER: LazyLock<Selector> =
    LazyLock::new(|| select(&format!("#{EXTRACTION_MARKER_ID}")));

static SERVICE_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    select(
        &class_tokens(
            &["service", "route", "line"],
            &["-", "_", ""],
            &["label", "name", "number", "short-name"],
        )
        .join(", "),
    )
});

/// A bus service code, alone in its attribute or element
const SERVICE_CODE: &str = r"(?i)^\s*([A-Z]?\d{2,3}[A-Z]?)\s*$";

fn route_number(caps: &Captures<'_>) -> Option<String> {
    let raw = first_group(caps)?;
    if normalize_metro_line(&raw).is_some() {
        return None;
    }
    Some(raw.to_uppercase())
}

fn stop_code(caps: &Captures<'_>) -> Option<String> {
    let raw = first_group(caps)?;
    StopCode::parse(&raw).ok().map(|code| code.to_string())
}

fn metro_line(caps: &Captures<'_>) -> Option<String> {
    normalize_metro_line(&first_group(caps)?)
}

fn metro_line_number(caps: &Captures<'_>) -> Option<String> {
    normalize_metro_line(&format!("L{}", first_group(caps)?))
}

fn small_count(caps: &Captures<'_>) -> Option<String> {
    let count: u32 = first_group(caps)?.parse().ok()?;
    (1..=200).contains(&count).then(|| count.to_string())
}

fn minutes(caps: &Captures<'_>) -> Option<String> {
    let value: u32 = first_group(caps)?.parse().ok()?;
    (1..=600).contains(&value).then(|| value.to_string())
}

fn hours_and_minutes(caps: &Captures<'_>) -> Option<String> {
    let hours: u32 = caps.get(1)?.as_str().parse().ok()?;
    let mins: u32 = caps.get(2)?.as_str().parse().ok()?;
    (mins < 60 && hours < 10).then(|| (hours * 60 + mins).to_string())
}

pub(super) static ROUTE_NUMBER: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "service-label",
            4,
            Source::Element(SERVICE_LABEL.clone()),
            compile(r"(?i)^\s*([A-Z]?\d{2,3}[A-Z]?)\b"),
            route_number,
        ),
        Strategy::new(
            "data-line",
            3,
            Source::Attributes(&["data-line", "data-route", "data-route-number", "data-service"]),
            compile(SERVICE_CODE),
            route_number,
        ),
        Strategy::new(
            "badge",
            2,
            Source::Element(select(".badge, .chip, .pill, .tag")),
            compile(SERVICE_CODE),
            route_number,
        ),
        Strategy::new(
            "bare-span",
            1,
            Source::Element(select("span")),
            compile(r"(?i)^\s*(\d{2,3}[A-Z]?)\s*$"),
            route_number,
        ),
    ]
});

pub(super) static STOP_CODE: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "data-stop-code",
            3,
            Source::Attributes(&["data-stop-code", "data-stop-id", "data-stop"]),
            compile(r"(?i)^\s*([A-Z]{2}\d{1,5})\s*$"),
            stop_code,
        ),
        Strategy::new(
            "labelled-stop",
            2,
            Source::Text,
            compile(r"(?i)\b(?:paradero|parada|stop)\s*(?:code|c[oó]digo)?\s*[:#]?\s*(P[A-Z]\d{1,5})\b"),
            stop_code,
        ),
        Strategy::new(
            "bare-code",
            1,
            Source::Text,
            compile(r"\b(P[A-Z]\d{1,5})\b"),
            stop_code,
        ),
    ]
});

pub(super) static METRO_LINE: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "data-metro",
            3,
            Source::Attributes(&["data-metro-line", "data-metro", "data-subway-line"]),
            compile(r"^(.{1,12})$"),
            metro_line,
        ),
        Strategy::new(
            "line-name",
            2,
            Source::Text,
            compile(r"(?i)\b(?:metro\s+)?(?:l[ií]nea|line)\s+(\d{1,2}A?)\b"),
            metro_line_number,
        ),
        Strategy::new(
            "line-badge",
            1,
            Source::Node,
            compile(r"^(L\d{1,2}A?)$"),
            metro_line,
        ),
    ]
});

pub(super) static STOP_COUNT: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "data-stop-count",
            3,
            Source::Attributes(&["data-stop-count", "data-stops-count", "data-num-stops"]),
            compile(r"^\s*(\d{1,3})\s*$"),
            small_count,
        ),
        Strategy::new(
            "count-then-noun",
            2,
            Source::Text,
            compile(r"(?i)\b(\d{1,3})\s+(?:paradas|stops|estaciones|stations)\b"),
            small_count,
        ),
        Strategy::new(
            "noun-then-count",
            1,
            Source::Text,
            compile(r"(?i)\b(?:paradas|stops)\s*:?\s*(\d{1,3})\b"),
            small_count,
        ),
    ]
});

pub(super) static DURATION: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "data-duration",
            4,
            Source::Attributes(&["data-duration", "data-total-duration", "data-duration-minutes"]),
            compile(r"^\s*(\d{1,4})\s*$"),
            minutes,
        ),
        Strategy::new(
            "duration-class",
            3,
            Source::Element(select(".duration, .total-time, .travel-time, .trip-time")),
            compile(r"(?i)^\s*(\d{1,3})\s*(?:minutos|minutes|mins|min)\b"),
            minutes,
        ),
        Strategy::new(
            "labelled-duration",
            3,
            Source::Text,
            compile(
                r"(?i)\b(?:duraci[oó]n|duration|total|tiempo de viaje|travel time)\s*:?\s*(\d{1,3})\s*(?:minutos|minutes|mins|min)\b",
            ),
            minutes,
        ),
        Strategy::new(
            "hours-minutes",
            2,
            Source::Text,
            compile(
                r"(?i)\b(\d{1,2})\s*(?:horas|hora|hours|hour|hrs|hr|h)\s*(\d{1,2})\s*(?:minutos|minutes|mins|min)\b",
            ),
            hours_and_minutes,
        ),
        Strategy::new(
            "bare-minutes",
            1,
            Source::Text,
            compile(r"(?i)\b(\d{1,3})\s*(?:minutos|minutes|mins|min)\b"),
            minutes,
        ),
    ]
});

pub(super) static WALKING: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "walk-then-minutes",
            2,
            Source::Text,
            compile(
                r"(?i)\b(?:caminar|camina|caminata|walking|walk)\b\D{0,24}?(\d{1,2})\s*(?:minutos|minutes|mins|min)\b",
            ),
            minutes,
        ),
        Strategy::new(
            "minutes-then-walk",
            1,
            Source::Text,
            compile(
                r"(?i)\b(\d{1,2})\s*(?:minutos|minutes|mins|min)\.?\s*(?:a pie|caminando|de caminata|walking|walk)\b",
            ),
            minutes,
        ),
    ]
});

/// Rows of the arrivals table, and the list rendering of the same table
pub(super) static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| select("tr"));

pub(super) static LIST_ROW: LazyLock<Selector> = LazyLock::new(|| select("li"));

/// Row attributes that carry the service code
pub(super) const ROW_ROUTE_ATTRS: [&str; 3] = ["data-route", "data-service", "data-servicio"];

pub(super) static ROW_ROUTE_ATTR: LazyLock<Regex> = LazyLock::new(|| compile(SERVICE_CODE));

pub(super) static ROW_DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)(\d+(?:[.,]\d+)?)\s*(kil[oó]metros|kms|km|metros|mts|mt|m)\b")
});

pub(super) static ROW_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\d+\s*(?:a\s*\d+\s*)?(?:minutos|minutes|mins|min)\b"));

pub(super) static ROW_ROUTE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b([A-Z]?\d{2,3}[a-zA-Z]?)\b"));
