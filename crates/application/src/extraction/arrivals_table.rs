//! Parses the real-time arrivals table for one stop

use scraper::{ElementRef, Html};

use super::patterns::{
    LIST_ROW, ROW_DISTANCE, ROW_MINUTES, ROW_ROUTE_ATTR, ROW_ROUTE_ATTRS, ROW_ROUTE_TOKEN,
    TABLE_ROW,
};
use super::strategy::element_text;

/// One vehicle reading from the table
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRow {
    /// Route number, upper-cased
    pub route_number: String,
    /// Distance to the stop in kilometers
    pub distance_km: f64,
}

/// Extract every (route, distance) row, dropping exact duplicates
///
/// Rows are read from `<tr>` elements, or `<li>` elements when the page renders
/// the table as a list. Rows without both a route and a distance are skipped.
pub fn parse_rows(html: &str) -> Vec<ArrivalRow> {
    let page = Html::parse_document(html);
    let mut rows: Vec<ElementRef<'_>> = page.select(&TABLE_ROW).collect();
    if rows.is_empty() {
        rows = page.select(&LIST_ROW).collect();
    }

    let mut parsed: Vec<ArrivalRow> = Vec::new();
    for row in rows {
        let Some(arrival) = parse_row(row) else {
            continue;
        };
        let duplicate = parsed.iter().any(|p| {
            p.route_number == arrival.route_number
                && (p.distance_km - arrival.distance_km).abs() < f64::EPSILON
        });
        if !duplicate {
            parsed.push(arrival);
        }
    }
    parsed
}

fn parse_row(row: ElementRef<'_>) -> Option<ArrivalRow> {
    let text = element_text(row);

    let distance = ROW_DISTANCE.captures(&text)?;
    let distance_km = to_km(distance.get(1)?.as_str(), distance.get(2)?.as_str())?;

    let attribute = ROW_ROUTE_ATTRS
        .iter()
        .filter_map(|name| row.value().attr(name))
        .find_map(|value| ROW_ROUTE_ATTR.captures(value).and_then(|c| c.get(1)));

    let route_number = match attribute {
        Some(attr) => attr.as_str().to_uppercase(),
        None => {
            let remaining = ROW_DISTANCE.replace_all(&text, " ");
            let remaining = ROW_MINUTES.replace_all(&remaining, " ");
            ROW_ROUTE_TOKEN
                .captures(&remaining)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_uppercase())?
        },
    };

    Some(ArrivalRow {
        route_number,
        distance_km,
    })
}

fn to_km(amount: &str, unit: &str) -> Option<f64> {
    let value: f64 = amount.replace(',', ".").parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let unit = unit.to_lowercase();
    if unit.starts_with('k') {
        Some(value)
    } else {
        Some(value / 1000.0)
    }
}
