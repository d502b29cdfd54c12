//! Target URL construction from templates
//!
//! Substitution is plain text replacement of `{placeholder}` tokens with
//! percent-encoded values, so the same inputs always produce the same URL.

use domain::GeoLocation;
use url::Url;

use crate::config::BrowserConfig;
use crate::error::BrowserError;

/// Build the itinerary page URL
///
/// # Errors
///
/// Returns `BrowserError::ConfigurationError` if the result is not a valid URL.
pub fn itinerary_url(
    template: &str,
    origin_name: &str,
    destination_name: &str,
    origin: GeoLocation,
    destination: GeoLocation,
) -> Result<String, BrowserError> {
    let url = template
        .replace("{origin_name}", &encode(origin_name))
        .replace("{destination_name}", &encode(destination_name))
        .replace("{origin_lat}", &coordinate(origin.latitude()))
        .replace("{origin_lon}", &coordinate(origin.longitude()))
        .replace("{destination_lat}", &coordinate(destination.latitude()))
        .replace("{destination_lon}", &coordinate(destination.longitude()));
    checked(url)
}

/// Build the arrivals page URL for a stop
///
/// # Errors
///
/// Returns `BrowserError::ConfigurationError` if the result is not a valid URL.
pub fn arrivals_url(template: &str, stop_code: &str) -> Result<String, BrowserError> {
    checked(template.replace("{stop_code}", &encode(stop_code)))
}

/// Both templates must expand to valid URLs
pub(crate) fn check_templates(config: &BrowserConfig) -> Result<(), String> {
    let here = GeoLocation::santiago();
    itinerary_url(&config.itinerary_url_template, "A", "B", here, here)
        .map_err(|e| format!("itinerary_url_template: {e}"))?;
    arrivals_url(&config.arrivals_url_template, "PA433")
        .map_err(|e| format!("arrivals_url_template: {e}"))?;
    Ok(())
}

fn encode(value: &str) -> String {
    // byte_serialize writes spaces as '+' and a literal '+' as %2B
    url::form_urlencoded::byte_serialize(value.trim().as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Six decimals, about 10 cm
fn coordinate(value: f64) -> String {
    format!("{value:.6}")
}

fn checked(url: String) -> Result<String, BrowserError> {
    Url::parse(&url).map_err(|e| BrowserError::ConfigurationError(format!("{url}: {e}")))?;
    Ok(url)
}
