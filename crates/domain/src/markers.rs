//! Identifiers shared between the in-page extraction script and the HTML extractor

/// `id` attribute of the hidden element the in-page script injects with its findings
pub const EXTRACTION_MARKER_ID: &str = "trayecto-extraction";

/// Attribute carrying the option index the marker was captured for
pub const MARKER_OPTION_ATTR: &str = "data-option";

/// Attribute carrying comma-separated stop codes in itinerary order
pub const MARKER_STOPS_ATTR: &str = "data-stops";

/// Attribute carrying comma-separated metro line identifiers
pub const MARKER_METRO_ATTR: &str = "data-metro";

/// Attribute carrying comma-separated route numbers seen in the selected option
pub const MARKER_ROUTES_ATTR: &str = "data-routes";
