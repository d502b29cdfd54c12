//! Heuristic HTML extraction
//!
//! Pulls transit facts out of pages whose markup nobody promised to keep
//! stable. Pages are parsed into a DOM once; each fact then has an ordered
//! family of pattern strategies (see `patterns`) run over its attributes,
//! elements and visible text. Their matches are tallied and the best scoring
//! candidate wins. A marker element injected by the in-page script takes
//! precedence for stop codes and metro lines when it describes the requested
//! option.

mod arrivals_table;
mod marker;
mod patterns;
mod strategy;

use domain::{LightweightOption, StopCode};
use scraper::{ElementRef, Html};
use tracing::debug;

pub use arrivals_table::ArrivalRow;
pub use marker::Marker;

use patterns::{DURATION, METRO_LINE, OPTION_BLOCK, ROUTE_NUMBER, STOP_CODE, STOP_COUNT, WALKING};
use strategy::{Candidate, Document, Scoreboard, Strategy, first_productive};

/// Route strategies below this priority are too noisy to list every match
const LISTING_MIN_PRIORITY: u8 = 2;

/// How a page answers for the option at one index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Coverage {
    /// The injected marker was written for this option; the whole page describes it
    Marker,
    /// The page lists options and this one is among them
    Block,
    /// One unmarked itinerary with no listing around it, read as the first option
    Unmarked,
    /// Nothing on the page belongs to this option
    #[default]
    Absent,
}

impl Coverage {
    /// Whether the page holds nothing for the option
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Facts extracted for one itinerary option, each independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFacts {
    /// Best-scoring bus route number
    pub route_number: Option<String>,
    /// Canonical metro lines in page order
    pub metro_lines: Vec<String>,
    /// Stop codes in itinerary order
    pub stop_codes: Vec<StopCode>,
    /// Stops travelled on the ride, as printed by the page
    pub stop_count: Option<u32>,
    /// Total trip duration in minutes
    pub duration_minutes: Option<u32>,
    /// Which part of the page the facts were read from
    pub coverage: Coverage,
}

impl ExtractedFacts {
    /// Nothing at all was found
    pub fn is_empty(&self) -> bool {
        self.route_number.is_none()
            && self.metro_lines.is_empty()
            && self.stop_codes.is_empty()
            && self.duration_minutes.is_none()
    }

    /// The route to ride: the bus route if any, else the first metro line
    pub fn primary_route(&self) -> Option<&str> {
        self.route_number
            .as_deref()
            .or_else(|| self.metro_lines.first().map(String::as_str))
    }

    /// Bus route followed by metro lines
    pub fn route_numbers(&self) -> Vec<String> {
        self.route_number
            .iter()
            .chain(self.metro_lines.iter())
            .cloned()
            .collect()
    }
}

/// Cheap per-option facts for the lightweight phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFacts {
    /// Position of the option on the results page
    pub index: usize,
    /// Buses and metro lines in the order the option lists them
    pub route_numbers: Vec<String>,
    /// Total duration, when the page printed one
    pub duration_minutes: Option<u32>,
    /// Walking minutes, zero when none were printed
    pub walking_minutes: u32,
}

impl OptionFacts {
    /// Whether the block yielded anything worth presenting
    pub fn is_empty(&self) -> bool {
        self.route_numbers.is_empty() && self.duration_minutes.is_none()
    }
}

impl From<OptionFacts> for LightweightOption {
    fn from(facts: OptionFacts) -> Self {
        Self::new(
            facts.index,
            facts.route_numbers,
            facts.duration_minutes,
            facts.walking_minutes,
        )
    }
}

/// The part of a page that answers for one option
struct Scope<'a> {
    coverage: Coverage,
    root: Option<ElementRef<'a>>,
    marker: Option<Marker>,
}

/// Stateless extractor over rendered HTML
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Create an extractor
    pub const fn new() -> Self {
        Self
    }

    /// Number of itinerary options the page lists
    ///
    /// A page without recognisable option containers counts as one.
    pub fn option_count(&self, html: &str) -> usize {
        option_blocks(&Html::parse_document(html)).len().max(1)
    }

    /// Cheap facts for every option found on the page
    ///
    /// Blocks that yield nothing are dropped; the survivors keep their page
    /// position as index so a later detail request clicks the right one.
    pub fn lightweight_options(&self, html: &str) -> Vec<OptionFacts> {
        let page = Html::parse_document(html);
        let mut blocks = option_blocks(&page);
        if blocks.is_empty() {
            blocks.push(page.root_element());
        }

        blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                let doc = Document::new(block);
                OptionFacts {
                    index,
                    route_numbers: listed_routes(&doc),
                    duration_minutes: best_number(&DURATION, &doc),
                    walking_minutes: walking_minutes(&doc).unwrap_or(0),
                }
            })
            .filter(|facts| !facts.is_empty())
            .collect()
    }

    /// How `html` answers for the option at `index`
    pub fn coverage(&self, html: &str, index: usize) -> Coverage {
        scope(&Html::parse_document(html), index).coverage
    }

    /// Full facts for the option at `index`
    ///
    /// With an authoritative marker the whole page describes the option. A
    /// page that lists options is narrowed to that option's block, and one
    /// that does not list it yields no facts at all.
    pub fn extract_option(&self, html: &str, index: usize) -> ExtractedFacts {
        let page = Html::parse_document(html);
        let Scope {
            coverage,
            root,
            marker,
        } = scope(&page, index);
        let Some(root) = root else {
            debug!(option = index, "Page holds nothing for this option");
            return ExtractedFacts::default();
        };
        let doc = Document::new(root);

        let mut facts = ExtractedFacts {
            route_number: Scoreboard::tally(&ROUTE_NUMBER, &doc).best().map(|c| c.value.clone()),
            stop_count: best_number(&STOP_COUNT, &doc),
            duration_minutes: best_number(&DURATION, &doc),
            coverage,
            ..ExtractedFacts::default()
        };

        if let Some(marker) = marker {
            facts.stop_codes = marker.stops;
            facts.metro_lines = marker.metro_lines;
            if facts.route_number.is_none() {
                facts.route_number = marker
                    .routes
                    .into_iter()
                    .find(|r| domain::normalize_metro_line(r).is_none());
            }
        }

        if facts.stop_codes.is_empty() {
            facts.stop_codes = Scoreboard::tally(&STOP_CODE, &doc)
                .in_page_order(0)
                .into_iter()
                .filter_map(|c| StopCode::parse(&c.value).ok())
                .collect();
        }
        if facts.metro_lines.is_empty() {
            facts.metro_lines = Scoreboard::tally(&METRO_LINE, &doc)
                .in_page_order(0)
                .into_iter()
                .map(|c| c.value.clone())
                .collect();
        }

        debug!(
            option = index,
            ?coverage,
            route = ?facts.route_number,
            stops = facts.stop_codes.len(),
            metro = facts.metro_lines.len(),
            "Extracted option facts"
        );

        facts
    }

    /// Facts for the first option on the page
    pub fn extract(&self, html: &str) -> ExtractedFacts {
        self.extract_option(html, 0)
    }

    /// Rows of a real-time arrivals page
    pub fn arrivals(&self, html: &str) -> Vec<ArrivalRow> {
        arrivals_table::parse_rows(html)
    }
}

/// Outermost option containers in page order
fn option_blocks(page: &Html) -> Vec<ElementRef<'_>> {
    page.select(&OPTION_BLOCK)
        .filter(|block| {
            !block
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| OPTION_BLOCK.matches(&ancestor))
        })
        .collect()
}

fn scope(page: &Html, index: usize) -> Scope<'_> {
    let marker = Marker::find(page);
    if marker.as_ref().is_some_and(|m| m.describes(index)) {
        return Scope {
            coverage: Coverage::Marker,
            root: Some(page.root_element()),
            marker,
        };
    }

    let blocks = option_blocks(page);
    match blocks.get(index) {
        Some(&block) => Scope {
            coverage: Coverage::Block,
            root: Some(block),
            marker: None,
        },
        None if index == 0 && blocks.is_empty() && marker.is_none() => Scope {
            coverage: Coverage::Unmarked,
            root: Some(page.root_element()),
            marker: None,
        },
        None => Scope {
            coverage: Coverage::Absent,
            root: None,
            marker: None,
        },
    }
}

fn best_number(strategies: &[Strategy], doc: &Document<'_>) -> Option<u32> {
    Scoreboard::tally(strategies, doc)
        .best()
        .and_then(|c| c.value.parse().ok())
}

fn walking_minutes(doc: &Document<'_>) -> Option<u32> {
    let values = first_productive(&WALKING, doc);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().filter_map(|v| v.parse::<u32>().ok()).sum())
}

/// Buses and metro lines of one option, interleaved in page order
fn listed_routes(doc: &Document<'_>) -> Vec<String> {
    let buses = Scoreboard::tally(&ROUTE_NUMBER, doc);
    let mut listed: Vec<&Candidate> = buses.in_page_order(LISTING_MIN_PRIORITY);
    if listed.is_empty() {
        listed.extend(buses.best());
    }

    let metro = Scoreboard::tally(&METRO_LINE, doc);
    listed.extend(metro.in_page_order(0));
    listed.sort_by_key(|c| c.position);

    let mut routes: Vec<String> = Vec::new();
    for candidate in listed {
        if !routes.contains(&candidate.value) {
            routes.push(candidate.value.clone());
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
        <ul class="results">
          <li class="itinerary-option">
            <span class="route-label">506</span>
            <span class="metro-badge">L1</span>
            <span>Caminar 4 min</span><span>Caminar 3 min</span>
            <span class="duration">35 min</span>
          </li>
          <li class="itinerary-option">
            <span class="route-label">210v</span>
            <span>Caminar 9 min</span>
            <span class="duration">48 min</span>
          </li>
          <li class="itinerary-option">
            <span class="ad">Publicidad</span>
          </li>
        </ul>
        </body></html>"#;

    const DETAIL_PAGE: &str = r#"
        <div class="itinerary-detail">
          <div class="service-name"><b>506</b></div>
          <p>Duración: 35 min</p>
          <button class="expand">12 paradas</button>
          <ol>
            <li>Paradero PA433 - Alameda / Estado</li>
            <li>Paradero PA434 - Alameda / San Antonio</li>
            <li>PA440 - Av. Matta / Santa Rosa</li>
          </ol>
        </div>"#;

    #[test]
    fn counts_options() {
        let extractor = HtmlExtractor::new();
        assert_eq!(extractor.option_count(RESULTS_PAGE), 3);
        assert_eq!(extractor.option_count(DETAIL_PAGE), 1);
    }

    #[test]
    fn nested_containers_count_once() {
        let html = r#"<ul>
            <li class="itinerary-option"><a class="route-card" href="/1">506</a></li>
            <li class="itinerary-option"><a class="route-card" href="/2">210</a></li>
        </ul>"#;
        assert_eq!(HtmlExtractor::new().option_count(html), 2);
    }

    #[test]
    fn lightweight_options_per_block() {
        let options = HtmlExtractor::new().lightweight_options(RESULTS_PAGE);

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].index, 0);
        assert_eq!(options[0].route_numbers, vec!["506", "L1"]);
        assert_eq!(options[0].duration_minutes, Some(35));
        assert_eq!(options[0].walking_minutes, 7);

        assert_eq!(options[1].index, 1);
        assert_eq!(options[1].route_numbers, vec!["210V"]);
        assert_eq!(options[1].duration_minutes, Some(48));
    }

    #[test]
    fn lightweight_option_conversion() {
        let facts = HtmlExtractor::new().lightweight_options(RESULTS_PAGE).remove(0);
        let option = LightweightOption::from(facts);
        assert_eq!(option.transfers, 1);
        assert!(option.summary.starts_with("Option 1: bus 506, then metro L1."));
    }

    #[test]
    fn detail_page_without_marker() {
        let facts = HtmlExtractor::new().extract(DETAIL_PAGE);

        assert_eq!(facts.route_number.as_deref(), Some("506"));
        assert_eq!(facts.duration_minutes, Some(35));
        assert_eq!(facts.stop_count, Some(12));
        let codes: Vec<_> = facts.stop_codes.iter().map(StopCode::as_str).collect();
        assert_eq!(codes, vec!["PA433", "PA434", "PA440"]);
        assert_eq!(facts.coverage, Coverage::Unmarked);
    }

    #[test]
    fn encoded_page_copy_is_read() {
        let html = "<p>5 min</p><p>5 min</p><p>Duraci&#243;n: 42 min</p><p>Toma la L&#237;nea 5</p>";
        let facts = HtmlExtractor::new().extract(html);

        assert_eq!(facts.duration_minutes, Some(42));
        assert_eq!(facts.metro_lines, vec!["L5"]);
    }

    #[test]
    fn stop_codes_keep_page_order_across_encoded_copy() {
        let html = r#"
            <p>Paradero&nbsp;PA440</p>
            <span data-stop-code="PA433"></span>
            <p>Parada PA434</p>"#;
        let facts = HtmlExtractor::new().extract(html);
        let codes: Vec<_> = facts.stop_codes.iter().map(StopCode::as_str).collect();
        assert_eq!(codes, vec!["PA440", "PA433", "PA434"]);
    }

    #[test]
    fn marker_is_authoritative_for_its_option() {
        let html = format!(
            r#"{DETAIL_PAGE}<div id="trayecto-extraction" data-option="0" data-stops="PA500,PA501" data-metro="L2" data-routes="506"></div>"#
        );
        let facts = HtmlExtractor::new().extract_option(&html, 0);

        assert_eq!(facts.coverage, Coverage::Marker);
        let codes: Vec<_> = facts.stop_codes.iter().map(StopCode::as_str).collect();
        assert_eq!(codes, vec!["PA500", "PA501"]);
        assert_eq!(facts.metro_lines, vec!["L2"]);
        assert_eq!(facts.route_number.as_deref(), Some("506"));
    }

    #[test]
    fn marker_for_another_option_is_ignored() {
        let html = format!(
            r#"{RESULTS_PAGE}<div id="trayecto-extraction" data-option="0" data-stops="PA500" data-metro="L2"></div>"#
        );
        let facts = HtmlExtractor::new().extract_option(&html, 1);

        assert_eq!(facts.coverage, Coverage::Block);
        assert!(facts.stop_codes.is_empty());
        assert_eq!(facts.route_number.as_deref(), Some("210V"));
        assert_eq!(facts.duration_minutes, Some(48));
    }

    #[test]
    fn marked_page_does_not_answer_for_other_options() {
        let html = format!(
            r#"{DETAIL_PAGE}<div id="trayecto-extraction" data-option="0" data-stops="PA433,PA434"></div>"#
        );
        let extractor = HtmlExtractor::new();

        assert_eq!(extractor.coverage(&html, 0), Coverage::Marker);
        let other = extractor.extract_option(&html, 1);
        assert!(other.is_empty());
        assert!(other.coverage.is_absent());
    }

    #[test]
    fn listed_options_answer_only_for_their_own_index() {
        let extractor = HtmlExtractor::new();
        assert_eq!(extractor.coverage(RESULTS_PAGE, 1), Coverage::Block);

        let beyond = extractor.extract_option(RESULTS_PAGE, 5);
        assert!(beyond.is_empty());
        assert_eq!(beyond.coverage, Coverage::Absent);

        assert!(extractor.coverage(DETAIL_PAGE, 1).is_absent());

        let single = r#"<div class="trip-card"><span class="route-label">506</span></div>"#;
        assert_eq!(extractor.extract_option(single, 0).route_number.as_deref(), Some("506"));
        assert!(extractor.extract_option(single, 1).is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = HtmlExtractor::new();
        let first = extractor.extract(DETAIL_PAGE);
        for _ in 0..5 {
            assert_eq!(extractor.extract(DETAIL_PAGE), first);
        }
    }

    #[test]
    fn empty_page_yields_no_facts() {
        let facts = HtmlExtractor::new().extract("<html><body>Sin resultados</body></html>");
        assert!(facts.is_empty());
        assert!(facts.primary_route().is_none());
    }

    #[test]
    fn primary_route_falls_back_to_metro() {
        let facts = ExtractedFacts {
            metro_lines: vec!["L4A".into()],
            ..ExtractedFacts::default()
        };
        assert_eq!(facts.primary_route(), Some("L4A"));
        assert_eq!(facts.route_numbers(), vec!["L4A"]);
    }
}
