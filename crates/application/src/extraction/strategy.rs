//! Prioritized pattern strategies and the scorer that ranks their matches

use std::fmt;

use regex::{Captures, Regex};
use scraper::{ElementRef, Selector};

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Where in the parsed page a strategy looks
#[derive(Debug, Clone)]
pub enum Source {
    /// Visible text of the whole scope, so a match may span elements
    Text,
    /// Each visible text node on its own
    Node,
    /// Values of the named attributes on every element
    Attributes(&'static [&'static str]),
    /// Text content of every element the selector matches
    Element(Selector),
}

/// Turns a regex match into a canonical value, rejecting implausible ones
pub type Normalizer = fn(&Captures<'_>) -> Option<String>;

/// A named pattern with a fixed specificity
pub struct Strategy {
    /// Name used in debug logs
    pub name: &'static str,
    /// Higher is more specific
    pub priority: u8,
    /// Part of the page this strategy scans
    pub source: Source,
    pattern: Regex,
    normalize: Normalizer,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Strategy {
    /// Create a strategy from a compiled pattern
    pub fn new(
        name: &'static str,
        priority: u8,
        source: Source,
        pattern: Regex,
        normalize: Normalizer,
    ) -> Self {
        Self {
            name,
            priority,
            source,
            pattern,
            normalize,
        }
    }

    /// Every normalized match in document order, with where it sits in the tree
    pub fn matches(&self, doc: &Document<'_>) -> Vec<(String, Position)> {
        let mut found = Vec::new();
        match &self.source {
            Source::Text => {
                self.scan(doc.text(), &mut found, |start| doc.text_position(start));
            },
            Source::Node => {
                for segment in &doc.segments {
                    self.scan(&doc.text[segment.start..segment.end], &mut found, |start| {
                        Position::new(segment.node, start)
                    });
                }
            },
            Source::Attributes(names) => {
                for (node, element) in doc.elements() {
                    for value in names.iter().filter_map(|name| element.value().attr(name)) {
                        self.scan(value, &mut found, |_| Position::new(node, 0));
                    }
                }
            },
            Source::Element(selector) => {
                for (node, element) in doc.elements() {
                    if selector.matches(&element) {
                        let text = element_text(element);
                        self.scan(&text, &mut found, |start| Position::new(node, start));
                    }
                }
            },
        }
        found
    }

    fn scan(
        &self,
        haystack: &str,
        found: &mut Vec<(String, Position)>,
        locate: impl Fn(usize) -> Position,
    ) {
        for caps in self.pattern.captures_iter(haystack) {
            let (Some(whole), Some(value)) = (caps.get(0), (self.normalize)(&caps)) else {
                continue;
            };
            found.push((value, locate(whole.start())));
        }
    }
}

/// First capture group, trimmed, as-is
pub fn first_group(caps: &Captures<'_>) -> Option<String> {
    caps.get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Where a match sits: the tree node it came from, then the byte offset inside it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    node: usize,
    offset: usize,
}

impl Position {
    const fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// One visible text node inside the joined text view
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: usize,
    end: usize,
    node: usize,
}

/// A subtree of a parsed page, prepared once and shared by every strategy
///
/// Nodes are numbered in document order from the scope root, so matches from
/// attributes, elements and text can be ordered against each other.
#[derive(Debug)]
pub struct Document<'a> {
    root: ElementRef<'a>,
    text: String,
    segments: Vec<Segment>,
}

impl<'a> Document<'a> {
    /// Collect the visible text under `root`
    pub fn new(root: ElementRef<'a>) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();

        for (node, current) in root.descendants().enumerate() {
            let Some(raw) = current.value().as_text() else {
                continue;
            };
            let hidden = current.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
            });
            let collapsed = collapse_whitespace(raw);
            if hidden || collapsed.is_empty() {
                continue;
            }

            if !text.is_empty() {
                text.push(' ');
            }
            let start = text.len();
            text.push_str(&collapsed);
            segments.push(Segment {
                start,
                end: text.len(),
                node,
            });
        }

        Self {
            root,
            text,
            segments,
        }
    }

    /// Visible text, entities decoded and whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Elements under the root, root included, with their document-order number
    fn elements(&self) -> impl Iterator<Item = (usize, ElementRef<'a>)> + use<'a> {
        self.root
            .descendants()
            .enumerate()
            .filter_map(|(node, current)| ElementRef::wrap(current).map(|e| (node, e)))
    }

    fn text_position(&self, byte: usize) -> Position {
        let index = self
            .segments
            .partition_point(|s| s.start <= byte)
            .saturating_sub(1);
        self.segments
            .get(index)
            .map_or_else(Position::default, |s| Position::new(s.node, byte - s.start))
    }
}

/// Text of an element, one space between text nodes
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One distinct value with its tallied evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Normalized value
    pub value: String,
    /// Highest priority of any strategy that produced it
    pub priority: u8,
    /// Total matches across all strategies
    pub frequency: u32,
    /// Order of first encounter (strategies in order, matches in document order)
    pub first_seen: usize,
    /// Earliest place on the page
    pub position: Position,
}

/// Tally of every candidate a family of strategies produced for one page
#[derive(Debug, Default)]
pub struct Scoreboard {
    candidates: Vec<Candidate>,
}

impl Scoreboard {
    /// Run every strategy over `doc` and tally the results
    pub fn tally(strategies: &[Strategy], doc: &Document<'_>) -> Self {
        let mut board = Self::default();
        let mut seen = 0usize;

        for strategy in strategies {
            for (value, position) in strategy.matches(doc) {
                match board.candidates.iter_mut().find(|c| c.value == value) {
                    Some(existing) => {
                        existing.priority = existing.priority.max(strategy.priority);
                        existing.frequency += 1;
                        existing.position = existing.position.min(position);
                    },
                    None => {
                        board.candidates.push(Candidate {
                            value,
                            priority: strategy.priority,
                            frequency: 1,
                            first_seen: seen,
                            position,
                        });
                    },
                }
                seen += 1;
            }
        }

        board
    }

    /// Whether no strategy matched
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates ordered by priority, then frequency, then encounter order
    pub fn ranked(&self) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.frequency.cmp(&a.frequency))
                .then(a.first_seen.cmp(&b.first_seen))
        });
        ranked
    }

    /// The single best-scoring candidate
    pub fn best(&self) -> Option<&Candidate> {
        self.ranked().into_iter().next()
    }

    /// Candidates at or above `min_priority`, in the order they appear on the page
    pub fn in_page_order(&self, min_priority: u8) -> Vec<&Candidate> {
        let mut ordered: Vec<&Candidate> = self
            .candidates
            .iter()
            .filter(|c| c.priority >= min_priority)
            .collect();
        ordered.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.first_seen.cmp(&b.first_seen))
        });
        ordered
    }
}

/// Values from the most specific strategy that matched at all, every occurrence kept
pub fn first_productive(strategies: &[Strategy], doc: &Document<'_>) -> Vec<String> {
    strategies
        .iter()
        .map(|s| s.matches(doc))
        .find(|found| !found.is_empty())
        .map(|found| found.into_iter().map(|(value, _)| value).collect())
        .unwrap_or_default()
}
