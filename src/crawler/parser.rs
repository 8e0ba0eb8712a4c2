//! Listing parser for search result pages
//!
//! The site's markup changes often, so every lookup is a table of ordered
//! strategies and the first one that produces a value wins:
//! - listing containers: CSS selectors, then a text heuristic
//! - each record field: CSS text/attribute reads, then a label scan
//!
//! A missing field leaves that field empty. A container without a usable apply
//! link is dropped. Only a page that cannot be read as a listing page at all
//! is an error.

use crate::listing::ListingRecord;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Page-level parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response body is not HTML")]
    NotMarkup,

    #[error("anti-bot challenge page: {0}")]
    Challenge(String),
}

/// Listings extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Records in page order
    pub records: Vec<ListingRecord>,

    /// Number of listing containers found
    pub containers: usize,

    /// Containers dropped for lack of an apply link
    pub dropped: usize,

    /// Name of the container strategy that matched
    pub strategy: Option<String>,
}

/// How a field value is read from a listing container
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Text of the first matching descendant
    Text(&'static str),
    /// Attribute of the first matching descendant
    Attr(&'static str, &'static str),
    /// Attribute of the container element itself
    OwnAttr(&'static str),
    /// Text following a label such as "Stipend"
    Label(&'static str),
}

const CONTAINERS: &[&str] = &[
    ".individual_internship",
    ".internship_list_container .individual_internship",
    ".internship-container",
    ".internships-list .internship-container",
    ".internship-container .internship",
    ".internship_list > div",
    ".internship-list > div",
    ".internships > div",
    ".internship_list li",
    ".internships li",
];

const TITLE: &[Rule] = &[
    Rule::Text(".job-title-href"),
    Rule::Text(".profile"),
    Rule::Text("h3.heading"),
    Rule::Text(".heading a"),
    Rule::Text(".internship-title"),
    Rule::Attr("a[title]", "title"),
];

const COMPANY: &[Rule] = &[
    Rule::Text(".company-name"),
    Rule::Text(".company_name"),
    Rule::Text(".company_and_premium"),
    Rule::Text(".company-text"),
    Rule::Text(".company_text"),
    Rule::Text(".company"),
];

const LOCATION: &[Rule] = &[
    Rule::Text(".locations a"),
    Rule::Text(".locations span"),
    Rule::Text(".location_names"),
    Rule::Text(".location_link"),
    Rule::Text(".location-name"),
    Rule::Text(".location"),
    Rule::Label("Location"),
];

const DURATION: &[Rule] = &[
    Rule::Text(".ic-16-calendar + span"),
    Rule::Text(".duration"),
    Rule::Text(".other_detail_item .item_body"),
    Rule::Label("Duration"),
];

const STIPEND: &[Rule] = &[
    Rule::Text(".stipend"),
    Rule::Text(".stipend-text"),
    Rule::Text(".stipend_text"),
    Rule::Text(".stipend_container"),
    Rule::Label("Stipend"),
];

const KIND: &[Rule] = &[
    Rule::Text(".gray-labels .status-li span"),
    Rule::Text(".internship_label"),
    Rule::Text(".label_container span"),
    Rule::Text(".label-container span"),
    Rule::Text(".badge-container span"),
    Rule::Text("span.badge"),
];

const POSTED: &[Rule] = &[
    Rule::Text(".status-success span"),
    Rule::Text(".status-info span"),
    Rule::Text(".status-inactive span"),
    Rule::Text(".posted_by_container"),
    Rule::Text(".posted span"),
    Rule::Text(".posted-by"),
    Rule::Text(".posted_by"),
    Rule::Text(".posted-on"),
    Rule::Text(".posted_on"),
    Rule::Label("Posted"),
];

const APPLY_LINK: &[Rule] = &[
    Rule::Attr("a.job-title-href", "href"),
    Rule::Attr("a.view_detail_button", "href"),
    Rule::Attr("a.apply_button", "href"),
    Rule::Attr("a.view-detail-button", "href"),
    Rule::Attr("a.view-detail", "href"),
    Rule::Attr("a.view_detail", "href"),
    Rule::Attr(".view-detail a", "href"),
    Rule::Attr(".apply a", "href"),
    Rule::Attr(".apply_now a", "href"),
    Rule::Attr("a.apply_now", "href"),
    Rule::OwnAttr("data-href"),
];

const LOGO: &[Rule] = &[
    Rule::Attr(".internship_logo img", "src"),
    Rule::Attr(".company_logo img", "src"),
    Rule::Attr(".logo img", "src"),
    Rule::Attr(".company-logo img", "src"),
    Rule::Attr(".internship-logo img", "src"),
    Rule::Attr(".internship_logo img", "data-src"),
];

const ACTIVELY_HIRING: &[&str] = &[
    ".actively-hiring-badge",
    ".actively_hiring_badge",
    ".actively-hiring",
    ".badge-actively-hiring",
    ".actively_hiring",
];

const EARLY_APPLICANT: &[&str] = &[
    ".early_applicant_wrapper",
    ".early-applicant",
    ".early_applicant",
];

const CHALLENGE_MARKERS: &[&str] = &[
    "#challenge-form",
    "#cf-challenge-running",
    ".cf-browser-verification",
];

const CHALLENGE_TITLES: &[&str] = &["just a moment...", "attention required! | cloudflare"];

/// Compiles a selector, logging and skipping one that does not parse
fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Skipping invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// One compiled extraction strategy
#[derive(Debug)]
enum Strategy {
    Text(Selector),
    Attr(Selector, &'static str),
    OwnAttr(&'static str),
    Label(Selector, &'static str),
}

impl Strategy {
    fn compile(rule: Rule) -> Option<Self> {
        match rule {
            Rule::Text(css) => compile(css).map(Self::Text),
            Rule::Attr(css, attr) => compile(css).map(|s| Self::Attr(s, attr)),
            Rule::OwnAttr(attr) => Some(Self::OwnAttr(attr)),
            Rule::Label(label) => compile("*").map(|s| Self::Label(s, label)),
        }
    }

    fn apply(&self, card: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text(selector) => card
                .select(selector)
                .find_map(|element| clean_text(&element_text(element))),
            Self::Attr(selector, attr) => card
                .select(selector)
                .filter_map(|element| element.value().attr(attr))
                .find_map(clean_text),
            Self::OwnAttr(attr) => card.value().attr(attr).and_then(clean_text),
            Self::Label(any, label) => labelled_value(card, any, label),
        }
    }
}

/// Ordered strategies for one field
#[derive(Debug)]
struct Field {
    name: &'static str,
    strategies: Vec<Strategy>,
}

impl Field {
    fn new(name: &'static str, rules: &[Rule]) -> Self {
        Self {
            name,
            strategies: rules.iter().copied().filter_map(Strategy::compile).collect(),
        }
    }

    fn extract(&self, card: ElementRef<'_>) -> Option<String> {
        let value = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.apply(card));
        if value.is_none() {
            tracing::trace!("No value for field '{}'", self.name);
        }
        value
    }
}

/// Extracts listing records from search result pages
#[derive(Debug)]
pub struct ListingParser {
    base_url: Url,
    containers: Vec<(&'static str, Selector)>,
    title: Field,
    company: Field,
    location: Field,
    duration: Field,
    stipend: Field,
    kind: Field,
    posted: Field,
    apply_link: Field,
    logo_url: Field,
    actively_hiring: Vec<Selector>,
    early_applicant: Vec<Selector>,
    challenge_markers: Vec<(&'static str, Selector)>,
    div: Option<Selector>,
    title_tag: Option<Selector>,
}

impl ListingParser {
    /// Creates a parser; relative links are resolved against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            containers: compile_named(CONTAINERS),
            title: Field::new("title", TITLE),
            company: Field::new("company", COMPANY),
            location: Field::new("location", LOCATION),
            duration: Field::new("duration", DURATION),
            stipend: Field::new("stipend", STIPEND),
            kind: Field::new("type", KIND),
            posted: Field::new("posted", POSTED),
            apply_link: Field::new("apply_link", APPLY_LINK),
            logo_url: Field::new("logo_url", LOGO),
            actively_hiring: compile_all(ACTIVELY_HIRING),
            early_applicant: compile_all(EARLY_APPLICANT),
            challenge_markers: compile_named(CHALLENGE_MARKERS),
            div: compile("div"),
            title_tag: compile("title"),
        }
    }

    /// Parses one results page into records, in page order
    ///
    /// An empty body, or a page without listings, yields an empty page rather
    /// than an error.
    ///
    /// # Example
    ///
    /// ```
    /// use internship_scout::crawler::ListingParser;
    /// use url::Url;
    ///
    /// let parser = ListingParser::new(Url::parse("https://internshala.com/").unwrap());
    /// let html = r#"<div class="individual_internship">
    ///     <a class="job-title-href" href="/internship/detail/1">Backend Intern</a>
    /// </div>"#;
    /// let page = parser.parse(html).unwrap();
    /// assert_eq!(page.records[0].apply_link, "https://internshala.com/internship/detail/1");
    /// ```
    pub fn parse(&self, html: &str) -> Result<ParsedPage, ParseError> {
        let trimmed = html.trim();
        if trimmed.is_empty() {
            return Ok(ParsedPage::default());
        }
        if !trimmed.contains('<') {
            return Err(ParseError::NotMarkup);
        }

        let document = Html::parse_document(html);
        self.check_challenge(&document)?;

        let (strategy, cards) = self.locate_containers(&document);
        let mut page = ParsedPage {
            containers: cards.len(),
            strategy: strategy.map(str::to_string),
            ..ParsedPage::default()
        };

        if let Some(name) = strategy {
            tracing::debug!("Found {} listing containers using '{}'", cards.len(), name);
        } else {
            tracing::debug!("No listing containers found");
        }

        for card in cards {
            match self.parse_container(card) {
                Some(record) => page.records.push(record),
                None => {
                    page.dropped += 1;
                    tracing::warn!("Dropping listing without an apply link");
                }
            }
        }

        Ok(page)
    }

    fn check_challenge(&self, document: &Html) -> Result<(), ParseError> {
        if let Some((marker, _)) = self
            .challenge_markers
            .iter()
            .find(|(_, selector)| document.select(selector).next().is_some())
        {
            return Err(ParseError::Challenge(format!("found {}", marker)));
        }

        let title = self.title_tag.as_ref().and_then(|selector| {
            document
                .select(selector)
                .next()
                .map(|element| element_text(element).to_lowercase())
        });
        if let Some(title) = title {
            if CHALLENGE_TITLES.contains(&title.as_str()) {
                return Err(ParseError::Challenge(format!("title '{}'", title)));
            }
        }

        Ok(())
    }

    /// Tries each container strategy in order, falling back to the text heuristic
    fn locate_containers<'a>(
        &self,
        document: &'a Html,
    ) -> (Option<&'static str>, Vec<ElementRef<'a>>) {
        for (name, selector) in &self.containers {
            let cards: Vec<_> = document.select(selector).collect();
            if !cards.is_empty() {
                return (Some(*name), cards);
            }
        }

        let cards = self.text_heuristic(document);
        if cards.is_empty() {
            (None, cards)
        } else {
            (Some("text heuristic"), cards)
        }
    }

    /// Innermost `div`s whose text reads like a listing card
    fn text_heuristic<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(div) = &self.div else {
            return Vec::new();
        };
        let candidates: Vec<ElementRef<'a>> = document
            .select(div)
            .filter(|element| looks_like_listing(&element_text(*element).to_lowercase()))
            .collect();

        candidates
            .iter()
            .filter(|outer| {
                !candidates.iter().any(|inner| {
                    inner.id() != outer.id()
                        && inner.ancestors().any(|ancestor| ancestor.id() == outer.id())
                })
            })
            .copied()
            .collect()
    }

    /// Extracts one record; `None` when no apply link can be recovered
    fn parse_container(&self, card: ElementRef<'_>) -> Option<ListingRecord> {
        let apply_link = self
            .apply_link
            .extract(card)
            .and_then(|href| resolve_link(&href, &self.base_url))?;

        let card_text = element_text(card).to_lowercase();

        Some(ListingRecord {
            title: self.title.extract(card),
            company: self
                .company
                .extract(card)
                .and_then(|company| clean_text(&remove_phrase(&company, "actively hiring"))),
            location: self.location.extract(card),
            duration: self
                .duration
                .extract(card)
                .and_then(|value| strip_label(&value, "Duration")),
            stipend: self
                .stipend
                .extract(card)
                .and_then(|value| strip_label(&value, "Stipend")),
            actively_hiring: has_marker(card, &self.actively_hiring)
                || card_text.contains("actively hiring"),
            early_applicant: has_marker(card, &self.early_applicant)
                || card_text.contains("early applicant"),
            kind: self.kind.extract(card),
            posted: self.posted.extract(card),
            apply_link,
            logo_url: self
                .logo_url
                .extract(card)
                .and_then(|src| resolve_link(&src, &self.base_url)),
        })
    }
}

fn compile_all(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|css| compile(css)).collect()
}

fn compile_named(list: &[&'static str]) -> Vec<(&'static str, Selector)> {
    list.iter()
        .filter_map(|css| compile(css).map(|selector| (*css, selector)))
        .collect()
}

/// Text content of an element with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses whitespace; blank and "Not specified" values count as absent
fn clean_text(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() || text.eq_ignore_ascii_case("not specified") {
        None
    } else {
        Some(text)
    }
}

/// Text after `label` when `value` starts with it as a whole word
///
/// The label must be followed by the end of the text, whitespace or `:`, so
/// "Location" does not match "Locations: Pune".
fn after_label<'a>(value: &'a str, label: &str) -> Option<&'a str> {
    let prefix = value.get(..label.len())?;
    if !prefix.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = &value[label.len()..];
    match rest.chars().next() {
        None | Some(':') => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}

/// Removes a leading label (and colon) from a display value
fn strip_label(value: &str, label: &str) -> Option<String> {
    let rest = after_label(value, label).unwrap_or(value);
    clean_text(rest.trim_start().trim_start_matches(':'))
}

/// Removes every occurrence of a whitespace-separated phrase, ignoring case
fn remove_phrase(text: &str, phrase: &str) -> String {
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut kept = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        let matches = words.len() - i >= phrase.len()
            && words[i..i + phrase.len()]
                .iter()
                .zip(&phrase)
                .all(|(word, expected)| word.eq_ignore_ascii_case(expected));
        if matches {
            i += phrase.len();
        } else {
            kept.push(words[i]);
            i += 1;
        }
    }

    kept.join(" ")
}

/// Finds the value following `label` in the smallest element that starts with it
fn labelled_value(card: ElementRef<'_>, any: &Selector, label: &str) -> Option<String> {
    card.select(any)
        .map(element_text)
        .filter_map(|text| {
            let rest = after_label(&text, label)?;
            let value = clean_text(rest.trim_start().trim_start_matches(':'))?;
            Some((text.len(), value))
        })
        .min_by_key(|(len, _)| *len)
        .map(|(_, value)| value)
}

fn has_marker(card: ElementRef<'_>, markers: &[Selector]) -> bool {
    markers
        .iter()
        .any(|selector| card.select(selector).next().is_some())
}

fn looks_like_listing(text: &str) -> bool {
    (text.contains("internship") || text.contains("job"))
        && (text.contains("stipend") || text.contains("salary") || text.contains("month"))
        && (text.contains("duration") || text.contains("location"))
}

/// Resolves an href or src to an absolute http(s) URL
///
/// Returns None for `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only
/// links, and for anything that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
