use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use schedule_parser::{
    dispatch, DateParser, Dispatch, FatalParseError, LineParser, ParseErrorKind, ScheduleRecord,
    ScheduleUpdate, TimeParser,
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::geocode::Location;
use crate::listing::{Borough, ListingNode, PageContext, SiteListing, SiteType};
use crate::metadata::{MetadataParser, MetadataUpdate};

lazy_static! {
    static ref ZIP_LINE: Regex = Regex::new(r"(NY|New York|Bronx|Brooklyn|Manhattan|Queens),? [0-9]{5}")
        .expect("ZIP_LINE regex to compile");
}

const SCHEDULE_ANCHOR: &str = "#scheduleContainer";
const ZERO_WIDTH_SPACE: &str = "\u{200B}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Offer {
    Pcr,
    Antibody,
    RapidMolecular,
    RapidAntigen,
    Rapid,
    SalivaPcr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSite {
    pub name: String,
    pub link: Option<Url>,
    pub address: String,
    pub borough: Borough,
    pub site_type: SiteType,
    pub phone: Option<String>,
    pub minimum_age: u32,
    pub offers: Vec<Offer>,
    pub pre_register_link: Option<String>,
    pub location: Option<Location>,
    pub wait_time: String,
    pub closed: Vec<NaiveDate>,
    pub notes: Vec<String>,
    pub appointments_required: bool,
    #[serde(flatten)]
    pub schedule: ScheduleRecord,
}

/// Anything one line of a listing can contribute to a [`ParsedSite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteUpdate {
    Schedule(ScheduleUpdate),
    Metadata(MetadataUpdate),
}

impl From<ScheduleUpdate> for SiteUpdate {
    fn from(update: ScheduleUpdate) -> Self {
        SiteUpdate::Schedule(update)
    }
}

impl ParsedSite {
    pub fn new(borough: Borough, site_type: SiteType) -> Self {
        Self {
            name: String::new(),
            link: None,
            address: String::new(),
            borough,
            site_type,
            phone: None,
            minimum_age: 2,
            offers: vec![],
            pre_register_link: None,
            location: None,
            wait_time: "unknown".to_string(),
            closed: vec![],
            notes: vec![],
            appointments_required: false,
            schedule: ScheduleRecord::new(),
        }
    }

    pub fn apply(&mut self, update: SiteUpdate) {
        match update {
            SiteUpdate::Schedule(update) => self.schedule.apply(update),
            SiteUpdate::Metadata(MetadataUpdate::Phone(phone)) => self.phone = Some(phone),
            SiteUpdate::Metadata(MetadataUpdate::MinimumAge(age)) => self.minimum_age = age,
            SiteUpdate::Metadata(MetadataUpdate::Offers(offers)) => self.offers.extend(offers),
            SiteUpdate::Metadata(MetadataUpdate::Boilerplate) => {}
        }
    }
}

#[derive(Debug, Error)]
pub enum SiteParseError {
    #[error("could not find a ZIP code line in {0:?}")]
    MissingZipLine(String),
    #[error(transparent)]
    Fatal(#[from] FatalParseError),
}

fn has_content(node: &ListingNode) -> bool {
    match node {
        ListingNode::Text { text } => !text.trim().is_empty(),
        ListingNode::Element { tag, .. } => !tag.eq_ignore_ascii_case("br"),
        ListingNode::Link { .. } => true,
    }
}

fn is_inline_text(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("span") || tag.eq_ignore_ascii_case("strong")
}

/// Turns one site listing into a [`ParsedSite`]: name, address, then one dispatch per line.
pub struct SiteParser {
    dates: DateParser,
    times: TimeParser,
    metadata: MetadataParser,
}

impl SiteParser {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            dates: DateParser::new(today),
            times: TimeParser::new(),
            metadata: MetadataParser,
        }
    }

    #[tracing::instrument(skip_all, fields(borough = %listing.borough, site_type = %listing.site_type))]
    pub fn parse(
        &self,
        listing: &SiteListing,
        page: &PageContext,
    ) -> Result<ParsedSite, SiteParseError> {
        let mut site = ParsedSite::new(listing.borough, listing.site_type);
        let nodes = listing
            .nodes
            .iter()
            .filter(|node| has_content(node))
            .collect::<Vec<_>>();
        let mut nodes = nodes.into_iter();

        let Some(first) = nodes.next() else {
            site.schedule
                .push_error(ParseErrorKind::NoText, "no text to parse");
            return Ok(site);
        };

        parse_name(first, page, &mut site);

        let mut address_lines = vec![];
        for node in nodes.by_ref() {
            if let ListingNode::Text { text } = node {
                let line = text.trim();
                address_lines.push(line);
                if ZIP_LINE.is_match(line) {
                    break;
                }
            }
        }
        if nodes.as_slice().is_empty() {
            return Err(SiteParseError::MissingZipLine(address_lines.join("\n")));
        }
        site.address = match address_lines.as_slice() {
            [single_line] => format!("{}\n{}", site.name, single_line),
            lines => lines.join("\n"),
        };

        for node in nodes {
            self.parse_node(node, &mut site)?;
        }

        Ok(site)
    }

    fn parse_node(&self, node: &ListingNode, site: &mut ParsedSite) -> Result<(), FatalParseError> {
        let text = match node {
            ListingNode::Link {
                href,
                attributes,
                outer_html,
                ..
            } => {
                let parsed = href.as_deref() == Some(SCHEDULE_ANCHOR)
                    && parse_pre_register_link(attributes, outer_html, site);
                if !parsed {
                    site.schedule
                        .push_error(ParseErrorKind::UnrecognisedElement, outer_html.as_str());
                }
                return Ok(());
            }
            ListingNode::Element {
                tag, inner_html, ..
            } if is_inline_text(tag) => inner_html.trim(),
            ListingNode::Element { outer_html, .. } => {
                site.schedule
                    .push_error(ParseErrorKind::UnrecognisedElement, outer_html.as_str());
                return Ok(());
            }
            ListingNode::Text { text } => text.trim(),
        };

        if text.is_empty() || text == ZERO_WIDTH_SPACE {
            return Ok(());
        }

        let parsers: [&dyn LineParser<SiteUpdate>; 3] = [&self.times, &self.dates, &self.metadata];
        let Dispatch { update, errors } = dispatch(&parsers, text)?;
        site.schedule.errors.extend(errors);
        if let Some(update) = update {
            site.apply(update);
        }
        Ok(())
    }
}

fn parse_name(node: &ListingNode, page: &PageContext, site: &mut ParsedSite) {
    match node {
        ListingNode::Text { text } => site.name = text.trim().to_owned(),
        ListingNode::Link {
            href,
            text,
            outer_html,
            ..
        } => {
            site.name = text.trim().to_owned();
            let Some(href) = href else {
                site.schedule
                    .push_error(ParseErrorKind::NameMissingLink, outer_html.as_str());
                return;
            };
            match page.url.join(href) {
                Ok(link) => site.link = Some(link),
                Err(error) => {
                    debug!(?error, %href, "site link is not a valid url");
                    site.schedule
                        .push_error(ParseErrorKind::ParseLinkFailed, outer_html.as_str());
                    return;
                }
            }
            // Linked sites test children of any age, as long as the page still says so.
            if page.children_in_blue_notice {
                site.minimum_age = 0;
            } else {
                site.schedule.push_error(ParseErrorKind::AgeInfoMissing, "");
            }
        }
        ListingNode::Element { .. } => {}
    }
}

fn parse_pre_register_link(
    attributes: &HashMap<String, String>,
    outer_html: &str,
    site: &mut ParsedSite,
) -> bool {
    let attribute = |name: &str| attributes.get(name).filter(|value| !value.is_empty());

    match (
        attribute("data-visitid"),
        attribute("data-resid"),
        attribute("data-deptid"),
    ) {
        (Some(visit_id), Some(res_id), Some(dept_id)) => {
            site.pre_register_link = Some(format!(
                "https://epicscheduling.nychhc.org/MyChart/SignupAndSchedule/EmbeddedSchedule?id=RES,{res_id}&dept={dept_id}&vt={visit_id}"
            ));
            true
        }
        _ => {
            site.schedule
                .push_error(ParseErrorKind::ParseLinkFailed, outer_html);
            false
        }
    }
}
