use lazy_static::lazy_static;
use regex::Regex;
use schedule_parser::{FatalParseError, LineParser, Outcome};

use crate::site::{Offer, SiteUpdate};

lazy_static! {
    static ref PHONE_NUMBER: Regex =
        Regex::new(r"^[0-9]{3}-[0-9]{3}-[0-9]{4}$").expect("PHONE_NUMBER regex to compile");
}

const CITY_HOTLINE: &str = "844-NYC-4NYC";

/// Lines carrying no information we keep.
const BOILERPLATE: [&str; 3] = ["Appointments:", "General Information:", "7 days a week"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataUpdate {
    Phone(String),
    MinimumAge(u32),
    Offers(Vec<Offer>),
    Boilerplate,
}

/// Exact phrases the page uses for phone numbers, age limits and offered tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataParser;

impl MetadataParser {
    pub fn parse(&self, text: &str) -> Option<MetadataUpdate> {
        if PHONE_NUMBER.is_match(text) || text == CITY_HOTLINE {
            return Some(MetadataUpdate::Phone(text.to_owned()));
        }

        let update = match text {
            "4 years old and above" => MetadataUpdate::MinimumAge(4),
            "COVID-19 Testing and Antibody Testing Offered Here" => {
                MetadataUpdate::Offers(vec![Offer::Pcr, Offer::Antibody])
            }
            "Rapid Molecular Testing Available Here" => {
                MetadataUpdate::Offers(vec![Offer::RapidMolecular])
            }
            "Rapid Antigen Testing Available Here" => {
                MetadataUpdate::Offers(vec![Offer::RapidAntigen])
            }
            "PCR Testing Available Here" => MetadataUpdate::Offers(vec![Offer::Pcr]),
            text if BOILERPLATE.contains(&text) => MetadataUpdate::Boilerplate,
            _ => return None,
        };
        Some(update)
    }
}

impl LineParser<SiteUpdate> for MetadataParser {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn parse_line(&self, line: &str) -> Result<Outcome<SiteUpdate>, FatalParseError> {
        Ok(match self.parse(line) {
            Some(update) => Outcome::Matched(SiteUpdate::Metadata(update)),
            None => Outcome::NotApplicable,
        })
    }
}
