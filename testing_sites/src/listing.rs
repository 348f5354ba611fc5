//! What the page walker hands over: one listing per site paragraph, plus the
//! few page level facts the parsers and post-fixers need.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Borough {
    Bronx,
    Brooklyn,
    Manhattan,
    Queens,
    StatenIsland,
}

impl Borough {
    pub const ALL: [Borough; 5] = [
        Borough::Bronx,
        Borough::Brooklyn,
        Borough::Manhattan,
        Borough::Queens,
        Borough::StatenIsland,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Borough::Bronx => "bronx",
            Borough::Brooklyn => "brooklyn",
            Borough::Manhattan => "manhattan",
            Borough::Queens => "queens",
            Borough::StatenIsland => "staten-island",
        }
    }
}

impl fmt::Display for Borough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    Micro,
    Mobile,
    Mortar,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::Micro => "micro",
            SiteType::Mobile => "mobile",
            SiteType::Mortar => "mortar",
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingNode {
    Text {
        text: String,
    },
    Link {
        href: Option<String>,
        text: String,
        #[serde(default)]
        attributes: HashMap<String, String>,
        outer_html: String,
    },
    Element {
        tag: String,
        inner_html: String,
        outer_html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteListing {
    pub borough: Borough,
    pub site_type: SiteType,
    pub nodes: Vec<ListingNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub url: Url,
    /// The page still explains that linked sites test children of any age.
    #[serde(default)]
    pub children_in_blue_notice: bool,
    /// Section header markup keyed by its id, e.g. `bronx-mobile`.
    #[serde(default)]
    pub section_headers: HashMap<String, String>,
}

impl PageContext {
    pub fn section_header(&self, borough: Borough, site_type: SiteType) -> Option<&str> {
        self.section_headers
            .get(&format!("{borough}-{site_type}"))
            .map(String::as_str)
    }
}

/// The walker's output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingsInput {
    pub page: PageContext,
    pub listings: Vec<SiteListing>,
}
