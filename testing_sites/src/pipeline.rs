use anyhow::Context;
use chrono::NaiveDate;
use itertools::Itertools;
use schedule_parser::ParseErrorKind;
use std::sync::Arc;
use tracing::{error, info};

use crate::geocode::{locate, Geocoder};
use crate::listing::{PageContext, SiteListing};
use crate::post_fixes::run_post_fixes;
use crate::site::{ParsedSite, SiteParser};
use crate::wait_times::{add_wait_times, WaitTimesSource};

pub struct SitesPipeline {
    parser: SiteParser,
    geocoder: Arc<dyn Geocoder>,
    wait_times: Arc<dyn WaitTimesSource>,
}

impl SitesPipeline {
    pub fn new(
        today: NaiveDate,
        geocoder: Arc<dyn Geocoder>,
        wait_times: Arc<dyn WaitTimesSource>,
    ) -> Self {
        Self {
            parser: SiteParser::new(today),
            geocoder,
            wait_times,
        }
    }

    #[tracing::instrument(skip_all, fields(listings = listings.len()))]
    pub async fn run(
        &self,
        listings: &[SiteListing],
        page: &PageContext,
    ) -> anyhow::Result<Vec<ParsedSite>> {
        info!("Checking site listings...");
        let mut sites = Vec::with_capacity(listings.len());
        for listing in listings {
            let mut site = self
                .parser
                .parse(listing, page)
                .with_context(|| format!("Failed to parse a {} listing", listing.borough))?;
            locate(&mut site, self.geocoder.as_ref())
                .await
                .with_context(|| format!("Failed to geocode {}", site.name))?;
            sites.push(site);
        }

        run_post_fixes(&mut sites, page)?;

        let wait_times = self.wait_times.latest().await?;
        add_wait_times(&mut sites, wait_times)?;

        for site in sites.iter_mut() {
            if site.offers.is_empty() {
                site.schedule
                    .push_error(ParseErrorKind::NoOffers, "site has no offers");
            }
        }
        report_errors(&sites);

        Ok(sites)
    }
}

fn report_errors(sites: &[ParsedSite]) {
    for site in sites.iter().filter(|site| !site.schedule.errors.is_empty()) {
        let errors = site
            .schedule
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.kind, error.value))
            .join("; ");
        error!(site = %site.name, count = site.schedule.errors.len(), %errors, "Errors encountered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{GeocodeResponse, GeocodeResult, Geometry, Location};
    use crate::listing::{Borough, ListingNode, SiteType};
    use async_trait::async_trait;
    use schedule_parser::{Day, OpeningHours, ParseError};
    use std::collections::HashMap;
    use url::Url;

    struct RooftopGeocoder;

    #[async_trait]
    impl Geocoder for RooftopGeocoder {
        async fn geocode(&self, _address: &str) -> anyhow::Result<GeocodeResponse> {
            Ok(GeocodeResponse {
                results: vec![GeocodeResult {
                    geometry: Geometry {
                        location: Location { lat: 40.7, lng: -73.9 },
                        location_type: "ROOFTOP".to_string(),
                    },
                }],
            })
        }
    }

    struct StaticWaitTimes(HashMap<String, String>);

    #[async_trait]
    impl WaitTimesSource for StaticWaitTimes {
        async fn latest(&self) -> anyhow::Result<HashMap<String, String>> {
            Ok(self.0.clone())
        }
    }

    fn text(text: &str) -> ListingNode {
        ListingNode::Text {
            text: text.to_string(),
        }
    }

    fn page() -> PageContext {
        PageContext {
            url: Url::parse("https://www.nychealthandhospitals.org/covid-19-testing-sites/")
                .unwrap(),
            children_in_blue_notice: true,
            section_headers: HashMap::from([(
                "queens-mobile".to_string(),
                "Mobile Sites: Rapid and PCR available".to_string(),
            )]),
        }
    }

    fn pipeline(wait_times: &[(&str, &str)]) -> SitesPipeline {
        let wait_times = wait_times
            .iter()
            .map(|(name, time)| (name.to_string(), time.to_string()))
            .collect();
        SitesPipeline::new(
            NaiveDate::from_ymd_opt(2021, 12, 20).unwrap(),
            Arc::new(RooftopGeocoder),
            Arc::new(StaticWaitTimes(wait_times)),
        )
    }

    #[tokio::test]
    async fn test_running_the_whole_pipeline() {
        let listings = vec![
            SiteListing {
                borough: Borough::Queens,
                site_type: SiteType::Mobile,
                nodes: vec![
                    text("Times Square Testing Site"),
                    text("Queens, NY 11373"),
                    text("Monday – Saturday 9 a.m. – 5 p.m."),
                    text("Dates: Dec 27 – 30"),
                ],
            },
            SiteListing {
                borough: Borough::Queens,
                site_type: SiteType::Micro,
                nodes: vec![
                    text("Kiosk"),
                    text("Queens, NY 11101"),
                    text("Sunday: Closed"),
                ],
            },
        ];

        let sites = pipeline(&[("Times Square", "30-60")])
            .run(&listings, &page())
            .await
            .unwrap();

        assert_eq!(sites.len(), 2);
        let mobile = &sites[0];
        assert_eq!(mobile.location, Some(Location { lat: 40.7, lng: -73.9 }));
        assert_eq!(mobile.offers.len(), 2);
        assert_eq!(mobile.wait_time, "30-60");
        assert_eq!(mobile.schedule.hours[&Day::Saturday], OpeningHours(900, 1700));
        assert_eq!(mobile.schedule.open.len(), 4);
        assert!(mobile.schedule.errors.is_empty());

        let kiosk = &sites[1];
        assert!(kiosk.schedule.hours.is_empty());
        assert_eq!(
            kiosk.schedule.errors,
            vec![ParseError::new(ParseErrorKind::NoOffers, "site has no offers")]
        );
    }

    #[tokio::test]
    async fn test_fatal_listing_aborts_the_run() {
        let listings = vec![SiteListing {
            borough: Borough::Bronx,
            site_type: SiteType::Mortar,
            nodes: vec![text("Nowhere"), text("no zip here")],
        }];

        let result = pipeline(&[]).run(&listings, &page()).await;

        assert!(result.is_err());
    }
}
