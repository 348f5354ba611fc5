use anyhow::anyhow;
use async_trait::async_trait;
use shared_kernel::http_client::HttpClient;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::site::ParsedSite;

/// Wait-time feed name to the site name the page uses.
const WAIT_TIME_MAPPINGS: [(&str, &str); 30] = [
    ("57 Cleveland Place", "Former St John Villa HS"),
    ("Bay Ridge 5th Avenue", "Bay Ridge"),
    ("Bellevue Hospital", "NYC Health + Hospitals/Bellevue"),
    ("Belvis DTC", "NYC Health + Hospitals/Gotham Health, Belvis"),
    ("Bensonhurst 14th Avenue", "Bensonhurst"),
    ("Coney Island Hospital", "NYC Health + Hospitals/Coney Island"),
    ("Cumberland DTC", "NYC Health + Hospitals/Gotham Health, Cumberland"),
    ("NYC Health + Hospitals/Gotham Health, East New York", "0-30"),
    ("Elmhurst Hospital", "NYC Health + Hospitals/Elmhurst"),
    ("Fort Hamilton", "4002 Fort Hamilton"),
    ("Gouverneur Healthcare", "NYC Health + Hospitals/Gotham Health, Gouverneur"),
    ("Greenbelt Recreation Center", "Greenbelt Recreation Center"),
    ("Harlem Hospital Center", "NYC Health + Hospitals/Harlem"),
    ("Jacobi Medical Center", "NYC Health + Hospitals/Jacobi"),
    ("Kings County Hospital", "NYC Health + Hospitals/Kings County"),
    ("Lincoln Medical Center", "NYC Health + Hospitals/Lincoln"),
    ("Metropolitan Hospital", "NYC Health + Hospitals/Metropolitan"),
    ("Midwood", "Midwood Pre-K"),
    ("Morrisania DTC", "NYC Health + Hospitals/Gotham Health, Morrisania"),
    ("North Central Bronx Hospital", "NYC Health + Hospitals/North Central Bronx"),
    ("Queens Hospital Center", "NYC Health + Hospitals/Queens"),
    ("Sorreno Recreation Center", "Sorrentino Rec Center"),
    ("St. George Ferry Terminal", "Staten Island Ferry"),
    ("Starret City", "Starrett City"),
    ("Sydenham Health Center", "Gotham Health – Sydenham"),
    ("Times Square", "Times Square Testing Site"),
    ("Tremont CHC", "Christ Apostolic Church – Pediatric"),
    ("Vanderbilt", "NYC Health + Hospitals/Gotham Health, Vanderbilt"),
    ("Woodhull Medical Center", "NYC Health + Hospitals/Woodhull"),
    ("Woodside Houses", "NYCHA Woodside Streetside Parking"),
];

fn site_name_for(feed_name: &str) -> Option<&'static str> {
    WAIT_TIME_MAPPINGS
        .iter()
        .find(|(name, _)| *name == feed_name)
        .map(|(_, site_name)| *site_name)
}

#[async_trait]
pub trait WaitTimesSource: Send + Sync {
    /// Feed name to a wait time such as `0-30`.
    async fn latest(&self) -> anyhow::Result<HashMap<String, String>>;
}

pub struct HttpWaitTimes {
    url: Url,
}

impl HttpWaitTimes {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl WaitTimesSource for HttpWaitTimes {
    async fn latest(&self) -> anyhow::Result<HashMap<String, String>> {
        HttpClient::get_json(self.url.clone()).await
    }
}

/// Feed entries without a mapping are skipped. A mapping that names no parsed site is an error.
pub fn add_wait_times(
    sites: &mut [ParsedSite],
    wait_times: HashMap<String, String>,
) -> anyhow::Result<()> {
    for (feed_name, wait_time) in wait_times {
        let Some(site_name) = site_name_for(&feed_name) else {
            debug!(%feed_name, "no site mapped to wait time");
            continue;
        };
        let site = sites
            .iter_mut()
            .find(|site| site.name == site_name)
            .ok_or_else(|| anyhow!("Can't find mapping for {site_name}"))?;
        site.wait_time = wait_time;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Borough, SiteType};
    use httpmock::prelude::*;

    fn site(name: &str) -> ParsedSite {
        let mut site = ParsedSite::new(Borough::Manhattan, SiteType::Mortar);
        site.name = name.to_string();
        site
    }

    #[test]
    fn test_feed_names_are_mapped_to_site_names() {
        let mut sites = vec![site("Times Square Testing Site"), site("Bay Ridge")];
        let wait_times = HashMap::from([
            ("Times Square".to_string(), "30-60".to_string()),
            ("CU Homecrest".to_string(), "NR".to_string()),
        ]);

        add_wait_times(&mut sites, wait_times).unwrap();

        assert_eq!(sites[0].wait_time, "30-60");
        assert_eq!(sites[1].wait_time, "unknown");
    }

    #[test]
    fn test_a_mapped_site_that_is_missing_is_an_error() {
        let mut sites = vec![site("Bay Ridge")];
        let wait_times = HashMap::from([("Times Square".to_string(), "30-60".to_string())]);

        let error = add_wait_times(&mut sites, wait_times).unwrap_err();

        assert_eq!(
            error.to_string(),
            "Can't find mapping for Times Square Testing Site"
        );
    }

    #[tokio::test]
    async fn test_fetching_the_feed() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/data/latest.json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"Bay Ridge 5th Avenue": "0-30"}"#);
        });
        let source = HttpWaitTimes::new(Url::parse(&server.url("/data/latest.json")).unwrap());

        let latest = source.latest().await.unwrap();

        mock.assert();
        assert_eq!(latest.get("Bay Ridge 5th Avenue").map(String::as_str), Some("0-30"));
    }
}
