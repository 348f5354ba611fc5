use anyhow::{bail, Context};
use async_trait::async_trait;
use schedule_parser::ParseErrorKind;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use shared_kernel::http_client::HttpClient;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use crate::site::ParsedSite;

const ACCEPTABLE_LOCATION_TYPES: [&str; 3] = ["GEOMETRIC_CENTER", "RANGE_INTERPOLATED", "ROOFTOP"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: Location,
    pub location_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub results: Vec<GeocodeResult>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> anyhow::Result<GeocodeResponse>;
}

/// Geocodes through the Google geocoding API, remembering every answer in a JSON file.
pub struct CachedGeocoder {
    endpoint: Url,
    api_key: Secret<String>,
    cache_path: PathBuf,
    cache: Mutex<BTreeMap<String, GeocodeResponse>>,
}

impl CachedGeocoder {
    pub async fn load(
        endpoint: Url,
        api_key: Secret<String>,
        cache_path: PathBuf,
    ) -> anyhow::Result<Self> {
        let cache = match tokio::fs::read_to_string(&cache_path).await {
            Ok(contents) => serde_json::from_str(&contents).with_context(|| {
                format!("Failed to read the geocode cache {}", cache_path.display())
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("Failed to open the geocode cache {}", cache_path.display())
                })
            }
        };

        Ok(Self {
            endpoint,
            api_key,
            cache_path,
            cache: Mutex::new(cache),
        })
    }

    async fn save(&self, cache: &BTreeMap<String, GeocodeResponse>) -> anyhow::Result<()> {
        let contents = serde_json::to_string_pretty(cache)?;
        tokio::fs::write(&self.cache_path, contents)
            .await
            .with_context(|| {
                format!(
                    "Failed to write the geocode cache {}",
                    self.cache_path.display()
                )
            })
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn geocode(&self, address: &str) -> anyhow::Result<GeocodeResponse> {
        let mut cache = self.cache.lock().await;
        if let Some(response) = cache.get(address) {
            return Ok(response.clone());
        }

        if self.api_key.expose_secret().is_empty() {
            bail!("No geocode key");
        }

        info!(
            address = address.lines().next().unwrap_or_default(),
            "Sending geocode request"
        );
        let url = Url::parse_with_params(
            self.endpoint.as_str(),
            &[("key", self.api_key.expose_secret().as_str()), ("address", address)],
        )
        .context("Failed to parse url")?;
        let response = HttpClient::get_json::<GeocodeResponse>(url).await?;

        cache.insert(address.to_owned(), response.clone());
        self.save(&cache).await?;
        Ok(response)
    }
}

/// Sets the site's location, or records `bad-geocode` when the best result is too vague.
pub async fn locate(site: &mut ParsedSite, geocoder: &dyn Geocoder) -> anyhow::Result<()> {
    let response = geocoder.geocode(&site.address).await?;

    match response.results.first() {
        Some(result) if ACCEPTABLE_LOCATION_TYPES.contains(&result.geometry.location_type.as_str()) => {
            site.location = Some(result.geometry.location);
        }
        _ => {
            let address = site.address.clone();
            site.schedule.push_error(ParseErrorKind::BadGeocode, address);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Borough, SiteType};
    use httpmock::prelude::*;
    use schedule_parser::ParseError;

    fn response(location_type: &str) -> GeocodeResponse {
        GeocodeResponse {
            results: vec![GeocodeResult {
                geometry: Geometry {
                    location: Location {
                        lat: 40.739,
                        lng: -73.975,
                    },
                    location_type: location_type.to_string(),
                },
            }],
        }
    }

    fn cache_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("testing_sites_{name}.json"));
        let _ = std::fs::remove_file(&path);
        path
    }

    struct FixedGeocoder(GeocodeResponse);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> anyhow::Result<GeocodeResponse> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_misses_are_fetched_once_and_cached_on_disk() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/geocode/json")
                .query_param("key", "secret")
                .query_param("address", "462 First Avenue\nNew York, NY 10016");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::to_value(response("ROOFTOP")).unwrap());
        });
        let path = cache_path("geocode_cache_miss");
        let endpoint = Url::parse(&server.url("/geocode/json")).unwrap();

        let geocoder =
            CachedGeocoder::load(endpoint.clone(), Secret::new("secret".to_string()), path.clone())
                .await
                .unwrap();
        let first = geocoder.geocode("462 First Avenue\nNew York, NY 10016").await.unwrap();
        let second = geocoder.geocode("462 First Avenue\nNew York, NY 10016").await.unwrap();

        mock.assert_hits(1);
        assert_eq!(first, second);

        let reloaded = CachedGeocoder::load(endpoint, Secret::new(String::new()), path)
            .await
            .unwrap();
        let cached = reloaded
            .geocode("462 First Avenue\nNew York, NY 10016")
            .await
            .unwrap();
        assert_eq!(cached, first);
    }

    #[tokio::test]
    async fn test_misses_need_an_api_key() {
        let geocoder = CachedGeocoder::load(
            Url::parse("http://localhost/geocode/json").unwrap(),
            Secret::new(String::new()),
            cache_path("geocode_no_key"),
        )
        .await
        .unwrap();

        assert!(geocoder.geocode("Somewhere").await.is_err());
    }

    #[tokio::test]
    async fn test_precise_results_set_the_location() {
        let mut site = ParsedSite::new(Borough::Manhattan, SiteType::Mortar);

        locate(&mut site, &FixedGeocoder(response("RANGE_INTERPOLATED")))
            .await
            .unwrap();

        assert_eq!(
            site.location,
            Some(Location {
                lat: 40.739,
                lng: -73.975
            })
        );
        assert!(site.schedule.errors.is_empty());
    }

    #[tokio::test]
    async fn test_vague_results_are_bad_geocodes() {
        let mut site = ParsedSite::new(Borough::Manhattan, SiteType::Mortar);
        site.address = "New York, NY".to_string();

        locate(&mut site, &FixedGeocoder(response("APPROXIMATE")))
            .await
            .unwrap();

        assert_eq!(site.location, None);
        assert_eq!(
            site.schedule.errors,
            vec![ParseError::new(ParseErrorKind::BadGeocode, "New York, NY")]
        );
    }
}
