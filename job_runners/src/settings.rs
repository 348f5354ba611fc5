use lazy_static::lazy_static;
use secrecy::Secret;
use serde::Deserialize;
use shared_kernel::configuration::config;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct ScraperConfig {
    pub listings_path: PathBuf,
    pub output_path: PathBuf,
    pub wait_times_url: Url,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeConfig {
    pub host: Url,
    pub api_key: Secret<String>,
    pub cache_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub scraper: ScraperConfig,
    pub geocode: GeocodeConfig,
}

lazy_static! {
    pub static ref SETTINGS_CONFIG: Settings =
        config::<Settings>().expect("Expected to have the configuration set");
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use secrecy::ExposeSecret;
    use shared_kernel::configuration::config_from;
    use std::path::Path;

    #[test]
    fn test_base_configuration_deserializes() {
        let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configuration");

        let settings = config_from::<Settings>(&directory).unwrap();

        assert_eq!(settings.scraper.output_path, Path::new("output/sites.json"));
        assert_eq!(
            settings.geocode.host.as_str(),
            "https://maps.googleapis.com/maps/api/geocode/json"
        );
        assert!(settings.geocode.api_key.expose_secret().is_empty());
    }
}
