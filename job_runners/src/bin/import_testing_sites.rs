use anyhow::Context;
use job_runners::settings::SETTINGS_CONFIG;
use secrecy::{ExposeSecret, Secret};
use std::path::Path;
use std::sync::Arc;
use testing_sites::geocode::CachedGeocoder;
use testing_sites::listing::ListingsInput;
use testing_sites::pipeline::SitesPipeline;
use testing_sites::wait_times::HttpWaitTimes;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared_kernel::tracing::config_telemetry("import_testing_sites")?;
    start().await
}

async fn start() -> anyhow::Result<()> {
    let scraper = &SETTINGS_CONFIG.scraper;
    let geocode = &SETTINGS_CONFIG.geocode;

    let input = read_listings(&scraper.listings_path).await?;

    let geocoder = CachedGeocoder::load(
        geocode.host.clone(),
        Secret::new(geocode.api_key.expose_secret().to_owned()),
        geocode.cache_path.clone(),
    )
    .await?;
    let wait_times = HttpWaitTimes::new(scraper.wait_times_url.clone());

    let today = chrono::Local::now().date_naive();
    let pipeline = SitesPipeline::new(today, Arc::new(geocoder), Arc::new(wait_times));
    let sites = pipeline.run(&input.listings, &input.page).await?;

    if let Some(directory) = scraper.output_path.parent() {
        tokio::fs::create_dir_all(directory)
            .await
            .with_context(|| format!("Failed to create {}", directory.display()))?;
    }
    let output = serde_json::to_string_pretty(&sites)?;
    tokio::fs::write(&scraper.output_path, output)
        .await
        .with_context(|| format!("Failed to write {}", scraper.output_path.display()))?;

    info!(
        sites = sites.len(),
        output = %scraper.output_path.display(),
        "Wrote testing sites"
    );
    Ok(())
}

async fn read_listings(path: &Path) -> anyhow::Result<ListingsInput> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read listings from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to deserialize listings from {}", path.display()))
}
