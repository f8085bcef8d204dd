pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod index;
pub mod metrics;
pub mod orphan;
pub mod paths;
pub mod rules;
pub mod types;

pub use cache::{Cache, CacheStats};
pub use config::{CliArgs, Config};
pub use error::{TidyError, TidyResult};
pub use identity::{FileIdentity, IdentityResolver, LinkInfo, OsResolver};
pub use index::{HardlinkIndex, RegistryOptions, TorrentFacts, TorrentFileIndex, TorrentRegistry};
pub use metrics::ScanMetrics;
pub use orphan::{OrphanOptions, OrphanReport, OrphanScanner};
pub use paths::{IgnoreList, PathMapEntry, PathMapping, SortedPathIndex};
pub use types::Torrent;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-torrent line of the `links` report.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub hash: String,
    pub name: String,
    #[serde(flatten)]
    pub facts: TorrentFacts,
}

async fn load_torrents(config: &Config) -> Result<Vec<Torrent>> {
    let source = client::open(&config.client).context("Failed to initialize client")?;
    let torrents = tokio::task::spawn_blocking(move || source.torrents())
        .await
        .context("Torrent loading task failed")?
        .context("Failed retrieving torrents")?;
    tracing::info!(count = torrents.len(), "Retrieved torrents");
    Ok(torrents)
}

fn load_mapping(config: &Config) -> Result<PathMapping> {
    let mapping = config
        .path_mapping()
        .context("Invalid client.download_path_mapping")?;
    tracing::debug!(rules = mapping.len(), "Loaded download path mappings");
    Ok(mapping)
}

fn registry_options(config: &Config) -> RegistryOptions {
    RegistryOptions {
        workers: config.orphan.workers,
        cache_entries: config.cache.max_path_entries,
    }
}

/// Loads torrents from the configured client and indexes them.
pub async fn load_registry(config: &Config) -> Result<(TorrentRegistry, Vec<Torrent>)> {
    let torrents = client::filter_by_category(
        load_torrents(config).await?,
        &config.client.categories,
        &config.client.exclude_categories,
    );

    let mapping = load_mapping(config)?;
    let registry = TorrentRegistry::build(&torrents, mapping, registry_options(config)).await;
    Ok((registry, torrents))
}

/// Scans `client.download_path` for orphans, or every category's save
/// path when `orphan.use_category_paths` is set.
pub async fn run_orphan(config: Config) -> Result<OrphanReport> {
    tracing::info!(operation = "startup", message = "torrent-tidy orphan scan starting");
    tracing::debug!(config = ?config, "Configuration loaded");

    if config.orphan.use_category_paths {
        return run_category_orphan(config).await;
    }

    let download_path = config
        .client
        .download_path
        .clone()
        .context("client.download_path must be set for an orphan scan")?;
    let options =
        OrphanOptions::from_config(&config.orphan).context("Invalid orphan configuration")?;

    let (registry, _) = load_registry(&config).await?;
    let scanner = OrphanScanner::new(Arc::new(registry), options);
    let report = scanner
        .scan(&download_path)
        .await
        .with_context(|| format!("Failed scanning {}", download_path.display()))?;

    scanner.log_summary();
    Ok(report)
}

/// Scans each category's save path against that category's torrents only.
///
/// Categories failing the include/exclude lists are skipped. Roots of other
/// categories nested below a scanned root are ignored, and categories
/// sharing a root are scanned against their combined torrents.
async fn run_category_orphan(config: Config) -> Result<OrphanReport> {
    let options =
        OrphanOptions::from_config(&config.orphan).context("Invalid orphan configuration")?;
    let mapping = load_mapping(&config)?;
    let torrents = load_torrents(&config).await?;

    let categories = client::category_paths(&torrents, &mapping, &config.client.category_paths);
    let mut total = OrphanReport::default();
    if categories.is_empty() {
        tracing::warn!("No categories with a save path found, nothing to scan");
        return Ok(total);
    }
    tracing::info!(count = categories.len(), "Found categories");

    let roots: Vec<PathBuf> = categories.iter().map(|(_, path)| path.clone()).collect();
    for (category, root) in &categories {
        if !client::category_selected(
            category,
            &config.client.categories,
            &config.client.exclude_categories,
        ) {
            tracing::debug!(category = %category, "Skipping category excluded by configuration");
            continue;
        }
        if !root.is_dir() {
            tracing::warn!(category = %category, path = %root.display(), "Category path does not exist, skipping");
            continue;
        }

        // categories saved to the same root own its files together
        let owners: Vec<&str> = categories
            .iter()
            .filter(|(_, other)| other == root)
            .map(|(label, _)| label.as_str())
            .collect();
        let members: Vec<Torrent> = torrents
            .iter()
            .filter(|t| owners.iter().any(|o| t.label.eq_ignore_ascii_case(o)))
            .cloned()
            .collect();
        if members.is_empty() && has_entries(root) {
            tracing::warn!(
                category = %category,
                path = %root.display(),
                "Category has files or folders but no torrents, use with caution"
            );
        }

        let nested = roots
            .iter()
            .filter(|other| *other != root && other.starts_with(root))
            .map(|other| other.to_string_lossy().into_owned());
        let mut category_options = options.clone();
        category_options.ignore = category_options.ignore.with_prefixes(nested);

        let registry =
            TorrentRegistry::build(&members, mapping.clone(), registry_options(&config)).await;
        let scanner = OrphanScanner::new(Arc::new(registry), category_options);
        match scanner.scan(root).await {
            Ok(report) => {
                tracing::info!(
                    category = %category,
                    torrents = members.len(),
                    removed = report.removed(),
                    failures = report.failures,
                    "Category scan finished"
                );
                total += &report;
            }
            Err(e) => {
                tracing::error!(category = %category, path = %root.display(), error = %e, "Category scan failed");
            }
        }
    }

    tracing::info!(
        operation = "category_orphan_summary",
        files_removed = total.files_removed,
        folders_removed = total.folders_removed,
        failures = total.failures,
        reclaimed_bytes = total.reclaimed_bytes,
        dry_run = config.orphan.dry_run,
        "Category orphan scan finished"
    );
    Ok(total)
}

fn has_entries(root: &std::path::Path) -> bool {
    std::fs::read_dir(root)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Reports uniqueness and hardlink facts for every tracked torrent.
pub async fn run_links(config: Config) -> Result<Vec<LinkReport>> {
    tracing::info!(operation = "startup", message = "torrent-tidy links report starting");

    let (registry, mut torrents) = load_registry(&config).await?;
    torrents.sort_by(|a, b| a.hash.cmp(&b.hash));

    let reports = tokio::task::spawn_blocking(move || {
        torrents
            .iter()
            .map(|t| LinkReport {
                hash: t.hash.clone(),
                name: t.name.clone(),
                facts: registry.facts(t),
            })
            .collect::<Vec<_>>()
    })
    .await
    .context("Link report task failed")?;

    let outside = reports
        .iter()
        .filter(|r| r.facts.hardlinked_outside_client)
        .count();
    tracing::info!(
        torrents = reports.len(),
        hardlinked_outside_client = outside,
        "Computed torrent link facts"
    );
    Ok(reports)
}
