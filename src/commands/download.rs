// Download command for fetching a product version and its dependencies

use crate::ui;
use anyhow::Context;
use ccpkg::catalog::CatalogClient;
use ccpkg::config::Config;
use ccpkg::driver::DriverDescriptor;
use ccpkg::error::Error;
use ccpkg::fetcher::ResumableFetcher;
use ccpkg::orchestrator::{self, DownloadJob, RunReport, RunStatus};
use ccpkg::platform::{self, Platform};
use ccpkg::resolver;
use console::style;
use log::debug;
use std::path::PathBuf;

pub struct DownloadOptions {
    pub platform: Platform,
    pub sap_code: String,
    pub version: String,
    pub language: String,
    pub destination: PathBuf,
    pub dry_run: bool,
    pub no_driver: bool,
    pub jobs: Option<usize>,
}

pub async fn download(config: &Config, options: DownloadOptions) -> anyhow::Result<i32> {
    let language = platform::validate_language(&options.language)?.to_string();

    let client = CatalogClient::new(config)?;
    let catalog = super::fetch_catalog(&client, options.platform).await?;

    let product = catalog
        .product(&options.sap_code)
        .ok_or_else(|| Error::ProductNotFound {
            sap_code: options.sap_code.clone(),
        })?;
    if product.hidden {
        ui::warning(&format!(
            "{} is not listed for {}; downloading anyway",
            product.sap_code, options.platform
        ));
    }

    let plan = resolver::resolve(&catalog, &options.sap_code, &options.version)?;
    for unresolved in &plan.unresolved {
        ui::warning(&format!("{}, skipping", unresolved));
    }

    let root = options.destination.join(format!(
        "{}_{}_{}",
        options.sap_code, options.version, language
    ));

    if options.dry_run {
        ui::status(
            "[DRY RUN]",
            &format!(
                "Would download {} package set(s) into {}",
                plan.entries.len(),
                root.display()
            ),
        );
        for entry in &plan.entries {
            ui::action(&format!(
                "{} {}",
                entry,
                style(format!("build {}", entry.build_guid)).dim()
            ));
        }
        return Ok(0);
    }

    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("Failed to create {}", root.display()))?;
    debug!("Download root: {}", root.display());

    let fetcher = ResumableFetcher::new(
        client.http().clone(),
        config.download.retry_policy(),
        config.download.chunk_size,
    );
    let job = DownloadJob {
        cdn: catalog.cdn.clone(),
        destination_root: root.clone(),
        install_language: language.clone(),
        concurrency: options.jobs.unwrap_or(config.download.concurrency),
    };

    ui::header(&format!(
        "Downloading {} {} ({}, {})",
        product.display_name, options.version, options.platform, language
    ));
    let observer = ui::ConsoleObserver::new();
    let report = orchestrator::run(&plan, &client, &fetcher, &job, &observer).await;

    if !options.no_driver
        && let Some(driver) = DriverDescriptor::new(product, &plan, options.platform, &language)
    {
        let path = driver
            .write(&root)
            .await
            .with_context(|| format!("Failed to write driver descriptor in {}", root.display()))?;
        ui::success(&format!("Wrote {}", path.display()));
    }

    print_summary(&report);

    Ok(match report.status() {
        RunStatus::Completed => 0,
        RunStatus::CompletedWithFailures => 1,
    })
}

fn print_summary(report: &RunReport) {
    let succeeded = report.succeeded().count();
    let failed = report.failed().count();

    for (entry, reason) in report.failed_entries() {
        ui::error(&format!("{}: {}", entry, reason));
    }
    for (entry, file) in report.failed() {
        let reason = file.result.as_ref().err().map_or("", String::as_str);
        ui::error(&format!("{} {}: {}", entry, file.name, reason));
    }

    match report.status() {
        RunStatus::Completed => ui::success(&format!("Downloaded {} file(s)", succeeded)),
        RunStatus::CompletedWithFailures => ui::warning(&format!(
            "Completed with failures: {} file(s) downloaded, {} failed, {} package set(s) skipped",
            succeeded,
            failed,
            report.failed_entries().count()
        )),
    }
}
