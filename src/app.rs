use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::controller::Session;
use crate::data::{GithubTrendingService, TrendingService};
use crate::launcher::SystemLauncher;
use crate::logging;
use crate::preload;
use crate::trending;
use crate::ui;

pub fn run() -> Result<()> {
    let log_target = logging::init(&logging::LogOptions::from_env());
    tracing::info!(version = crate::VERSION, ?log_target, "starting");

    if config::default_path().is_some() {
        if let Err(err) = config::ensure_config_file(None) {
            tracing::warn!(error = %err, "could not write default config");
        }
    }
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let client = trending::Client::new(trending::ClientConfig {
        user_agent: format!("gh-trending/{}", crate::VERSION),
        timeout: Some(cfg.fetch_timeout),
        ..trending::ClientConfig::default()
    })
    .context("build trending client")?;
    let service: Arc<dyn TrendingService> =
        Arc::new(GithubTrendingService::new(Arc::new(client)));

    eprintln!("Fetching trending repositories for {}…", cfg.languages.join(", "));
    let report = preload::preload(
        service,
        &cfg.languages,
        &preload::Options {
            fetch_timeout: cfg.fetch_timeout,
        },
    );

    let options = ui::Options {
        status_message: startup_status(&report, &log_target),
        status_kind: if report.failures.is_empty() {
            ui::StatusKind::Info
        } else {
            ui::StatusKind::Error
        },
    };

    let session = Session::new(report.store, Arc::new(SystemLauncher), &cfg.browser);
    let mut model = ui::Model::new(session, options);
    model.run()
}

fn startup_status(report: &preload::Report, log_target: &logging::LogTarget) -> String {
    if report.failures.is_empty() {
        return "Browsing GitHub trending. j/k to move, l to enter the list, Enter to open, q to quit."
            .to_string();
    }
    let failed = report.failed_categories().join(", ");
    match log_target {
        logging::LogTarget::File(path) => {
            format!("Failed to load {failed}; see {}", path.display())
        }
        logging::LogTarget::Stderr => format!("Failed to load {failed}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchErrorKind};
    use crate::store::CategoryStore;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn startup_status_names_failed_categories() {
        let report = preload::Report {
            store: CategoryStore::default(),
            failures: vec![
                FetchError::new("go", FetchErrorKind::Status(502)),
                FetchError::new("zig", FetchErrorKind::Timeout(Duration::from_secs(1))),
            ],
        };
        let target = logging::LogTarget::File(PathBuf::from("/tmp/gh-trending.log"));
        assert_eq!(
            startup_status(&report, &target),
            "Failed to load go, zig; see /tmp/gh-trending.log"
        );
    }
}
