//! Multi-section orchestration
//!
//! Spawns one isolated worker process per configured section, sequences
//! their startup through the readiness handshake plus a fixed cooldown,
//! then waits for every worker regardless of individual outcome and
//! reports the aggregate checkpoint locations.
//!
//! The stagger is deliberate: sections share egress infrastructure, and
//! bootstrapping several sessions at once is exactly the correlated burst
//! that gets all of them blocked together.

mod readiness;
mod registry;

pub use readiness::ReadinessMarker;
pub use registry::{WorkerRegistry, WorkerStatus};

use crate::config::Config;
use crate::crawler::{MarkerBlockList, RestartSupervisor, SectionOutcome};
use crate::extract::SelectorExtractor;
use crate::session::HttpBootstrap;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

/// Interval between readiness-marker polls
const READINESS_POLL: Duration = Duration::from_millis(500);

/// Terminal report for one section
#[derive(Debug, Clone)]
pub struct SectionReport {
    pub keyword: String,
    pub checkpoint_path: PathBuf,
    pub status: WorkerStatus,
}

impl SectionReport {
    pub fn completed(&self) -> bool {
        matches!(self.status, WorkerStatus::Stopped(Some(0)))
    }
}

/// Runs every configured section to completion
///
/// Workers inherit stdio, so their live log stream shows up interleaved
/// with the orchestrator's own output; durable per-section logs are written
/// by the workers themselves.
pub async fn run_sections(
    config: &Config,
    config_path: &Path,
) -> Result<Vec<SectionReport>, HarvestError> {
    std::fs::create_dir_all(&config.output.data_dir)?;
    std::fs::create_dir_all(&config.output.log_dir)?;

    let exe = std::env::current_exe()?;
    let started_at = chrono::Local::now();
    let mut registry = WorkerRegistry::new();

    let total = config.sections.len();
    for (index, section) in config.sections.iter().enumerate() {
        let keyword = &section.keyword;
        let marker = ReadinessMarker::new(config.readiness_path(keyword));

        // A stale marker from an earlier run must not satisfy the handshake
        marker.clear()?;

        let child = Command::new(&exe)
            .arg(config_path)
            .arg("--section")
            .arg(keyword)
            .spawn()?;
        tracing::info!(%keyword, pid = ?child.id(), "worker started");
        registry.register(keyword, child)?;

        let became_ready = wait_for_readiness(&mut registry, &marker, keyword).await?;
        marker.clear()?;

        // Cooldown only between starts; nothing follows the last worker
        if became_ready && index + 1 < total {
            let cooldown = config.harvest.startup_cooldown_secs;
            tracing::info!(%keyword, cooldown_secs = cooldown, "startup cooldown before next section");
            tokio::time::sleep(Duration::from_secs(cooldown)).await;
        }
    }

    // Every worker gets waited on, whatever its outcome
    let mut reports = Vec::with_capacity(total);
    for section in &config.sections {
        let status = registry.wait(&section.keyword).await?;

        // Restarted workers re-signal; consume whatever marker is left
        ReadinessMarker::new(config.readiness_path(&section.keyword)).clear()?;
        tracing::info!(
            keyword = %section.keyword,
            code = status.code(),
            success = status.success(),
            "worker exited"
        );
        reports.push(SectionReport {
            keyword: section.keyword.clone(),
            checkpoint_path: config.checkpoint_path(&section.keyword),
            status: registry.status(&section.keyword),
        });
    }

    let completed = reports.iter().filter(|r| r.completed()).count();
    tracing::info!(
        sections = total,
        completed,
        abandoned = total - completed,
        started_at = %started_at.format("%Y-%m-%d %H:%M:%S"),
        finished_at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "all sections finished"
    );

    Ok(reports)
}

/// Blocks until the worker signals readiness or exits early
///
/// Returns false when the worker died before ever bootstrapping; the
/// orchestrator then moves straight on to the next section instead of
/// hanging on a marker that will never appear.
async fn wait_for_readiness(
    registry: &mut WorkerRegistry,
    marker: &ReadinessMarker,
    keyword: &str,
) -> Result<bool, HarvestError> {
    loop {
        if marker.is_signaled() {
            tracing::info!(%keyword, "readiness observed");
            return Ok(true);
        }

        if let Some(status) = registry.try_finish(keyword)? {
            tracing::warn!(
                keyword,
                code = status.code(),
                "worker exited before signaling readiness"
            );
            return Ok(false);
        }

        tokio::time::sleep(READINESS_POLL).await;
    }
}

/// Entry point for one section worker process
///
/// Wires the concrete collaborators together and hands the section to the
/// restart supervisor. Failures are contained here; the orchestrator sees
/// only the process exit status.
pub async fn run_worker(config: &Config, keyword: &str) -> Result<SectionOutcome, HarvestError> {
    let section = config.find_section(keyword).ok_or_else(|| {
        HarvestError::Config(crate::ConfigError::Validation(format!(
            "unknown section keyword '{}'",
            keyword
        )))
    })?;

    std::fs::create_dir_all(&config.output.data_dir)?;

    let base_url = Url::parse(&config.source.base_url)?;
    let extractor = SelectorExtractor::new(&config.extractor, &base_url)
        .map_err(|m| HarvestError::Config(crate::ConfigError::InvalidSelector(m)))?;
    let detector = MarkerBlockList::new(&config.harvest.block_markers);
    let bootstrap = HttpBootstrap::new(config.source.clone(), config.egress.clone());
    let marker = ReadinessMarker::new(config.readiness_path(keyword));

    let supervisor = RestartSupervisor::new(
        config,
        section,
        &bootstrap,
        &extractor,
        &detector,
        Some(&marker),
    );

    supervisor.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completion() {
        let report = SectionReport {
            keyword: "bmw".to_string(),
            checkpoint_path: PathBuf::from("./data/bmw_items.json"),
            status: WorkerStatus::Stopped(Some(0)),
        };
        assert!(report.completed());

        let abandoned = SectionReport {
            status: WorkerStatus::Stopped(Some(2)),
            ..report.clone()
        };
        assert!(!abandoned.completed());
    }
}
