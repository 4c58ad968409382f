//! Fans registration tasks out across a bounded pool of workers.

use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ProtocolConfig;
use crate::error::TaskError;
use crate::registrar::client::RegistrarClient;
use crate::registrar::{run_registration, TaskOutcome, TaskReport};
use crate::utils::names::{generate_label, NameStyle};
use crate::utils::proxy_manager::ProxyEndpoint;
use crate::utils::retry::RetryPolicy;
use crate::utils::wallet_manager::WalletKey;

/// Builds one chain client per task. Receives the task's wallet and the
/// proxy assigned to it, if any.
pub type ClientFactory = Arc<
    dyn Fn(&WalletKey, Option<&ProxyEndpoint>) -> Result<Arc<dyn RegistrarClient>, TaskError>
        + Send
        + Sync,
>;

#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub succeeded: u64,
    pub skipped: u64,
    pub failed_insufficient_funds: u64,
    pub failed_exhausted: u64,
}

impl BatchSummary {
    pub fn total(&self) -> u64 {
        self.succeeded + self.skipped + self.failed_insufficient_funds + self.failed_exhausted
    }

    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Succeeded => self.succeeded += 1,
            TaskOutcome::SkippedInvalidKey | TaskOutcome::SkippedInvalidConfig => {
                self.skipped += 1
            }
            TaskOutcome::FailedInsufficientFunds => self.failed_insufficient_funds += 1,
            TaskOutcome::FailedExhaustedRetries => self.failed_exhausted += 1,
        }
    }
}

pub struct TaskScheduler {
    protocol: ProtocolConfig,
    policy: RetryPolicy,
    name_style: NameStyle,
    max_concurrency: usize,
}

impl TaskScheduler {
    pub fn new(
        protocol: ProtocolConfig,
        policy: RetryPolicy,
        name_style: NameStyle,
        max_concurrency: usize,
    ) -> Self {
        Self {
            protocol,
            policy,
            name_style,
            max_concurrency,
        }
    }

    /// Runs `domain_count` tasks to their terminal states and aggregates the
    /// outcomes. Individual failures never abort the batch.
    pub async fn run_all(
        &self,
        wallets: &[WalletKey],
        domain_count: usize,
        proxies: &[ProxyEndpoint],
        factory: ClientFactory,
        token: CancellationToken,
    ) -> BatchSummary {
        let start = Instant::now();
        let reports = self
            .execute(wallets, domain_count, proxies, factory, token)
            .await;

        let mut summary = BatchSummary::default();
        for report in &reports {
            summary.record(&report.outcome);
        }

        info!(
            "Batch finished in {:.1}s | Success: {} | Insufficient funds: {} | Exhausted: {} | Skipped: {}",
            start.elapsed().as_secs_f64(),
            summary.succeeded,
            summary.failed_insufficient_funds,
            summary.failed_exhausted,
            summary.skipped
        );
        summary
    }

    /// Schedules the tasks and collects their reports. Wallet for task `i` is
    /// `wallets[i % wallets.len()]`; each task gets a freshly generated label
    /// and, when a pool exists, a proxy picked uniformly at random. At most
    /// `max_concurrency` tasks are in flight; the rest queue on the
    /// semaphore. Cancellation stops queued tasks from starting but lets
    /// in-flight tasks run to a terminal state.
    pub async fn execute(
        &self,
        wallets: &[WalletKey],
        domain_count: usize,
        proxies: &[ProxyEndpoint],
        factory: ClientFactory,
        token: CancellationToken,
    ) -> Vec<TaskReport> {
        if wallets.is_empty() {
            warn!("No wallets loaded; nothing to schedule.");
            return Vec::new();
        }

        info!(
            "Scheduling {} registration tasks across {} wallets ({} max concurrent)",
            domain_count,
            wallets.len(),
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.max(1)));
        let mut set = JoinSet::new();

        for index in 0..domain_count {
            let key = wallets[index % wallets.len()].clone();
            let label = generate_label(&self.name_style);
            let proxy = if proxies.is_empty() {
                None
            } else {
                let pick = rand::thread_rng().gen_range(0..proxies.len());
                Some(proxies[pick].clone())
            };

            let protocol = self.protocol.clone();
            let policy = self.policy;
            let factory = Arc::clone(&factory);
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();

            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // Semaphore only closes on shutdown.
                    Err(_) => return None,
                };
                if token.is_cancelled() {
                    return None;
                }
                let report = run_registration(index, label, &key, &protocol, &policy, || {
                    factory(&key, proxy.as_ref())
                })
                .await;
                Some(report)
            });
        }

        let mut reports = Vec::new();
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Some(report)) => {
                    log_report(&report);
                    reports.push(report);
                }
                Ok(None) => {}
                Err(e) => warn!("A registration task panicked: {:?}", e),
            }
        }
        reports
    }
}

fn log_report(report: &TaskReport) {
    let status = if report.outcome.is_success() {
        "Success".green().bold()
    } else if report.outcome.is_skip() {
        "Skipped".yellow().bold()
    } else {
        "Failed ".red().bold()
    };
    info!(
        target: "task_result",
        "[Task #{:03}] {} {} ({:?}, attempts: {})",
        report.index,
        status,
        report.label,
        report.outcome,
        report.attempts
    );
}
