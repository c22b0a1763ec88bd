//! The device backup loop.
//!
//! Each device goes through `classify -> resolve credentials -> fetch ->
//! save`. A device's failure is recorded as a `NOT_OK` outcome and never
//! stops the batch; only an invalid record (under fail-fast), the run
//! timeout or external cancellation stop it early, and even then the
//! outcomes recorded so far are reported.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{StreamExt, future, stream};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use super::adapter::{ChannelAdapter, Fetched, HttpAdapter, ShellAdapter};
use super::catalog::{ChannelGroup, DeviceCatalog};
use super::credentials::CredentialResolver;
use super::registry::{ClassifiedDevice, DeviceRecord, DeviceRegistry, ValidationPolicy};
use super::report::{BackupOutcome, RunReport};
use crate::error::FetchError;
use crate::storage::{BackupStore, date_stamp};

/// Batch-level knobs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Devices processed at once. `1` processes them strictly in order.
    pub concurrency: usize,
    /// Budget for one adapter call.
    pub device_timeout: Duration,
    /// Budget for the whole run; no new devices start once it is spent.
    pub run_timeout: Option<Duration>,
    pub validation: ValidationPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            device_timeout: Duration::from_secs(600),
            run_timeout: None,
            validation: ValidationPolicy::FailFast,
        }
    }
}

/// Drives every device through the matching adapter and collects outcomes.
pub struct Orchestrator {
    catalog: Arc<DeviceCatalog>,
    resolver: CredentialResolver,
    shell: ChannelAdapter,
    http: ChannelAdapter,
    store: BackupStore,
    settings: RunSettings,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<DeviceCatalog>,
        resolver: CredentialResolver,
        shell: ShellAdapter,
        http: HttpAdapter,
        store: BackupStore,
        settings: RunSettings,
    ) -> Self {
        Self {
            catalog,
            resolver,
            shell: ChannelAdapter::Shell(shell),
            http: ChannelAdapter::Http(http),
            store,
            settings,
        }
    }

    pub fn store(&self) -> &BackupStore {
        &self.store
    }

    /// Back up every record and build the report.
    ///
    /// Cancelling `cancel` stops dispatching new devices and cancels the
    /// ones in flight; the partial report is still returned.
    pub async fn run(
        &self,
        org: &str,
        records: Vec<DeviceRecord>,
        cancel: CancellationToken,
    ) -> RunReport {
        let started = Instant::now();
        let concurrency = self.settings.concurrency.max(1);

        let classification = DeviceRegistry::new(Arc::clone(&self.catalog))
            .classify_all(records, self.settings.validation);

        let mut abort_reasons = vec![];
        let mut devices = classification.devices;
        if let Some(ref invalid) = classification.aborted {
            abort_reasons.push(format!("invalid record: {invalid}"));
            if concurrency > 1 {
                error!(
                    "rejecting the whole batch of {} valid records: {}",
                    devices.len(),
                    invalid
                );
                devices.clear();
            }
        }

        info!(
            "dispatching {} devices, {} at a time",
            devices.len(),
            concurrency
        );

        let run_token = cancel.child_token();
        let timer = self.settings.run_timeout.map(|limit| {
            let token = run_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                token.cancel();
            })
        });

        let gate = run_token.clone();
        let token = &run_token;
        let mut outcomes: Vec<(usize, BackupOutcome)> = stream::iter(devices.iter())
            .take_while(move |_| future::ready(!gate.is_cancelled()))
            .map(move |device| async move { (device.index, self.process(device, token).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        if let Some(timer) = timer {
            timer.abort();
        }

        if cancel.is_cancelled() {
            warn!("run cancelled");
            abort_reasons.push("run cancelled".to_string());
        } else if run_token.is_cancelled() {
            let limit = self.settings.run_timeout.unwrap_or_default();
            warn!("run timeout of {limit:?} exceeded");
            abort_reasons.push(format!("run timeout of {limit:?} exceeded"));
        }

        outcomes.sort_by_key(|(index, _)| *index);

        let finished: HashSet<usize> = outcomes.iter().map(|(index, _)| *index).collect();
        let undispatched = devices
            .iter()
            .filter(|d| !finished.contains(&d.index))
            .map(|d| d.name().to_string())
            .collect();

        let mut report = RunReport::aggregate(
            org,
            date_stamp(self.store.date()),
            outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        );
        report.aborted = (!abort_reasons.is_empty()).then(|| abort_reasons.join("; "));
        report.skipped = classification
            .skipped
            .iter()
            .map(|e| e.device().to_string())
            .collect();
        report.undispatched = undispatched;
        report.elapsed = started.elapsed();

        info!(
            "run finished: {} OK, {} NOT_OK, {} skipped in {:?}",
            report.ok_count(),
            report.failed_count(),
            report.skipped.len(),
            report.elapsed
        );
        report
    }

    async fn process(&self, device: &ClassifiedDevice, cancel: &CancellationToken) -> BackupOutcome {
        let name = device.name();
        info!(
            "{}: starting backup of {} ({} via {})",
            name,
            device.record.host,
            device.record.device_kind,
            device.group()
        );

        let credential = match self.resolver.resolve(device) {
            Ok(credential) => credential,
            Err(e) => {
                error!("{name}: credentials: {e}");
                return BackupOutcome::not_ok(name, FetchError::from(e).to_string());
            }
        };

        let adapter = match device.group() {
            ChannelGroup::InteractiveShell => &self.shell,
            ChannelGroup::HttpApi => &self.http,
        };

        let limit = self.settings.device_timeout;
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(limit, adapter.fetch(device, &credential)) => {
                result.unwrap_or_else(|_| Err(FetchError::Timeout(limit)))
            }
        };

        match fetched {
            Ok(Fetched::Config(text)) => match self.store.save(name, &text) {
                Ok(path) => {
                    info!("{}: backup saved to {}", name, path.display());
                    BackupOutcome::ok(name, text, Some(path))
                }
                Err(e) => {
                    error!("{name}: save: {e}; fetch succeeded, outcome stays OK");
                    BackupOutcome::ok(name, text, None)
                }
            },
            Ok(Fetched::Empty) => {
                warn!("{name}: fetch: device returned no configuration");
                BackupOutcome::not_ok(name, "no configuration returned")
            }
            Err(e) => {
                error!("{name}: fetch: {e}");
                BackupOutcome::not_ok(name, e.to_string())
            }
        }
    }
}
