use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Parser;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use netbackup::backup::{
    CredentialResolver, DeviceCatalog, HttpAdapter, Orchestrator, ReqwestGetter, RunReport,
    ShellAdapter, SshExecutor,
};
use netbackup::cli::Cli;
use netbackup::mail::{self, SmtpSettings};
use netbackup::platform::PlatformRegistry;
use netbackup::secrets::{ORG, SecretStore};
use netbackup::storage::BackupStore;
use netbackup::{inventory, logging, render};

fn banner(message: &str) -> String {
    format!("########## {message} ##########")
}

#[tokio::main]
async fn main() -> ExitCode {
    let started = Instant::now();
    let start = Local::now();
    let cli = Cli::parse();

    let starting = banner(&format!("Starting netbackup at {}", start.format("%Y%m%d-%H%M%S")));
    println!("{starting}");
    println!("{}", banner(&format!("Log path: {}", cli.log.display())));
    println!("{}", banner(&format!("Backup path: {}", cli.bck.display())));
    println!("{}", banner(&format!("CSV path: {}", cli.csv.display())));
    println!("{}", banner(&format!("ENV path: {}", cli.env.display())));
    println!("{}", banner(&format!("Report path: {}", cli.rep.display())));

    let date = start.date_naive();
    if let Err(e) = logging::init(&cli.log, date) {
        eprintln!("cannot open the log in {}: {e}", cli.log.display());
        return ExitCode::FAILURE;
    }
    info!("{starting}");

    let code = match run(&cli, date).await {
        Ok(report) if report.is_aborted() => {
            println!(
                "{}",
                banner(&format!(
                    "Run stopped early: {}",
                    report.aborted.as_deref().unwrap_or_default()
                ))
            );
            ExitCode::FAILURE
        }
        Ok(report) => {
            println!(
                "{}",
                banner(&format!(
                    "{} OK, {} NOT OK",
                    report.ok_count(),
                    report.failed_count()
                ))
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    };

    let finished = banner(&format!(
        "Finished netbackup at {}",
        Local::now().format("%Y%m%d-%H%M%S")
    ));
    info!("{finished}");
    println!("{finished}");

    let total = banner(&format!("Total execution time: {:?}", started.elapsed()));
    info!("{total}");
    println!("{total}");

    code
}

async fn run(cli: &Cli, date: NaiveDate) -> netbackup::Result<RunReport> {
    let store = BackupStore::new(&cli.bck, date);
    // Each device's save reports its own failure
    if let Err(e) = store.prepare() {
        error!("{e}");
    }

    let secrets = Arc::new(SecretStore::load(&cli.env)?);
    let org = secrets.require_value(ORG)?.to_string();
    info!("{}", banner(&format!("Loaded ENV file for organization {org}")));

    let platforms = Arc::new(PlatformRegistry::with_builtins());
    let catalog = match cli.catalog {
        Some(ref path) => {
            info!("loading device catalog from {}", path.display());
            DeviceCatalog::load(path)?
        }
        None => DeviceCatalog::builtin(),
    };
    catalog.check_platforms(&platforms)?;

    let records = inventory::load(&cli.csv)?;
    info!("{}", banner(&format!("Loaded {} records from the CSV file", records.len())));

    let http_settings = cli.http_settings();
    if !http_settings.verify_tls {
        warn!("certificate validation is disabled for HTTP API devices");
    }
    let getter = ReqwestGetter::new(&http_settings)?;

    let orchestrator = Orchestrator::new(
        Arc::new(catalog),
        CredentialResolver::new(Arc::clone(&secrets), cli.strict_credentials),
        ShellAdapter::new(Arc::new(SshExecutor::new(cli.shell_settings())), platforms),
        HttpAdapter::new(Arc::new(getter), http_settings.reject_http_errors),
        store,
        cli.run_settings(),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping the run");
            on_interrupt.cancel();
        }
    });

    let report = orchestrator.run(&org, records, cancel).await;
    deliver(cli, &secrets, &report).await;

    Ok(report)
}

/// Render and mail the report. Failures are logged only.
async fn deliver(cli: &Cli, secrets: &SecretStore, report: &RunReport) {
    info!("{}", banner("Starting with rendering the report"));
    let html = match render::render_file(&cli.rep, report) {
        Ok(html) => html,
        Err(e) => {
            error!("report: {e}");
            return;
        }
    };

    match SmtpSettings::from_secrets(secrets) {
        Ok(Some(settings)) => {
            info!("{}", banner("Sending the report"));
            let subject = mail::subject(&report.org, &report.date);
            if let Err(e) = mail::send_report(&settings, &subject, html).await {
                error!("mail: {e}");
            }
        }
        Ok(None) => info!("USE_SMTP is not 'yes', the report is not mailed"),
        Err(e) => error!("mail settings: {e}"),
    }
}
