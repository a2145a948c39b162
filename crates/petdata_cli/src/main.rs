//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire config, logging, gateway and notifications together once.
//! - Print a deterministic summary for quick local sanity checks.
//!
//! Usage: `petdata_cli [DB_PATH]`. Logging is enabled when
//! `PETDATA_LOG_DIR` is set; `PETDATA_LOG_LEVEL` overrides the level.

use petdata_core::contract::pets_content_uri;
use petdata_core::{
    core_version, default_log_level, init_logging, notification_channel, Gender, GatewayConfig,
    PetGateway, PetValues,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("petdata_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    if let Ok(log_dir) = std::env::var("PETDATA_LOG_DIR") {
        let level = std::env::var("PETDATA_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let config = match std::env::args().nth(1) {
        Some(path) => GatewayConfig::with_db_file(path),
        None => GatewayConfig::default(),
    };

    let (notifier, dispatcher) = notification_channel();
    let gateway = PetGateway::open(&config, notifier);
    let collection = pets_content_uri();

    let before = gateway
        .query(&collection, &[], None, &[], None)
        .map_err(|err| err.to_string())?;

    let values = PetValues::new()
        .name("Toto")
        .breed("Terrier")
        .gender(Gender::Male)
        .weight(7);
    let inserted = gateway
        .insert(&collection, &values)
        .map_err(|err| err.to_string())?;
    let delivered = dispatcher.dispatch_pending();
    let after = gateway
        .query(&collection, &[], None, &[], None)
        .map_err(|err| err.to_string())?;

    println!("petdata_core version={}", core_version());
    println!("inserted={}", inserted.as_deref().unwrap_or("<none>"));
    println!(
        "rows_before={} rows_after={} deliveries={delivered} stale={}",
        before.row_count(),
        after.row_count(),
        before.has_changed()
    );
    log::info!(
        "event=cli_smoke module=cli status=ok rows={}",
        after.row_count()
    );
    Ok(())
}
