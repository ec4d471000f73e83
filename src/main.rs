// src/main.rs

use alert2teams::{
    serve, AppError, CardSender, CommandLineInput, HttpCardSender, RelayConfig, RetryingSender,
};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::path::Path;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let log_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%dT%H:%M:%S%.3f%z)} [{l}] {t} - {m}{n}",
        )))
        .build();

    let mut config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)));
    let mut root = Root::builder().appender("stdout");

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file_appender = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
            )))
            .build(path)?;
        config = config.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        );
        root = root.appender("file");
    }

    log4rs::init_config(config.build(root.build(log_level))?)?;
    if let Some(path) = log_file {
        log::info!("Logging initialized. Log file: {}", path.display());
    }
    Ok(())
}

/// Resolves configuration, wires the relay and serves until Ctrl-C.
async fn run(config: RelayConfig) -> Result<(), AppError> {
    let transport = HttpCardSender::new(&config.pool)?;
    let sender: Arc<dyn CardSender> = Arc::new(RetryingSender::new(transport, config.retry));

    let state = Arc::new(config.build_state(sender)?);
    log::info!(
        "Serving {} connector(s), dynamic webhooks under {}",
        state.connectors().count(),
        alert2teams::constants::DYNAMIC_WEBHOOK_PREFIX
    );

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        log::info!("Shutdown signal received, draining requests");
    })
    .await?;

    log::info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CommandLineInput::parse();

    let result = match setup_logging(cli.debug, cli.log_file.as_deref()) {
        Ok(()) => match RelayConfig::resolve(cli) {
            Ok(config) => run(config).await,
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(AppError::Logging(e)),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
