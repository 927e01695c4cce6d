// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPEngine set watcher CLI
//!
//! Reads Kubernetes watch events for EndpointSlices and prints the endpoint list of
//! the configured RTPEngine set (one JSON line) every time it changes.
//!
//! # Usage
//!
//! ```bash
//! # Follow a live watch
//! kubectl get endpointslices -n voip --watch --output-watch-events -o json \
//!   | jq -c . | rtpengine-set --service-name rtpengine --namespace voip --port ng
//!
//! # Using configuration file
//! rtpengine-set --config set.toml --input events.jsonl --exit-on-eof
//!
//! # Generate an example configuration file
//! rtpengine-set gen-config --output set.toml
//! ```

use clap::{Parser, Subcommand};
use rtpengine_set::{stream, ConfigError, EndpointSet, LocalInformer, SetConfig, WatchError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// RTPEngine set watcher
#[derive(Parser, Debug)]
#[command(name = "rtpengine-set")]
#[command(about = "Track RTPEngine control endpoints from Kubernetes EndpointSlice events")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service name
    #[arg(long, conflicts_with = "config")]
    service_name: Option<String>,

    /// Service namespace
    #[arg(short, long, default_value = "default", conflicts_with = "config")]
    namespace: String,

    /// Control port number or declared port name
    #[arg(short, long, conflicts_with = "config")]
    port: Option<String>,

    /// RTPEngine set number
    #[arg(long, default_value = "0", conflicts_with = "config")]
    set_id: u32,

    /// Watch events file (newline-delimited JSON, default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Stop when the watch event input ends
    #[arg(long)]
    exit_on_eof: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "rtpengine-set.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Handle subcommands
    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    // Initialize logging (stdout carries the endpoint lists)
    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let informer = Arc::new(LocalInformer::new());
    let span = tracing::info_span!(
        "rtpengine_set",
        id = config.id,
        service = %format!("{}/{}", config.service_namespace, config.service_name)
    );
    let set = config.builder().informer(informer.clone()).logger(span).start()?;

    info!(
        "Watching set {} on {}/{} port {}",
        set.id(),
        set.service_namespace(),
        set.service_name(),
        set.service_port()
    );

    let shutdown = Arc::new(Notify::new());

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received, stopping...");
        ctrl_c.notify_one();
    });

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match args.input {
        Some(ref path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let feed_shutdown = shutdown.clone();
    let exit_on_eof = args.exit_on_eof;
    tokio::spawn(async move {
        match stream::run(reader, &informer).await {
            Ok(n) => info!("Watch input ended after {} events", n),
            Err(e) => error!("Watch input failed: {}", e),
        }
        if exit_on_eof {
            feed_shutdown.notify_one();
        }
    });

    consume(&set, &shutdown, &mut std::io::stdout()).await?;

    info!("Stopped");
    Ok(())
}

fn build_config(args: &Args) -> Result<SetConfig, ConfigError> {
    // Load from file if specified
    if let Some(ref config_path) = args.config {
        return SetConfig::from_file(config_path);
    }

    // Build from command line arguments
    let service_name = args
        .service_name
        .clone()
        .ok_or(ConfigError::MissingField("service_name"))?;
    let service_port = args
        .port
        .clone()
        .ok_or(ConfigError::MissingField("service_port"))?;

    let config = SetConfig::new(service_name, service_port)
        .with_namespace(args.namespace.clone())
        .with_id(args.set_id);
    config.validate()?;

    Ok(config)
}

/// Print the endpoint list after every change until `shutdown` fires.
///
/// A change still pending when shutdown fires is printed before returning.
async fn consume<W: Write>(
    set: &EndpointSet,
    shutdown: &Notify,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match set.watch(shutdown.notified()).await {
            Ok(()) => print_endpoints(set, out)?,
            Err(WatchError::Cancelled) => {
                if set.watch_timeout(Duration::ZERO).await.is_ok() {
                    print_endpoints(set, out)?;
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_endpoints<W: Write>(set: &EndpointSet, out: &mut W) -> std::io::Result<()> {
    let line = serde_json::json!({
        "set": set.id(),
        "endpoints": set.endpoints(),
    });
    writeln!(out, "{}", line)?;
    out.flush()
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = SetConfig::new("rtpengine", "ng").with_namespace("voip");

    let content = format!(
        r#"# RTPEngine set configuration
# Generated by rtpengine-set gen-config

{}
"#,
        config.to_toml()?
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match SetConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Set:       {}", config.id);
            println!(
                "Service:   {}/{}",
                config.service_namespace, config.service_name
            );
            println!("Port:      {}", config.service_port);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Span;

    const ADDED: &str = r#"{"type":"ADDED","object":{"kind":"EndpointSlice","metadata":{"name":"rtpengine","namespace":"voip"},"ports":[{"name":"ng","port":22222}],"endpoints":[{"addresses":["10.0.0.1"]}]}}"#;

    fn start(informer: &Arc<LocalInformer>) -> Arc<EndpointSet> {
        SetConfig::new("rtpengine", "ng")
            .with_namespace("voip")
            .builder()
            .informer(informer.clone())
            .logger(Span::none())
            .start()
            .unwrap()
    }

    #[tokio::test]
    async fn test_consume_prints_change_pending_at_shutdown() {
        let informer = Arc::new(LocalInformer::new());
        let set = start(&informer);

        // Input ends (and shutdown fires) before the consumer ever runs.
        let applied = stream::run(format!("{}\n", ADDED).as_bytes(), &informer)
            .await
            .unwrap();
        assert_eq!(applied, 1);
        let shutdown = Notify::new();
        shutdown.notify_one();

        let mut out = Vec::new();
        consume(&set, &shutdown, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            vec![r#"{"endpoints":[{"address":"10.0.0.1","port":22222}],"set":0}"#]
        );
    }

    #[tokio::test]
    async fn test_consume_without_changes_prints_nothing() {
        let informer = Arc::new(LocalInformer::new());
        let set = start(&informer);

        let shutdown = Notify::new();
        shutdown.notify_one();

        let mut out = Vec::new();
        consume(&set, &shutdown, &mut out).await.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_build_config_from_flags() {
        let args = Args::parse_from([
            "rtpengine-set",
            "--service-name",
            "rtpengine",
            "--namespace",
            "voip",
            "--port",
            "ng",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.service_namespace, "voip");
        assert_eq!(config.service_port, "ng");

        let args = Args::parse_from(["rtpengine-set", "--port", "ng"]);
        assert!(matches!(
            build_config(&args),
            Err(ConfigError::MissingField("service_name"))
        ));
    }
}
