use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use raiplayrss::config::Config;
use raiplayrss::feed::Convertor;
use raiplayrss::server::{self, AppState};
use raiplayrss::transport::{ReqwestTransport, Transport};

#[derive(Parser, Debug)]
#[command(
    name = "raiplayrss",
    about = "Serves RaiPlay Sound programmes as podcast RSS feeds"
)]
struct Args {
    /// TOML config file (defaults apply when omitted or missing)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Convert one programme and print its RSS
    Convert {
        /// Provider path, e.g. programmi/lastoriaingiallo.xml
        path: String,

        /// Write the RSS here instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before the config loads so its warnings are not lost
    let rust_log = EnvFilter::try_from_default_env().ok();
    let explicit_filter = rust_log.is_some();
    let (subscriber, filter_handle) = logging(
        rust_log.unwrap_or_else(|| EnvFilter::new(STARTUP_LOG_FILTER)),
        std::io::stderr,
    );
    subscriber.init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Invalid environment override")?;

    // RUST_LOG wins over the configured level
    if !explicit_filter {
        let configured = EnvFilter::try_new(&config.log_level).context("Invalid log level")?;
        filter_handle
            .reload(configured)
            .context("Failed to apply log level")?;
    }

    let convert_config = config.validate().context("Invalid configuration")?;
    let transport: Arc<dyn Transport> = Arc::new(
        ReqwestTransport::new(config.request_timeout()).context("Failed to build HTTP client")?,
    );

    match args.command {
        Command::Serve => {
            let addr = config.listen_addr()?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            server::serve(listener, AppState::new(convert_config, transport))
                .await
                .context("Server error")?;
        }
        Command::Convert { path, output } => {
            let convertor = Convertor::new(convert_config, transport);
            let json_path = provider_json_path(&path);
            let xml = convertor
                .convert_path(&json_path)
                .await
                .with_context(|| format!("Failed to convert '{json_path}'"))?;

            match output {
                Some(file) => std::fs::write(&file, xml)
                    .with_context(|| format!("Failed to write '{}'", file.display()))?,
                None => println!("{xml}"),
            }
        }
    }

    Ok(())
}

const STARTUP_LOG_FILTER: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Builds the stderr subscriber with a filter that can be swapped once the
/// configured level is known.
fn logging<W>(
    initial: EnvFilter,
    make_writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(initial);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(make_writer));
    (subscriber, handle)
}

/// `/programmi/foo.xml` and `programmi/foo` both name `programmi/foo.json`.
fn provider_json_path(path: &str) -> String {
    let path = path.trim_start_matches('/');
    if let Some(stem) = path.strip_suffix(".xml") {
        format!("{stem}.json")
    } else if path.ends_with(".json") {
        path.to_string()
    } else {
        format!("{path}.json")
    }
}
