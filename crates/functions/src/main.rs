#![forbid(unsafe_code)]

mod auth;
mod config;
mod dispatch;
mod envelope;
mod error;
mod images;
mod publish;
mod reads;
mod server;
mod stdio;
mod time;
mod upload;

use config::HubConfig;
use hub_storage::SqliteStore;
use server::FunctionsServer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const SERVER_NAME: &str = "hub_functions";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> &'static str {
    "hub_functions: news hub callable functions over stdio\n\n\
USAGE:\n\
  hub_functions [--storage-dir DIR] [--deny-domain DOMAIN]... [--url-parse-policy open|closed]\n\
        [--publisher-role ROLE]... [--upload-base-url URL] [--upload-ttl-secs N]\n\
        [--busy-timeout-ms N] [--max-request-bytes N]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
NOTES:\n\
  - One JSON request per stdin line, one JSON response per stdout line\n\
  - Request lines over --max-request-bytes (default 16 MiB) are answered with an error\n\
  - Logs go to stderr; filter with HUB_LOG (default: info)\n\
  - HUB_UPLOAD_SECRET signs upload credentials; unset means a per-process secret\n"
}

fn version_line() -> String {
    format!("{SERVER_NAME} {SERVER_VERSION}")
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HUB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    init_logging();
    let config = HubConfig::from_process()?;
    if config.upload_secret_generated {
        warn!("HUB_UPLOAD_SECRET is not set; upload credentials only verify within this process");
    }

    let store = SqliteStore::open_with_options(&config.storage_dir, config.store_options())?;
    info!(
        storage_dir = %config.storage_dir.display(),
        url_parse_policy = config.url_parse_policy.as_str(),
        deny_list_len = config.deny_list.entries().count(),
        "{}",
        version_line()
    );

    let mut server = FunctionsServer::new(
        store,
        config.link_checker(),
        Box::new(config.authorizer()),
        config.upload_signer()?,
    );
    stdio::run_stdio(&mut server, config.max_request_bytes)
}
