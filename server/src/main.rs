use anyhow::Result;
use catalog_core::EngineConfig;
use clap::Parser;
use catalog_server::{build_app, build_search, CatalogPaths};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Primary catalog file or directory (indexed)
    #[arg(long, env = "CATALOG_PRIMARY", default_value = "./catalog/primary")]
    primary: PathBuf,
    /// Licensed works file or directory
    #[arg(long, env = "CATALOG_LICENSED", default_value = "./catalog/licensed")]
    licensed: PathBuf,
    /// E-book file or directory
    #[arg(long, env = "CATALOG_EBOOKS", default_value = "./catalog/ebooks")]
    ebooks: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Maximum records fetched for one index build
    #[arg(long, env = "CATALOG_FETCH_LIMIT", default_value_t = 5000)]
    fetch_limit: usize,
    #[arg(long, env = "CATALOG_BUILD_TIMEOUT_MS", default_value_t = 5000)]
    build_timeout_ms: u64,
    #[arg(long, env = "CATALOG_SOURCE_TIMEOUT_MS", default_value_t = 3000)]
    source_timeout_ms: u64,
    /// Results per source when the request does not say
    #[arg(long, env = "CATALOG_LIMIT_PER_SOURCE", default_value_t = 20)]
    limit_per_source: usize,
    /// Build the index before accepting requests instead of on first use
    #[arg(long, default_value_t = false)]
    warm: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fetch_limit: self.fetch_limit,
            build_timeout_ms: self.build_timeout_ms,
            source_timeout_ms: self.source_timeout_ms,
            primary_limit: self.limit_per_source,
            secondary_limit: self.limit_per_source,
            ..EngineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let paths = CatalogPaths { primary: args.primary.clone(), licensed: args.licensed.clone(), ebooks: args.ebooks.clone() };
    let search = Arc::new(build_search(&paths, args.engine_config()));

    if args.warm {
        // failure is not fatal: the first request retries and falls back meanwhile
        if let Err(e) = search.manager().rebuild().await {
            tracing::warn!(error = %e, "warm-up build failed");
        }
    }

    let app = build_app(search);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, primary = %paths.primary.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
