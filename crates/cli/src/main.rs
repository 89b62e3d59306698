mod app;

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use {
    anyhow::Context,
    bolmcp_common::time::now_millis,
    bolmcp_config::{BolMcpConfig, TransportKind},
    bolmcp_mcp::HttpState,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "bol-mcp", version, about = "MCP server for the bol.com Retailer API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/bol-mcp/).
    #[arg(long, global = true, env = "BOL_MCP_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Keep the access token in memory instead of the token file.
    #[arg(long, global = true, default_value_t = false)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server (default when no subcommand is provided).
    Serve {
        /// stdio or http (overrides config value).
        #[arg(long)]
        transport: Option<TransportKind>,
        /// Address to bind to for http (overrides config value).
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on for http (overrides config value).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fetch a fresh access token and print its metadata.
    Token,
    /// List the tools the server registers.
    Tools,
}

/// Logs always go to stderr; stdout carries JSON-RPC on the stdio transport.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> BolMcpConfig {
    if let Some(ref dir) = cli.config_dir {
        bolmcp_config::set_config_dir(dir.clone());
    }
    let mut config = bolmcp_config::discover_and_load();
    if cli.ephemeral {
        config.storage.ephemeral = true;
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "bol-mcp starting");

    let config = load_config(&cli);
    match cli.command {
        None => serve(config, None, None, None).await,
        Some(Commands::Serve {
            transport,
            bind,
            port,
        }) => serve(config, transport, bind, port).await,
        Some(Commands::Token) => print_token(&config).await,
        Some(Commands::Tools) => print_tools(&config),
    }
}

async fn serve(
    mut config: BolMcpConfig,
    transport: Option<TransportKind>,
    bind: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    // CLI args override config values
    if let Some(transport) = transport {
        config.server.transport = transport;
    }
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    app::check_config(&config)?;

    #[cfg(feature = "metrics")]
    let metrics = bolmcp_metrics::init_metrics(bolmcp_metrics::MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: Vec::new(),
    })?;

    let server = app::build_server(&config)?;

    match config.server.transport {
        TransportKind::Stdio => {
            info!("serving MCP over stdio");
            bolmcp_mcp::serve_stdio(server).await?;
        },
        TransportKind::Http => {
            let ip: IpAddr = config
                .server
                .bind
                .parse()
                .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;
            let state = HttpState::new(server);
            #[cfg(feature = "prometheus")]
            let state = state.with_metrics(metrics);
            #[cfg(all(feature = "metrics", not(feature = "prometheus")))]
            let _ = metrics;
            bolmcp_mcp::serve_http(state, SocketAddr::new(ip, config.server.port)).await?;
        },
    }
    Ok(())
}

async fn print_token(config: &BolMcpConfig) -> anyhow::Result<()> {
    let tokens = app::token_manager(config, app::credential_store(config))?;
    let token = tokens.refresh().await?;

    let remaining_secs = token.expires_at_ms().saturating_sub(now_millis()) / 1000;
    println!("Token type: {}", token.token_type());
    println!("Scope:      {}", token.scope().unwrap_or("-"));
    println!(
        "Expires in: {remaining_secs}s (at {} ms since epoch)",
        token.expires_at_ms()
    );
    Ok(())
}

fn print_tools(config: &BolMcpConfig) -> anyhow::Result<()> {
    let server = app::build_server(config)?;
    for tool in server.router().list() {
        match tool.description {
            Some(description) => println!("{:<22} {description}", tool.name),
            None => println!("{}", tool.name),
        }
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["bol-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "bol-mcp",
            "serve",
            "--transport",
            "http",
            "--port",
            "9000",
            "--json-logs",
        ])
        .unwrap();
        assert!(cli.json_logs);
        match cli.command {
            Some(Commands::Serve {
                transport, port, ..
            }) => {
                assert_eq!(transport, Some(TransportKind::Http));
                assert_eq!(port, Some(9000));
            },
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn unknown_transport_is_rejected() {
        assert!(Cli::try_parse_from(["bol-mcp", "serve", "--transport", "sse"]).is_err());
    }
}
