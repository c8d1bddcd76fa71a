use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Method;
use clap::Parser;
use instapexport::config::{Cli, Command, Config, SourceArgs};
use instapexport::dal::{Dal, OrphanPolicy};
use instapexport::handler::{AppState, routes};
use instapexport::progress::LogProgress;
use instapexport::report::{Summary, render_text};
use instapexport::{api::PageView, sources};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Cli::parse();
    init_tracing(args.log_json);

    if let Err(err) = run(args) {
        tracing::error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            tracing::error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn run(args: Cli) -> Result<()> {
    let cfg = Config::load_or_default(args.config_path.as_deref())?;

    match args.command {
        Command::Pages(cmd) => {
            let dal = build_dal(&cfg, &cmd.sources)?;
            let pages = dal.pages()?;
            if cmd.json {
                let views: Vec<PageView> = pages
                    .iter()
                    .map(|p| PageView::new(p, cfg.app.get_service_url()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for page in &pages {
                    println!("{} {} \"{}\"", page.dt().format("%Y-%m-%d"), page.url(), page.title());
                    for hl in &page.highlights {
                        println!("    {}", hl.text());
                        if let Some(note) = hl.note() {
                            println!("      note: {}", note);
                        }
                    }
                }
            }
            Ok(())
        }
        Command::Summary(cmd) => {
            let dal = build_dal(&cfg, &cmd.sources)?;
            let summary = Summary::from_pages(&dal.pages()?, cmd.top);
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", render_text(&summary));
            }
            Ok(())
        }
        Command::Serve(cmd) => {
            let dal = build_dal(&cfg, &cmd.sources)?;
            let port = cmd.port.unwrap_or(cfg.app.get_port());
            let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            runtime.block_on(serve(dal, cfg.app.get_service_url().to_string(), port))
        }
    }
}

fn build_dal(cfg: &Config, args: &SourceArgs) -> Result<Dal> {
    let sources: Vec<PathBuf> = if args.inputs.is_empty() {
        let dir = cfg
            .app
            .get_export_dir()
            .context("no inputs given and no export_dir configured")?;
        sources::discover(&dir)?
    } else {
        sources::resolve(&args.inputs)?
    };
    let orphans = if args.drop_orphans {
        OrphanPolicy::Drop
    } else {
        cfg.app.orphan_policy()
    };

    let dal = Dal::new(sources)
        .with_progress(Box::new(LogProgress::new()))
        .with_orphans(orphans);
    tracing::info!(count = dal.sources().len(), "found exports");

    Ok(dal)
}

async fn serve(dal: Dal, service_url: String, port: u16) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let app = routes().layer(cors).with_state(AppState {
        dal: Arc::new(dal),
        service_url,
    });

    let address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    tracing::info!("instapexport running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("server failed")?;
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, shutting down");
        }
    }

    Ok(())
}
