use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser; // for cli
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pastebin_gateway::logging::{LogFormat, init_logging};
use pastebin_gateway::{AdmissionController, AppState, Args, build_router};

#[tokio::main]
async fn main() -> ExitCode {
    // parse cli arguments
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, LogFormat::parse(&args.log_format)) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.rate_limit_config();
    let admission = Arc::new(AdmissionController::new(config.clone())?);

    // one sweeper for the process, stopped on shutdown
    let shutdown = CancellationToken::new();
    let sweeper = admission.spawn_sweeper(shutdown.clone());
    if sweeper.is_none() {
        info!("eviction sweep disabled");
    }

    let app = build_router(AppState::new(admission, args.page_size));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "pastebin gateway listening");
    info!(
        burst = config.burst_capacity(),
        rate = config.rate_per_second(),
        idle_timeout = ?config.idle_timeout_duration(),
        sweep_interval = ?config.sweep_interval_duration(),
        "rate limit policy"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    info!("server exited gracefully");
    Ok(())
}

// Resolves on Ctrl-C or SIGTERM and cancels background work
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("server is shutting down");
    shutdown.cancel();
}
