use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use ifttt_remote::dyndns::spdyn::SpdynClient;
use ifttt_remote::dyndns::throttle::{self, UpdateThrottle};
use ifttt_remote::http::state::AppState;
use ifttt_remote::kodi::KodiClient;
use ifttt_remote::player::{HostControl, Notifier};
use ifttt_remote::remote::auth::Identity;
use ifttt_remote::settings::FileSettings;
use ifttt_remote::shutdown::{self, RunningFlag, ServerHandle, ShutdownReason, ShutdownSignal};
use ifttt_remote::{cli, config, http};

/// Resolve on Ctrl+C or, on Unix, SIGTERM from the service manager.
async fn wait_for_abort() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    eprintln!("error: {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref())
        .and_then(|path| {
            match config::load_config(&path) {
                Ok(cfg) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    None
                }
            }
        });

    // Missing settings are fatal: nothing is bound.
    let config = match config::Config::resolve(file_config, &args) {
        Ok(config) => Arc::new(config),
        Err(e) => fail(format!("Missing settings, not starting: {e}")),
    };

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("ifttt-remote/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|e| fail(format!("failed to build HTTP client: {e}")));

    let kodi = Arc::new(KodiClient::new(http_client.clone(), &config.kodi));

    let state_path = config
        .state_file
        .clone()
        .or_else(FileSettings::default_path)
        .unwrap_or_else(|| fail("no state_file configured and no config directory available"));
    let settings = FileSettings::open(&state_path)
        .unwrap_or_else(|e| fail(format!("failed to open {}: {e}", state_path.display())));

    // Startup address update. Failures are logged and never block startup.
    let provider = SpdynClient::new(http_client, &config.dyndns);
    let update_throttle = Arc::new(UpdateThrottle::new(
        config.dyndns.interval,
        Arc::new(settings),
        Arc::new(provider),
    ));
    throttle::log_outcome(&update_throttle.run().await);

    let background = CancellationToken::new();
    let dyndns_task = tokio::spawn(throttle::run_periodically(
        Arc::clone(&update_throttle),
        config.dyndns.check_every,
        background.clone(),
    ));

    let signal = ShutdownSignal::new();
    let identity = match config.identity {
        Some(ip) => Identity::Fixed(ip),
        None => Identity::Probe(config.probe_target),
    };
    let state = AppState::new(kodi.clone(), &config.user_token, identity, signal.clone());
    let app = http::build_router(state, config.interface);

    let addr = SocketAddr::new(config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| fail(format!("failed to bind {addr}: {e}")));
    let server = ServerHandle::spawn(listener, app, RunningFlag::new())
        .unwrap_or_else(|e| fail(format!("failed to start listener on {addr}: {e}")));

    kodi.notify("Starting the IFTTT remote service").await;
    tracing::info!(
        "ifttt-remote {} listening on http://{}{} ({:?} interface)",
        env!("GIT_VERSION"),
        server.local_addr(),
        http::REMOTE_PREFIX,
        config.interface
    );

    let reason = shutdown::supervise(&signal, server, wait_for_abort(), config.poll_interval).await;

    kodi.notify("Stopping the IFTTT remote service").await;
    background.cancel();
    let _ = dyndns_task.await;

    if reason == ShutdownReason::ExitRequested && config.shutdown_host_on_exit {
        if let Err(e) = kodi.shutdown_host().await {
            tracing::error!("Host shutdown request failed: {}", e);
        }
    }

    tracing::info!("Goodbye.");
}
