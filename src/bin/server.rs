use std::{
    fs::OpenOptions,
    net::SocketAddr,
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use ledgerly::{
    AppState, Currency, build_router, get_local_offset, graceful_shutdown, logging_middleware,
};

/// The web server for ledgerly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. It is created if it does not exist.
    #[arg(long, default_value = "finance.db")]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// The canonical name of the local timezone, e.g. "Asia/Shanghai".
    ///
    /// Used to decide which month is the current month.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The currency that totals on the dashboard and in reports are converted into.
    #[arg(long, default_value = "CNY")]
    base_currency: String,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args.log_path) {
        eprintln!("could not set up logging to {}: {error}", args.log_path);
        return ExitCode::FAILURE;
    }

    if get_local_offset(&args.timezone).is_none() {
        tracing::error!("unknown timezone {:?}", args.timezone);
        return ExitCode::FAILURE;
    }

    let base_currency: Currency = match args.base_currency.parse() {
        Ok(currency) => currency,
        Err(error) => {
            tracing::error!("invalid base currency: {error}");
            return ExitCode::FAILURE;
        }
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not open database {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, &args.timezone, base_currency) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("could not initialize database {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on http://{addr}");

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging(log_path: &str) -> std::io::Result<()> {
    let stdout_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the handlers, so skip the default 5xx logging.
        .on_failure(());

    router.layer(tracing_layer)
}
