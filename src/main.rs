use std::process::ExitCode;

use tracing::error;

use rudis::config::Config;
use rudis::server::RedisServer;

/// Entry point for the server binary.
///
/// Parses the command line, loads the optional RDB snapshot, binds the
/// listening socket and runs the accept loop until a shutdown signal
/// arrives. Exits with status 1 if the listening socket cannot be created,
/// bound or listened on.
#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt().try_init();

    let config = match Config::from_args(std::env::args()) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid command line arguments");
            return ExitCode::FAILURE;
        }
    };

    let server = match RedisServer::bind(config).await {
        Ok(server) => server,
        Err(error) => {
            error!(%error, "unable to start server");
            return ExitCode::FAILURE;
        }
    };

    server.run().await;

    ExitCode::SUCCESS
}
