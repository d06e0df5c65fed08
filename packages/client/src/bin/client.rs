//! Terminal client for the Denpo direct-message relay.
//!
//! Connects over WebSocket for live presence and deliveries, and sends messages over HTTP.
//! Type `@<recipient> <message>` to send.
//! Automatically reconnects on disconnection (max 5 attempts with a 1 second interval).
//! A rejected token is not retried.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin denpo-client -- --token <jwt>
//! cargo run --bin denpo-client -- -u ws://127.0.0.1:3000/ws -a http://127.0.0.1:3000 -t <jwt>
//! ```

use clap::Parser;

use denpo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "denpo-client")]
#[command(about = "Terminal client for the Denpo direct-message relay", long_about = None)]
struct Args {
    /// Bearer token issued for the participant
    #[arg(short = 't', long, env = "DENPO_TOKEN", hide_env_values = true)]
    token: String,

    /// WebSocket endpoint
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// REST API base URL
    #[arg(short = 'a', long, default_value = "http://127.0.0.1:8080")]
    api: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("denpo_client", env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = denpo_client::run_client(args.url, args.api, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
