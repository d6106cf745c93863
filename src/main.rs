/// centerdesk: admissions and enrollment back end
///
/// Main entry point. Initializes logging and configuration and starts the
/// HTTP server.

use centerdesk::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Center and student API at /api/centers, /api/students/*
/// - Inquiry pipeline API at /api/inquiries/*
/// - Caller permissions at /api/me/permissions
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    // Defaults to 0.0.0.0:3004, ./data and the standard permission table
    let config = Config::from_env()?;

    start_server(config).await?;

    Ok(())
}
