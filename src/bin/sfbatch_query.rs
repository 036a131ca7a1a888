//! Run one bulk query and print the raw result.
//!
//! ```sh
//! export SF_CLIENT_ID=... SF_CLIENT_SECRET=... SF_USERNAME=... SF_PASSWORD=...
//! export SFBATCH_LOG_DIR=logs   # optional, keeps every request/response
//! cargo run --bin sfbatch-query -- Account "SELECT Id, Name FROM Account"
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use sfbatch::auth::{PasswordCredentials, PasswordLogin};
use sfbatch::bulk::BulkJobClient;
use sfbatch::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(object_type), Some(query), None) = (args.next(), args.next(), args.next()) else {
        eprintln!("Usage: sfbatch-query <object> <soql>");
        return ExitCode::from(2);
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling bulk query");
            on_interrupt.cancel();
        }
    });

    match run(&object_type, &query, &cancel).await {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    object_type: &str,
    query: &str,
    cancel: &CancellationToken,
) -> Result<String, BoxError> {
    let log_dir = std::env::var("SFBATCH_LOG_DIR").ok().filter(|d| !d.is_empty());

    let login = PasswordLogin::new(PasswordCredentials::from_env()?)?;
    let session = login
        .login_with(|builder| match log_dir {
            Some(dir) => builder.with_diagnostic_log(dir),
            None => builder,
        })
        .await?;

    if let Some(log) = session.diagnostics() {
        info!(path = %log.path().display(), "Writing diagnostic log");
    }

    let bulk = BulkJobClient::new(Arc::new(session))?;
    let result = bulk
        .execute_bulk_query_cancellable(object_type, query, cancel)
        .await?;
    Ok(result)
}
