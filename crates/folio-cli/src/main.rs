//! Entry point for the folio shell.

mod commands;
mod repl;

use commands::Session;
use folio_common::DatabaseConfig;
use repl::Repl;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("folio {}", env!("CARGO_PKG_VERSION"));
    println!("a small bibliographic database engine");

    let session = Session::new(DatabaseConfig::default());
    match Repl::new(session) {
        Ok(mut repl) => repl.run(),
        Err(e) => {
            eprintln!("Error: failed to initialize line editor: {}", e);
            std::process::exit(1);
        }
    }
}
