//! Follows one table from the terminal.
//!
//! ```text
//! TABLESYNC_WS_URL=ws://localhost:8080/ws cargo run -p table-watch -- <table-id> [identity.json]
//! ```
//!
//! Each snapshot change is printed as one line. Lines typed on stdin are
//! sent as actions: `fold`, `call`, `raise 200`. `quit` or Ctrl-C exits.

use tablesync::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_IDENTITY_FILE: &str = "identity.json";

fn describe(snap: &Snapshot) -> String {
    let table = snap
        .table_id
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    let mut line = format!("[{table}] {}", snap.phase);
    if snap.is_loading {
        line.push_str(" loading");
    }
    if let (Some(format), Some(variant)) = (&snap.format, &snap.variant) {
        line.push_str(&format!(" {format}/{variant}"));
    }
    if let Some(state) = &snap.game_state {
        line.push_str(&format!(" players={}", state.seated().count()));
        if let Some(bb) = state.game_options.as_ref().and_then(|o| o.big_blind.as_ref()) {
            line.push_str(&format!(" bb={bb}"));
        }
    }
    if let Some(pending) = &snap.pending_action {
        line.push_str(&format!(" pending={}:{}", pending.actor, pending.action));
    }
    if let Some(invalid) = &snap.validation_error {
        line.push_str(&format!(" incomplete({})", invalid.missing_fields.join(",")));
    }
    if let Some(error) = &snap.error {
        line.push_str(&format!(" error=\"{error}\""));
    }
    line
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tablesync_session=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(table) = args.next() else {
        eprintln!("usage: table-watch <table-id> [identity.json]");
        std::process::exit(2);
    };
    let identity_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_IDENTITY_FILE.to_string());

    let config = EngineConfig::from_env()?;
    let signature = std::env::var("TABLESYNC_DEV_SIGNATURE")
        .unwrap_or_else(|_| "0xdev".to_string());
    let engine = SyncEngine::websocket(
        config,
        FileIdentityStore::new(identity_path),
        StaticSignature::new(signature),
    );

    engine.subscribe(table.as_str()).await?;

    let mut updates = engine.watch();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", describe(&updates.borrow_and_update()));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", describe(&updates.borrow_and_update()));
            }
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                let mut words = line.split_whitespace();
                match (words.next(), words.next()) {
                    (None, _) => {}
                    (Some("quit"), _) => break,
                    (Some(action), amount) => {
                        if let Err(e) = engine
                            .send_action(action, amount.map(str::to_string))
                            .await
                        {
                            eprintln!("could not send {action}: {e}");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("shutting down");
    engine.shutdown().await?;
    Ok(())
}
