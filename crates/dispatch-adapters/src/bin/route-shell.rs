//! Reads lines from stdin and routes each one to a child shell or the assistant.
//!
//! `--classify-only` prints the routing decision for each line as JSON
//! instead of acting on it.

use std::sync::Arc;

use anyhow::Result;
use dispatch_adapters::{init_tracing, AppConfig, PathProbe, ProcessShell};
use dispatch_core::{Dispatcher, Session, SessionContext, SessionQueue, SessionUpdate, TurnRole};
use intent_router::IntentClassifier;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("route_shell=info,dispatch_core=info,dispatch_adapters=info,intent_router=warn");
    let config = AppConfig::from_env()?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let classify_only = args.iter().any(|a| a == "--classify-only");

    let classifier = IntentClassifier::with_probe(PathProbe::from_flag(config.probe_enabled));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if classify_only {
        while let Some(line) = lines.next_line().await? {
            let decision = classifier.classify_or_fallback(&line).await;
            println!("{}", serde_json::to_string(&decision)?);
        }
        return Ok(());
    }

    let inference = config.inference()?;
    if inference.is_offline() {
        warn!("no API key configured; assistant requests will fail");
    }

    let cwd = std::env::current_dir()?;
    let shell = Arc::new(ProcessShell::new(config.shell_program.clone()));
    let handle = shell.attach(&cwd).await?;
    let session = Session::open(
        SessionContext::new(cwd)
            .with_max_recent_commands(config.dispatch.max_recent_commands)
            .with_shell(handle.clone()),
    );
    info!(session = %session.id(), shell = %config.shell_program, "session open");

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(SessionUpdate::TurnAppended(turn)) if turn.role == TurnRole::Assistant => {
                    if turn.is_error() {
                        eprintln!("assistant! {}", turn.content);
                    } else {
                        println!("assistant> {}", turn.content);
                    }
                }
                Ok(SessionUpdate::ErrorRecorded(record)) => {
                    eprintln!("[{:?}] {}", record.kind, record.message);
                }
                Ok(SessionUpdate::Closed) | Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            }
        }
    });

    let dispatcher = Arc::new(Dispatcher::with_config(
        classifier,
        shell.clone(),
        inference,
        config.dispatch.clone(),
    ));
    let queue = SessionQueue::spawn(dispatcher.clone(), session.clone());

    while let Some(line) = lines.next_line().await? {
        if let Err(e) = queue.submit(line) {
            warn!(error = %e, "input rejected");
            break;
        }
    }

    queue.finish().await;
    session.close();
    let _ = printer.await;

    let status = shell.detach(&handle).await?;
    info!(?status, "shell exited");
    eprintln!("{}", serde_json::to_string_pretty(&dispatcher.stats())?);
    Ok(())
}
