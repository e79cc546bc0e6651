//! Scopebench - actor-based request workbench
//!
//! Architecture:
//! - Console layer - reads commands from stdin, prints render state
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - token acquisition and HTTP execution

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use scopebench::auth::{AuthProvider, DeviceCodeProvider, StaticTokenProvider, TokenCache};
use scopebench::config::{Config, CONFIG_ENV};
use scopebench::console::{self, ConsoleCommand};
use scopebench::constants::{APP_NAME, APP_VERSION};
use scopebench::network::{NetworkActor, ReqwestTransport, RequestExecutor, SendPipeline};
use scopebench::{AppActor, NetworkCommand, NetworkResponse, RenderState, UiEvent, WorkbenchState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging to file
    let log_dir = config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let log_name = config
        .log_file
        .file_name()
        .context("log_file must name a file")?;
    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(version = APP_VERSION, "{} starting", APP_NAME);

    let pipeline = Arc::new(SendPipeline::new(
        TokenCache::new(build_provider(&config)?),
        RequestExecutor::new(Arc::new(ReqwestTransport::new(config.timeout()))),
    ));

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(pipeline, net_resp_tx);
    let network_handle = tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let state = WorkbenchState::new(config.default_scope.clone());
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    println!("{} {} - type `help` for commands", APP_NAME, APP_VERSION);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_render = RenderState::default();

    loop {
        tokio::select! {
            render = render_rx.recv() => {
                let Some(render) = render else { break };
                print!("{}", console::render(&render));
                last_render = render;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    let _ = ui_tx.send(UiEvent::Quit);
                    break;
                };
                match console::parse_command(&line) {
                    Ok(Some(ConsoleCommand::Event(UiEvent::Quit))) => {
                        let _ = ui_tx.send(UiEvent::Quit);
                        break;
                    }
                    Ok(Some(ConsoleCommand::Event(event))) => {
                        let _ = ui_tx.send(event);
                    }
                    Ok(Some(ConsoleCommand::Show)) => print!("{}", console::render(&last_render)),
                    Ok(Some(ConsoleCommand::History)) => print!("{}", console::render_history(&last_render)),
                    Ok(Some(ConsoleCommand::Help)) => println!("{}", console::HELP),
                    Ok(None) => {}
                    Err(message) => eprintln!("{}", message),
                }
            }
        }
    }

    let _ = network_handle.await;
    tracing::info!("{} stopped", APP_NAME);
    Ok(())
}

/// Static token when configured, else device code sign-in against the authority
fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn AuthProvider>> {
    if let Some(token) = &config.auth.static_token {
        return Ok(Arc::new(StaticTokenProvider::new(token.clone())));
    }
    let client_id = config.auth.client_id.clone().with_context(|| {
        format!(
            "set auth.client_id or auth.static_token in the config file (or point {} at one)",
            CONFIG_ENV
        )
    })?;
    Ok(Arc::new(DeviceCodeProvider::new(
        config.auth.authority.clone(),
        client_id,
        config.timeout(),
        |prompt| eprintln!("{}", prompt.message),
    )))
}
