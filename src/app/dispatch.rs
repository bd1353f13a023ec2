use crate::cli::commands::{Cli, Commands, PrefsCommands, PrefsTarget};
use anyhow::{Context, Result, bail};
use chainpilot::Config;
use chainpilot::core::engine::ChatEngine;
use chainpilot::core::preferences::PreferenceStore;
use chainpilot::core::providers::create_reasoner;
use chainpilot::core::session::{ConnectionManager, ToolBackend};
use chainpilot::plugins::mcp::connection_manager;
use chainpilot::ui::{TerminalSurface, TerminalTranscript, style};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::app::status::{render_preferences, render_status};

fn require_backend(config: &Config) -> Result<()> {
    let errors = config.backend.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        bail!(
            "backend is not configured ({}). Edit {}",
            errors.join("; "),
            config.config_path.display()
        )
    }
}

async fn connect(config: &Config) -> Result<Arc<ConnectionManager>> {
    require_backend(config)?;
    let manager = Arc::new(connection_manager(&config.backend));
    let tools = manager.connect().await?;
    info!(backend = %config.backend.name, tools = tools.len(), "backend ready");
    Ok(manager)
}

fn prompt() {
    print!("{} ", style::accent(">"));
    let _ = std::io::stdout().flush();
}

async fn run_chat(config: &Config, message: Option<String>, verbose: bool) -> Result<()> {
    let manager = connect(config).await?;
    let backend: Arc<dyn ToolBackend> = manager.clone();
    let mut engine = ChatEngine::new(
        backend,
        create_reasoner(&config.reasoning),
        PreferenceStore::open(&config.resolved_preferences_path()),
        config,
    )?
    .with_catalog(manager.tools().to_vec());

    let surface = TerminalSurface;
    let transcript = TerminalTranscript { verbose };

    if let Some(message) = message {
        let result = engine.handle(&message, &surface, &transcript).await;
        manager.disconnect().await?;
        result?;
        return Ok(());
    }

    println!(
        "  {} {} {}",
        style::header("chainpilot"),
        style::dim("connected to"),
        style::value(&config.backend.name)
    );
    println!("  {}", style::dim("Type a request, or /quit to exit."));
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line == "/quit" || line == "/exit" {
            break;
        }
        if !line.is_empty() {
            // Failures are already on the transcript; keep the loop alive.
            if engine.handle(line, &surface, &transcript).await.is_err()
                && !manager.check_liveness().await
                && reconnect(&manager).await
                && let Err(error) = engine.refresh_catalog().await
            {
                tracing::warn!(error = %format!("{error:#}"), "catalog refresh failed");
            }
        }
        prompt();
    }

    manager.disconnect().await
}

async fn reconnect(manager: &ConnectionManager) -> bool {
    println!("  {}", style::dim("Backend connection lost, reconnecting..."));
    match manager.connect().await {
        Ok(_) => true,
        Err(error) => {
            eprintln!("  {} {error}", style::yellow("reconnect failed:"));
            false
        }
    }
}

async fn list_tools(config: &Config) -> Result<()> {
    let manager = connect(config).await?;
    let tools = manager.tools();
    println!("  {} {}", style::header("Tools"), style::dim(tools.len()));
    for tool in tools.iter() {
        println!("  {} {}", style::cyan(&tool.name), style::dim(&tool.description));
    }
    manager.disconnect().await
}

async fn call_tool(config: &Config, tool: &str, args: Option<&str>) -> Result<()> {
    let arguments: Value = match args {
        Some(raw) => serde_json::from_str(raw).context("--args must be a JSON object")?,
        None => Value::Object(serde_json::Map::new()),
    };
    if !arguments.is_object() {
        bail!("--args must be a JSON object");
    }

    let manager = connect(config).await?;
    let result = manager.call_tool(tool, arguments).await;
    manager.disconnect().await?;

    let output = result?;
    if output.is_error {
        bail!("{tool} reported an error: {}", output.render());
    }
    println!("{}", output.render());
    Ok(())
}

async fn show_status(config: &Config) -> Result<()> {
    let manager = connection_manager(&config.backend);
    if let Err(error) = require_backend(config) {
        println!("{}", render_status(config, &manager.status(), 0));
        return Err(error);
    }

    // Connection failures are part of the report.
    let _ = manager.connect().await;
    println!(
        "{}",
        render_status(config, &manager.status(), manager.tools().len())
    );
    manager.disconnect().await
}

fn set_locked(store: &mut PreferenceStore, target: PrefsTarget, locked: bool) -> Result<()> {
    match target {
        PrefsTarget::Scope => store.set_execution_scope_locked(locked)?,
        PrefsTarget::Container => store.set_tracking_container_locked(locked)?,
    }
    Ok(())
}

fn edit_preferences(config: &Config, command: PrefsCommands) -> Result<()> {
    let mut store = PreferenceStore::open(&config.resolved_preferences_path());
    match command {
        PrefsCommands::Show => {}
        PrefsCommands::Lock { target } => set_locked(&mut store, target, true)?,
        PrefsCommands::Unlock { target } => set_locked(&mut store, target, false)?,
        PrefsCommands::Reset => store.reset()?,
    }
    println!("{}", render_preferences(store.get()));
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Chat { message } => run_chat(&config, message, cli.verbose).await,
        Commands::Tools => list_tools(&config).await,
        Commands::Call { tool, args } => call_tool(&config, &tool, args.as_deref()).await,
        Commands::Status => show_status(&config).await,
        Commands::Prefs { prefs_command } => edit_preferences(&config, prefs_command),
    }
}
