mod cli;

use anyhow::{Context, Result};
use cli::commands::{RunCommand, ValidateCommand};
use cli::output::*;
use cli::{Cli, Command};
use reqmodel::{
    AgentClientConfig, ExecutionContext, PiInferenceClient, PipelineConfig, PipelineCoordinator,
    Toolbox,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; stdout is reserved for the model
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_stages(cmd)?,
    }

    Ok(())
}

/// Resolve stage configuration: explicit file, user config dir, built-in
fn load_stages(explicit: Option<&str>) -> Result<PipelineConfig> {
    if let Some(path) = explicit {
        return PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load stage config {}", path));
    }

    if let Some(path) = user_stages_path().filter(|p| p.exists()) {
        debug!("Using stage config {}", path.display());
        return PipelineConfig::from_file(&path)
            .with_context(|| format!("Failed to load stage config {}", path.display()));
    }

    PipelineConfig::builtin().context("Failed to load built-in stage config")
}

fn user_stages_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reqmodel").join("stages.yaml"))
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = load_stages(cmd.stages.as_deref())?;
    let requirements = tokio::fs::read_to_string(&cmd.input)
        .await
        .with_context(|| format!("Failed to read requirements from {}", cmd.input))?;

    eprintln!(
        "{} Loaded stages: {}",
        INFO,
        style(&config.name).bold()
    );

    // Create agent client
    let mut agent_config = AgentClientConfig::new();
    if let Some(agent) = &cmd.agent {
        agent_config = agent_config.with_endpoint(agent.clone());
    }
    let inference = Arc::new(PiInferenceClient::new(agent_config));
    let ctx = ExecutionContext::new(inference, Toolbox::simulated());

    let coordinator = PipelineCoordinator::new(&config, ctx)?;

    // Set up event handler for console output
    let spinner = create_spinner();
    let events = spinner.clone();
    coordinator
        .add_event_handler(move |event| {
            events.println(format_pipeline_event(&event));
        })
        .await;

    let result = coordinator.run(&requirements).await;
    spinner.finish_and_clear();

    match result {
        Ok(model) => {
            let json = if cmd.pretty {
                serde_json::to_string_pretty(&model)?
            } else {
                serde_json::to_string(&model)?
            };

            match &cmd.output {
                Some(path) => {
                    tokio::fs::write(path, json)
                        .await
                        .with_context(|| format!("Failed to write model to {}", path))?;
                    eprintln!("{} Model written to {}", CHECK, style(path).bold());
                }
                None => println!("{}", json),
            }

            eprintln!(
                "{} {} user stories, {} classes {}",
                CHECK,
                style(model.user_stories.len()).cyan(),
                style(model.class_diagram.len()).cyan(),
                style("modeled successfully").green()
            );
            Ok(())
        }
        Err(failure) => {
            eprintln!("\n{}", format_failure(&failure, 20));
            error!("{}", failure);
            std::process::exit(1);
        }
    }
}

fn validate_stages(cmd: &ValidateCommand) -> Result<()> {
    eprintln!("{} Validating stage configuration...", INFO);

    match load_stages(cmd.stages.as_deref()) {
        Ok(config) => {
            eprintln!("{} Stage configuration is valid!", CHECK);
            eprintln!("  Name: {}", style(&config.name).bold());
            for stage in &config.stages {
                let capabilities: Vec<&str> =
                    stage.capabilities.iter().map(|c| c.as_str()).collect();
                eprintln!(
                    "  {} -> {:?} [{}]",
                    style(stage.name).cyan(),
                    stage.expected_output,
                    capabilities.join(", ")
                );
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{}", json);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} Validation failed:", CROSS);
            eprintln!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}
