//! CLI output formatting

use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use reqmodel::{PipelineEvent, PipelineFailure, RunPhase};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner for a run
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(template);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a run phase for display
pub fn format_phase(phase: &RunPhase) -> String {
    match phase {
        RunPhase::Idle => style("IDLE").dim().to_string(),
        RunPhase::ParsingRequirements => style("PARSING").yellow().to_string(),
        RunPhase::ModelingConcurrent => style("MODELING").yellow().to_string(),
        RunPhase::Merging => style("MERGING").yellow().to_string(),
        RunPhase::Completed => style("COMPLETED").green().to_string(),
        RunPhase::Failed { .. } => style("FAILED").red().to_string(),
    }
}

/// Format a pipeline event for display
pub fn format_pipeline_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::RunStarted { run_id } => format!(
            "{} Starting run {}",
            ROCKET,
            style(&run_id.to_string()[..8]).dim()
        ),
        PipelineEvent::PhaseChanged { phase, .. } => {
            format!("{} Phase {}", INFO, format_phase(phase))
        }
        PipelineEvent::StageStarted { stage } => format!("{} {}", SPINNER, style(stage).cyan()),
        PipelineEvent::StageRetrying {
            stage,
            attempt,
            kind,
            delay_ms,
        } => format!(
            "{} {} {} (attempt {} in {}ms)",
            WARN,
            style(stage).yellow(),
            style(kind).dim(),
            attempt,
            delay_ms
        ),
        PipelineEvent::ToolInvoked {
            stage,
            capability,
            ok,
        } => {
            let outcome = if *ok {
                style("ok").green()
            } else {
                style("failed").red()
            };
            format!(
                "{} {} called {} ({})",
                INFO,
                style(stage).dim(),
                style(capability).cyan(),
                outcome
            )
        }
        PipelineEvent::StageCompleted { stage } => format!("{} {}", CHECK, style(stage).green()),
        PipelineEvent::StageFailed {
            stage,
            kind,
            message,
        } => format!(
            "{} {} {}: {}",
            CROSS,
            style(stage).red(),
            style(kind).red(),
            style(message).dim()
        ),
        PipelineEvent::RunFinished { run_id, phase } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_phase(phase)
        ),
    }
}

/// Format a failure with its raw payload, truncated
pub fn format_failure(failure: &PipelineFailure, max_lines: usize) -> String {
    let mut out = format!("{} {}", CROSS, style(failure).red());
    if let Some(raw) = &failure.raw_payload {
        out.push_str(&format!("\n{}\n{}", style("Raw payload:").bold(), format_output(raw, max_lines)));
    }
    out
}

/// Format output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
