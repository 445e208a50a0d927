//! Prompt composition for text-mode agents

use crate::agent::InferenceRequest;
use std::fmt::Write;

/// Render a request as a single prompt
///
/// The agent is asked for exactly one JSON document: either the stage output
/// or a `tool_calls` envelope when capabilities are granted.
pub fn compose(request: &InferenceRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(request.instructions.trim());
    prompt.push_str("\n\n## Output\n");
    prompt.push_str(
        "Respond with a single JSON document of the following shape and nothing else. \
         Use exactly these field names.\n",
    );
    prompt.push_str(request.expected_shape.skeleton());
    prompt.push('\n');

    if !request.capabilities.is_empty() {
        prompt.push_str("\n## Tools\n");
        prompt.push_str(
            "Instead of the output you may call tools by responding only with \
             {\"tool_calls\": [{\"name\": \"<tool>\", \"arguments\": {...}}]}. \
             Their results are returned to you.\n",
        );
        for cap in &request.capabilities {
            let _ = writeln!(
                prompt,
                "- {}: {} Arguments: {}",
                cap.name, cap.description, cap.arguments
            );
        }
    }

    if !request.tool_results.is_empty() {
        prompt.push_str("\n## Tool results\n");
        for result in &request.tool_results {
            let status = if result.ok { "ok" } else { "failed" };
            let _ = writeln!(prompt, "- {} ({}): {}", result.name, status, result.output);
        }
    }

    prompt.push_str("\n## Input\n");
    prompt.push_str(&request.input);
    prompt.push('\n');
    prompt
}
