pub mod commands;
pub mod config;
pub mod logging;

use anyhow::Result;

use downtime_core::error::AppError;

use crate::config::Cli;

pub fn run(cli: &Cli) -> Result<String> {
    commands::execute(&cli.command, &cli.global, &commands::read_input)
}

/// Render a failure for stderr: the structured error as JSON when requested and available,
/// otherwise the error chain on one line.
pub fn render_error(err: &anyhow::Error, json: bool) -> String {
    match (json, err.downcast_ref::<AppError>()) {
        (true, Some(app)) => {
            serde_json::to_string(app).unwrap_or_else(|_| format!("error: {app}"))
        }
        (true, None) => serde_json::json!({
            "code": "CLI_FAILED",
            "message": format!("{err:#}"),
            "details": null,
            "retryable": false,
        })
        .to_string(),
        (false, _) => format!("error: {err:#}"),
    }
}
