//! Small CLI front-end: launches a browser session, navigates to a URL,
//! and prints the resulting page map. Enough to exercise the whole
//! pipeline as a runnable program, not a production crawler.

use anyhow::{Context, Result};
use clap::Parser;

use pagemapper::context::JobContext;
use pagemapper::tool::Tool;
use pagemapper::tools::builtin::BrowserTool;

/// Navigate a page and print its page map.
#[derive(Debug, Parser)]
#[command(name = "pagemapper", version, about)]
struct Cli {
    /// URL to navigate to.
    url: String,

    /// Session id to use for debug-dump grouping (defaults to a random id).
    #[arg(long, env = "PAGE_MAP_SESSION_ID")]
    session_id: Option<String>,

    /// Also print a screenshot's base64 length instead of the image data.
    #[arg(long)]
    screenshot: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let session_id = cli
        .session_id
        .unwrap_or_else(|| format!("cli-{}", std::process::id()));

    let tool = BrowserTool::new(session_id);
    let ctx = JobContext::new("cli");

    let nav_params = serde_json::json!({ "action": "navigate", "url": cli.url });
    let output = tool
        .execute(nav_params, &ctx)
        .await
        .context("navigation failed")?;

    println!("{}", serde_json::to_string_pretty(&output.content)?);

    if cli.screenshot {
        let shot_params = serde_json::json!({ "action": "screenshot" });
        let shot = tool
            .execute(shot_params, &ctx)
            .await
            .context("screenshot failed")?;
        if let Some(data) = shot.content.get("data").and_then(|v| v.as_str()) {
            println!("screenshot: {} base64 bytes", data.len());
        }
    }

    Ok(())
}
