//! # reach
//!
//! Command-line front end for the REACH client. `append` enriches a batch of
//! records read from a file or stdin; `listgen` streams a generated list.
//! Both print NDJSON to stdout. Diagnostics go to stderr.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use lib_reach::loggers::init_tracing;
use lib_reach::{AppendTool, InputRecord, ListgenTool, ReachClient, ReachOptions};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Query the Versium REACH API from the command line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// REACH API key.
    #[arg(long, env = "REACH_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API host, for testing against a local server.
    #[arg(long, env = "REACH_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Requests started per second (also the chunk size).
    #[arg(long, global = true)]
    qps: Option<usize>,

    /// Per-attempt timeout in milliseconds; 0 disables it.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Total attempts per record.
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Print chunk progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fallback log level when RUST_LOG is unset.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append data to a batch of input records.
    Append {
        /// Append endpoint, e.g. contact, demographic, c2b.
        #[arg(short, long)]
        tool: AppendTool,

        /// Output type to request; repeat for several.
        #[arg(short, long = "output")]
        outputs: Vec<String>,

        /// JSON array or NDJSON of input records. Reads stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Stream a generated list.
    Listgen {
        /// Listgen endpoint.
        #[arg(short, long, default_value = "abm")]
        tool: ListgenTool,

        /// The input record as a JSON object.
        #[arg(long)]
        input_json: String,

        /// Output type to request; repeat for several.
        #[arg(short, long = "output")]
        outputs: Vec<String>,
    },
}

impl GlobalArgs {
    fn options(&self) -> Result<ReachOptions> {
        let Some(api_key) = self.api_key.clone() else {
            bail!("an API key is required: pass --api-key or set REACH_API_KEY");
        };

        let mut options = ReachOptions::new(api_key).verbose(self.verbose);
        if let Some(base_url) = &self.base_url {
            options = options.base_url(base_url.clone());
        }
        if let Some(qps) = self.qps {
            options = options.requests_per_second(qps);
        }
        if let Some(ms) = self.timeout_ms {
            options = options.timeout((ms > 0).then(|| Duration::from_millis(ms)));
        }
        if let Some(retries) = self.retries {
            options = options.max_retries(retries);
        }
        if self.verbose {
            options = options.with_logging_function(Arc::new(|parts: &[String]| {
                eprintln!("REACH: {}", parts.join(" "));
            }));
        }
        options.validate()?;
        Ok(options)
    }
}

/// Accepts either a JSON array of records or one record per line.
fn parse_inputs(text: &str) -> Result<Vec<InputRecord>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("input is not a JSON array of records");
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| serde_json::from_str(line).with_context(|| format!("input line {} is not a JSON object", n + 1)))
        .collect()
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("reading stdin")?;
            Ok(text)
        }
    }
}

async fn run_append(
    client: &ReachClient,
    tool: AppendTool,
    outputs: &[String],
    input: Option<&PathBuf>,
) -> Result<()> {
    let inputs = parse_inputs(&read_input(input)?)?;
    info!(tool = %tool, records = inputs.len(), "starting append");

    let mut stdout = io::stdout().lock();
    let mut batches = pin!(client.append(tool.as_str(), inputs, outputs));
    while let Some(chunk) = batches.next().await {
        for response in chunk? {
            let line = json!({
                "success": response.success,
                "httpStatus": response.http_status,
                "matchFound": response.match_found,
                "inputs": response.inputs,
                "body": response.body,
            });
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
    }
    Ok(())
}

async fn run_listgen(client: &ReachClient, tool: ListgenTool, input_json: &str, outputs: &[String]) -> Result<()> {
    let inputs: InputRecord = serde_json::from_str(input_json).context("--input-json must be a JSON object")?;
    let response = client.listgen(tool.as_str(), inputs, outputs).await?;
    if !response.success {
        bail!("listgen request failed with HTTP status {}", response.http_status);
    }

    let mut stdout = io::stdout().lock();
    let mut records = response.records::<Value>();
    let mut count = 0usize;
    while let Some(record) = records.next().await {
        writeln!(stdout, "{}", record?)?;
        count += 1;
    }
    stdout.flush()?;
    debug!(records = count, "listgen finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level);

    let client = ReachClient::new(cli.global.options()?)?;

    match &cli.command {
        Command::Append { tool, outputs, input } => run_append(&client, *tool, outputs, input.as_ref()).await,
        Command::Listgen {
            tool,
            input_json,
            outputs,
        } => run_listgen(&client, *tool, input_json, outputs).await,
    }
}
