//! # REACH Live Sweep
//!
//! Runs every append tool against the real API with a few hundred queries,
//! then one `abm` listgen call. Needs `REACH_API_KEY` (or a `.env` file) and
//! network access, so it is a binary rather than part of `cargo test`.
//!
//! ```text
//! cargo run -p project_tests --bin test_reach_live
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use futures_util::StreamExt;
use lib_reach::loggers::init_tracing;
use lib_reach::{AppendTool, InputRecord, ListgenRecord, ReachClient, ReachOptions, input_record};
use tokio::time::Instant;
use tracing::info;

struct Case {
    tool: AppendTool,
    outputs: &'static [&'static str],
    record: InputRecord,
    count: usize,
}

fn cases() -> Vec<Case> {
    let john = || input_record([("first", "John"), ("last", "Doe"), ("email", "doejohn@hotmail.com")]);
    let jdoe = || input_record([("first", "John"), ("last", "Doe"), ("email", "jdoe@versium.com")]);

    vec![
        Case { tool: AppendTool::C2b, outputs: &[], record: john(), count: 135 },
        Case { tool: AppendTool::IpToDomain, outputs: &[], record: input_record([("ip", "152.44.212.248")]), count: 97 },
        Case {
            tool: AppendTool::Contact,
            outputs: &["address", "phone"],
            record: input_record([("email", "doejohn@hotmail.com")]),
            count: 111,
        },
        Case {
            tool: AppendTool::Demographic,
            outputs: &["lifestyle", "political"],
            record: input_record([("email", "doejohn@hotmail.com")]),
            count: 88,
        },
        Case { tool: AppendTool::B2cOnlineAudience, outputs: &[], record: jdoe(), count: 95 },
        Case { tool: AppendTool::B2bOnlineAudience, outputs: &[], record: jdoe(), count: 147 },
        Case {
            tool: AppendTool::Firmographic,
            outputs: &[],
            record: input_record([("email", "jdoe@versium.com")]),
            count: 5,
        },
        Case {
            tool: AppendTool::HemToBusinessDomain,
            outputs: &[],
            record: input_record([("email", "ba593b9e33bae27a032c79ac24ab38e4")]),
            count: 7,
        },
    ]
}

async fn appends(client: &ReachClient) -> Result<()> {
    for case in cases() {
        let inputs = vec![case.record.clone(); case.count];
        let outputs: Vec<String> = case.outputs.iter().map(|s| s.to_string()).collect();

        let start = Instant::now();
        let responses = client.append_all(case.tool.as_str(), inputs, &outputs).await?;
        let elapsed = start.elapsed();

        ensure!(responses.len() == case.count, "{}: got {} responses", case.tool, responses.len());
        ensure!(responses[0].inputs == case.record, "{}: inputs not echoed", case.tool);
        if let Some(bad) = responses.iter().find(|r| r.http_status != 200) {
            anyhow::bail!("{}: non-200 response {}: {}", case.tool, bad.http_status, bad.body_raw);
        }

        println!("✅ Test '{}' successful! {} queries in {}ms", case.tool, case.count, elapsed.as_millis());
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Ok(())
}

async fn listgen(client: &ReachClient) -> Result<()> {
    let start = Instant::now();
    let mut domain = InputRecord::new();
    domain.insert("domain".into(), vec!["versium.com".to_string()].into());

    let response = client.listgen("abm", domain, &["abm_email".to_string()]).await?;
    ensure!(response.success, "listgen returned HTTP {}", response.http_status);

    let mut records = response.records::<ListgenRecord>();
    let mut count = 0usize;
    while let Some(record) = records.next().await {
        let record = record.context("decoding listgen record")?;
        ensure!(!record.contact_fields.is_empty(), "record without contact_fields");
        count += 1;
    }

    println!("✅ Test 'abm' successful! {count} records in {}ms", start.elapsed().as_millis());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let options = ReachOptions::from_env()?.with_logging_function(Arc::new(|parts: &[String]| {
        println!("CLIENT LOG: {}", parts.join(" "));
    }));
    let client = ReachClient::new(options)?;
    info!("--- Starting REACH live tests ---");

    appends(&client).await?;
    listgen(&client).await?;

    println!("--- All REACH live tests passed ---");
    Ok(())
}
