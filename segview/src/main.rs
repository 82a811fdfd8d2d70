use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use log::{info, warn};
use tokio::io::AsyncBufReadExt;

use segview::cmd::{Cmd, SubCmd};
use segview::graph::build_graph;
use segview::ingest::Ingest;
use segview_common::Protocol;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cmd::parse();
    env_logger::Builder::new()
        .parse_filters(&cmd.verbose)
        .init();

    match &cmd.sub_cmd {
        SubCmd::Check(input) => run_check(&input.input_files).await,
        SubCmd::Print(input) => run_print(&input.input_files).await,
        SubCmd::Graph(graph) => run_graph(&graph.input.input_files, graph.out.as_deref()).await,
    }
}

async fn run_check(files: &[String]) -> Result<()> {
    let mut rejected = 0;
    for path in files {
        let ingest = ingest_file(path).await?;
        report_rejected(path, &ingest);
        info!(
            "{}: {} valid, {} rejected, {} lines",
            path,
            ingest.records().len(),
            ingest.rejected().len(),
            ingest.lines()
        );
        rejected += ingest.rejected().len();
    }

    if rejected != 0 {
        return Err(anyhow!("{} packet records failed validation", rejected));
    }
    Ok(())
}

async fn run_print(files: &[String]) -> Result<()> {
    for path in files {
        let ingest = ingest_file(path).await?;
        report_rejected(path, &ingest);
        for pkt in ingest.records() {
            let pkt_line = format!("{pkt}");
            let output = match pkt.protocol {
                Protocol::Tcp => pkt_line.bright_green(),
                Protocol::Udp => pkt_line.bright_yellow(),
            };
            println!("{output}");
        }
    }
    Ok(())
}

async fn run_graph(files: &[String], out: Option<&str>) -> Result<()> {
    let mut records = Vec::new();
    for path in files {
        let ingest = ingest_file(path).await?;
        report_rejected(path, &ingest);
        records.extend(ingest.into_records());
    }

    let graph = build_graph(&records);
    let json = serde_json::to_string_pretty(&graph)?;
    match out {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .map_err(|e| anyhow!("failed to write graph data to '{}' by {}", path, e))?;
            info!(
                "wrote {} nodes and {} links to {}",
                graph.nodes.len(),
                graph.links.len(),
                path
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn ingest_file(path: &str) -> Result<Ingest> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| anyhow!("failed to open '{}' by {}", path, e))?;
    let mut lines = tokio::io::BufReader::new(file).lines();

    let mut ingest = Ingest::new();
    while let Some(line) = lines.next_line().await? {
        ingest.push_line(&line);
    }
    Ok(ingest)
}

fn report_rejected(path: &str, ingest: &Ingest) {
    for line in ingest.rejected() {
        warn!("{}:{}: {}", path, line.line, line.reason);
    }
}
