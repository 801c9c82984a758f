use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warehouse_core::{generate_report, DeviceRecord, ReportFormat};
use warehouse_parser::{assign_tokens, parse_user_info, FieldSlot};

#[derive(Parser, Debug)]
#[command(author, version, about = "Warehouse administrative tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how a user info string splits into device fields
    ParseUserInfo(ParseUserInfoArgs),
    /// Render a report from a JSON array of device records
    RenderReport(RenderReportArgs),
}

#[derive(Args, Debug)]
struct ParseUserInfoArgs {
    /// Pipe-delimited user info text
    text: String,
}

#[derive(Args, Debug)]
struct RenderReportArgs {
    /// Report kind slug (label-carton, device-label, asset-import)
    #[arg(long)]
    kind: String,
    /// Output format (csv or xlsx)
    #[arg(long, default_value = "xlsx")]
    format: String,
    /// JSON file holding the device records
    #[arg(long)]
    input: PathBuf,
    /// Where to write the report; defaults to the report's own file name
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ParseUserInfo(args) => handle_parse_user_info(args),
        Command::RenderReport(args) => handle_render_report(args),
    }
}

fn handle_parse_user_info(args: ParseUserInfoArgs) -> Result<()> {
    let assignments = assign_tokens(args.text.as_str());

    let mut tokens = Table::new();
    tokens.set_header(vec!["token", "field"]);
    for assignment in &assignments {
        let field = assignment
            .slot
            .map(|slot| slot.to_string())
            .unwrap_or_else(|| "(dropped)".to_string());
        tokens.add_row(vec![assignment.token.clone(), field]);
    }
    println!("{tokens}");

    let parsed = parse_user_info(args.text.as_str());
    let mut fields = Table::new();
    fields.set_header(vec!["field", "value"]);
    for slot in FieldSlot::ALL {
        fields.add_row(vec![
            slot.to_string(),
            parsed.get(slot).unwrap_or_default().to_string(),
        ]);
    }
    println!("{fields}");

    Ok(())
}

fn handle_render_report(args: RenderReportArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let records: Vec<DeviceRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of devices", args.input.display()))?;

    let format = ReportFormat::from_query(Some(args.format.as_str()));
    let output = generate_report(&args.kind, format, &records)?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&output.filename));
    fs::write(&path, &output.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(
        kind = %args.kind,
        records = records.len(),
        path = %path.display(),
        "report written"
    );
    println!("Wrote {} ({} bytes)", path.display(), output.bytes.len());
    Ok(())
}
