//! Applies a hook patch to a listing.
//!
//! The patch comes from a built-in preset or a JSON `PatchConfig`; member names go through an
//! optional mapping table first, read from JSON or from MCP `methods.csv`/`fields.csv` exports. The patched listing is printed (or written to
//! `--output`) with the inserted records highlighted, and `--emit` writes the outcome as JSON.

use crate::commands::CliError;
use async_trait::async_trait;
use clap::Args;
use graft_core::listing::{header_line, record_indent};
use graft_core::{InsnId, MethodBody};
use graft_transform::hook_patch::{PatchConfig, PatchOutcome};
use graft_transform::presets;
use graft_transform::resolver::{IdentityResolver, MappingTable};
use owo_colors::OwoColorize;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Arguments for the `patch` subcommand.
#[derive(Args)]
pub struct PatchArgs {
    /// Listing file holding the target method.
    pub listing: PathBuf,
    /// Name of a built-in patch (e.g. elytra_start_server_flight).
    #[arg(long, conflicts_with = "config")]
    pub preset: Option<String>,
    /// Path to a JSON patch definition.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Path to a JSON name mapping table (`{"methods": {..}, "fields": {..}}`).
    #[arg(long, conflicts_with_all = ["methods_csv", "fields_csv"])]
    pub mappings: Option<PathBuf>,
    /// MCP `methods.csv` export (`searge,name,side,desc`).
    #[arg(long)]
    pub methods_csv: Option<PathBuf>,
    /// MCP `fields.csv` export (`searge,name,side,desc`).
    #[arg(long)]
    pub fields_csv: Option<PathBuf>,
    /// Write the resulting listing here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Path to emit the patch outcome as JSON.
    #[arg(long)]
    pub emit: Option<PathBuf>,
}

/// Executes the `patch` subcommand.
#[async_trait]
impl super::Command for PatchArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let PatchArgs {
            listing,
            preset,
            config,
            mappings,
            methods_csv,
            fields_csv,
            output,
            emit,
        } = self;

        let config = match (preset, config) {
            (Some(name), None) => presets::by_name(&name).map_err(CliError::from)?,
            (None, Some(path)) => {
                PatchConfig::from_json(&super::read_text(&path).await?).map_err(CliError::from)?
            }
            _ => return Err(CliError::PatchSource.into()),
        };

        let json = read_optional(mappings.as_deref()).await?;
        let methods = read_optional(methods_csv.as_deref()).await?;
        let fields = read_optional(fields_csv.as_deref()).await?;
        let table = mapping_table(json.as_deref(), methods.as_deref(), fields.as_deref())?;
        let patch = match &table {
            Some(table) => config.resolve(table),
            None => config.resolve(&IdentityResolver),
        }
        .map_err(CliError::from)?;

        let mut method = super::load_listing(&listing).await?;
        let outcome = patch.run(&mut method).map_err(CliError::from)?;

        if let Some(path) = output.as_ref() {
            super::write_text(path, &method.to_string()).await?;
            println!("Wrote patched listing to {}", path.display());
        } else {
            print!("{}", highlight(&method, &outcome));
        }

        if let Some(path) = emit.as_ref() {
            let report = serde_json::to_string_pretty(&outcome).map_err(CliError::from)?;
            super::write_text(path, &report).await?;
            println!("Wrote patch report to {}", path.display());
        }

        if outcome.applied {
            println!("{}", outcome.message.green());
        } else {
            println!("{}", outcome.message.yellow());
        }
        Ok(())
    }
}

async fn read_optional(path: Option<&Path>) -> Result<Option<String>, CliError> {
    match path {
        Some(path) => Ok(Some(super::read_text(path).await?)),
        None => Ok(None),
    }
}

/// Builds the mapping table from a JSON table or from CSV exports; a missing CSV side maps
/// nothing.
fn mapping_table(
    json: Option<&str>,
    methods_csv: Option<&str>,
    fields_csv: Option<&str>,
) -> Result<Option<MappingTable>, CliError> {
    let table = match (json, methods_csv, fields_csv) {
        (Some(json), _, _) => MappingTable::from_json(json)?,
        (None, None, None) => return Ok(None),
        (None, methods, fields) => {
            MappingTable::from_csv(methods.unwrap_or_default(), fields.unwrap_or_default())?
        }
    };
    Ok(Some(table))
}

/// Listing text with the inserted records marked.
fn highlight(method: &MethodBody, outcome: &PatchOutcome) -> String {
    let inserted: HashSet<InsnId> = outcome
        .report
        .as_ref()
        .map(|report| report.inserted.iter().copied().collect())
        .unwrap_or_default();

    let mut out = header_line(method);
    out.push('\n');
    for (id, insn) in method.instructions.iter() {
        let indent = record_indent(insn);
        if inserted.contains(&id) {
            out.push_str(&format!("{}{} {}\n", indent, insn.bold(), "# +".dimmed()));
        } else {
            out.push_str(&format!("{indent}{insn}\n"));
        }
    }
    out
}
