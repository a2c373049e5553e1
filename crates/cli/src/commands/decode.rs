//! Parses a listing and prints every record with its position, optionally together with the
//! operand stack depth and assigned local slots before it.

use async_trait::async_trait;
use clap::Args;
use graft_core::frame::LocalContext;
use graft_core::InstructionSequence;
use graft_core::listing::record_indent;
use std::error::Error;
use std::path::PathBuf;

/// Arguments for the `decode` subcommand.
#[derive(Args)]
pub struct DecodeArgs {
    /// Listing file to decode.
    pub listing: PathBuf,
    /// Also print stack depth and assigned slots before each record.
    #[arg(long)]
    pub context: bool,
}

/// Executes the `decode` subcommand to print a listing.
#[async_trait]
impl super::Command for DecodeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let method = super::load_listing(&self.listing).await?;
        println!(
            "{}.{} {}{}",
            method.owner,
            method.name,
            method.descriptor(),
            if method.is_static { " static" } else { "" }
        );

        let contexts = self.context.then(|| LocalContext::all(&method));
        for line in render(&method.instructions, contexts.as_deref()) {
            println!("{line}");
        }
        Ok(())
    }
}

fn render(sequence: &InstructionSequence, contexts: Option<&[LocalContext]>) -> Vec<String> {
    sequence
        .iter()
        .enumerate()
        .map(|(pos, (_, insn))| {
            let record = format!("{pos:>5}  {}{insn}", record_indent(insn));
            match contexts.and_then(|all| all.get(pos)) {
                Some(ctx) => {
                    let depth = ctx
                        .stack_depth()
                        .map_or_else(|| "?".to_string(), |d| d.to_string());
                    let slots: Vec<String> =
                        ctx.assigned_slots().map(|s| s.to_string()).collect();
                    format!("{record:<72} ; stack={depth} locals=[{}]", slots.join(","))
                }
                None => record,
            }
        })
        .collect()
}
