//! Runs the call-site matcher against a listing.

use async_trait::async_trait;
use clap::{Args, ValueEnum};
use graft_core::DispatchKind;
use graft_transform::matcher::{CallMatch, CallSiteDescriptor, find_first_call, find_first_call_before};
use std::error::Error;
use std::path::PathBuf;

/// Arguments for the `find` subcommand.
#[derive(Args)]
pub struct FindArgs {
    /// Listing file to search.
    pub listing: PathBuf,
    /// Internal name of the class declaring the called method.
    #[arg(long)]
    pub owner: String,
    /// Name of the called method.
    #[arg(long)]
    pub name: String,
    /// Method descriptor, e.g. `(Lnet/minecraft/item/ItemStack;)Z`.
    #[arg(long)]
    pub desc: String,
    /// Dispatch kind of the call instruction.
    #[arg(long, value_enum, ignore_case = true, default_value_t = KindArg::Virtual)]
    pub kind: KindArg,
    /// Only consider calls strictly before this position and report the nearest one.
    #[arg(long)]
    pub before: Option<usize>,
}

/// Executes the `find` subcommand.
#[async_trait]
impl super::Command for FindArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let method = super::load_listing(&self.listing).await?;
        let descriptor =
            CallSiteDescriptor::new(self.kind.into(), self.owner, self.name, self.desc);

        let found = match self.before {
            Some(bound) => find_first_call_before(&method, &descriptor, bound),
            None => find_first_call(&method, &descriptor),
        };

        match found {
            Some(CallMatch {
                id,
                position,
                context,
            }) => {
                let depth = context
                    .stack_depth()
                    .map_or_else(|| "unknown".to_string(), |d| d.to_string());
                println!("found {descriptor} at position {position} ({id}), stack depth {depth}");
            }
            None => println!("no call to {descriptor}"),
        }
        Ok(())
    }
}

/// Command-line spelling of [`DispatchKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Static,
    Virtual,
    Special,
    Interface,
}

impl From<KindArg> for DispatchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Static => DispatchKind::Static,
            KindArg::Virtual => DispatchKind::Virtual,
            KindArg::Special => DispatchKind::Special,
            KindArg::Interface => DispatchKind::Interface,
        }
    }
}
