//! Command line front-end for graft: decode listings, locate call sites and apply hook patches.

pub mod commands;
