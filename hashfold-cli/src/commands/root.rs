//! Root command handler

use crate::records::read_records;
use anyhow::{Context, Result};
use colored::Colorize;
use hashfold_merkle::{build_leaves, build_tree, HashValue, MerkleTree};
use std::path::Path;
use tracing::info;

pub fn handle(file: &Path, show_layers: bool) -> Result<HashValue> {
    println!("{} Hashing records from {}", "→".cyan().bold(), file.display().to_string().cyan());

    let records = read_records(file)?;
    let leaves = build_leaves(&records);
    println!("  Records: {}", leaves.len().to_string().cyan());

    let root = if show_layers {
        let tree = MerkleTree::build(&leaves)
            .with_context(|| format!("No records found in {}", file.display()))?;

        for (height, layer) in tree.layers().enumerate() {
            println!();
            println!("  {} {} ({} nodes)", "Layer".bold(), height, layer.len());
            for (i, node) in layer.iter().enumerate() {
                let marker = if node.is_self_paired() { " (self-paired)".dimmed() } else { "".normal() };
                println!("    {:>6}  {}{}", i, node.digest(), marker);
            }
        }
        println!();
        tree.root()
    } else {
        build_tree(&leaves).with_context(|| format!("No records found in {}", file.display()))?
    };

    info!(records = leaves.len(), root = %root, "Computed merkle root");
    println!("{} Root: {}", "✓".green().bold(), root.to_string().green());
    Ok(root)
}
