//! Proof command handler

use crate::records::read_records;
use anyhow::{Context, Result};
use colored::Colorize;
use hashfold_merkle::{MerkleProof, MerkleTree, Side};
use std::path::Path;
use tracing::info;

pub fn handle(file: &Path, index: usize, json: bool, out: Option<&Path>) -> Result<MerkleProof> {
    let records = read_records(file)?;
    let tree = MerkleTree::from_records(&records)
        .with_context(|| format!("No records found in {}", file.display()))?;
    let proof = tree.proof(index)?;

    info!(index, depth = proof.depth(), root = %tree.root(), "Extracted inclusion proof");

    if let Some(path) = out {
        let data = serde_json::to_string_pretty(&proof)?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write proof file {}", path.display()))?;
        println!("{} Proof written to {}", "✓".green().bold(), path.display().to_string().cyan());
        println!("  Root: {}", tree.root().to_string().cyan());
        return Ok(proof);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&proof)?);
        return Ok(proof);
    }

    println!("{} Inclusion proof", "✓".green().bold());
    println!("  Record:  {}", String::from_utf8_lossy(&records[index]).cyan());
    println!("  Index:   {} of {}", index.to_string().cyan(), proof.leaf_count);
    println!("  Leaf:    {}", leaf_hex(&tree, index).cyan());
    println!("  Root:    {}", tree.root().to_string().cyan());
    println!();
    println!("  {:<6} {:<6} {}", "STEP".bold(), "SIDE".bold(), "SIBLING".bold());
    println!("  {}", "-".repeat(78));
    for (i, step) in proof.steps.iter().enumerate() {
        let side = match step.side {
            Side::Left => "left",
            Side::Right => "right",
        };
        println!("  {:<6} {:<6} {}", i, side, step.sibling);
    }
    Ok(proof)
}

fn leaf_hex(tree: &MerkleTree, index: usize) -> String {
    tree.leaf(index)
        .map(|leaf| leaf.digest().to_hex())
        .unwrap_or_default()
}
