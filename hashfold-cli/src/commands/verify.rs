//! Verify command handler

use anyhow::{Context, Result};
use colored::Colorize;
use hashfold_merkle::{verify_proof, HashValue, Leaf, MerkleProof};
use std::path::Path;
use tracing::{info, warn};

/// Record bytes from either `--record` (text) or `--record-hex`.
pub fn record_bytes(record: Option<&str>, record_hex: Option<&str>) -> Result<Vec<u8>> {
    match (record, record_hex) {
        (Some(text), None) => Ok(text.as_bytes().to_vec()),
        (None, Some(encoded)) => {
            let encoded = encoded.strip_prefix("0x").unwrap_or(encoded);
            hex::decode(encoded).context("Invalid --record-hex")
        }
        _ => anyhow::bail!("Pass exactly one of --record or --record-hex"),
    }
}

pub fn handle(record: &[u8], proof_file: &Path, root: &str) -> Result<()> {
    let root = HashValue::from_hex(root).context("Invalid --root")?;

    let data = std::fs::read_to_string(proof_file)
        .with_context(|| format!("Failed to read proof file {}", proof_file.display()))?;
    let proof: MerkleProof = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse proof file {}", proof_file.display()))?;

    let leaf = Leaf::from_record(record);
    println!("{} Verifying inclusion proof...", "→".cyan().bold());
    println!("  Record: {}", String::from_utf8_lossy(record).cyan());
    println!("  Index:  {} of {}", proof.leaf_index, proof.leaf_count);
    println!("  Root:   {}", root.to_string().cyan());

    if verify_proof(&leaf, &proof, &root) {
        info!(index = proof.leaf_index, root = %root, "Proof verified");
        println!("{} OK", "✓".green().bold());
        Ok(())
    } else {
        let computed = proof.compute_root(&leaf);
        warn!(expected = %root, computed = %computed, "Proof rejected");
        println!("{} Proof does not match root", "✗".red().bold());
        println!("  Computed: {}", computed.to_string().red());
        anyhow::bail!("inclusion proof rejected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{proof, root};
    use std::path::PathBuf;

    struct Fixture {
        _dir: tempfile::TempDir,
        proof_file: PathBuf,
        root: String,
    }

    /// Write `records` to a file, then run `root` and `proof --out` on it.
    fn fixture(records: &[&[u8]], index: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let record_file = dir.path().join("records.txt");
        std::fs::write(&record_file, records.join(&b'\n')).unwrap();

        let proof_file = dir.path().join("proof.json");
        let root = root::handle(&record_file, false).unwrap().to_hex();
        proof::handle(&record_file, index, true, Some(&proof_file)).unwrap();

        Fixture {
            _dir: dir,
            proof_file,
            root,
        }
    }

    const HAT: [&[u8]; 6] = [b"In", b"Pursuit", b"Of", b"His", b"Own", b"Hat"];

    #[test]
    fn test_round_trip_every_index() {
        for (index, record) in HAT.iter().enumerate() {
            let fx = fixture(&HAT, index);
            assert!(handle(record, &fx.proof_file, &fx.root).is_ok(), "index {}", index);
        }
    }

    #[test]
    fn test_wrong_record_rejected() {
        let fx = fixture(&HAT, 1);
        let err = handle(b"Hat", &fx.proof_file, &fx.root).unwrap_err();
        assert!(err.to_string().contains("inclusion proof rejected"));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let fx = fixture(&HAT, 1);
        let other = HashValue::new([0x11; 32]).to_hex();
        assert!(handle(b"Pursuit", &fx.proof_file, &other).is_err());
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let fx = fixture(&HAT, 4);
        let mut proof: MerkleProof =
            serde_json::from_str(&std::fs::read_to_string(&fx.proof_file).unwrap()).unwrap();
        let mut bytes = *proof.steps[0].sibling.as_bytes();
        bytes[0] ^= 0x80;
        proof.steps[0].sibling = HashValue::new(bytes);
        std::fs::write(&fx.proof_file, serde_json::to_string(&proof).unwrap()).unwrap();

        assert!(handle(b"Own", &fx.proof_file, &fx.root).is_err());
    }

    #[test]
    fn test_malformed_inputs() {
        let fx = fixture(&HAT, 0);
        assert!(format!("{:#}", handle(b"In", &fx.proof_file, "xyz").unwrap_err()).contains("Invalid --root"));

        std::fs::write(&fx.proof_file, "{ not json").unwrap();
        let err = handle(b"In", &fx.proof_file, &fx.root).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse proof file"));
    }

    #[test]
    fn test_non_utf8_record_by_hex() {
        let records: [&[u8]; 3] = [b"alpha", &[0xff, 0xfe, 0x00, 0x9c], b"gamma"];
        let fx = fixture(&records, 1);

        let bytes = record_bytes(None, Some("fffe009c")).unwrap();
        assert_eq!(bytes, records[1]);
        assert!(handle(&bytes, &fx.proof_file, &fx.root).is_ok());
    }

    #[test]
    fn test_record_bytes_sources() {
        assert_eq!(record_bytes(Some("Hat"), None).unwrap(), b"Hat");
        assert_eq!(record_bytes(None, Some("0x486174")).unwrap(), b"Hat");
        assert!(record_bytes(None, Some("zz")).is_err());
        assert!(record_bytes(None, None).is_err());
        assert!(record_bytes(Some("Hat"), Some("486174")).is_err());
    }
}
