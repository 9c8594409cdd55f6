//! Signing key persistence: the raw 32-byte Ed25519 seed, nothing else.

use anyhow::{bail, Context, Result};
use powchain_core::auth::Keypair;
use std::fs;
use std::path::Path;

/// Save (overwrite) the key seed to `path`, creating parent directories.
pub fn save_key(path: &Path, keys: &Keypair) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, keys.seed()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_key(path: &Path) -> Result<Keypair> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let seed: [u8; 32] = match bytes.try_into() {
        Ok(seed) => seed,
        Err(bytes) => bail!(
            "{} holds {} bytes, expected a 32-byte seed",
            path.display(),
            bytes.len()
        ),
    };
    Ok(Keypair::from_seed(&seed))
}
