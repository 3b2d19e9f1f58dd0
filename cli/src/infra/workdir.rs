//! Working copies of Terraform folders.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::domain::stage::StageSkips;

/// Copy `root` into a fresh temporary directory and return the copy of
/// `root/module`.
///
/// The whole root is copied so relative module sources such as
/// `../modules/web` still resolve from the working copy. Local Terraform state (`.terraform/`, `*.tfstate*`) and hidden files are
/// left behind so every run starts clean. When any stage is skipped the
/// original folder is returned instead, so state persists between separate
/// invocations.
///
/// # Errors
///
/// Returns an error if the folder does not exist or cannot be copied.
pub fn copy_terraform_folder_to_temp(
    root: &Path,
    module: &str,
    skips: &StageSkips,
) -> Result<PathBuf> {
    let source = root.join(module);
    if !source.is_dir() {
        bail!("terraform folder {} does not exist", source.display());
    }
    if skips.any() {
        info!(dir = %source.display(), "stage skips set, using terraform folder in place");
        return Ok(source);
    }

    let temp = tempfile::Builder::new()
        .prefix("tfcheck-")
        .tempdir()
        .context("creating temporary directory")?
        .keep();
    copy_dir(root, &temp)?;
    let dest = temp.join(module);
    info!(from = %source.display(), to = %dest.display(), "copied terraform folder");
    Ok(dest)
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).with_context(|| format!("creating {}", to.display()))?;
    let entries = std::fs::read_dir(from).with_context(|| format!("reading {}", from.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", from.display()))?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if should_skip(&name_str) {
            continue;
        }
        let path = entry.path();
        let target = to.join(&name);
        if entry.file_type()?.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            std::fs::copy(&path, &target).with_context(|| {
                format!("copying {} to {}", path.display(), target.display())
            })?;
        }
    }
    Ok(())
}

fn should_skip(name: &str) -> bool {
    if name == ".terraform-version" {
        return false;
    }
    name.starts_with('.')
        || name.ends_with(".tfstate")
        || name.ends_with(".tfstate.backup")
        || name == "terraform.tfstate.d"
}
