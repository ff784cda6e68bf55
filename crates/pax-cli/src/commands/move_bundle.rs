//! Handler for `pax-construct move-bundle`.

use std::path::Path;

use miette::Result;

use pax_ops::ops_move::{self, MoveOptions};
use pax_util::progress;

pub fn exec(bundle: &str, target_directory: &Path) -> Result<()> {
    let summary = ops_move::move_bundle(&MoveOptions {
        base_directory: super::current_dir()?,
        bundle_name: bundle.to_string(),
        target_directory: target_directory.to_path_buf(),
    })?;

    for dir in &summary.created {
        progress::status_info("Created", &dir.display().to_string());
    }
    progress::status(
        "Moved",
        &format!("{} to {}", summary.from.display(), summary.to.display()),
    );
    Ok(())
}
