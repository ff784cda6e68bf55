//! Handler for `pax-construct remove-bundle`.

use miette::Result;

use pax_ops::ops_remove::{self, RemoveOptions};
use pax_util::progress;

pub fn exec(bundle: &str) -> Result<()> {
    let summary = ops_remove::remove_bundle(&RemoveOptions {
        base_directory: super::current_dir()?,
        bundle_name: bundle.to_string(),
    })?;

    progress::status("Removed", &format!("{} ({})", summary.id, summary.removed.display()));
    for manifest in &summary.touched {
        progress::status_info("Updated", &manifest.display().to_string());
    }
    Ok(())
}
