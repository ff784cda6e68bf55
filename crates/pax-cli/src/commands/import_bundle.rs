//! Handler for `pax-construct import-bundle`.

use miette::Result;

use pax_core::config::GlobalConfig;
use pax_core::coordinate::Coordinate;
use pax_maven::bundle::OsgiBundleClassifier;
use pax_maven::cache::LocalRepository;
use pax_maven::document::RecordOutcome;
use pax_maven::source::RepositorySource;
use pax_ops::ops_import::{self, ImportOptions};
use pax_resolver::ResolveOptions;
use pax_util::errors::PaxError;
use pax_util::progress;

use crate::cli::ImportArgs;

pub fn exec(args: ImportArgs) -> Result<()> {
    let cwd = super::current_dir()?;
    let config = GlobalConfig::load()?;

    let root = Coordinate::parse(&args.coordinate).ok_or_else(|| PaxError::Generic {
        message: format!(
            "Invalid coordinate '{}', expected group:artifact:version",
            args.coordinate
        ),
    })?;

    let source = if args.offline {
        RepositorySource::offline(LocalRepository::new(config.local_repository_path()))
    } else {
        RepositorySource::from_config(&config)?
    };

    let opts = ImportOptions {
        root,
        provision_id: args
            .provision_id
            .unwrap_or_else(|| config.provision.provision_id.clone()),
        target_directory: cwd.join(&args.target_directory),
        resolve: ResolveOptions {
            exclude_transitive: args.exclude_transitive,
            widen_scope: args.widen_scope,
            test_metadata: args.test_metadata,
        },
        deploy: args.deploy,
        overwrite: args.overwrite,
    };

    let spinner = progress::spinner(&format!("Resolving {}", opts.root));
    let summary = ops_import::import_bundle(&opts, &source, &OsgiBundleClassifier);
    spinner.finish_and_clear();
    let summary = summary?;

    for warning in &summary.warnings {
        progress::status_warn("Warning", warning);
    }
    for record in &summary.records {
        let label = match (record.provision, record.current) {
            (Some(RecordOutcome::Added), _) | (_, Some(RecordOutcome::Added)) => "Imported",
            (Some(RecordOutcome::Replaced), _) | (_, Some(RecordOutcome::Replaced)) => "Updated",
            _ => "Unchanged",
        };
        progress::status(label, &format!("{} ({})", record.action.name, record.action.coordinate));
    }
    if summary.records.is_empty() {
        progress::status_warn("Import", "No bundles found");
    }
    progress::status_info(
        "Resolved",
        &format!("{} artifact(s) from {}", summary.resolved, opts.root),
    );
    Ok(())
}
