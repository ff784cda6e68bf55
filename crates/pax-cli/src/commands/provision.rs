//! Handler for `pax-construct provision`.

use miette::Result;

use pax_core::config::GlobalConfig;
use pax_ops::ops_provision::{self, ExternalRunner, ProvisionOptions};
use pax_util::progress;

use crate::cli::ProvisionArgs;

pub fn exec(args: ProvisionArgs) -> Result<()> {
    let cwd = super::current_dir()?;
    let config = GlobalConfig::load()?;

    let opts = ProvisionOptions {
        base_directory: cwd.clone(),
        framework: args
            .framework
            .unwrap_or_else(|| config.provision.framework.clone()),
        deploy: args.deploy,
        deploy_poms: args.deploy_poms.iter().map(|p| cwd.join(p)).collect(),
        runner_version: args.runner.unwrap_or_else(|| config.provision.runner.clone()),
        local_repository: config.local_repository_path(),
        remote_urls: config
            .remote_repositories()
            .into_iter()
            .map(|(_, url)| url)
            .collect(),
    };
    let runner = ExternalRunner::new(config.provision.runner_command.clone()).in_dir(&cwd);

    let outcome = ops_provision::provision(&opts, &runner)?;

    for bundle in &outcome.bundles {
        progress::status_info("Bundle", &bundle.to_string());
    }
    progress::status(
        "Provisioned",
        &format!(
            "{} bundle(s) in {}",
            outcome.bundles.len(),
            outcome.deployment_pom.display()
        ),
    );
    progress::status_info("Installed", &outcome.installed.display().to_string());
    Ok(())
}
