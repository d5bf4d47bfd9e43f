use crate::support::{
    EXIT_GENERATION_ERROR, error_json, install_manifest_or_exit, not_handled_json,
    print_json_or_exit, unit_json,
};
use modsynth_kernel::Resolution;
use serde_json::json;
use tracing::{info, warn};

pub fn run(manifest_path: String, requests: Vec<String>, json_output: bool) {
    let installed = install_manifest_or_exit(&manifest_path);

    let mut failed = false;
    let mut results = Vec::with_capacity(requests.len());
    for request in &requests {
        match installed.host.resolve(request) {
            Ok(Resolution::Unit(unit)) => {
                info!(
                    request = %request,
                    loader = %unit.loader(),
                    digest = %unit.digest(),
                    "resolved"
                );
                if json_output {
                    results.push(unit_json(request, &unit));
                } else {
                    print!("{}", unit.source());
                }
            }
            Ok(Resolution::NotHandled) => {
                if json_output {
                    results.push(not_handled_json(request));
                } else {
                    warn!("no loader handled {request}");
                }
            }
            Err(err) => {
                failed = true;
                if json_output {
                    results.push(error_json(request, &err));
                } else {
                    eprintln!("error: {err}");
                }
            }
        }
    }

    if json_output {
        let loader_ids: Vec<&str> = installed
            .loaders
            .iter()
            .map(|loader| loader.id().as_str())
            .collect();
        let payload = json!({
            "manifest": manifest_path,
            "loaders": loader_ids,
            "results": results,
        });
        print_json_or_exit(&payload, "resolve");
    }
    if failed {
        std::process::exit(EXIT_GENERATION_ERROR);
    }
}
