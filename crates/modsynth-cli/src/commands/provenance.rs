use crate::support::{EXIT_GENERATION_ERROR, install_manifest_or_exit, print_json_or_exit};
use modsynth_kernel::canonicalize;
use serde_json::json;

pub fn run(manifest_path: String, requests: Vec<String>, json_output: bool) {
    let installed = install_manifest_or_exit(&manifest_path);

    let mut failed = false;
    for request in &requests {
        if let Err(err) = installed.host.resolve(request) {
            failed = true;
            eprintln!("error: {err}");
        }
    }

    let rows: Vec<_> = requests
        .iter()
        .map(|request| {
            let name = canonicalize(request);
            let loader = installed.registry.generated_by(&name);
            (request, name, loader)
        })
        .collect();

    if json_output {
        let queried: Vec<_> = rows
            .iter()
            .map(|(request, name, loader)| {
                json!({
                    "request": request,
                    "name": name,
                    "generated": loader.is_some(),
                    "generatedBy": loader,
                })
            })
            .collect();
        let payload = json!({
            "manifest": manifest_path,
            "registryPolicy": installed.registry.policy(),
            "requests": queried,
            "records": installed.registry.snapshot(),
        });
        print_json_or_exit(&payload, "provenance");
    } else {
        println!("modsynth provenance");
        for (_, name, loader) in &rows {
            match loader {
                Some(loader) => println!("  {name}: generated by {loader}"),
                None => println!("  {name}: not generated"),
            }
        }
        for loader in &installed.loaders {
            let names = loader.generated();
            if !names.is_empty() {
                println!("  Loader {}: {}", loader.id(), names.join(", "));
            }
        }
    }

    if failed {
        std::process::exit(EXIT_GENERATION_ERROR);
    }
}
