use crate::support::{load_manifest_or_exit, print_json_or_exit};
use modsynth_manifest::OneOrMany;
use serde_json::json;

pub fn run(manifest_path: String, json_output: bool) {
    let manifest = load_manifest_or_exit(&manifest_path);
    let ids = manifest.loader_ids();

    if json_output {
        let loaders: Vec<_> = manifest
            .loaders
            .iter()
            .zip(&ids)
            .map(|(decl, id)| {
                json!({
                    "id": id,
                    "matchOnly": decl.match_only.as_ref().map(OneOrMany::globs),
                    "fragmentPolicy": decl.fragment_policy,
                    "rules": decl.rules,
                })
            })
            .collect();
        let payload = json!({
            "manifest": manifest_path,
            "result": "accepted",
            "registryPolicy": manifest.registry.policy,
            "emit": manifest.emit,
            "loaders": loaders,
        });
        print_json_or_exit(&payload, "check");
        return;
    }

    println!("modsynth check {manifest_path}");
    println!("  Registry policy: {:?}", manifest.registry.policy);
    println!("  Loaders: {}", manifest.loaders.len());
    for (decl, id) in manifest.loaders.iter().zip(&ids) {
        println!("  - {id}");
        if let Some(match_only) = &decl.match_only {
            println!("      match_only: {}", match_only.globs().join(", "));
        }
        for rule in &decl.rules {
            println!(
                "      {} -> {:?} ({} fragment(s))",
                rule.pattern,
                rule.action,
                rule.fragments.len()
            );
        }
    }
}
