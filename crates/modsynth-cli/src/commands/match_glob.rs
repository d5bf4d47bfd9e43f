use crate::support::{EXIT_INPUT_ERROR, print_json_or_exit};
use modsynth_kernel::{Pattern, canonicalize};
use serde_json::json;

pub fn run(pattern: String, names: Vec<String>, json_output: bool) {
    let compiled = Pattern::compile(&pattern).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_INPUT_ERROR);
    });

    let rows: Vec<(String, String, Option<Vec<String>>)> = names
        .into_iter()
        .map(|input| {
            let name = canonicalize(&input);
            let captures = compiled.captures(&name);
            (input, name, captures)
        })
        .collect();

    if json_output {
        let results: Vec<_> = rows
            .iter()
            .map(|(input, name, captures)| {
                json!({
                    "input": input,
                    "name": name,
                    "matched": captures.is_some(),
                    "captures": captures,
                })
            })
            .collect();
        let payload = json!({
            "pattern": compiled.source(),
            "wildcards": compiled.wildcard_count(),
            "results": results,
        });
        print_json_or_exit(&payload, "match");
        return;
    }

    println!("modsynth match {}", compiled.source());
    for (_, name, captures) in &rows {
        match captures {
            Some(captures) if captures.is_empty() => println!("  {name}: match"),
            Some(captures) => println!("  {name}: match [{}]", captures.join(", ")),
            None => println!("  {name}: no match"),
        }
    }
}
