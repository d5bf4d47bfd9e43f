use modsynth_kernel::{DispatchError, GeneratedUnit, HostChain, Loader, ProvenanceRegistry};
use modsynth_manifest::Manifest;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const EXIT_INPUT_ERROR: i32 = 1;
pub const EXIT_GENERATION_ERROR: i32 = 2;

/// stderr logging; `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

pub fn load_manifest_or_exit(path: &str) -> Manifest {
    Manifest::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_INPUT_ERROR);
    })
}

pub struct Installed {
    pub host: HostChain,
    pub registry: Arc<ProvenanceRegistry>,
    pub loaders: Vec<Arc<Loader>>,
}

pub fn install_manifest_or_exit(path: &str) -> Installed {
    let manifest = load_manifest_or_exit(path);
    let host = HostChain::with_cache();
    let registry = manifest.new_registry();
    let loaders = manifest.install(&host, &registry).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_INPUT_ERROR);
    });
    Installed {
        host,
        registry,
        loaders,
    }
}

pub fn print_json_or_exit<T: Serialize>(payload: &T, label: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {label} json: {err}");
        std::process::exit(EXIT_INPUT_ERROR);
    });
    println!("{rendered}");
}

pub fn unit_json(request: &str, unit: &GeneratedUnit) -> Value {
    json!({
        "request": request,
        "result": "generated",
        "name": unit.name(),
        "loader": unit.loader().as_str(),
        "pattern": unit.pattern(),
        "fragmentCount": unit.fragments().len(),
        "digest": unit.digest(),
        "source": unit.source(),
    })
}

pub fn not_handled_json(request: &str) -> Value {
    json!({
        "request": request,
        "result": "not_handled",
    })
}

pub fn error_json(request: &str, err: &DispatchError) -> Value {
    json!({
        "request": request,
        "result": "error",
        "error": err.to_string(),
    })
}
