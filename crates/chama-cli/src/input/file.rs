use chama_core::LendingPolicy;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    tracing::debug!(path = %canonical.display(), "read input file");
    Ok(value)
}

/// Load and validate a lending policy. `.yaml`/`.yml` files are parsed as
/// YAML, anything else as JSON. Fields the file omits keep their defaults.
pub fn read_policy(path: &Path) -> Result<LendingPolicy, Box<dyn std::error::Error>> {
    let canonical = resolve_path(&path.to_string_lossy())?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let policy: LendingPolicy = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse policy '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse policy '{}': {}", canonical.display(), e))?
    };
    policy.validate()?;

    tracing::info!(path = %canonical.display(), "loaded lending policy");
    Ok(policy)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
