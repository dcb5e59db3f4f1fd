//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::fixture::{ModuleFixture, ResultFixture};
use crate::report::{ConfigurationReport, GraphReport};
use resgraph_core::{GraphError, GraphRecorder, ResultCache, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum fixture or config file size (16 MB).
const MAX_INPUT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a whole UTF-8 input file after a size check.
fn read_input(path: &Path) -> Result<String, GraphError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(GraphError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GraphError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| GraphError::SerializationError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub store: StoreConfig,
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        toml::from_str(text)
            .map_err(|e| GraphError::DeserializationError(format!("Invalid config: {}", e)))
    }

    /// Load the config file if given, then apply flag overrides.
    pub fn load(path: Option<&Path>, spill_threshold: Option<u64>) -> Result<Self, GraphError> {
        let mut settings = match path {
            Some(path) => Self::parse(&read_input(path)?)?,
            None => Self::default(),
        };
        if let Some(threshold) = spill_threshold {
            settings.store.spill_threshold_bytes = threshold;
        }
        Ok(settings)
    }
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// Record `fixture` into a fresh store, seal it and materialize it through
/// a result cache.
pub fn replay(fixture: &ResultFixture, store: &StoreConfig) -> Result<GraphReport, GraphError> {
    let mut recorder = GraphRecorder::new(store.open_store());
    let contents = fixture.record(&mut recorder)?;
    let records = recorder.records();
    let handle = recorder.done()?;
    let on_disk = handle.is_on_disk();

    let cache = ResultCache::new(handle);
    let graph = cache.load(&contents)?;
    tracing::info!(
        records,
        on_disk,
        nodes = graph.len(),
        "fixture replayed"
    );
    Ok(GraphReport::from_graph(&graph))
}

/// Replay a result fixture file and print the materialized graph.
pub fn cmd_replay(settings: &Settings, path: &Path, json_mode: bool) -> Result<(), GraphError> {
    let fixture = ResultFixture::parse(&read_input(path)?)?;
    let report = replay(&fixture, &settings.store)?;

    if json_mode {
        return print_json(&report);
    }
    print!("{}", report.render());
    Ok(())
}

// =============================================================================
// CONFIGURATION COMMAND
// =============================================================================

/// Evaluate configuration `name` of a module fixture.
pub fn inspect_configuration(
    fixture: &ModuleFixture,
    name: &str,
) -> Result<ConfigurationReport, GraphError> {
    let metadata = fixture.metadata()?;
    let configuration = metadata.configuration(name).ok_or_else(|| {
        GraphError::DeserializationError(format!(
            "Module {} declares no configuration '{}'",
            metadata.id(),
            name
        ))
    })?;
    Ok(ConfigurationReport::from_configuration(&configuration))
}

/// Print one configuration of a module fixture file.
pub fn cmd_configuration(path: &Path, name: &str, json_mode: bool) -> Result<(), GraphError> {
    let fixture = ModuleFixture::parse(&read_input(path)?)?;
    let report = inspect_configuration(&fixture, name)?;

    if json_mode {
        return print_json(&report);
    }
    print!("{}", report.render());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
