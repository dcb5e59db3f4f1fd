//! # Reports
//!
//! Serializable views of a materialized graph and of one configuration.
//! Core types keep non-string map keys, so JSON goes through these.

use resgraph_core::{ConfigurationMetadata, DependencyMetadata, ResolutionResultGraph};
use serde::{Deserialize, Serialize};

// =============================================================================
// GRAPH REPORT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    pub root: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub first_level: Vec<FirstLevelJson>,
    pub nodes: Vec<NodeJson>,
    pub unresolved: Vec<UnresolvedJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstLevelJson {
    pub requested: String,
    pub selected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub id: String,
    pub parents: Vec<IncomingJson>,
    pub children: Vec<String>,
}

/// One incoming edge with the artifacts it contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingJson {
    pub parent: String,
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedJson {
    pub parent: String,
    pub requested: String,
    pub reason: String,
}

impl GraphReport {
    #[must_use]
    pub fn from_graph(graph: &ResolutionResultGraph) -> Self {
        let first_level = graph
            .first_level()
            .iter()
            .map(|(requested, selected)| FirstLevelJson {
                requested: requested.to_string(),
                selected: selected.to_string(),
            })
            .collect();

        let nodes = graph
            .nodes()
            .map(|node| NodeJson {
                id: node.key().to_string(),
                parents: node
                    .parents()
                    .map(|parent| IncomingJson {
                        parent: parent.to_string(),
                        artifacts: node
                            .artifacts_from(parent)
                            .map(|set| set.iter().map(ToString::to_string).collect())
                            .unwrap_or_default(),
                    })
                    .collect(),
                children: node.children().map(ToString::to_string).collect(),
            })
            .collect();

        let unresolved = graph
            .unresolved()
            .map(|(parent, result)| UnresolvedJson {
                parent: parent.to_string(),
                requested: result.requested().to_string(),
                reason: result
                    .failure()
                    .map(|failure| failure.message.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            root: graph.root_key().to_string(),
            node_count: graph.len(),
            edge_count: graph.edge_count(),
            first_level,
            nodes,
            unresolved,
        }
    }

    /// Plain-text rendering for terminals.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Resolution Result\n");
        out.push_str("=================\n");
        out.push_str(&format!("Root:  {}\n", self.root));
        out.push_str(&format!("Nodes: {}\n", self.node_count));
        out.push_str(&format!("Edges: {}\n", self.edge_count));

        if !self.first_level.is_empty() {
            out.push_str("\nFirst level:\n");
            for entry in &self.first_level {
                out.push_str(&format!("  {} -> {}\n", entry.requested, entry.selected));
            }
        }

        out.push_str("\nNodes:\n");
        for node in &self.nodes {
            out.push_str(&format!("  {}\n", node.id));
            for incoming in &node.parents {
                out.push_str(&format!("    <- {}", incoming.parent));
                if !incoming.artifacts.is_empty() {
                    out.push_str(&format!(" [{}]", incoming.artifacts.join(", ")));
                }
                out.push('\n');
            }
        }

        if !self.unresolved.is_empty() {
            out.push_str("\nUnresolved:\n");
            for entry in &self.unresolved {
                out.push_str(&format!(
                    "  {} -> {}: {}\n",
                    entry.parent, entry.requested, entry.reason
                ));
            }
        }
        out
    }
}

// =============================================================================
// CONFIGURATION REPORT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationReport {
    pub component: String,
    pub name: String,
    pub hierarchy: Vec<String>,
    pub transitive: bool,
    pub visible: bool,
    pub dependencies: Vec<DependencyJson>,
    pub excludes: Vec<ExcludeJson>,
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyJson {
    pub requested: String,
    /// Target configurations when requested from this configuration.
    pub targets: Vec<String>,
    pub transitive: bool,
    pub changing: bool,
    pub force: bool,
    pub excludes: Vec<ExcludeJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeJson {
    pub group: String,
    pub module: String,
}

/// Targets contributed by every mapped source in the hierarchy. Falls back
/// to the `*` and `%` entries when no source is named directly.
fn targets_for(
    dependency: &DependencyMetadata,
    configuration: &ConfigurationMetadata,
) -> Vec<String> {
    let mapping = dependency.mapping();
    let mut targets: Vec<String> = Vec::new();
    for source in mapping
        .module_configurations()
        .filter(|source| configuration.hierarchy().contains(*source))
    {
        for target in mapping.targets(source, configuration.name()) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    if targets.is_empty() {
        targets = mapping.targets(configuration.name(), configuration.name());
    }
    targets
}

impl ConfigurationReport {
    #[must_use]
    pub fn from_configuration(configuration: &ConfigurationMetadata) -> Self {
        let hierarchy = configuration.hierarchy();
        let dependencies = configuration
            .dependencies()
            .iter()
            .map(|dependency| DependencyJson {
                requested: dependency.requested().to_string(),
                targets: targets_for(dependency, configuration),
                transitive: dependency.is_transitive(),
                changing: dependency.is_changing(),
                force: dependency.is_force(),
                excludes: dependency
                    .excludes_for(hierarchy)
                    .iter()
                    .map(|rule| ExcludeJson {
                        group: rule.group().to_string(),
                        module: rule.module().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            component: configuration.component().to_string(),
            name: configuration.name().to_string(),
            hierarchy: hierarchy.iter().cloned().collect(),
            transitive: configuration.is_transitive(),
            visible: configuration.is_visible(),
            dependencies,
            excludes: configuration
                .excludes()
                .iter()
                .map(|rule| ExcludeJson {
                    group: rule.group().to_string(),
                    module: rule.module().to_string(),
                })
                .collect(),
            artifacts: configuration
                .artifacts()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Configuration {} of {}\n", self.name, self.component));
        out.push_str(&format!("Hierarchy:  {}\n", self.hierarchy.join(", ")));
        out.push_str(&format!("Transitive: {}\n", self.transitive));
        out.push_str(&format!("Visible:    {}\n", self.visible));

        out.push_str("\nDependencies:\n");
        for dependency in &self.dependencies {
            out.push_str(&format!(
                "  {} -> [{}]",
                dependency.requested,
                dependency.targets.join(", ")
            ));
            if dependency.force {
                out.push_str(" (force)");
            }
            if dependency.changing {
                out.push_str(" (changing)");
            }
            if !dependency.transitive {
                out.push_str(" (intransitive)");
            }
            out.push('\n');
        }

        if !self.excludes.is_empty() {
            out.push_str("\nExcludes:\n");
            for rule in &self.excludes {
                out.push_str(&format!("  {}:{}\n", rule.group, rule.module));
            }
        }

        out.push_str("\nArtifacts:\n");
        for artifact in &self.artifacts {
            out.push_str(&format!("  {}\n", artifact));
        }
        out
    }
}
