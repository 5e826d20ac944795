//! Server definition and launch configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::collection::ConfigTarget;

/// Where `${...}` placeholders in a definition's launch configuration are
/// resolved: the configuration section they were declared under and the
/// configuration layer whose saved inputs apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReplacement {
    /// Configuration section the definition came from (e.g. `"mcp"`).
    pub section: String,
    /// Configuration layer whose saved inputs apply.
    pub target: ConfigTarget,
}

/// Launch parameters for an MCP server.
///
/// Immutable once produced: variable substitution yields a new value rather
/// than mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerLaunch {
    /// Server spawned as a child process, speaking over stdio.
    Stdio {
        /// Command to execute.
        command: String,
        /// Arguments to pass to the executable.
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables for the child process.
        #[serde(default)]
        env: BTreeMap<String, String>,
        /// Working directory for the process.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
    /// External server reached over HTTP server-sent events.
    Sse {
        /// Endpoint URL (e.g. `http://localhost:3001/sse`).
        url: String,
        /// Additional request headers.
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl McpServerLaunch {
    /// Create a stdio launch with no environment or working directory.
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args,
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Create an SSE launch.
    pub fn sse(url: impl Into<String>) -> Self {
        Self::Sse {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }
}

/// One addressable server within a collection.
///
/// Its identity for caching purposes is `id` plus the owning collection's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerDefinition {
    /// Identifier, unique within the owning collection.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    /// Launch parameters, possibly containing `${...}` placeholders.
    pub launch: McpServerLaunch,
    /// When set, placeholders in `launch` are resolved before starting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_replacement: Option<VariableReplacement>,
}

impl McpServerDefinition {
    /// Create a definition without variable replacement.
    pub fn new(id: impl Into<String>, label: impl Into<String>, launch: McpServerLaunch) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            launch,
            variable_replacement: None,
        }
    }

    /// Enable variable replacement for this definition.
    #[must_use]
    pub fn with_variable_replacement(mut self, section: impl Into<String>, target: ConfigTarget) -> Self {
        self.variable_replacement = Some(VariableReplacement {
            section: section.into(),
            target,
        });
        self
    }
}
