//! `${...}` variable substitution with memoized interactive inputs.
//!
//! Launch configurations may reference variables in any string-valued field.
//! Plain variables go to the resolution backend in one non-interactive pass.
//! Interactive variables (`${input:...}`, `${command:...}`) are served from
//! a persisted per-scope cache when possible; only cache misses reach the
//! backend's interactive path, so the user is asked for each input at most
//! once per scope until the saved inputs are cleared.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use relay_core::{
    ConfigurationResolver, McpServerLaunch, RegistryError, ScopedStorage, StorageScope,
    VariableReplacement,
};

/// Storage key for the per-scope saved inputs document.
const SAVED_INPUTS_STORAGE_KEY: &str = "mcp.savedInputs";

/// section -> variable -> resolved value
type SavedInputs = BTreeMap<String, BTreeMap<String, String>>;

/// Resolves launch configuration placeholders against a backend, memoizing
/// interactive values in scoped storage.
pub struct VariableResolver {
    backend: Arc<dyn ConfigurationResolver>,
    storage: Arc<dyn ScopedStorage>,
}

impl VariableResolver {
    /// Create a resolver over the given backend and storage.
    pub fn new(backend: Arc<dyn ConfigurationResolver>, storage: Arc<dyn ScopedStorage>) -> Self {
        Self { backend, storage }
    }

    /// Produce a new launch configuration with every `${...}` reference
    /// replaced.
    ///
    /// Fails with [`RegistryError::UnresolvedVariables`] if any reference
    /// survives both resolution passes. The input launch is never mutated.
    pub async fn resolve(
        &self,
        launch: &McpServerLaunch,
        replacement: &VariableReplacement,
    ) -> Result<McpServerLaunch, RegistryError> {
        let references = collect_references(launch);
        if references.is_empty() {
            return Ok(launch.clone());
        }

        let (plain, interactive): (Vec<String>, Vec<String>) = references
            .iter()
            .cloned()
            .partition(|name| !is_interactive(name));

        let mut values: HashMap<String, String> = HashMap::new();
        if !plain.is_empty() {
            let resolved = self
                .backend
                .resolve_variables(&plain)
                .await
                .map_err(|e| RegistryError::Backend(e.to_string()))?;
            values.extend(resolved);
        }

        if !interactive.is_empty() {
            let scope = replacement.target.storage_scope();
            let saved = self.read_saved(scope).await?;
            let cached = saved.get(&replacement.section);

            let mut missing = Vec::new();
            for name in &interactive {
                match cached.and_then(|section| section.get(name)) {
                    // Cache hit: no interaction
                    Some(value) => {
                        values.insert(name.clone(), value.clone());
                    }
                    None => missing.push(name.clone()),
                }
            }

            if !missing.is_empty() {
                tracing::debug!(
                    section = %replacement.section,
                    count = missing.len(),
                    "resolving interactive variables"
                );
                let resolved = self
                    .backend
                    .resolve_with_interaction(
                        &missing,
                        &replacement.section,
                        &values,
                        replacement.target,
                    )
                    .await
                    .map_err(|e| RegistryError::Backend(e.to_string()))?;
                // Re-read after the await so inputs memoized by a concurrent
                // resolve against this scope survive the write below.
                let mut saved = self.read_saved(scope).await?;
                let section = saved.entry(replacement.section.clone()).or_default();
                // Memoize everything the backend produced, even values we
                // did not ask for; later launches reuse them.
                for (name, value) in resolved {
                    section.insert(name.clone(), value.clone());
                    values.insert(name, value);
                }
                self.write_saved(scope, &saved).await?;
            }
        }

        let (resolved_launch, unresolved) = substitute(launch, &values);
        if unresolved.is_empty() {
            Ok(resolved_launch)
        } else {
            Err(RegistryError::UnresolvedVariables(
                unresolved.into_iter().collect(),
            ))
        }
    }

    /// Purge memoized inputs for a scope; subsequent resolutions re-trigger
    /// interaction.
    pub async fn clear_saved_inputs(&self, scope: StorageScope) -> Result<(), RegistryError> {
        self.storage.remove(scope, SAVED_INPUTS_STORAGE_KEY).await?;
        Ok(())
    }

    async fn read_saved(&self, scope: StorageScope) -> Result<SavedInputs, RegistryError> {
        let raw = self.storage.get(scope, SAVED_INPUTS_STORAGE_KEY).await?;
        Ok(raw
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(saved) => Some(saved),
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable saved inputs");
                    None
                }
            })
            .unwrap_or_default())
    }

    async fn write_saved(&self, scope: StorageScope, saved: &SavedInputs) -> Result<(), RegistryError> {
        let raw =
            serde_json::to_string(saved).map_err(|e| RegistryError::Backend(e.to_string()))?;
        self.storage.set(scope, SAVED_INPUTS_STORAGE_KEY, raw).await?;
        Ok(())
    }
}

/// Interactive references require user input or command execution.
fn is_interactive(name: &str) -> bool {
    name.starts_with("input:") || name.starts_with("command:")
}

/// Collect every `${...}` reference in a launch configuration.
fn collect_references(launch: &McpServerLaunch) -> BTreeSet<String> {
    let mut references = BTreeSet::new();
    match launch {
        McpServerLaunch::Stdio {
            command,
            args,
            env,
            cwd,
        } => {
            scan_placeholders(command, &mut references);
            for arg in args {
                scan_placeholders(arg, &mut references);
            }
            for value in env.values() {
                scan_placeholders(value, &mut references);
            }
            if let Some(cwd) = cwd {
                scan_placeholders(cwd, &mut references);
            }
        }
        McpServerLaunch::Sse { url, headers } => {
            scan_placeholders(url, &mut references);
            for value in headers.values() {
                scan_placeholders(value, &mut references);
            }
        }
    }
    references
}

/// Replace references with their values, returning the rewritten launch and
/// the references that had no value.
fn substitute(
    launch: &McpServerLaunch,
    values: &HashMap<String, String>,
) -> (McpServerLaunch, BTreeSet<String>) {
    let mut unresolved = BTreeSet::new();
    let resolved = match launch {
        McpServerLaunch::Stdio {
            command,
            args,
            env,
            cwd,
        } => McpServerLaunch::Stdio {
            command: substitute_str(command, values, &mut unresolved),
            args: args
                .iter()
                .map(|arg| substitute_str(arg, values, &mut unresolved))
                .collect(),
            env: env
                .iter()
                .map(|(k, v)| (k.clone(), substitute_str(v, values, &mut unresolved)))
                .collect(),
            cwd: cwd
                .as_ref()
                .map(|cwd| substitute_str(cwd, values, &mut unresolved)),
        },
        McpServerLaunch::Sse { url, headers } => McpServerLaunch::Sse {
            url: substitute_str(url, values, &mut unresolved),
            headers: headers
                .iter()
                .map(|(k, v)| (k.clone(), substitute_str(v, values, &mut unresolved)))
                .collect(),
        },
    };
    (resolved, unresolved)
}

fn scan_placeholders(value: &str, out: &mut BTreeSet<String>) {
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.insert(rest[start + 2..start + 2 + len].to_string());
        rest = &rest[start + 2 + len + 1..];
    }
}

fn substitute_str(
    value: &str,
    values: &HashMap<String, String>,
    unresolved: &mut BTreeSet<String>,
) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let name = &rest[start + 2..start + 2 + len];
        out.push_str(&rest[..start]);
        match values.get(name) {
            Some(resolved) => out.push_str(resolved),
            None => {
                unresolved.insert(name.to_string());
                // Keep the reference verbatim; the caller reports it
                out.push_str(&rest[start..start + 2 + len + 1]);
            }
        }
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::{ConfigTarget, MemoryStorage, ResolverBackendError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct StubBackend {
        known: HashMap<String, String>,
        interactive_calls: AtomicUsize,
    }

    impl StubBackend {
        fn new() -> Arc<Self> {
            let mut known = HashMap::new();
            known.insert("workspaceFolder".to_string(), "/test/workspace".to_string());
            known.insert("fileBasename".to_string(), "test.txt".to_string());
            Arc::new(Self {
                known,
                interactive_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ConfigurationResolver for StubBackend {
        async fn resolve_variables(
            &self,
            variables: &[String],
        ) -> Result<HashMap<String, String>, ResolverBackendError> {
            Ok(variables
                .iter()
                .filter_map(|name| self.known.get(name).map(|v| (name.clone(), v.clone())))
                .collect())
        }

        async fn resolve_with_interaction(
            &self,
            variables: &[String],
            _section: &str,
            _known: &HashMap<String, String>,
            _target: ConfigTarget,
        ) -> Result<HashMap<String, String>, ResolverBackendError> {
            let call = self.interactive_calls.fetch_add(1, Ordering::SeqCst);
            Ok(variables
                .iter()
                .map(|name| (name.clone(), format!("interactive{call}:{name}")))
                .collect())
        }
    }

    /// Backend that holds one section's interactive resolution open until
    /// released.
    struct GatedBackend {
        gated_section: String,
        gate: Notify,
        waiting: AtomicBool,
        interactive_calls: AtomicUsize,
    }

    impl GatedBackend {
        fn new(gated_section: &str) -> Arc<Self> {
            Arc::new(Self {
                gated_section: gated_section.to_string(),
                gate: Notify::new(),
                waiting: AtomicBool::new(false),
                interactive_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ConfigurationResolver for GatedBackend {
        async fn resolve_variables(
            &self,
            _variables: &[String],
        ) -> Result<HashMap<String, String>, ResolverBackendError> {
            Ok(HashMap::new())
        }

        async fn resolve_with_interaction(
            &self,
            variables: &[String],
            section: &str,
            _known: &HashMap<String, String>,
            _target: ConfigTarget,
        ) -> Result<HashMap<String, String>, ResolverBackendError> {
            if section == self.gated_section {
                self.waiting.store(true, Ordering::SeqCst);
                self.gate.notified().await;
            }
            self.interactive_calls.fetch_add(1, Ordering::SeqCst);
            Ok(variables
                .iter()
                .map(|name| (name.clone(), format!("{section}:{name}")))
                .collect())
        }
    }

    fn replacement() -> VariableReplacement {
        VariableReplacement {
            section: "mcp".to_string(),
            target: ConfigTarget::Workspace,
        }
    }

    fn replacement_in(section: &str) -> VariableReplacement {
        VariableReplacement {
            section: section.to_string(),
            target: ConfigTarget::Workspace,
        }
    }

    fn resolver(backend: Arc<StubBackend>) -> VariableResolver {
        VariableResolver::new(backend, Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_scan_placeholders() {
        let mut out = BTreeSet::new();
        scan_placeholders("${a}/x/${input:b}${c", &mut out);
        assert_eq!(
            out.into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "input:b".to_string()]
        );
    }

    #[test]
    fn test_substitute_keeps_unknown_references() {
        let mut unresolved = BTreeSet::new();
        let mut values = HashMap::new();
        values.insert("a".to_string(), "A".to_string());

        let out = substitute_str("${a}-${b}", &values, &mut unresolved);
        assert_eq!(out, "A-${b}");
        assert_eq!(unresolved.into_iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_resolves_plain_variables() {
        let backend = StubBackend::new();
        let resolver = resolver(backend.clone());
        let launch = McpServerLaunch::stdio(
            "${workspaceFolder}/cmd",
            vec!["--file".to_string(), "${fileBasename}".to_string()],
        );

        let resolved = resolver.resolve(&launch, &replacement()).await.unwrap();
        let McpServerLaunch::Stdio { command, args, .. } = resolved else {
            panic!("expected stdio launch");
        };
        assert_eq!(command, "/test/workspace/cmd");
        assert_eq!(args, vec!["--file", "test.txt"]);
        assert_eq!(backend.interactive_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interactive_values_are_memoized_per_scope() {
        let backend = StubBackend::new();
        let resolver = resolver(backend.clone());
        let mut env = BTreeMap::new();
        env.insert("TOKEN".to_string(), "${input:token}".to_string());
        let launch = McpServerLaunch::Stdio {
            command: "cmd".to_string(),
            args: vec![],
            env,
            cwd: None,
        };

        let first = resolver.resolve(&launch, &replacement()).await.unwrap();
        let second = resolver.resolve(&launch, &replacement()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.interactive_calls.load(Ordering::SeqCst), 1);

        resolver
            .clear_saved_inputs(StorageScope::Workspace)
            .await
            .unwrap();

        let third = resolver.resolve(&launch, &replacement()).await.unwrap();
        assert_ne!(first, third);
        assert_eq!(backend.interactive_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_do_not_lose_memoized_inputs() {
        let backend = GatedBackend::new("one");
        let resolver = Arc::new(VariableResolver::new(
            backend.clone(),
            Arc::new(MemoryStorage::new()),
        ));
        let mut env = BTreeMap::new();
        env.insert("TOKEN".to_string(), "${input:token}".to_string());
        let launch = McpServerLaunch::Stdio {
            command: "cmd".to_string(),
            args: vec![],
            env,
            cwd: None,
        };

        let gated = tokio::spawn({
            let resolver = resolver.clone();
            let launch = launch.clone();
            async move {
                resolver
                    .resolve(&launch, &replacement_in("one"))
                    .await
                    .unwrap()
            }
        });
        while !backend.waiting.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        // The other section's inputs land while "one" is still interacting
        resolver
            .resolve(&launch, &replacement_in("two"))
            .await
            .unwrap();
        assert_eq!(backend.interactive_calls.load(Ordering::SeqCst), 1);

        backend.gate.notify_one();
        gated.await.unwrap();

        // Both sections now hit the cache: "one" must not have overwritten
        // the inputs "two" saved while it was interacting
        resolver
            .resolve(&launch, &replacement_in("one"))
            .await
            .unwrap();
        resolver
            .resolve(&launch, &replacement_in("two"))
            .await
            .unwrap();
        assert_eq!(backend.interactive_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unresolved_reference_fails() {
        let backend = StubBackend::new();
        let resolver = resolver(backend);
        let launch = McpServerLaunch::stdio("${unknownVariable}/cmd", vec![]);

        let error = resolver.resolve(&launch, &replacement()).await.unwrap_err();
        assert!(matches!(
            error,
            RegistryError::UnresolvedVariables(names) if names == vec!["unknownVariable"]
        ));
    }

    #[tokio::test]
    async fn test_launch_without_references_is_unchanged() {
        let backend = StubBackend::new();
        let resolver = resolver(backend.clone());
        let launch = McpServerLaunch::stdio("plain-cmd", vec!["--flag".to_string()]);

        let resolved = resolver.resolve(&launch, &replacement()).await.unwrap();
        assert_eq!(resolved, launch);
    }
}
