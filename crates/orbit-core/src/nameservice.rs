//! Name service
//!
//! Resolves task names to shared task contexts. Several providers can be
//! enabled at once; [`Nameservice::resolve`] asks them in the order they
//! were enabled.

use crate::error::NameServiceError;
use crate::task::TaskRef;
use dashmap::DashMap;
use std::sync::Arc;

/// A source of name-to-task mappings
pub trait NameService: std::fmt::Debug + Send + Sync {
    /// Provider kind, e.g. `"local"`
    fn kind(&self) -> &'static str;

    /// Make a task resolvable under `name`
    fn register(&self, name: &str, task: TaskRef) -> Result<(), NameServiceError>;

    /// Forget a name; returns whether it was known
    fn unregister(&self, name: &str) -> bool;

    /// Look up a task
    fn resolve(&self, name: &str) -> Option<TaskRef>;

    /// Known names
    fn names(&self) -> Vec<String>;
}

/// In-process provider
#[derive(Default)]
pub struct LocalNameService {
    tasks: DashMap<String, TaskRef>,
}

impl LocalNameService {
    /// Provider kind
    pub const KIND: &'static str = "local";

    /// Empty provider
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameService for LocalNameService {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn register(&self, name: &str, task: TaskRef) -> Result<(), NameServiceError> {
        use dashmap::mapref::entry::Entry;
        match self.tasks.entry(name.to_string()) {
            Entry::Occupied(_) => Err(NameServiceError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(task);
                tracing::debug!(task = name, "registered");
                Ok(())
            }
        }
    }

    fn unregister(&self, name: &str) -> bool {
        self.tasks.remove(name).is_some()
    }

    fn resolve(&self, name: &str) -> Option<TaskRef> {
        self.tasks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for LocalNameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNameService")
            .field("names", &self.names())
            .finish()
    }
}

/// Create a provider from its kind name
pub fn provider_from_kind(kind: &str) -> Result<Arc<dyn NameService>, NameServiceError> {
    match kind {
        LocalNameService::KIND => Ok(Arc::new(LocalNameService::new())),
        other => Err(NameServiceError::UnknownProvider(other.to_string())),
    }
}

/// Ordered set of enabled providers
#[derive(Default)]
pub struct Nameservice {
    providers: Vec<Arc<dyn NameService>>,
}

impl Nameservice {
    /// No providers enabled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a single local provider
    #[must_use]
    pub fn local() -> Self {
        let mut ns = Self::new();
        ns.enable(Arc::new(LocalNameService::new()));
        ns
    }

    /// Enable a provider; one of the same kind is replaced
    pub fn enable(&mut self, provider: Arc<dyn NameService>) {
        self.providers.retain(|p| p.kind() != provider.kind());
        tracing::info!(kind = provider.kind(), "name service enabled");
        self.providers.push(provider);
    }

    /// Enable a provider by kind name
    pub fn enable_kind(&mut self, kind: &str) -> Result<Arc<dyn NameService>, NameServiceError> {
        let provider = provider_from_kind(kind)?;
        self.enable(Arc::clone(&provider));
        Ok(provider)
    }

    /// Check if a provider kind is enabled
    #[must_use]
    pub fn is_enabled(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Enabled provider of a kind
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<Arc<dyn NameService>> {
        self.providers.iter().find(|p| p.kind() == kind).cloned()
    }

    /// Register a task in the first enabled provider
    pub fn register(&self, name: &str, task: TaskRef) -> Result<(), NameServiceError> {
        let provider = self
            .providers
            .first()
            .ok_or_else(|| NameServiceError::NoProviders(name.to_string()))?;
        provider.register(name, task)
    }

    /// Remove a name from every provider
    pub fn unregister(&self, name: &str) -> bool {
        self.providers
            .iter()
            .fold(false, |found, p| p.unregister(name) || found)
    }

    /// Resolve a task name
    pub fn resolve(&self, name: &str) -> Result<TaskRef, NameServiceError> {
        if self.providers.is_empty() {
            return Err(NameServiceError::NoProviders(name.to_string()));
        }
        self.providers
            .iter()
            .find_map(|p| p.resolve(name))
            .ok_or_else(|| NameServiceError::NotFound(name.to_string()))
    }

    /// Names known to any provider, sorted and deduplicated
    #[must_use]
    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().flat_map(|p| p.names()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Disable every provider
    pub fn reset(&mut self) {
        self.providers.clear();
    }
}

impl std::fmt::Debug for Nameservice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<_> = self.providers.iter().map(|p| p.kind()).collect();
        f.debug_struct("Nameservice").field("providers", &kinds).finish()
    }
}
