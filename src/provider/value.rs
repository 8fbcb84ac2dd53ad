use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, WebError};

/// Value produced by a provider and injected by name into dependents.
///
/// Values are type-erased so a single resolution path serves JSON
/// payloads, typed validator outputs, and opaque resources such as
/// connection pools. Consumers downcast at the seam.
pub type ProviderValue = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value for injection.
pub fn provided<T: Any + Send + Sync>(value: T) -> ProviderValue {
    Arc::new(value)
}

/// Named argument set handed to a provider or handler invocation.
#[derive(Clone, Default)]
pub struct ProviderArgs {
    values: HashMap<String, ProviderValue>,
}

impl ProviderArgs {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ProviderValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get_raw(&self, name: &str) -> Option<ProviderValue> {
        self.values.get(name).cloned()
    }

    /// Typed access. A missing name or a type mismatch is a provider
    /// contract violation and maps to an internal error.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.values.get(name).ok_or_else(|| {
            WebError::Provider(format!("argument not resolved: {}", name))
        })?;
        value.clone().downcast::<T>().map_err(|_| {
            WebError::Provider(format!("argument type mismatch for: {}", name))
        })
    }

    /// JSON access, the common case for structured values.
    pub fn json(&self, name: &str) -> Result<Arc<serde_json::Value>> {
        self.get::<serde_json::Value>(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ProviderArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderArgs").field("names", &names).finish()
    }
}

/// Truthiness of a provider result as seen by decision points.
///
/// Booleans speak for themselves; JSON values treat `null` and `false`
/// as falsy; any other produced value counts as truthy (the provider
/// signalled absence by erroring or returning null, not by type).
pub fn value_is_truthy(value: &ProviderValue) -> bool {
    if let Some(flag) = value.downcast_ref::<bool>() {
        return *flag;
    }
    if let Some(json) = value.downcast_ref::<serde_json::Value>() {
        return !matches!(json, serde_json::Value::Null | serde_json::Value::Bool(false));
    }
    true
}
