//! Published component interfaces and their optional capabilities.
//!
//! The directory stores every published interface as an opaque
//! `Arc<dyn ComponentApi>`. Consumers narrow it either by capability
//! ([`ComponentApi::lifecycle`], [`ComponentApi::utility_publisher`]) or to a
//! concrete type through [`crate::Directory::get_as`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Upcast helper so trait objects can be downcast to their concrete type.
pub trait AsAnyArc: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Interface a component publishes through `Directory::register`.
pub trait ComponentApi: AsAnyArc {
    /// Teardown hook, if the component owns state beyond tracked resources.
    fn lifecycle(&self) -> Option<&dyn HasLifecycle> {
        None
    }

    /// Helpers the component wants published into the shared utility namespace.
    fn utility_publisher(&self) -> Option<&dyn PublishesUtilities> {
        None
    }
}

/// Components that need an explicit shutdown call during suite teardown.
pub trait HasLifecycle {
    fn shutdown(&self) -> Result<(), String>;
}

/// Components that contribute shared utilities when they register.
pub trait PublishesUtilities {
    fn utilities(&self) -> Vec<(String, Utility)>;
}

/// Interface for components with nothing to expose beyond their presence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmptyApi;

impl ComponentApi for EmptyApi {}

type UtilityFn = dyn Fn(&Value) -> Value + Send + Sync;

/// A named shared helper. Arguments and results travel as JSON values.
#[derive(Clone)]
pub struct Utility {
    func: Arc<UtilityFn>,
}

impl Utility {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// A utility that ignores its input and returns `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| value.clone())
    }

    pub fn call(&self, input: &Value) -> Value {
        (self.func)(input)
    }

    /// `true` when both handles wrap the same function.
    pub fn ptr_eq(&self, other: &Utility) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utility").finish_non_exhaustive()
    }
}
