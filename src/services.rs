use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered remote-callable function: JSON arguments in, JSON result or
/// a caller-visible error message out.
pub type ServiceFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// ServiceDispatcher
///
/// Contract of the service-call route: name a function, hand it the request
/// body, get its result. `dispatch` returns `None` for names nothing has
/// registered, which the handler turns into a 404.
pub trait ServiceDispatcher: Send + Sync {
    fn names(&self) -> Vec<String>;
    fn dispatch(&self, name: &str, args: Value) -> Option<Result<Value, String>>;
}

/// ServiceState
pub type ServiceState = Arc<dyn ServiceDispatcher>;

/// ServiceRegistry
///
/// The default dispatcher: a name → function map filled at startup. The
/// application registers none by default; deployments add their own before
/// building the router.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceFn>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, service: F)
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.services.insert(name.to_string(), Arc::new(service));
    }
}

impl ServiceDispatcher for ServiceRegistry {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    fn dispatch(&self, name: &str, args: Value) -> Option<Result<Value, String>> {
        self.services.get(name).map(|service| service(args))
    }
}
