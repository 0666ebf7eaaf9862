//! Named hooks that modules expose through the project
//!
//! A module declares each hook as a name plus a map of discriminating
//! argument values. When the project proxies a call, the call's
//! arguments override the declared values; the first hook whose
//! discriminants still hold receives the call. This lets `Packages` and
//! `DevPackages` both offer `add_package`, told apart by `dev`.

use serde_json::{Map, Value};

/// A hook declaration: name plus discriminant defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct HookSpec {
    pub name: &'static str,
    pub discriminants: Map<String, Value>,
}

impl HookSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            discriminants: Map::new(),
        }
    }

    /// Add a discriminating argument and its default value.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.discriminants.insert(key.to_string(), value.into());
        self
    }

    /// Whether this hook accepts `call`.
    pub fn accepts(&self, call: &HookCall) -> bool {
        self.name == call.name
            && self
                .discriminants
                .iter()
                .all(|(key, declared)| call.args.get(key).unwrap_or(declared) == declared)
    }
}

/// A proxied hook invocation with keyword arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookCall {
    pub name: String,
    pub args: Map<String, Value>,
}

impl HookCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.args.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Arguments rendered for error messages.
    pub fn describe_args(&self) -> String {
        Value::Object(self.args.clone()).to_string()
    }
}

/// Hook declarations of every attached module, in registration order.
#[derive(Debug, Default, Clone)]
pub struct HookRegistry {
    entries: Vec<(usize, HookSpec)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hooks of the module at `module` index.
    pub fn register(&mut self, module: usize, specs: impl IntoIterator<Item = HookSpec>) {
        self.entries
            .extend(specs.into_iter().map(|spec| (module, spec)));
    }

    /// Index of the module that handles `call`. Ties go to the module
    /// registered first.
    pub fn resolve(&self, call: &HookCall) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, spec)| spec.accepts(call))
            .map(|(module, _)| *module)
    }

    /// Distinct hook names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for (_, spec) in &self.entries {
            if !names.contains(&spec.name) {
                names.push(spec.name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> HookRegistry {
        let mut registry = HookRegistry::new();
        registry.register(0, [HookSpec::new("add_stub")]);
        registry.register(1, [HookSpec::new("add_package").with("dev", false)]);
        registry.register(2, [HookSpec::new("add_package").with("dev", true)]);
        registry
    }

    #[rstest]
    #[case(HookCall::new("add_package").arg("dev", true), Some(2))]
    #[case(HookCall::new("add_package").arg("dev", false), Some(1))]
    #[case(HookCall::new("add_package"), Some(1))]
    #[case(HookCall::new("add_package").arg("name", "foo").arg("dev", true), Some(2))]
    #[case(HookCall::new("add_stub").arg("dev", true), Some(0))]
    #[case(HookCall::new("remove_package"), None)]
    fn test_resolve(#[case] call: HookCall, #[case] expected: Option<usize>) {
        assert_eq!(registry().resolve(&call), expected);
    }

    #[test]
    fn test_names_are_unique() {
        assert_eq!(registry().names(), vec!["add_stub", "add_package"]);
    }
}
