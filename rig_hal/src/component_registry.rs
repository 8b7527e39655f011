//! Component registry.
//!
//! Maps component names (as used in `--component` and config sections) to
//! factories. Built at startup and handed to `RigCore::init`; no global state.

use crate::components::register_builtin;
use rig_common::rig::component::{Component, ComponentFactory, RigError};
use rig_common::rig::config::RigConfig;
use std::collections::BTreeMap;

/// Registry of available components.
pub struct ComponentRegistry {
    factories: BTreeMap<&'static str, ComponentFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding the servo driver and distance reader.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin(&mut registry);
        registry
    }

    /// Register a component factory.
    ///
    /// # Panics
    /// Panics if a component with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: ComponentFactory) {
        if self.factories.contains_key(name) {
            panic!("Component '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a component factory by name.
    pub fn get_factory(&self, name: &str) -> Option<ComponentFactory> {
        self.factories.get(name).copied()
    }

    /// Create a component instance by name.
    ///
    /// # Errors
    /// Returns `RigError::ComponentNotFound` for unknown names and whatever the
    /// factory reports for a missing or invalid config section.
    pub fn create(&self, name: &str, config: &RigConfig) -> Result<Box<dyn Component>, RigError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| RigError::ComponentNotFound(name.to_string()))?;
        factory(config)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_common::rig::component::ComponentDiagnostics;
    use rig_common::rig::config::ServoConfig;
    use rig_common::rig::types::{ComponentStatus, FrameInput, ServoStatus};
    use rig_common::serial::LinkOpener;
    use std::time::Duration;

    struct NullComponent;

    impl Component for NullComponent {
        fn name(&self) -> &'static str {
            "null"
        }

        fn start(&mut self, _opener: &dyn LinkOpener) -> Result<(), RigError> {
            Ok(())
        }

        fn tick(&mut self, _frame: &FrameInput, _dt: Duration) -> Result<ComponentStatus, RigError> {
            Ok(ComponentStatus::Servo(ServoStatus::default()))
        }

        fn shutdown(&mut self) -> Result<(), RigError> {
            Ok(())
        }

        fn diagnostics(&self) -> ComponentDiagnostics {
            ComponentDiagnostics::default()
        }
    }

    fn create_null(_config: &RigConfig) -> Result<Box<dyn Component>, RigError> {
        Ok(Box::new(NullComponent))
    }

    #[test]
    fn register_and_create() {
        let mut reg = ComponentRegistry::new();
        reg.register("null", create_null);
        let component = reg.create("null", &RigConfig::default()).expect("should create");
        assert_eq!(component.name(), "null");
    }

    #[test]
    fn unknown_component() {
        let reg = ComponentRegistry::with_builtin();
        let result = reg.create("lidar", &RigConfig::default());
        assert!(matches!(result, Err(RigError::ComponentNotFound(_))));
    }

    #[test]
    fn builtin_names() {
        assert_eq!(ComponentRegistry::with_builtin().list(), vec!["distance", "servo"]);
    }

    #[test]
    fn builtin_factory_requires_its_section() {
        let reg = ComponentRegistry::with_builtin();
        let mut config = RigConfig::default();
        assert!(matches!(
            reg.create("servo", &config),
            Err(RigError::ConfigError(_))
        ));

        config.servo = Some(ServoConfig::with_port("COM9"));
        let servo = reg.create("servo", &config).expect("should create");
        assert_eq!(servo.name(), "servo");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_panics() {
        let mut reg = ComponentRegistry::new();
        reg.register("dup", create_null);
        reg.register("dup", create_null);
    }
}
