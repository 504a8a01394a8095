use smartstring::alias::String as SmartString;

/// Runtime config shared by every instance of a [`Pivot`](crate::Pivot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Attribute written on component root elements, holding the component
    /// name (empty for anonymous components). `None` disables the marker.
    pub component_attribute: Option<SmartString>,
    /// Attribute read from native element children to register them as slots
    pub native_ref_attribute: SmartString,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component_attribute(mut self, name: Option<&str>) -> Self {
        self.component_attribute = name.map(Into::into);
        self
    }

    pub fn with_native_ref_attribute(mut self, name: &str) -> Self {
        self.native_ref_attribute = name.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component_attribute: Some("data-pivot".into()),
            native_ref_attribute: "ref".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.component_attribute.as_deref(), Some("data-pivot"));
        assert_eq!(config.native_ref_attribute.as_str(), "ref");
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_component_attribute(None)
            .with_native_ref_attribute("data-ref");
        assert!(config.component_attribute.is_none());
        assert_eq!(config.native_ref_attribute.as_str(), "data-ref");
    }
}
