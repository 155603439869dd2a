//! Caller-facing editor configuration.

use smol_str::SmolStr;

use crate::types::Dimension;

/// Recognized construction options.
///
/// `allowed_tags` is an explicit override; plugin-declared tags are always
/// unioned in afterwards and cannot be removed by this list. A `None`
/// `storage_key` disables persistence entirely. Plugins register through
/// `Editor::register_plugin` (they carry callbacks, which do not belong in
/// a plain options struct).
pub struct EditorOptions {
    pub value: String,
    pub height: Dimension,
    pub width: Dimension,
    pub min_height: u32,
    pub allowed_tags: Option<Vec<SmolStr>>,
    pub storage_key: Option<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            value: String::new(),
            height: Dimension::Auto,
            width: Dimension::Responsive,
            min_height: 200,
            allowed_tags: None,
            storage_key: Some("rte-editor-content".to_string()),
        }
    }
}

impl EditorOptions {
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_allowed_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.allowed_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_storage_key(mut self, key: Option<&str>) -> Self {
        self.storage_key = key.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EditorOptions::default();
        assert_eq!(options.height, Dimension::Auto);
        assert_eq!(options.width, Dimension::Responsive);
        assert_eq!(options.min_height, 200);
        assert!(options.allowed_tags.is_none());
        assert_eq!(options.storage_key.as_deref(), Some("rte-editor-content"));
    }

    #[test]
    fn test_builder_helpers() {
        let options = EditorOptions::default()
            .with_value("<p>x</p>")
            .with_allowed_tags(["p", "strong"])
            .with_storage_key(None);
        assert_eq!(options.value, "<p>x</p>");
        assert_eq!(options.allowed_tags.as_ref().map(Vec::len), Some(2));
        assert!(options.storage_key.is_none());
    }
}
