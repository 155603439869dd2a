//! Plugin descriptors.
//!
//! A plugin is one of four shapes, resolved once at registration into an
//! explicit variant (never probed for field presence at call time):
//! wrap the selection in a declared tag, delegate to a built-in command,
//! run a caller-supplied callback against the tree, or insert a
//! timestamp. Tags declared by plugins always join the allowed-tag
//! policy and cannot be removed by a caller-supplied explicit list.

use chrono::Local;
use smol_str::SmolStr;
use vellum_dom::DomTree;

use crate::command::Command;
use crate::policy::TagPolicy;

/// A registered plugin, resolved to one of the four supported shapes.
pub enum Plugin {
    /// Wrap the current selection in a new element of this tag.
    WrapSelection { tag: SmolStr },
    /// Delegate to an existing command with a fixed argument.
    Invoke { cmd: Command, arg: Option<String> },
    /// Run a caller-supplied callback against the document tree.
    Action {
        run: Box<dyn FnMut(&mut DomTree) + Send>,
    },
    /// Insert the current local date and time as text.
    Timestamp,
}

impl Plugin {
    /// The tag this plugin contributes to the allowed-tag union.
    pub fn declared_tag(&self) -> Option<&str> {
        match self {
            Plugin::WrapSelection { tag } => Some(tag.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plugin::WrapSelection { tag } => f.debug_struct("WrapSelection").field("tag", tag).finish(),
            Plugin::Invoke { cmd, arg } => f
                .debug_struct("Invoke")
                .field("cmd", cmd)
                .field("arg", arg)
                .finish(),
            Plugin::Action { .. } => f.debug_struct("Action").finish_non_exhaustive(),
            Plugin::Timestamp => f.write_str("Timestamp"),
        }
    }
}

/// Ordered plugin collection, indexed by registration order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Plugin) -> usize {
        self.plugins.push(plugin);
        self.plugins.len() - 1
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Plugin> {
        self.plugins.get_mut(index)
    }

    /// Tags declared across all registered plugins.
    pub fn declared_tags(&self) -> Vec<SmolStr> {
        self.plugins
            .iter()
            .filter_map(|p| p.declared_tag().map(SmolStr::new))
            .collect()
    }

    /// A plugin affordance shows iff its declared tag passes the policy;
    /// plugins without a tag always show.
    pub fn is_visible(&self, index: usize, policy: &TagPolicy) -> bool {
        match self.plugins.get(index).and_then(Plugin::declared_tag) {
            Some(tag) => policy.allows(tag),
            None => true,
        }
    }
}

/// The text inserted by `Plugin::Timestamp`.
pub fn timestamp_text() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_tags() {
        let mut registry = PluginRegistry::new();
        registry.register(Plugin::WrapSelection { tag: "mark".into() });
        registry.register(Plugin::Timestamp);
        registry.register(Plugin::Invoke {
            cmd: Command::Bold,
            arg: None,
        });
        assert_eq!(registry.declared_tags(), vec![SmolStr::new("mark")]);
    }

    #[test]
    fn test_visibility_follows_policy() {
        let mut registry = PluginRegistry::new();
        let mark = registry.register(Plugin::WrapSelection { tag: "mark".into() });
        let stamp = registry.register(Plugin::Timestamp);

        let policy = TagPolicy::from_tags(["p"]);
        assert!(!registry.is_visible(mark, &policy));
        assert!(registry.is_visible(stamp, &policy));

        let policy = TagPolicy::from_tags(["p", "mark"]);
        assert!(registry.is_visible(mark, &policy));
    }

    #[test]
    fn test_timestamp_shape() {
        let text = timestamp_text();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(text.len(), 19);
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[10..11], " ");
        assert_eq!(&text[13..14], ":");
    }
}
