//! Named editing commands dispatched through `Editor::exec`.

/// A discrete editing operation. Commands are stateless names; the
/// optional string argument travels alongside in `exec(command, arg)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Undo,
    Redo,
    FormatBlock,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    ToUpperCase,
    ToLowerCase,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    ToggleHtml,
    CreateLink,
    Unlink,
    InsertImage,
    InsertTableGrid,
    InsertEmoji,
    InsertHorizontalRule,
    TextColor,
    Highlight,
    Cut,
    Copy,
    Paste,
    RemoveText,
    SelectAll,
    InsertUnorderedList,
    InsertOrderedList,
    UnorderedListStyle,
    OrderedListStyle,
    FontName,
}

impl Command {
    /// The wire name, matching the toolbar command vocabulary.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::FormatBlock => "formatBlock",
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::Strikethrough => "strikeThrough",
            Command::Superscript => "superscript",
            Command::Subscript => "subscript",
            Command::ToUpperCase => "toUpperCase",
            Command::ToLowerCase => "toLowerCase",
            Command::JustifyLeft => "justifyLeft",
            Command::JustifyCenter => "justifyCenter",
            Command::JustifyRight => "justifyRight",
            Command::ToggleHtml => "toggleHTML",
            Command::CreateLink => "createLink",
            Command::Unlink => "unlink",
            Command::InsertImage => "insertImage",
            Command::InsertTableGrid => "insertTableGrid",
            Command::InsertEmoji => "insertEmoji",
            Command::InsertHorizontalRule => "insertHorizontalRule",
            Command::TextColor => "textColor",
            Command::Highlight => "highlight",
            Command::Cut => "cut",
            Command::Copy => "copy",
            Command::Paste => "paste",
            Command::RemoveText => "removeText",
            Command::SelectAll => "selectAll",
            Command::InsertUnorderedList => "insertUnorderedList",
            Command::InsertOrderedList => "insertOrderedList",
            Command::UnorderedListStyle => "unorderedListStyle",
            Command::OrderedListStyle => "orderedListStyle",
            Command::FontName => "fontName",
        }
    }

    pub fn from_name(name: &str) -> Option<Command> {
        ALL_COMMANDS.iter().copied().find(|c| c.name() == name)
    }

    /// The policy entry gating this command's affordance: a structural
    /// tag or a pseudo-tag action. None means always available.
    pub fn policy_gate(&self) -> Option<&'static str> {
        match self {
            Command::Bold => Some("strong"),
            Command::Italic => Some("em"),
            Command::Underline => Some("u"),
            Command::Strikethrough => Some("s"),
            Command::Superscript => Some("sup"),
            Command::Subscript => Some("sub"),
            Command::FormatBlock => Some("blockquote"),
            Command::CreateLink => Some("a"),
            Command::InsertImage => Some("img"),
            Command::InsertTableGrid => Some("table"),
            Command::InsertUnorderedList | Command::UnorderedListStyle => Some("ul"),
            Command::InsertOrderedList | Command::OrderedListStyle => Some("ol"),
            Command::Cut => Some("cut"),
            Command::Copy => Some("copy"),
            Command::Paste => Some("paste"),
            Command::RemoveText => Some("remove"),
            Command::TextColor => Some("text-color"),
            Command::Highlight => Some("highlight-color"),
            Command::InsertEmoji => Some("emoji"),
            Command::SelectAll => Some("select"),
            Command::ToUpperCase => Some("uppercase"),
            Command::ToLowerCase => Some("lowercase"),
            Command::JustifyLeft => Some("align-left"),
            Command::JustifyCenter => Some("align-center"),
            Command::JustifyRight => Some("align-right"),
            Command::Unlink => Some("remove-link"),
            Command::InsertHorizontalRule => Some("hr"),
            _ => None,
        }
    }

    /// Commands that only open an auxiliary picker and must not run the
    /// change pipeline themselves.
    pub fn opens_picker(&self) -> bool {
        matches!(
            self,
            Command::InsertImage
                | Command::InsertEmoji
                | Command::InsertTableGrid
                | Command::TextColor
                | Command::Highlight
        )
    }
}

pub const ALL_COMMANDS: &[Command] = &[
    Command::Undo,
    Command::Redo,
    Command::FormatBlock,
    Command::Bold,
    Command::Italic,
    Command::Underline,
    Command::Strikethrough,
    Command::Superscript,
    Command::Subscript,
    Command::ToUpperCase,
    Command::ToLowerCase,
    Command::JustifyLeft,
    Command::JustifyCenter,
    Command::JustifyRight,
    Command::ToggleHtml,
    Command::CreateLink,
    Command::Unlink,
    Command::InsertImage,
    Command::InsertTableGrid,
    Command::InsertEmoji,
    Command::InsertHorizontalRule,
    Command::TextColor,
    Command::Highlight,
    Command::Cut,
    Command::Copy,
    Command::Paste,
    Command::RemoveText,
    Command::SelectAll,
    Command::InsertUnorderedList,
    Command::InsertOrderedList,
    Command::UnorderedListStyle,
    Command::OrderedListStyle,
    Command::FontName,
];
