//! Flattening of the tree into display lines.

use crate::fs::tree::{NodeId, NodeType, Tree};

const BRANCH: &str = "├─ ";
const CORNER: &str = "└─ ";
const VERTICAL: &str = "│  ";
const BLANK: &str = "   ";
const ELLIPSIS: &str = "...";

/// Name shown for the contents of an empty current directory.
pub const EMPTY_DIR_PLACEHOLDER: &str = "...";

/// What a display line stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Entry {
        id: NodeId,
        node_type: NodeType,
        is_expanded: bool,
        is_marked: bool,
    },
    /// Stand-in for the (absent) children of an empty current directory.
    Placeholder,
}

/// One rendered row of the tree, before styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Box-drawing connectors; empty for the root.
    pub prefix: String,
    /// Display name, already truncated to the available width.
    pub name: String,
    pub kind: LineKind,
    pub is_selected: bool,
}

#[cfg(test)]
impl TreeLine {
    /// Unstyled text of the line.
    pub fn text(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

/// The whole tree as display lines, plus the index of the selected line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    pub lines: Vec<TreeLine>,
    pub selected: usize,
}

/// Flatten `tree` from its root in pre-order.
///
/// Only expanded directories contribute children. Lines are at most
/// `width` characters wide unless the prefix alone is wider.
pub fn flatten(tree: &Tree, width: usize) -> Flattened {
    let selected_child = tree.selected_child();
    let mut lines = Vec::new();
    let mut selected = None;

    // (node, its connector column, what its children's connectors build on)
    let mut stack = vec![(tree.root(), String::new(), String::new())];
    while let Some((id, prefix, continuation)) = stack.pop() {
        let node = tree.node(id);
        let is_selected = selected_child == Some(id);
        if is_selected {
            selected = Some(lines.len());
        }
        lines.push(TreeLine {
            name: truncate(&node.name, width.saturating_sub(prefix.chars().count())),
            prefix,
            kind: LineKind::Entry {
                id,
                node_type: node.node_type,
                is_expanded: node.is_loaded(),
                is_marked: tree.is_marked(id),
            },
            is_selected,
        });

        let Some(children) = node.children() else {
            continue;
        };

        if children.is_empty() && id == tree.current_dir() {
            let prefix = format!("{continuation}{CORNER}");
            selected = Some(lines.len());
            lines.push(TreeLine {
                name: truncate(
                    EMPTY_DIR_PLACEHOLDER,
                    width.saturating_sub(prefix.chars().count()),
                ),
                prefix,
                kind: LineKind::Placeholder,
                is_selected: true,
            });
            continue;
        }

        // Reversed so the first child is popped first.
        let last = children.len().saturating_sub(1);
        for (i, &child) in children.iter().enumerate().rev() {
            let (glyph, next) = if i == last {
                (CORNER, BLANK)
            } else {
                (BRANCH, VERTICAL)
            };
            stack.push((
                child,
                format!("{continuation}{glyph}"),
                format!("{continuation}{next}"),
            ));
        }
    }

    Flattened {
        lines,
        selected: selected.unwrap_or(0),
    }
}

/// Cut `name` to `available` characters, ending in an ellipsis when cut.
fn truncate(name: &str, available: usize) -> String {
    if name.chars().count() <= available {
        return name.to_string();
    }
    let keep = available.saturating_sub(ELLIPSIS.len());
    let mut out: String = name.chars().take(keep).collect();
    out.extend(ELLIPSIS.chars().take(available - keep));
    out
}
