use std::cmp::Ordering;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{AppError, FsOp, Result};
use crate::fs::operations::{self, FileOps, NativeOps};

/// Type of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
    Symlink,
}

impl NodeType {
    fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            NodeType::Symlink
        } else if file_type.is_dir() {
            NodeType::Directory
        } else {
            NodeType::File
        }
    }
}

/// File metadata captured when the entry was last listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Unix permission bits (`0o755` style).
    pub mode: u32,
}

impl FileMeta {
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            mode: permission_bits(metadata),
        }
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Handle to a node stored in a [`Tree`].
///
/// The generation makes handles to released nodes detectably stale even
/// after their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A node in the filesystem tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name (lossy for non-UTF-8 names).
    pub name: String,
    /// Exact on-disk name; the identity used when matching entries.
    file_name: OsString,
    pub path: PathBuf,
    pub node_type: NodeType,
    pub meta: FileMeta,
    /// `None` until the directory is read; always `None` for files and symlinks.
    children: Option<Vec<NodeId>>,
    parent: Option<NodeId>,
    selected: usize,
}

impl Node {
    fn new(file_name: OsString, path: PathBuf, node_type: NodeType, meta: FileMeta) -> Self {
        Self {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            path,
            node_type,
            meta,
            children: None,
            parent: None,
            selected: 0,
        }
    }

    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    /// Loaded children in display order, or `None` when not loaded.
    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }

    /// Whether the directory has been read (expanded).
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Cursor into `children`.
    pub fn selected_index(&self) -> usize {
        self.selected
    }
}

/// One listed directory entry, read before any tree mutation happens.
struct Entry {
    file_name: OsString,
    path: PathBuf,
    node_type: NodeType,
    meta: FileMeta,
}

/// List a directory and read each entry's metadata without following symlinks.
fn read_entries(dir: &Path) -> Result<Vec<Entry>> {
    let listing = fs::read_dir(dir).map_err(|e| AppError::fs(FsOp::List, dir, e))?;
    let mut entries = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| AppError::fs(FsOp::List, dir, e))?;
        let path = entry.path();
        let metadata =
            fs::symlink_metadata(&path).map_err(|e| AppError::fs(FsOp::Metadata, &path, e))?;
        entries.push(Entry {
            file_name: entry.file_name(),
            node_type: NodeType::from_file_type(metadata.file_type()),
            meta: FileMeta::from_metadata(&metadata),
            path,
        });
    }
    Ok(entries)
}

/// Sibling ordering used when a directory is loaded.
pub type Comparator = Box<dyn Fn(&Node, &Node) -> Ordering>;

/// Sort criteria for the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Alphabetical (case-insensitive), default.
    Name,
    /// By file size (largest first).
    Size,
    /// By modification time (newest first).
    Modified,
}

impl SortBy {
    /// Parse sort_by from config string.
    pub fn from_config(s: &str) -> Self {
        match s {
            "size" => SortBy::Size,
            "modified" => SortBy::Modified,
            _ => SortBy::Name,
        }
    }

    /// Get the display label for the current sort.
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Name => "Name",
            SortBy::Size => "Size",
            SortBy::Modified => "Modified",
        }
    }

    /// Cycle to the next sort option.
    pub fn next(&self) -> Self {
        match self {
            SortBy::Name => SortBy::Size,
            SortBy::Size => SortBy::Modified,
            SortBy::Modified => SortBy::Name,
        }
    }
}

/// A built-in comparator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub by: SortBy,
    /// Whether directories are listed before files.
    pub dirs_first: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            by: SortBy::Name,
            dirs_first: true,
        }
    }
}

impl SortOrder {
    /// Total order over two siblings. Exact name is the final tie-breaker.
    pub fn compare(&self, a: &Node, b: &Node) -> Ordering {
        let mut cmp = Ordering::Equal;
        if self.dirs_first {
            cmp = b.is_dir().cmp(&a.is_dir());
        }
        cmp.then_with(|| match self.by {
            SortBy::Name => Ordering::Equal,
            SortBy::Size => b.meta.size.cmp(&a.meta.size),
            SortBy::Modified => b.meta.modified.cmp(&a.meta.modified),
        })
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.file_name.cmp(&b.file_name))
    }

    pub fn comparator(self) -> Comparator {
        Box::new(move |a, b| self.compare(a, b))
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Lazily-loaded mirror of a directory subtree.
///
/// The tree owns every node in an arena. Parents own their children through
/// the `children` id lists; the `parent` links are plain back references.
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    current_dir: NodeId,
    /// Path of the marked node. Paths are unique per node, so this refers to
    /// exactly one node without owning it, and outlives collapse and reloads.
    marked: Option<PathBuf>,
    comparator: Comparator,
    ops: Box<dyn FileOps>,
}

impl Tree {
    /// Create a tree with the default sort order and native file operations.
    pub fn new(path: &Path) -> Result<Self> {
        Self::with_options(path, SortOrder::default().comparator(), Box::new(NativeOps))
    }

    /// Create a tree rooted at `path`, reading its first level.
    ///
    /// Fails if the root is not a directory or has no entries.
    pub fn with_options(path: &Path, comparator: Comparator, ops: Box<dyn FileOps>) -> Result<Self> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| AppError::fs(FsOp::Metadata, path, e))?;
        if !metadata.is_dir() {
            return Err(AppError::NotADirectory(path.to_path_buf()));
        }
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        let root_node = Node::new(
            file_name,
            path.to_path_buf(),
            NodeType::Directory,
            FileMeta::from_metadata(&metadata),
        );
        let root = NodeId {
            index: 0,
            generation: 0,
        };

        let mut tree = Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root_node),
            }],
            free: Vec::new(),
            root,
            current_dir: root,
            marked: None,
            comparator,
            ops,
        };
        tree.load_children(root)?;
        if tree.node(root).children().map_or(true, <[NodeId]>::is_empty) {
            return Err(AppError::EmptyDirectory(path.to_path_buf()));
        }
        tracing::info!(root = %path.display(), "tree initialized");
        Ok(tree)
    }

    // ── Arena ────────────────────────────────────────────────────────────

    /// Look up a node; `None` if the handle is stale.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Access a node known to be live (root, current dir, or a loaded child).
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id).expect("node handle refers to a released node")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.get_mut(id)
            .expect("node handle refers to a released node")
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Free `id` and its whole loaded subtree.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                if let Some(children) = node.children {
                    stack.extend(children);
                }
            }
        }
    }

    fn sort_ids(&self, ids: &mut [NodeId]) {
        ids.sort_by(|a, b| (self.comparator)(self.node(*a), self.node(*b)));
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Read (or re-read) a directory's children.
    ///
    /// Children whose name and kind survive the re-read keep their handle,
    /// expansion state and selection; only their metadata is refreshed.
    /// Entries gone from disk are released. Any listing or metadata error
    /// aborts before the node is touched. No-op for non-directories.
    pub fn load_children(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id);
        if node.node_type != NodeType::Directory {
            return Ok(());
        }
        let dir_path = node.path.clone();
        let entries = read_entries(&dir_path)?;

        let mut existing: HashMap<OsString, NodeId> = node
            .children
            .iter()
            .flatten()
            .map(|&child| (self.node(child).file_name.clone(), child))
            .collect();

        let mut children = Vec::with_capacity(entries.len());
        let mut reused = 0usize;
        for entry in entries {
            match existing.remove(&entry.file_name) {
                Some(child) if self.node(child).node_type == entry.node_type => {
                    self.node_mut(child).meta = entry.meta;
                    children.push(child);
                    reused += 1;
                }
                replaced => {
                    if let Some(old) = replaced {
                        self.release(old);
                    }
                    let mut fresh =
                        Node::new(entry.file_name, entry.path, entry.node_type, entry.meta);
                    fresh.parent = Some(id);
                    children.push(self.alloc(fresh));
                }
            }
        }
        let dropped = existing.len();
        for (_, stale) in existing {
            self.release(stale);
        }

        self.sort_ids(&mut children);
        let len = children.len();
        let node = self.node_mut(id);
        node.children = Some(children);
        node.selected = node.selected.min(len.saturating_sub(1));

        tracing::debug!(
            dir = %dir_path.display(),
            entries = len,
            reused,
            dropped,
            "directory loaded"
        );
        Ok(())
    }

    /// Forget a directory's children, releasing the subtree.
    ///
    /// Returns `false` (and does nothing) when `id` is the current directory
    /// or one of its ancestors, since the current directory must stay loaded.
    pub fn collapse(&mut self, id: NodeId) -> bool {
        if self.is_ancestor_or_self(id, self.current_dir) {
            tracing::debug!("refusing to collapse the current directory or its ancestor");
            return false;
        }
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if let Some(children) = node.children.take() {
            for child in children {
                self.release(child);
            }
        }
        true
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(Node::parent);
        }
        false
    }

    /// Replace the sibling ordering and re-sort every loaded directory.
    ///
    /// Each directory keeps the same selected node.
    pub fn set_comparator(&mut self, comparator: Comparator) {
        self.comparator = comparator;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            let Some(mut children) = node.children.clone() else {
                continue;
            };
            let selected = children.get(node.selected).copied();
            self.sort_ids(&mut children);
            stack.extend(children.iter().copied());
            let node = self.node_mut(id);
            if let Some(selected) = selected {
                node.selected = children.iter().position(|&c| c == selected).unwrap_or(0);
            }
            node.children = Some(children);
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn current_dir(&self) -> NodeId {
        self.current_dir
    }

    /// Path of the marked node, if any.
    pub fn marked(&self) -> Option<&Path> {
        self.marked.as_deref()
    }

    pub fn is_marked(&self, id: NodeId) -> bool {
        match (&self.marked, self.get(id)) {
            (Some(marked), Some(node)) => node.path == *marked,
            _ => false,
        }
    }

    /// Find a loaded node by path.
    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        let rel = path.strip_prefix(&self.node(self.root).path).ok()?;
        let mut id = self.root;
        for component in rel.components() {
            let name = component.as_os_str();
            id = self
                .node(id)
                .children
                .as_ref()?
                .iter()
                .copied()
                .find(|&child| self.node(child).file_name.as_os_str() == name)?;
        }
        Some(id)
    }

    /// Deepest loaded directory on the way from the root to `path`.
    fn nearest_loaded_ancestor(&self, path: &Path) -> NodeId {
        let mut best = self.root;
        let Ok(rel) = path.strip_prefix(&self.node(self.root).path) else {
            return best;
        };
        let mut id = self.root;
        for component in rel.components() {
            let name = component.as_os_str();
            let Some(children) = self.node(id).children.as_ref() else {
                break;
            };
            match children
                .iter()
                .copied()
                .find(|&child| self.node(child).file_name.as_os_str() == name)
            {
                Some(next) => id = next,
                None => break,
            }
            if self.node(id).is_loaded() {
                best = id;
            }
        }
        best
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// The child of the current directory under the cursor.
    pub fn selected_child(&self) -> Option<NodeId> {
        let dir = self.node(self.current_dir);
        dir.children.as_ref()?.get(dir.selected).copied()
    }

    fn current_len(&self) -> usize {
        self.node(self.current_dir).children.as_ref().map_or(0, Vec::len)
    }

    /// Move the cursor down one entry. No-op on the last entry.
    pub fn select_next(&mut self) {
        let len = self.current_len();
        let dir = self.node_mut(self.current_dir);
        if dir.selected + 1 < len {
            dir.selected += 1;
        }
    }

    /// Move the cursor up one entry. No-op on the first entry.
    pub fn select_previous(&mut self) {
        let dir = self.node_mut(self.current_dir);
        if dir.selected > 0 {
            dir.selected -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.node_mut(self.current_dir).selected = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        self.node_mut(self.current_dir).selected = len.saturating_sub(1);
    }

    /// Make the selected directory current, reading it first if needed.
    pub fn descend_into_selected(&mut self) -> Result<()> {
        let Some(child) = self.selected_child() else {
            return Ok(());
        };
        let node = self.node(child);
        if !node.is_dir() {
            return Ok(());
        }
        if !node.is_loaded() {
            self.load_children(child)?;
        }
        self.current_dir = child;
        Ok(())
    }

    /// Make the parent current, with its cursor on the directory just left.
    pub fn ascend_to_parent(&mut self) {
        let current = self.node(self.current_dir);
        let Some(parent) = current.parent() else {
            return;
        };
        let name = current.file_name().to_os_string();
        let index = self
            .node(parent)
            .children
            .iter()
            .flatten()
            .position(|&child| self.node(child).file_name.as_os_str() == name);
        if let Some(index) = index {
            self.node_mut(parent).selected = index;
        }
        self.current_dir = parent;
    }

    /// Expand the selected directory in place, or collapse it if expanded.
    pub fn toggle_expand_selected(&mut self) -> Result<()> {
        let Some(child) = self.selected_child() else {
            return Ok(());
        };
        if self.node(child).is_loaded() {
            self.collapse(child);
            Ok(())
        } else {
            self.load_children(child)
        }
    }

    // ── Marking ──────────────────────────────────────────────────────────

    /// Mark the selected child. Returns whether there was anything to mark.
    pub fn mark(&mut self) -> bool {
        match self.selected_child() {
            Some(child) => {
                self.marked = Some(self.node(child).path.clone());
                true
            }
            None => false,
        }
    }

    pub fn unmark(&mut self) {
        self.marked = None;
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Re-read `dir` if it is loaded in the tree, then repair `current_dir`
    /// if the re-read released it.
    fn refresh(&mut self, dir: &Path) -> Result<()> {
        let current_path = self.node(self.current_dir).path.clone();
        if let Some(id) = self.find_by_path(dir) {
            if self.node(id).is_loaded() {
                self.load_children(id)?;
            }
        }
        if !self.contains(self.current_dir) {
            self.current_dir = self.nearest_loaded_ancestor(&current_path);
            tracing::info!(
                lost = %current_path.display(),
                now = %self.node(self.current_dir).path.display(),
                "current directory vanished, moved to nearest ancestor"
            );
        }
        Ok(())
    }

    /// Rename the marked node within its directory.
    pub fn rename_marked(&mut self, new_name: &str) -> Result<()> {
        let Some(marked) = self.marked.clone() else {
            return Ok(());
        };
        let Some(parent_dir) = marked.parent() else {
            return Ok(());
        };
        let target = operations::child_path(parent_dir, new_name)?;
        self.ops.rename(&marked, &target)?;
        tracing::info!(from = %marked.display(), to = %target.display(), "renamed");
        self.marked = None;
        self.refresh(parent_dir)
    }

    /// Create an empty file in the current directory.
    pub fn create_file(&mut self, name: &str) -> Result<()> {
        let dir = self.node(self.current_dir).path.clone();
        let path = operations::child_path(&dir, name)?;
        self.ops.create_file(&path)?;
        tracing::info!(path = %path.display(), "file created");
        self.refresh(&dir)
    }

    /// Create a directory in the current directory.
    pub fn create_directory(&mut self, name: &str) -> Result<()> {
        let dir = self.node(self.current_dir).path.clone();
        let path = operations::child_path(&dir, name)?;
        self.ops.create_dir(&path)?;
        tracing::info!(path = %path.display(), "directory created");
        self.refresh(&dir)
    }

    /// Recursively delete the marked node.
    pub fn delete_marked(&mut self) -> Result<()> {
        let Some(marked) = self.marked.clone() else {
            return Ok(());
        };
        self.ops.remove_all(&marked)?;
        tracing::info!(path = %marked.display(), "deleted");
        self.marked = None;
        match marked.parent() {
            Some(parent_dir) => self.refresh(parent_dir),
            None => Ok(()),
        }
    }

    /// Copy the marked node into the current directory under a free name.
    pub fn copy_marked_into_current(&mut self) -> Result<()> {
        let Some((marked, dest)) = self.transfer_target(FsOp::Copy)? else {
            return Ok(());
        };
        // The mark goes once the primitive has run, whatever its outcome.
        self.marked = None;
        self.ops.copy_all(&marked, &dest)?;
        tracing::info!(from = %marked.display(), to = %dest.display(), "copied");
        let target_dir = self.node(self.current_dir).path.clone();
        self.refresh(&target_dir)
    }

    /// Move the marked node into the current directory under a free name.
    pub fn move_marked_into_current(&mut self) -> Result<()> {
        let Some((marked, dest)) = self.transfer_target(FsOp::Move)? else {
            return Ok(());
        };
        self.marked = None;
        self.ops.move_to(&marked, &dest)?;
        tracing::info!(from = %marked.display(), to = %dest.display(), "moved");
        let target_dir = self.node(self.current_dir).path.clone();
        self.refresh(&target_dir)?;
        match marked.parent() {
            Some(source_dir) => self.refresh(source_dir),
            None => Ok(()),
        }
    }

    /// Source and collision-free destination for copy/move, checked before
    /// anything on disk changes.
    fn transfer_target(&self, op: FsOp) -> Result<Option<(PathBuf, PathBuf)>> {
        let Some(marked) = self.marked.clone() else {
            return Ok(None);
        };
        let target_dir = &self.node(self.current_dir).path;
        if target_dir.starts_with(&marked) {
            return Err(AppError::fs(
                op,
                &marked,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "cannot place a directory inside itself",
                ),
            ));
        }
        let name = marked
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::InvalidName(marked.display().to_string()))?;
        let dest_name = operations::collision_free_name(&name, target_dir)?;
        let dest = target_dir.join(dest_name);
        Ok(Some((marked, dest)))
    }
}
