//! `tk tree`: draw the hierarchy below a record.
//!
//! Records with several parents appear once under each of them and are
//! marked `*`. A record already on the current path is printed with a
//! cycle marker and not expanded again.

use std::collections::HashSet;
use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use thicket_core::{Hierarchy, ROOT_UID};

use crate::cmd::{Session, require};
use crate::output::render;

/// Arguments for `tk tree`.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Record to start from. Defaults to the root.
    #[arg(default_value = ROOT_UID)]
    pub uid: String,

    /// Maximum depth below the starting record (default and ceiling: 512).
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TreeNode {
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shared: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,
    /// Children not expanded because of the depth limit.
    #[serde(skip_serializing_if = "is_zero")]
    pub hidden: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Deepest level ever expanded. Nodes nest, so building, drawing and
/// serializing all recurse once per level.
pub const MAX_DEPTH: usize = 512;

/// Build the tree below `uid`, at most `depth` levels deep (clamped to
/// [`MAX_DEPTH`]). Returns `None` when `uid` does not resolve.
pub fn build_tree(store: &Hierarchy, uid: &str, depth: Option<usize>) -> Option<TreeNode> {
    let limit = depth.map_or(MAX_DEPTH, |depth| depth.min(MAX_DEPTH));
    let mut path = HashSet::new();
    build_node(store, uid, limit, 0, &mut path)
}

fn build_node(
    store: &Hierarchy,
    uid: &str,
    depth_limit: usize,
    depth: usize,
    path: &mut HashSet<String>,
) -> Option<TreeNode> {
    let record = store.get(uid)?;
    let mut node = TreeNode {
        uid: record.uid().to_string(),
        name: record.name.clone(),
        shared: record.parents().len() > 1,
        cycle: false,
        hidden: 0,
        children: Vec::new(),
    };

    if path.contains(uid) {
        node.cycle = true;
        return Some(node);
    }

    if depth >= depth_limit {
        node.hidden = store.children_of(uid).len();
        return Some(node);
    }

    path.insert(uid.to_string());
    node.children = record
        .children()
        .iter()
        .filter_map(|child| build_node(store, child, depth_limit, depth + 1, path))
        .collect();
    path.remove(uid);

    Some(node)
}

/// Draw a tree with box-drawing connectors.
pub fn write_tree(w: &mut dyn Write, node: &TreeNode) -> io::Result<()> {
    writeln!(w, "{}", label(node))?;
    write_children(w, &node.children, "")
}

fn write_children(w: &mut dyn Write, nodes: &[TreeNode], prefix: &str) -> io::Result<()> {
    let count = nodes.len();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });

        writeln!(w, "{prefix}{connector}{}", label(node))?;
        if node.hidden > 0 {
            writeln!(
                w,
                "{child_prefix}└── … {} more (use --depth to increase)",
                node.hidden
            )?;
        }
        write_children(w, &node.children, &child_prefix)?;
    }
    Ok(())
}

fn label(node: &TreeNode) -> String {
    let mut out = if node.uid == node.name {
        node.uid.clone()
    } else {
        format!("{} ({})", node.uid, node.name)
    };
    if node.shared {
        out.push_str(" *");
    }
    if node.cycle {
        out.push_str(" [cycle]");
    }
    out
}

pub fn run_tree(args: &TreeArgs, session: &Session) -> anyhow::Result<()> {
    let workspace = session.open()?;
    require(&workspace.store, &args.uid, session.output)?;
    let Some(tree) = build_tree(&workspace.store, &args.uid, args.depth) else {
        anyhow::bail!("record not found: {}", args.uid);
    };
    render(session.output, &tree, |t, w| write_tree(w, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Hierarchy {
        let mut store = Hierarchy::new();
        store.add("src", None).expect("add");
        store.add("docs", None).expect("add");
        store.add(vec!["main", "lib"], Some("src")).expect("add");
        store.add_parent("lib", "docs", false);
        store
    }

    fn draw(node: &TreeNode) -> String {
        let mut buf = Vec::new();
        write_tree(&mut buf, node).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn shared_records_appear_under_each_parent() {
        let tree = build_tree(&store(), ROOT_UID, None).expect("tree");
        assert_eq!(
            draw(&tree),
            "root\n├── src\n│   ├── main\n│   └── lib *\n└── docs\n    └── lib *\n"
        );
    }

    #[test]
    fn depth_limit_counts_hidden_children() {
        let tree = build_tree(&store(), ROOT_UID, Some(1)).expect("tree");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].hidden, 2);
        assert!(draw(&tree).contains("… 2 more"));
    }

    #[test]
    fn cycles_are_marked_not_expanded() {
        let mut store = store();
        store.add_parent("src", "main", false);
        let tree = build_tree(&store, "src", None).expect("tree");
        let main = &tree.children[0];
        assert_eq!(main.uid, "main");
        assert_eq!(main.children.len(), 1);
        assert!(main.children[0].cycle);
        assert!(main.children[0].children.is_empty());
    }

    #[test]
    fn deep_chains_stop_at_the_depth_ceiling() {
        let mut store = Hierarchy::new();
        let mut prev = store.add("n0", None).expect("add").remove(0);
        for i in 1..(MAX_DEPTH * 4) {
            prev = store
                .add(format!("n{i}").as_str(), Some(prev.as_str()))
                .expect("add")
                .remove(0);
        }

        let tree = build_tree(&store, ROOT_UID, Some(usize::MAX)).expect("tree");
        let mut node = &tree;
        let mut levels = 0;
        while let Some(child) = node.children.first() {
            node = child;
            levels += 1;
        }
        assert_eq!(levels, MAX_DEPTH);
        assert_eq!(node.hidden, 1);
        assert!(draw(&tree).ends_with("… 1 more (use --depth to increase)\n"));
    }

    #[test]
    fn unknown_start_has_no_tree() {
        assert!(build_tree(&store(), "ghost", None).is_none());
    }
}
