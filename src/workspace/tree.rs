//! Directory tree rendering for the prompt.

use std::collections::BTreeMap;

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
}

impl Node {
    fn insert(&mut self, path: &str) {
        let mut node = self;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.children.entry(part.to_string()).or_default();
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        for (name, child) in &self.children {
            out.push_str(&"    ".repeat(depth));
            out.push_str(name);
            out.push('\n');
            child.render(depth + 1, out);
        }
    }
}

/// Render paths as an indented tree, four spaces per level, names sorted.
pub fn render_tree<I, S>(paths: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = Node::default();
    for path in paths {
        root.insert(path.as_ref());
    }
    let mut out = String::new();
    root.render(0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree_nests_and_sorts() {
        let tree = render_tree(["src/main.rs", "README.md", "src/api/mod.rs", "Cargo.toml"]);
        assert_eq!(
            tree,
            "Cargo.toml\nREADME.md\nsrc\n    api\n        mod.rs\n    main.rs\n"
        );
    }

    #[test]
    fn test_render_tree_merges_shared_prefixes() {
        let tree = render_tree(["a/b/c.txt", "a/b/d.txt", "a/e.txt"]);
        assert_eq!(tree, "a\n    b\n        c.txt\n        d.txt\n    e.txt\n");
    }

    #[test]
    fn test_render_tree_empty() {
        assert_eq!(render_tree(Vec::<String>::new()), "");
    }
}
