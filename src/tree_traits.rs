//! termtree rendering of the page tree
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::application::services::PageAdmin;
use crate::domain::{Page, PageArena};

pub trait TreeNodeConvert {
    /// One tree per root page, children in sibling order.
    fn to_tree_string(&self) -> Vec<Tree<String>>;
}

impl TreeNodeConvert for PageArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Vec<Tree<String>> {
        fn build_tree(arena: &PageArena, page: &Page) -> Tree<String> {
            let leaves = page
                .children
                .iter()
                .filter_map(|&child| arena.get(child).map(|c| build_tree(arena, c)));
            Tree::new(page_label(page)).with_leaves(leaves)
        }

        self.roots()
            .iter()
            .filter_map(|&id| self.get(id).map(|page| build_tree(self, page)))
            .collect()
    }
}

impl TreeNodeConvert for PageAdmin {
    fn to_tree_string(&self) -> Vec<Tree<String>> {
        self.tree().to_tree_string()
    }
}

fn page_label(page: &Page) -> String {
    let mut label = format!("{} [{}]", page.data.slug, page.data.template_key);
    if !page.data.editable {
        label.push_str(" (locked)");
    }
    label
}

/// Template flags as a comma separated list, empty if none are set.
pub fn flag_list(flags: &[&str]) -> String {
    flags.iter().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageData;

    #[test]
    fn given_nested_pages_when_rendering_then_children_are_indented() {
        let mut arena = PageArena::new();
        let home = arena
            .insert_page(PageData::new("Home", "home", "homepage"), None)
            .unwrap();
        arena
            .insert_page(PageData::new("Team", "team", "internalpage"), Some(home))
            .unwrap();
        arena
            .insert_page(PageData::new("About", "about", "internalpage"), None)
            .unwrap();

        let trees = arena.to_tree_string();

        assert_eq!(trees.len(), 2);
        let rendered = trees[0].to_string();
        assert!(rendered.starts_with("home [homepage]"), "{rendered}");
        assert!(rendered.contains("└── team [internalpage]"), "{rendered}");
        assert_eq!(trees[1].to_string().trim_end(), "about [internalpage]");
    }

    #[test]
    fn given_locked_page_when_rendering_then_marks_it() {
        let mut arena = PageArena::new();
        let id = arena
            .insert_page(PageData::new("Home", "home", "homepage"), None)
            .unwrap();
        arena.data_mut(id).unwrap().editable = false;

        assert_eq!(
            arena.to_tree_string()[0].to_string().trim_end(),
            "home [homepage] (locked)"
        );
    }
}
