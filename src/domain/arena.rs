use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a page inside a [`PageArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Index);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Data payload for tree nodes representing pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageData {
    pub title: String,
    pub slug: String,
    pub template_key: String,
    /// Non-editable pages keep their default admin actions
    pub editable: bool,
}

impl PageData {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        template_key: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            template_key: template_key.into(),
            editable: true,
        }
    }
}

impl fmt::Display for PageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.slug, self.template_key)
    }
}

/// Tree node in the arena-based page hierarchy.
#[derive(Debug, Clone)]
pub struct Page {
    pub data: PageData,
    /// Parent page, None for root pages
    pub parent: Option<PageId>,
    /// Child pages in display order
    pub children: Vec<PageId>,
    /// Distance from the root, 0 for root pages
    pub level: usize,
}

impl Page {
    /// Navigation depth, 1 for root pages.
    pub fn depth(&self) -> usize {
        self.level + 1
    }
}

/// Where a moved page lands relative to the page it is dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    FirstChild,
    LastChild,
    Left,
    Right,
}

impl MovePosition {
    /// Whether the target becomes the new parent (as opposed to a sibling).
    pub fn is_child(self) -> bool {
        matches!(self, MovePosition::FirstChild | MovePosition::LastChild)
    }
}

impl FromStr for MovePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-child" => Ok(MovePosition::FirstChild),
            "last-child" => Ok(MovePosition::LastChild),
            "left" => Ok(MovePosition::Left),
            "right" => Ok(MovePosition::Right),
            other => Err(format!("unknown move position: {other}")),
        }
    }
}

impl fmt::Display for MovePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovePosition::FirstChild => "first-child",
            MovePosition::LastChild => "last-child",
            MovePosition::Left => "left",
            MovePosition::Right => "right",
        };
        f.write_str(s)
    }
}

/// Read access to a page hierarchy, as needed by placement checks.
///
/// Implemented by [`PageArena`]; other storage backends implement it to
/// reuse the validators.
pub trait PageTree {
    fn page(&self, id: PageId) -> Option<&Page>;

    /// All pages, parents before their children.
    fn pages(&self) -> Box<dyn Iterator<Item = (PageId, &Page)> + '_>;

    fn require(&self, id: PageId) -> DomainResult<&Page> {
        self.page(id).ok_or(DomainError::PageNotFound(id))
    }

    /// Number of pages using `template_key`, not counting `excluding`.
    fn count_with_template(&self, template_key: &str, excluding: Option<PageId>) -> usize {
        self.pages()
            .filter(|(id, page)| Some(*id) != excluding && page.data.template_key == template_key)
            .count()
    }

    /// True if `id` is `ancestor` or lies below it.
    fn is_descendant_of(&self, id: PageId, ancestor: PageId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.page(c).and_then(|page| page.parent);
        }
        false
    }

    /// Levels in the subtree rooted at `id`, 1 for a leaf.
    fn subtree_height(&self, id: PageId) -> usize {
        match self.page(id) {
            Some(page) => {
                1 + page
                    .children
                    .iter()
                    .map(|&child| self.subtree_height(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }
}

/// Arena-based forest of pages.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug, Default, Clone)]
pub struct PageArena {
    arena: Arena<Page>,
    roots: Vec<PageId>,
}

impl PageArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Append a page as last child of `parent`, or as last root page.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_page(&mut self, data: PageData, parent: Option<PageId>) -> DomainResult<PageId> {
        if self.find_by_slug(&data.slug).is_some() {
            return Err(DomainError::DuplicateSlug(data.slug));
        }
        let level = match parent {
            Some(p) => self.require(p)?.level + 1,
            None => 0,
        };
        let page = Page {
            data,
            parent,
            children: Vec::new(),
            level,
        };
        let page_id = PageId(self.arena.insert(page));

        match parent.and_then(|p| self.arena.get_mut(p.0)) {
            Some(parent_page) => parent_page.children.push(page_id),
            None => self.roots.push(page_id),
        }
        Ok(page_id)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.arena.get(id.0)
    }

    /// Mutable access to the page payload. Structure changes go through
    /// [`move_page`](Self::move_page).
    pub fn data_mut(&mut self, id: PageId) -> Option<&mut PageData> {
        self.arena.get_mut(id.0).map(|page| &mut page.data)
    }

    pub fn roots(&self) -> &[PageId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<PageId> {
        self.iter()
            .find(|(_, page)| page.data.slug == slug)
            .map(|(id, _)| id)
    }

    /// Pre-order traversal over all root pages in order.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> PageIterator<'_> {
        PageIterator::new(self)
    }

    /// Deepest navigation depth in the forest, 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.subtree_height(root))
            .max()
            .unwrap_or(0)
    }

    /// Parent the page would have after a move relative to `target`.
    pub fn destination_parent(
        &self,
        target: PageId,
        position: MovePosition,
    ) -> DomainResult<Option<PageId>> {
        let target_page = self.require(target)?;
        Ok(if position.is_child() {
            Some(target)
        } else {
            target_page.parent
        })
    }

    /// Move `id` (with its subtree) relative to `target`.
    ///
    /// Only tree structure is checked here; template constraints are the
    /// caller's concern.
    #[instrument(level = "debug", skip(self))]
    pub fn move_page(&mut self, id: PageId, target: PageId, position: MovePosition) -> DomainResult<()> {
        self.require(id)?;
        let new_parent = self.destination_parent(target, position)?;
        if self.is_descendant_of(target, id) {
            return Err(DomainError::InvalidMove { page: id });
        }

        self.detach(id);

        let siblings = match new_parent {
            Some(p) => &mut self.arena[p.0].children,
            None => &mut self.roots,
        };
        match position {
            MovePosition::FirstChild => siblings.insert(0, id),
            MovePosition::LastChild => siblings.push(id),
            MovePosition::Left | MovePosition::Right => {
                let at = siblings.iter().position(|&s| s == target).unwrap_or(siblings.len());
                let at = if position == MovePosition::Right { at + 1 } else { at };
                siblings.insert(at.min(siblings.len()), id);
            }
        }

        let level = match new_parent {
            Some(p) => self.arena[p.0].level + 1,
            None => 0,
        };
        self.arena[id.0].parent = new_parent;
        self.relevel(id, level);
        debug!("moved {} to {} of {}", id, position, target);
        Ok(())
    }

    /// Move `id` to the end of `parent`'s children, or to the end of the
    /// root pages when `parent` is None.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(&mut self, id: PageId, parent: Option<PageId>) -> DomainResult<()> {
        self.require(id)?;
        match parent {
            Some(p) => self.move_page(id, p, MovePosition::LastChild),
            None => {
                self.detach(id);
                self.roots.push(id);
                self.arena[id.0].parent = None;
                self.relevel(id, 0);
                Ok(())
            }
        }
    }

    fn detach(&mut self, id: PageId) {
        let old_parent = self.arena[id.0].parent;
        let siblings = match old_parent {
            Some(p) => &mut self.arena[p.0].children,
            None => &mut self.roots,
        };
        siblings.retain(|&s| s != id);
    }

    fn relevel(&mut self, id: PageId, level: usize) {
        let mut stack = vec![(id, level)];
        while let Some((current, level)) = stack.pop() {
            let page = &mut self.arena[current.0];
            page.level = level;
            stack.extend(page.children.iter().map(|&child| (child, level + 1)));
        }
    }
}

impl PageTree for PageArena {
    fn page(&self, id: PageId) -> Option<&Page> {
        self.get(id)
    }

    fn pages(&self) -> Box<dyn Iterator<Item = (PageId, &Page)> + '_> {
        Box::new(self.iter())
    }
}

pub struct PageIterator<'a> {
    arena: &'a PageArena,
    stack: Vec<PageId>,
}

impl<'a> PageIterator<'a> {
    fn new(arena: &'a PageArena) -> Self {
        let stack = arena.roots.iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PageIterator<'a> {
    type Item = (PageId, &'a Page);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(page) = self.arena.get(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(page.children.iter().rev().copied());
                return Some((current, page));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(slug: &str) -> PageData {
        PageData::new(slug, slug, "internalpage")
    }

    #[test]
    fn given_nested_pages_when_inserting_then_levels_follow_parents() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        let b = tree.insert_page(page("b"), Some(a)).unwrap();
        let c = tree.insert_page(page("c"), Some(b)).unwrap();

        assert_eq!(tree.get(a).unwrap().level, 0);
        assert_eq!(tree.get(c).unwrap().level, 2);
        assert_eq!(tree.get(c).unwrap().depth(), 3);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.subtree_height(b), 2);
    }

    #[test]
    fn given_existing_slug_when_inserting_then_errors() {
        let mut tree = PageArena::new();
        tree.insert_page(page("a"), None).unwrap();
        let result = tree.insert_page(page("a"), None);
        assert!(matches!(result, Err(DomainError::DuplicateSlug(s)) if s == "a"));
    }

    #[test]
    fn given_forest_when_iterating_then_yields_preorder() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        tree.insert_page(page("a1"), Some(a)).unwrap();
        tree.insert_page(page("b"), None).unwrap();
        tree.insert_page(page("a2"), Some(a)).unwrap();

        let slugs: Vec<_> = tree.iter().map(|(_, p)| p.data.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn given_subtree_when_moving_under_other_root_then_relevels_descendants() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        let a1 = tree.insert_page(page("a1"), Some(a)).unwrap();
        let b = tree.insert_page(page("b"), None).unwrap();
        let b1 = tree.insert_page(page("b1"), Some(b)).unwrap();

        tree.move_page(b, a1, MovePosition::LastChild).unwrap();

        assert_eq!(tree.roots(), &[a]);
        assert_eq!(tree.get(b).unwrap().parent, Some(a1));
        assert_eq!(tree.get(b).unwrap().level, 2);
        assert_eq!(tree.get(b1).unwrap().level, 3);
    }

    #[test]
    fn given_sibling_positions_when_moving_then_orders_around_target() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        let b = tree.insert_page(page("b"), None).unwrap();
        let c = tree.insert_page(page("c"), None).unwrap();

        tree.move_page(c, a, MovePosition::Left).unwrap();
        assert_eq!(tree.roots(), &[c, a, b]);

        tree.move_page(c, b, MovePosition::Right).unwrap();
        assert_eq!(tree.roots(), &[a, b, c]);
    }

    #[test]
    fn given_child_when_reparenting_to_root_then_becomes_last_root() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        let a1 = tree.insert_page(page("a1"), Some(a)).unwrap();
        let b = tree.insert_page(page("b"), None).unwrap();

        tree.reparent(a1, None).unwrap();

        assert_eq!(tree.roots(), &[a, b, a1]);
        assert!(tree.get(a).unwrap().children.is_empty());
        assert_eq!(tree.get(a1).unwrap().level, 0);
    }

    #[test]
    fn given_descendant_target_when_moving_then_rejects() {
        let mut tree = PageArena::new();
        let a = tree.insert_page(page("a"), None).unwrap();
        let a1 = tree.insert_page(page("a1"), Some(a)).unwrap();

        let result = tree.move_page(a, a1, MovePosition::FirstChild);

        assert_eq!(result, Err(DomainError::InvalidMove { page: a }));
        assert_eq!(tree.roots(), &[a]);
    }

    #[test]
    fn given_position_strings_when_parsing_then_maps_to_variants() {
        assert_eq!("last-child".parse::<MovePosition>(), Ok(MovePosition::LastChild));
        assert_eq!("left".parse::<MovePosition>(), Ok(MovePosition::Left));
        assert!("above".parse::<MovePosition>().is_err());
    }
}
