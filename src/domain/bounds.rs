//! Placement rules for constrained templates.
//!
//! [`PlacementValidator`] owns the template registry and the optional
//! maximum navigation depth. Every check is evaluated against the tree as it
//! is at call time; nothing is cached between calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::domain::arena::{PageId, PageTree};
use crate::domain::error::{DomainError, DomainResult, PlacementError};
use crate::domain::template::{Template, TemplateRegistry};

/// Evaluates template placement against a page tree.
#[derive(Debug, Clone)]
pub struct PlacementValidator {
    registry: Arc<TemplateRegistry>,
    max_navigation_level: Option<usize>,
}

impl PlacementValidator {
    /// `max_navigation_level` of `None` or `Some(0)` means unlimited.
    pub fn new(registry: Arc<TemplateRegistry>, max_navigation_level: Option<usize>) -> Self {
        Self {
            registry,
            max_navigation_level: max_navigation_level.filter(|&max| max > 0),
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn max_navigation_level(&self) -> Option<usize> {
        self.max_navigation_level
    }

    /// Whether a page at navigation depth `depth` is within bounds.
    pub fn is_depth_valid(&self, depth: usize) -> bool {
        self.max_navigation_level.map_or(true, |max| depth <= max)
    }

    /// Fails if a new child below a page at `parent_level` exceeds the limit.
    pub fn check_depth(&self, parent_level: usize) -> Result<(), PlacementError> {
        self.check_subtree_depth(parent_level + 2)
    }

    /// Fails if a page whose deepest descendant lands at `deepest` is out of bounds.
    pub fn check_subtree_depth(&self, deepest: usize) -> Result<(), PlacementError> {
        match self.max_navigation_level {
            Some(max) if deepest > max => Err(PlacementError::DepthExceeded { max }),
            _ => Ok(()),
        }
    }

    /// Check that `template` may be used by `instance` below `parent`.
    ///
    /// Unique conflicts are reported before first-level violations, which
    /// are reported before no-children violations. A parent whose template
    /// is not registered imposes no constraint.
    ///
    /// # Errors
    /// - [`DomainError::Placement`]: the placement is not allowed
    /// - [`DomainError::PageNotFound`]: `instance` or `parent` is not in the tree
    #[instrument(level = "trace", skip(self, tree, template), fields(template = %template.key))]
    pub fn check(
        &self,
        tree: &dyn PageTree,
        template: &Template,
        instance: Option<PageId>,
        parent: Option<PageId>,
    ) -> DomainResult<()> {
        let instance_page = instance.map(|id| tree.require(id)).transpose()?;
        let parent_page = parent.map(|id| tree.require(id)).transpose()?;

        if template.unique && tree.count_with_template(&template.key, instance) > 0 {
            return Err(PlacementError::TemplateInUse {
                key: template.key.clone(),
            }
            .into());
        }

        if template.first_level_only && parent_page.is_some() {
            return Err(PlacementError::NotAllowedAsChild {
                key: template.key.clone(),
            }
            .into());
        }

        if let Some(parent_page) = parent_page {
            let parent_forbids = self
                .registry
                .get(&parent_page.data.template_key)
                .is_some_and(|t| t.no_children);
            if parent_forbids {
                return Err(PlacementError::ParentCannotHaveChildren.into());
            }
        }

        if let Some(page) = instance_page {
            if template.no_children && !page.children.is_empty() {
                return Err(PlacementError::ParentCannotHaveChildren.into());
            }
        }

        Ok(())
    }

    /// Boolean form of [`check`](Self::check) for filtering.
    ///
    /// Only placement failures map to `false`; lookup errors propagate.
    pub fn is_template_valid(
        &self,
        tree: &dyn PageTree,
        template: &Template,
        instance: Option<PageId>,
        parent: Option<PageId>,
    ) -> DomainResult<bool> {
        match self.check(tree, template, instance, parent) {
            Ok(()) => Ok(true),
            Err(DomainError::Placement(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Template checks followed by the depth check against `parent`.
    ///
    /// The depth check covers the full subtree of `instance`, so moving a
    /// branch cannot push its descendants past the limit.
    #[instrument(level = "debug", skip(self, tree, template), fields(template = %template.key))]
    pub fn validate_placement(
        &self,
        tree: &dyn PageTree,
        template: &Template,
        instance: Option<PageId>,
        parent: Option<PageId>,
    ) -> DomainResult<()> {
        self.check(tree, template, instance, parent)
            .inspect_err(|e| debug!("placement rejected: {}", e))?;
        let Some(parent) = parent else {
            return Ok(());
        };
        let parent_level = tree.require(parent)?.level;
        let height = instance.map_or(1, |id| tree.subtree_height(id).max(1));
        Ok(self.check_subtree_depth(parent_level + 1 + height)?)
    }

    /// Templates usable by `instance` below `parent`, in registration order.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn allowed_templates(
        &self,
        tree: &dyn PageTree,
        instance: Option<PageId>,
        parent: Option<PageId>,
    ) -> DomainResult<Vec<&Template>> {
        let mut allowed = Vec::new();
        for template in self.registry.iter() {
            if self.is_template_valid(tree, template, instance, parent)? {
                allowed.push(template);
            } else {
                trace!("filtered out template {}", template.key);
            }
        }
        Ok(allowed)
    }

    /// Whether a child may be added below `page` at all.
    pub fn can_have_children(&self, tree: &dyn PageTree, page: PageId) -> DomainResult<bool> {
        let page = tree.require(page)?;
        let no_children = self
            .registry
            .get(&page.data.template_key)
            .is_some_and(|t| t.no_children);
        Ok(!no_children && self.is_depth_valid(page.level + 2))
    }

    /// Scan the whole tree for invariant violations.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn audit(&self, tree: &dyn PageTree) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut usage: HashMap<&str, Vec<PageId>> = HashMap::new();

        for (id, page) in tree.pages() {
            let key = page.data.template_key.as_str();
            usage.entry(key).or_default().push(id);

            let Some(template) = self.registry.get(key) else {
                violations.push(Violation::new(id, ViolationKind::UnknownTemplate(key.to_string())));
                continue;
            };
            if template.first_level_only && page.parent.is_some() {
                violations.push(Violation::new(
                    id,
                    PlacementError::NotAllowedAsChild { key: key.to_string() }.into(),
                ));
            }
            if template.no_children && !page.children.is_empty() {
                violations.push(Violation::new(
                    id,
                    PlacementError::ParentCannotHaveChildren.into(),
                ));
            }
            if let Err(e) = self.check_subtree_depth(page.depth()) {
                violations.push(Violation::new(id, e.into()));
            }
        }

        for template in self.registry.iter().filter(|t| t.unique) {
            if let Some(users) = usage.get(template.key.as_str()) {
                // first user in tree order keeps the template
                for &id in users.iter().skip(1) {
                    violations.push(Violation::new(
                        id,
                        PlacementError::TemplateInUse {
                            key: template.key.clone(),
                        }
                        .into(),
                    ));
                }
            }
        }

        debug!("audit found {} violations", violations.len());
        violations
    }
}

/// What an audited page violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Placement(PlacementError),
    UnknownTemplate(String),
}

impl From<PlacementError> for ViolationKind {
    fn from(e: PlacementError) -> Self {
        ViolationKind::Placement(e)
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Placement(e) => write!(f, "{e}"),
            ViolationKind::UnknownTemplate(key) => write!(f, "unknown template: {key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub page: PageId,
    pub kind: ViolationKind,
}

impl Violation {
    fn new(page: PageId, kind: ViolationKind) -> Self {
        Self { page, kind }
    }
}
