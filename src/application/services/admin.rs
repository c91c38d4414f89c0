//! Page administration: adding, editing and moving pages under the
//! template placement rules.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::form::{PageForm, PageSubmission};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    DomainError, DomainResult, MovePosition, PageArena, PageId, PageTree, PlacementError,
    PlacementValidator, TemplateRegistry,
};

pub const SERVER_ERROR: &str = "Server Error.";

/// Per-page action shown in the page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Edit,
    AddChild,
    ViewOnSite,
    Delete,
    /// Keeps the column layout where an action was suppressed
    Placeholder,
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PageAction::Edit => "edit",
            PageAction::AddChild => "add-child",
            PageAction::ViewOnSite => "view",
            PageAction::Delete => "delete",
            PageAction::Placeholder => "-",
        };
        f.write_str(s)
    }
}

/// Drag-and-drop move issued from the page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub cut_item: PageId,
    pub pasted_on: PageId,
    pub position: MovePosition,
}

/// A move that was refused; `message` is shown to the editor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MoveRejected {
    pub message: String,
}

impl MoveRejected {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User-facing message for a refused move.
pub fn move_error_message(error: &DomainError) -> String {
    match error {
        DomainError::Placement(PlacementError::NotAllowedAsChild { .. }) => {
            "This page can't be used as subpage.".into()
        }
        DomainError::Placement(PlacementError::ParentCannotHaveChildren) => {
            "This page can't have subpages".into()
        }
        DomainError::Placement(PlacementError::TemplateInUse { .. }) => {
            "Template already used somewhere else".into()
        }
        DomainError::Placement(PlacementError::DepthExceeded { max }) => {
            format!("Only {max} levels allowed")
        }
        _ => SERVER_ERROR.into(),
    }
}

/// Owns a page tree and guards every structural change with a
/// [`PlacementValidator`].
#[derive(Debug, Clone)]
pub struct PageAdmin {
    validator: PlacementValidator,
    tree: PageArena,
}

impl PageAdmin {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        tree: PageArena,
        max_navigation_level: Option<usize>,
    ) -> Self {
        Self {
            validator: PlacementValidator::new(registry, max_navigation_level),
            tree,
        }
    }

    pub fn validator(&self) -> &PlacementValidator {
        &self.validator
    }

    pub fn tree(&self) -> &PageArena {
        &self.tree
    }

    pub fn into_tree(self) -> PageArena {
        self.tree
    }

    /// Look up a page id by slug.
    pub fn page_id(&self, slug: &str) -> ApplicationResult<PageId> {
        self.tree
            .find_by_slug(slug)
            .ok_or_else(|| ApplicationError::UnknownSlug(slug.to_string()))
    }

    /// Form for a new page (`instance` None) or for editing `instance`.
    pub fn form(
        &self,
        instance: Option<PageId>,
        initial_parent: Option<PageId>,
    ) -> DomainResult<PageForm<'_>> {
        PageForm::new(&self.validator, &self.tree, instance, initial_parent)
    }

    /// Validate and insert a new page.
    ///
    /// Template choices are computed without a parent, so a submitted parent
    /// is judged only by the placement checks during cleaning.
    #[instrument(level = "debug", skip(self))]
    pub fn add_page(&mut self, submission: PageSubmission) -> ApplicationResult<PageId> {
        let cleaned = self
            .form(None, None)?
            .clean(submission)?
            .into_result()
            .map_err(ApplicationError::InvalidForm)?;

        let slug = cleaned.data.slug.clone();
        let id = self.tree.insert_page(cleaned.data, cleaned.parent)?;
        info!("added page {} ({})", slug, id);
        Ok(id)
    }

    /// Validate and apply an edit of `page`, reparenting it if needed.
    #[instrument(level = "debug", skip(self))]
    pub fn change_page(&mut self, page: PageId, submission: PageSubmission) -> ApplicationResult<()> {
        let cleaned = self
            .form(Some(page), None)?
            .clean(submission)?
            .into_result()
            .map_err(ApplicationError::InvalidForm)?;

        let current_parent = self.tree.require(page)?.parent;
        if current_parent != cleaned.parent {
            self.tree.reparent(page, cleaned.parent)?;
        }
        if let Some(data) = self.tree.data_mut(page) {
            *data = cleaned.data;
        }
        info!("changed page {}", page);
        Ok(())
    }

    /// Re-validate and perform a tree move.
    ///
    /// Any failure, including lookup errors, aborts the move and leaves the
    /// tree untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, request: MoveRequest) -> Result<(), MoveRejected> {
        match self.try_move(request) {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = move_error_message(&e);
                warn!("move of {} rejected: {} ({})", request.cut_item, message, e);
                Err(MoveRejected::new(message))
            }
        }
    }

    fn try_move(&mut self, request: MoveRequest) -> DomainResult<()> {
        let cut_item = self.tree.require(request.cut_item)?;
        let template = self.validator.registry().require(&cut_item.data.template_key)?;
        let parent = self
            .tree
            .destination_parent(request.pasted_on, request.position)?;
        debug!("destination parent: {:?}", parent);

        self.validator
            .validate_placement(&self.tree, template, Some(request.cut_item), parent)?;
        self.tree
            .move_page(request.cut_item, request.pasted_on, request.position)
    }

    /// Actions for `page`; add-child is replaced by a placeholder when no
    /// child could be added.
    pub fn actions(&self, page: PageId) -> ApplicationResult<Vec<PageAction>> {
        let mut actions = vec![
            PageAction::Edit,
            PageAction::AddChild,
            PageAction::ViewOnSite,
            PageAction::Delete,
        ];
        let editable = self.tree.require(page)?.data.editable;
        if editable && !self.validator.can_have_children(&self.tree, page)? {
            actions[1] = PageAction::Placeholder;
        }
        Ok(actions)
    }
}
