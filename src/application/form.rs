//! Page edit form with template filtering and placement re-validation.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::{
    DomainError, DomainResult, PageData, PageId, PageTree, PlacementError, PlacementValidator,
};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_PARENT: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const DUPLICATE_SLUG: &str = "Page with this Slug already exists.";

/// Fields of the page form that can carry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Title,
    Slug,
    TemplateKey,
    Parent,
}

impl FormField {
    pub fn name(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Slug => "slug",
            FormField::TemplateKey => "template_key",
            FormField::Parent => "parent",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field errors collected while cleaning a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<FormField, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: FormField) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &[String])> {
        self.0.iter().map(|(f, m)| (*f, m.as_slice()))
    }

    pub fn fields(&self) -> Vec<FormField> {
        self.0.keys().copied().collect()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .join("; ");
        f.write_str(&rendered)
    }
}

/// A selectable template option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChoice {
    pub key: String,
    pub label: String,
}

/// Raw values posted by an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSubmission {
    pub title: String,
    pub slug: String,
    pub template_key: String,
    pub parent: Option<PageId>,
    pub editable: bool,
}

impl PageSubmission {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        template_key: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            template_key: template_key.into(),
            parent: None,
            editable: true,
        }
    }

    pub fn with_parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Values that survived cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPage {
    pub data: PageData,
    pub parent: Option<PageId>,
}

/// Outcome of [`PageForm::clean`]: cleaned values plus field errors.
///
/// A rejected parent is dropped from `cleaned`, so even a caller that
/// ignores `errors` cannot persist the invalid relationship.
#[derive(Debug, Clone)]
pub struct BoundForm {
    pub cleaned: CleanedPage,
    pub errors: FormErrors,
}

impl BoundForm {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<CleanedPage, FormErrors> {
        if self.errors.is_empty() {
            Ok(self.cleaned)
        } else {
            Err(self.errors)
        }
    }
}

/// User-facing message for a parent rejected on submission.
pub fn parent_error_message(error: &PlacementError) -> String {
    match error {
        PlacementError::TemplateInUse { .. } => "Template already used somewhere else".into(),
        PlacementError::NotAllowedAsChild { .. } => {
            "This template can't be used as a subpage".into()
        }
        PlacementError::ParentCannotHaveChildren => "This parent page can't have subpages".into(),
        PlacementError::DepthExceeded { max } => format!("Only {max} levels allowed"),
    }
}

/// Message for a template key that is not among the offered choices.
pub fn invalid_choice_message(key: &str) -> String {
    format!("Select a valid choice. {key} is not one of the available choices.")
}

/// Page form bound to a tree snapshot.
///
/// Only templates valid for the instance and its (initial) parent are
/// offered as choices.
pub struct PageForm<'a> {
    validator: &'a PlacementValidator,
    tree: &'a dyn PageTree,
    instance: Option<PageId>,
    choices: Vec<TemplateChoice>,
}

impl<'a> PageForm<'a> {
    /// Build the form. Without `initial_parent` the instance's current
    /// parent is used for template filtering.
    #[instrument(level = "debug", skip(validator, tree))]
    pub fn new(
        validator: &'a PlacementValidator,
        tree: &'a dyn PageTree,
        instance: Option<PageId>,
        initial_parent: Option<PageId>,
    ) -> DomainResult<Self> {
        let parent = match (initial_parent, instance) {
            (Some(p), _) => Some(p),
            (None, Some(id)) => tree.require(id)?.parent,
            (None, None) => None,
        };

        let choices = validator
            .allowed_templates(tree, instance, parent)?
            .into_iter()
            .map(|template| TemplateChoice {
                key: template.key.clone(),
                label: match &template.preview_image {
                    Some(image) => format!(
                        r#"<img src="{}" alt="{}" /> {}"#,
                        image, template.key, template.title
                    ),
                    None => template.title.clone(),
                },
            })
            .collect::<Vec<_>>();
        debug!(
            "template choices: {}",
            choices.iter().map(|c| c.key.as_str()).join(", ")
        );

        Ok(Self {
            validator,
            tree,
            instance,
            choices,
        })
    }

    pub fn choices(&self) -> &[TemplateChoice] {
        &self.choices
    }

    /// Key of the first choice, preselected on new pages.
    pub fn default_template(&self) -> Option<&str> {
        self.choices.first().map(|c| c.key.as_str())
    }

    /// Validate a submission.
    ///
    /// Field-level checks run first; placement checks only run when those
    /// pass and a parent was submitted.
    #[instrument(level = "debug", skip(self))]
    pub fn clean(&self, submission: PageSubmission) -> DomainResult<BoundForm> {
        let mut errors = FormErrors::default();
        let mut parent = submission.parent;

        if submission.title.trim().is_empty() {
            errors.add(FormField::Title, REQUIRED);
        }
        if submission.slug.trim().is_empty() {
            errors.add(FormField::Slug, REQUIRED);
        } else if self.slug_taken(&submission.slug) {
            errors.add(FormField::Slug, DUPLICATE_SLUG);
        }
        if !self.choices.iter().any(|c| c.key == submission.template_key) {
            errors.add(
                FormField::TemplateKey,
                invalid_choice_message(&submission.template_key),
            );
        }
        if let Some(p) = parent {
            let below_instance = self
                .instance
                .is_some_and(|instance| self.tree.is_descendant_of(p, instance));
            if self.tree.page(p).is_none() || below_instance {
                errors.add(FormField::Parent, INVALID_PARENT);
                parent = None;
            }
        }

        if errors.is_empty() {
            if let Some(p) = parent {
                let template = self.validator.registry().require(&submission.template_key)?;
                match self
                    .validator
                    .validate_placement(self.tree, template, self.instance, Some(p))
                {
                    Ok(()) => {}
                    Err(DomainError::Placement(e)) => {
                        debug!("parent rejected: {}", e);
                        errors.add(FormField::Parent, parent_error_message(&e));
                        parent = None;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let mut data = PageData::new(submission.title, submission.slug, submission.template_key);
        data.editable = submission.editable;
        Ok(BoundForm {
            cleaned: CleanedPage { data, parent },
            errors,
        })
    }

    fn slug_taken(&self, slug: &str) -> bool {
        self.tree
            .pages()
            .any(|(id, page)| Some(id) != self.instance && page.data.slug == slug)
    }
}
