//! Page templates and the registry that owns them.

use std::collections::HashMap;
use std::fmt;

use crate::domain::error::{DomainError, DomainResult};

/// A content region a template exposes to editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub key: String,
    pub title: String,
    /// Content falls back to the parent page when the region is empty
    pub inherited: bool,
}

impl Region {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            inherited: false,
        }
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }
}

/// A named page layout together with its placement constraints.
///
/// Built with chained setters and frozen once handed to a
/// [`TemplateRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub key: String,
    pub title: String,
    pub path: String,
    pub regions: Vec<Region>,
    pub preview_image: Option<String>,
    /// At most one page may use this template
    pub unique: bool,
    /// Only root pages may use this template
    pub first_level_only: bool,
    /// Pages using this template may not have children
    pub no_children: bool,
}

impl Template {
    /// Create a template without constraints. The key defaults to `path`.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            key: path.clone(),
            title: title.into(),
            path,
            regions: Vec::new(),
            preview_image: None,
            unique: false,
            first_level_only: false,
            no_children: false,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_preview_image(mut self, image: impl Into<String>) -> Self {
        self.preview_image = Some(image.into());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn first_level_only(mut self, first_level_only: bool) -> Self {
        self.first_level_only = first_level_only;
        self
    }

    pub fn no_children(mut self, no_children: bool) -> Self {
        self.no_children = no_children;
        self
    }

    /// Short flag summary, e.g. `unique,first-level-only`.
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.unique {
            flags.push("unique");
        }
        if self.first_level_only {
            flags.push("first-level-only");
        }
        if self.no_children {
            flags.push("no-children");
        }
        flags
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.key)
    }
}

/// Ordered set of templates keyed by template key.
///
/// Iteration follows registration order, which is also the order in which
/// templates are offered as choices.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
    index: HashMap<String, usize>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Keys must be unique within the registry.
    pub fn register(&mut self, template: Template) -> DomainResult<()> {
        if self.index.contains_key(&template.key) {
            return Err(DomainError::DuplicateTemplate(template.key));
        }
        self.index
            .insert(template.key.clone(), self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    /// Register several templates, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        templates: impl IntoIterator<Item = Template>,
    ) -> DomainResult<()> {
        for template in templates {
            self.register(template)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.index.get(key).map(|&i| &self.templates[i])
    }

    /// Like [`get`](Self::get) but fails with [`DomainError::UnknownTemplate`].
    pub fn require(&self, key: &str) -> DomainResult<&Template> {
        self.get(key)
            .ok_or_else(|| DomainError::UnknownTemplate(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
