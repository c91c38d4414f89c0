//! Site definition service
//!
//! Loads and saves TOML site files describing templates and pages.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, FormatResultExt, IoResultExt};
use crate::domain::{PageArena, PageData, PageTree, Region, Template, TemplateRegistry};
use crate::infrastructure::traits::FileSystem;

/// Region entry of a template definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionDef {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherited: bool,
}

/// Template entry of a site file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateDef {
    /// Defaults to `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub first_level_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_children: bool,
}

impl From<TemplateDef> for Template {
    fn from(def: TemplateDef) -> Self {
        let mut template = Template::new(def.title, def.path)
            .unique(def.unique)
            .first_level_only(def.first_level_only)
            .no_children(def.no_children);
        if let Some(key) = def.key {
            template = template.with_key(key);
        }
        if let Some(image) = def.preview_image {
            template = template.with_preview_image(image);
        }
        for region in def.regions {
            let mut r = Region::new(region.key, region.title);
            if region.inherited {
                r = r.inherited();
            }
            template = template.with_region(r);
        }
        template
    }
}

impl From<&Template> for TemplateDef {
    fn from(template: &Template) -> Self {
        Self {
            key: (template.key != template.path).then(|| template.key.clone()),
            title: template.title.clone(),
            path: template.path.clone(),
            regions: template
                .regions
                .iter()
                .map(|r| RegionDef {
                    key: r.key.clone(),
                    title: r.title.clone(),
                    inherited: r.inherited,
                })
                .collect(),
            preview_image: template.preview_image.clone(),
            unique: template.unique,
            first_level_only: template.first_level_only,
            no_children: template.no_children,
        }
    }
}

fn default_editable() -> bool {
    true
}

fn is_editable(editable: &bool) -> bool {
    *editable
}

/// Page entry of a site file. Parents are referenced by slug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageDef {
    pub slug: String,
    pub title: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_editable", skip_serializing_if = "is_editable")]
    pub editable: bool,
}

/// On-disk site definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteFile {
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
    #[serde(default)]
    pub pages: Vec<PageDef>,
}

/// Templates and pages of a loaded site.
#[derive(Debug, Clone)]
pub struct Site {
    pub registry: Arc<TemplateRegistry>,
    pub tree: PageArena,
}

impl Site {
    /// Build registry and tree from a parsed site file.
    ///
    /// Pages may appear before their parents; unresolved parents and cycles
    /// are reported with the offending slug.
    pub fn from_file(file: SiteFile, path: &Path) -> ApplicationResult<Self> {
        let site_err = |message: String| ApplicationError::Site {
            path: path.to_path_buf(),
            message,
        };

        let mut registry = TemplateRegistry::new();
        for def in file.templates {
            registry
                .register(def.into())
                .map_err(|e| site_err(e.to_string()))?;
        }

        let known: HashSet<&str> = file.pages.iter().map(|p| p.slug.as_str()).collect();
        let mut tree = PageArena::new();
        let mut pending: Vec<&PageDef> = file.pages.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for def in pending {
                let parent = match &def.parent {
                    None => None,
                    Some(slug) => match tree.find_by_slug(slug) {
                        Some(id) => Some(id),
                        None if known.contains(slug.as_str()) => {
                            deferred.push(def);
                            continue;
                        }
                        None => {
                            return Err(site_err(format!(
                                "page {} references unknown parent {}",
                                def.slug, slug
                            )))
                        }
                    },
                };
                let mut data = PageData::new(&def.title, &def.slug, &def.template);
                data.editable = def.editable;
                tree.insert_page(data, parent)
                    .map_err(|e| site_err(e.to_string()))?;
            }
            if deferred.len() == before {
                return Err(site_err(format!(
                    "parent cycle involving page {}",
                    deferred[0].slug
                )));
            }
            pending = deferred;
        }

        Ok(Self {
            registry: Arc::new(registry),
            tree,
        })
    }

    /// Serializable form, pages in tree order so parents precede children.
    pub fn to_file(&self) -> SiteFile {
        let templates = self.registry.iter().map(TemplateDef::from).collect();
        let pages = self
            .tree
            .iter()
            .map(|(_, page)| PageDef {
                slug: page.data.slug.clone(),
                title: page.data.title.clone(),
                template: page.data.template_key.clone(),
                parent: page
                    .parent
                    .and_then(|p| self.tree.page(p))
                    .map(|p| p.data.slug.clone()),
                editable: page.data.editable,
            })
            .collect();
        SiteFile { templates, pages }
    }
}

/// Service for reading and writing site files.
pub struct SiteService {
    fs: Arc<dyn FileSystem>,
}

impl SiteService {
    /// Create a new site service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load a site definition from `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Site> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read site file", path)?;
        let file: SiteFile = toml::from_str(&content).site_context(path)?;
        let site = Site::from_file(file, path)?;
        debug!(
            "loaded {} templates, {} pages",
            site.registry.len(),
            site.tree.len()
        );
        Ok(site)
    }

    /// Write `site` to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, site))]
    pub fn save(&self, path: &Path, site: &Site) -> ApplicationResult<PathBuf> {
        let content = toml::to_string_pretty(&site.to_file()).site_context(path)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write site file", path)?;
        Ok(path.to_path_buf())
    }
}
