//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{PageAdmin, Site, SiteService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Site file reader/writer
    pub site_service: SiteService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let site_service = SiteService::new(fs.clone());

        Self {
            settings,
            fs,
            site_service,
        }
    }

    /// Path of the configured site file.
    pub fn site_path(&self) -> PathBuf {
        self.settings.site_file.clone()
    }

    /// Load the configured site.
    pub fn load_site(&self) -> InfraResult<Site> {
        let path = self.site_path();
        if !self.fs.exists(&path) {
            return Err(InfraError::io(
                format!("site file not found: {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        Ok(self.site_service.load(&path)?)
    }

    /// Load the configured site into an admin honoring the depth limit.
    pub fn load_admin(&self) -> InfraResult<PageAdmin> {
        let site = self.load_site()?;
        debug!(
            "admin with max navigation level {:?}",
            self.settings.max_navigation_level
        );
        Ok(PageAdmin::new(
            site.registry,
            site.tree,
            self.settings.max_navigation_level,
        ))
    }

    /// Persist the admin's tree back to the configured site file.
    pub fn save_admin(&self, admin: &PageAdmin) -> InfraResult<PathBuf> {
        let site = Site {
            registry: Arc::new(admin.validator().registry().clone()),
            tree: admin.tree().clone(),
        };
        Ok(self.site_service.save(&self.site_path(), &site)?)
    }
}
