//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{MoveRequest, PageAdmin};
use crate::application::PageSubmission;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{MovePosition, PageId};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::tree_traits::{flag_list, TreeNodeConvert};

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    let project_dir = project_dir(cli)?;
    debug!("project dir: {}", project_dir.display());

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(&project_dir, command),
        Commands::Audit => cmd_audit(&container(cli, &project_dir)?),
        Commands::Templates { parent, page } => {
            cmd_templates(&container(cli, &project_dir)?, parent.as_deref(), page.as_deref())
        }
        Commands::Add {
            slug,
            title,
            template,
            parent,
            save,
        } => cmd_add(
            &container(cli, &project_dir)?,
            PageArgs {
                slug,
                title,
                template,
                parent: parent.as_deref(),
            },
            *save,
        ),
        Commands::Move {
            page,
            target,
            position,
            save,
        } => cmd_move(&container(cli, &project_dir)?, page, target, *position, *save),
        Commands::Tree => cmd_tree(&container(cli, &project_dir)?),
        Commands::Actions { page } => cmd_actions(&container(cli, &project_dir)?, page),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) if !dir.is_dir() => Err(CliError::InvalidArgs(format!(
            "project directory does not exist: {}",
            dir.display()
        ))),
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine current directory", e))),
    }
}

fn container(cli: &Cli, project_dir: &Path) -> CliResult<ServiceContainer> {
    let mut settings = Settings::load(Some(project_dir))?;
    if let Some(site) = &cli.site {
        settings.site_file = site.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn slug_label(admin: &PageAdmin, id: PageId) -> String {
    admin
        .tree()
        .get(id)
        .map(|p| p.data.slug.clone())
        .unwrap_or_else(|| id.to_string())
}

#[instrument(skip(container))]
fn cmd_audit(container: &ServiceContainer) -> CliResult<()> {
    let admin = container.load_admin()?;
    let violations = admin.validator().audit(admin.tree());

    if violations.is_empty() {
        output::success(&format!("{} pages, no violations", admin.tree().len()));
        return Ok(());
    }

    output::header(&format!("Violations in {}", container.site_path().display()));
    for violation in &violations {
        output::failure(&format!(
            "{}: {}",
            slug_label(&admin, violation.page),
            violation.kind
        ));
    }
    Err(CliError::Violations(violations.len()))
}

#[instrument(skip(container))]
fn cmd_templates(
    container: &ServiceContainer,
    parent: Option<&str>,
    page: Option<&str>,
) -> CliResult<()> {
    let admin = container.load_admin()?;
    let parent = parent.map(|slug| admin.page_id(slug)).transpose()?;
    let page = page.map(|slug| admin.page_id(slug)).transpose()?;

    let form = admin.form(page, parent)?;
    if form.choices().is_empty() {
        output::warning("no template can be used here");
        return Ok(());
    }
    for choice in form.choices() {
        let flags = admin
            .validator()
            .registry()
            .get(&choice.key)
            .map(|t| flag_list(&t.flags()))
            .unwrap_or_default();
        if flags.is_empty() {
            output::info(&format!("{}\t{}", choice.key, choice.label));
        } else {
            output::info(&format!("{}\t{}\t({})", choice.key, choice.label, flags));
        }
    }
    Ok(())
}

struct PageArgs<'a> {
    slug: &'a str,
    title: &'a str,
    template: &'a str,
    parent: Option<&'a str>,
}

#[instrument(skip(container, args))]
fn cmd_add(container: &ServiceContainer, args: PageArgs<'_>, save: bool) -> CliResult<()> {
    let mut admin = container.load_admin()?;
    let mut submission = PageSubmission::new(args.title, args.slug, args.template);
    if let Some(parent) = args.parent {
        submission = submission.with_parent(admin.page_id(parent)?);
    }

    let id = admin.add_page(submission)?;
    let depth = admin.tree().get(id).map(|p| p.depth()).unwrap_or_default();
    output::action("Added", &format!("{} at level {}", args.slug, depth));
    persist(container, &admin, save)
}

#[instrument(skip(container))]
fn cmd_move(
    container: &ServiceContainer,
    page: &str,
    target: &str,
    position: MovePosition,
    save: bool,
) -> CliResult<()> {
    let mut admin = container.load_admin()?;
    let request = MoveRequest {
        cut_item: admin.page_id(page)?,
        pasted_on: admin.page_id(target)?,
        position,
    };

    admin.move_node(request)?;
    output::action("Moved", &format!("{page} {position} {target}"));
    persist(container, &admin, save)
}

fn persist(container: &ServiceContainer, admin: &PageAdmin, save: bool) -> CliResult<()> {
    if save {
        let path = container.save_admin(admin)?;
        output::action("Saved", &path.display());
    } else {
        output::detail(&"not saved, pass --save to write the site file");
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer) -> CliResult<()> {
    let admin = container.load_admin()?;
    let trees = admin.to_tree_string();
    if trees.is_empty() {
        output::warning("site has no pages");
    }
    for tree in trees {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_actions(container: &ServiceContainer, page: &str) -> CliResult<()> {
    let admin = container.load_admin()?;
    let actions = admin.actions(admin.page_id(page)?)?;
    output::info(&actions.iter().join(" "));
    Ok(())
}

fn cmd_config(project_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(project_dir)
            };
            init_config(Arc::new(RealFileSystem), &path)
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => print_config_path("Global", &path),
                None => output::detail(&"Global: (unavailable)"),
            }
            print_config_path("Local", &local_config_path(project_dir));
            Ok(())
        }
    }
}

fn print_config_path(label: &str, path: &Path) {
    let marker = if path.exists() { "exists" } else { "missing" };
    output::detail(&format!("{label}: {} ({marker})", path.display()));
}

fn init_config(fs: Arc<dyn FileSystem>, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::action("Created", &path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::MemoryFileSystem;

    #[test]
    fn given_existing_config_when_init_then_refuses_to_overwrite() {
        let fs = Arc::new(MemoryFileSystem::new().with_file("/p/.pagebounds.toml", "x"));

        let err = init_config(fs, Path::new("/p/.pagebounds.toml")).unwrap_err();

        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn given_no_config_when_init_then_writes_template() {
        let fs = Arc::new(MemoryFileSystem::new());
        let path = Path::new("/p/.pagebounds.toml");

        init_config(fs.clone(), path).unwrap();

        assert_eq!(fs.read_to_string(path).unwrap(), Settings::template());
    }
}
