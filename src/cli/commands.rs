//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::registry::alternatives;
use crate::application::{ApplicationError, CompiledService};
use crate::cli::args::{Cli, Commands, ConfigCommands, DumpCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, project_config_path, Settings};
use crate::domain::Lifecycle;
use crate::infrastructure::{AppContext, InfraError};

/// Run the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".into()));
    };

    match command {
        Commands::Completion { shell } => {
            completion(*shell);
            Ok(())
        }
        Commands::Config { command } => config_command(cli, command),
        Commands::Dump { command } => {
            let ctx = context(cli)?;
            dump_command(&ctx, command)
        }
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn context(cli: &Cli) -> CliResult<AppContext> {
    let project_dir = project_dir(cli)?;
    let settings = Settings::load(Some(&project_dir))?;
    debug!(?settings, project_dir = %project_dir.display(), "settings loaded");
    Ok(AppContext::new(settings, project_dir))
}

fn completion(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
}

// ============================================================
// dump
// ============================================================

fn dump_command(ctx: &AppContext, command: &DumpCommands) -> CliResult<()> {
    match command {
        DumpCommands::Show { file, service } => dump_show(ctx, file.as_deref(), service.as_deref()),
        DumpCommands::Verify { file } => dump_verify(ctx, file.as_deref()),
        DumpCommands::Types { file } => dump_types(ctx, file.as_deref()),
    }
}

#[instrument(skip(ctx))]
fn dump_show(ctx: &AppContext, file: Option<&Path>, service: Option<&str>) -> CliResult<()> {
    let path = ctx.dump_path(file);
    let container = ctx.dumps.read(&path)?;

    if let Some(id) = service {
        if !container.has(id) {
            let known = container.services().keys().map(String::as_str);
            return Err(ApplicationError::not_found(id, alternatives(id, known)).into());
        }
    }

    output::header(&format!(
        "{} ({} services, fingerprint {}, generated {})",
        path.display(),
        container.services().len(),
        container.fingerprint(),
        container.generated_at().to_rfc3339()
    ));
    for (id, compiled) in container.services() {
        if service.is_some_and(|wanted| wanted != id) {
            continue;
        }
        output::action(id, &describe(compiled));
        for statement in &compiled.statements {
            output::detail(statement);
        }
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn dump_verify(ctx: &AppContext, file: Option<&Path>) -> CliResult<()> {
    let path = ctx.dump_path(file);
    let container = ctx.dumps.read_unverified(&path)?;

    match container.verify_fingerprint() {
        Ok(()) => {
            output::success(&format!(
                "{}: fingerprint {} matches {} services",
                path.display(),
                container.fingerprint(),
                container.services().len()
            ));
            Ok(())
        }
        Err(e) => {
            output::failure(&format!("{}: {}", path.display(), e));
            Err(e.into())
        }
    }
}

#[instrument(skip(ctx))]
fn dump_types(ctx: &AppContext, file: Option<&Path>) -> CliResult<()> {
    let path = ctx.dump_path(file);
    let container = ctx.dumps.read(&path)?;
    for (id, descriptor) in container.provided_services() {
        output::info(&format!("{id}: {descriptor}"));
    }
    Ok(())
}

fn describe(service: &CompiledService) -> String {
    let lifecycle = match service.lifecycle {
        Lifecycle::Shared => "shared",
        Lifecycle::Transient => "transient",
    };
    match &service.type_name {
        Some(type_name) => format!("{type_name} ({lifecycle})"),
        None => format!("? ({lifecycle})"),
    }
}

// ============================================================
// config
// ============================================================

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let ctx = context(cli)?;
            output::info(&ctx.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let project = project_config_path(&project_dir(cli)?);
            match global_config_path() {
                Some(global) => show_path("global", &global),
                None => output::warning("cannot determine global config directory"),
            }
            show_path("project", &project);
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
    }
}

fn show_path(label: &str, path: &Path) {
    if path.exists() {
        output::success(&format!("{label}: {}", path.display()));
    } else {
        output::failure(&format!("{label}: {} (not found)", path.display()));
    }
}
