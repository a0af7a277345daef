//! Integration tests for the dump inspection commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use autowire::application::{Container, ExecutionMode};
use autowire::cli::{execute, Cli};
use autowire::domain::{ClassMetadata, Parameter, ServiceDefinition};
use autowire::exitcode;
use autowire::infrastructure::{DumpStore, RealFileSystem};

fn write_dump(project: &Path) {
    let container = Container::builder()
        .mode(ExecutionMode::Compiled)
        .class(ClassMetadata::new("Mailer").parameter(Parameter::new("logger").typed("Logger")))
        .service(ServiceDefinition::autowired("Logger"))
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap();
    let path = project.join("var/cache/container.toml");
    DumpStore::new(Arc::new(RealFileSystem))
        .write(&path, container.compiled().unwrap())
        .unwrap();
}

fn run(project: &Path, args: &[&str]) -> Result<(), autowire::cli::CliError> {
    let project = project.to_string_lossy();
    let mut argv = vec!["autowire", "-C", project.as_ref()];
    argv.extend_from_slice(args);
    execute(&Cli::try_parse_from(argv).expect("valid arguments"))
}

#[test]
fn given_dump_at_configured_path_when_verifying_then_succeeds() {
    // Arrange
    let project = TempDir::new().unwrap();
    write_dump(project.path());

    // Act & Assert
    run(project.path(), &["dump", "verify"]).unwrap();
    run(project.path(), &["dump", "show", "--service", "mailer"]).unwrap();
    run(project.path(), &["dump", "types"]).unwrap();
}

#[test]
fn given_tampered_dump_when_verifying_then_data_error_exit_code() {
    // Arrange
    let project = TempDir::new().unwrap();
    write_dump(project.path());
    let path = project.path().join("var/cache/container.toml");
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content.replace("Mailer", "Postman")).unwrap();

    // Act
    let err = run(project.path(), &["dump", "verify"]).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_dump_when_showing_then_noinput_exit_code() {
    let project = TempDir::new().unwrap();

    let err = run(project.path(), &["dump", "show"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_unknown_service_when_showing_then_not_found_exit_code() {
    let project = TempDir::new().unwrap();
    write_dump(project.path());

    let err = run(project.path(), &["dump", "show", "--service", "mailr"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
    assert!(err.to_string().contains("did you mean \"mailer\""));
}

#[test]
fn given_no_command_when_executing_then_usage_error() {
    let project = TempDir::new().unwrap();

    let err = run(project.path(), &[]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}
