use super::*;

#[test]
fn parses_run_command_with_defaults() {
    let cli = Cli::try_parse_from([
        "bezz-cli",
        "run",
        "--company",
        "Acme",
        "--sector",
        "Technology",
        "--tone",
        "bold",
        "--audience",
        "founders",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Run {
            company,
            language,
            description,
            watch,
            ..
        }) => {
            assert_eq!(company, "Acme");
            assert_eq!(language, "en");
            assert!(description.is_empty());
            assert!(!watch);
        }
        other => panic!("expected run command, got {other:?}"),
    }
}

#[test]
fn run_requires_sector() {
    let result = Cli::try_parse_from([
        "bezz-cli", "run", "--company", "Acme", "--tone", "bold", "--audience", "x",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_retry_with_watch() {
    let cli = Cli::try_parse_from(["bezz-cli", "retry", "b-123", "--watch"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Retry { ref id, watch: true }) if id == "b-123"
    ));
}

#[test]
fn parses_status_json() {
    let cli = Cli::try_parse_from(["bezz-cli", "status", "b-1", "--json"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Status { json: true, .. })));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["bezz-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["bezz-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}
