use clap::{CommandFactory, Parser};

use pagebounds::cli::{Cli, Commands};
use pagebounds::domain::MovePosition;

#[test]
fn given_cli_definition_when_asserting_then_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn given_move_args_when_parsing_then_reads_position() {
    let cli = Cli::try_parse_from([
        "pagebounds", "-dd", "move", "team", "about", "--position", "first-child", "--save",
    ])
    .unwrap();

    assert_eq!(cli.debug, 2);
    match cli.command {
        Some(Commands::Move {
            page,
            target,
            position,
            save,
        }) => {
            assert_eq!((page.as_str(), target.as_str()), ("team", "about"));
            assert_eq!(position, MovePosition::FirstChild);
            assert!(save);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn given_unknown_position_when_parsing_then_errors() {
    let result = Cli::try_parse_from(["pagebounds", "move", "a", "b", "--position", "inside"]);

    assert!(result.is_err());
}

#[test]
fn given_move_without_position_when_parsing_then_defaults_to_last_child() {
    let cli = Cli::try_parse_from(["pagebounds", "--site", "s.toml", "move", "a", "b"]).unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Move {
            position: MovePosition::LastChild,
            save: false,
            ..
        })
    ));
    assert_eq!(cli.site.as_deref(), Some(std::path::Path::new("s.toml")));
}
