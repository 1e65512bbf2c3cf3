//! Interactive universe session.
//!
//! Reads one instruction per line from stdin while events stream to stdout.

use aionic_core::{AvatarOptions, FocusTarget, SelectOutcome, UniverseHandle};
use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{render, start_universe};
use crate::config::Config;
use crate::error::{CliError, CliResult};

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Empty,
    Help,
    Quit,
    Status,
    ClosePanel,
    Focus(FocusTarget),
    Avatar(AvatarOptions),
    Select(String),
}

pub fn parse_line(line: &str) -> CliResult<ShellInput> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    Ok(match word.to_ascii_lowercase().as_str() {
        "" => ShellInput::Empty,
        "help" | "?" => ShellInput::Help,
        "quit" | "exit" => ShellInput::Quit,
        "status" => ShellInput::Status,
        "close" => ShellInput::ClosePanel,
        "focus" if !rest.is_empty() => ShellInput::Focus(FocusTarget::parse(rest)),
        "focus" => return Err(CliError::InvalidInput("focus needs a target".to_string())),
        "avatar" => ShellInput::Avatar(parse_avatar(rest)?),
        _ => ShellInput::Select(line.to_string()),
    })
}

fn parse_avatar(rest: &str) -> CliResult<AvatarOptions> {
    let parts: Vec<&str> = rest.split(';').map(str::trim).collect();
    match parts.as_slice() {
        [body, appearance, clothing]
            if !body.is_empty() && !appearance.is_empty() && !clothing.is_empty() =>
        {
            Ok(AvatarOptions {
                base_body: body.to_string(),
                appearance: appearance.to_string(),
                clothing: clothing.to_string(),
            })
        }
        _ => Err(CliError::InvalidInput(
            "usage: avatar <body>; <appearance>; <clothing>".to_string(),
        )),
    }
}

pub async fn execute(mobile: bool, config: Config) -> Result<()> {
    let (universe, task) = start_universe(config.universe, mobile)?;
    let printer = render::spawn_printer(&universe);

    println!("{}", "Aionic shell".cyan().bold());
    println!("{}", "Type a command name, `help` or `quit`.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", e.to_string().red());
                continue;
            }
        };
        if input == ShellInput::Quit {
            break;
        }
        if let Err(e) = dispatch(&universe, input).await {
            println!("{}", e.to_string().red());
        }
    }

    printer.finish().await;
    universe.shutdown().await?;
    let _ = task.await;
    Ok(())
}

async fn dispatch(universe: &UniverseHandle, input: ShellInput) -> Result<()> {
    match input {
        ShellInput::Empty | ShellInput::Quit => {}
        ShellInput::Help => print_help(universe),
        ShellInput::Status => {
            let snapshot = universe.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        ShellInput::ClosePanel => universe.close_panel().await?,
        ShellInput::Focus(target) => {
            if !universe.focus(target).await? {
                println!("{}", "  camera is busy".yellow());
            }
        }
        ShellInput::Avatar(options) => {
            universe.create_avatar(options).await?;
        }
        ShellInput::Select(name) => {
            if let SelectOutcome::Rejected { phase } = universe.select(name.as_str()).await? {
                println!(
                    "{}",
                    format!("  {} rejected while {}", name, phase.as_str()).yellow()
                );
            }
        }
    }
    Ok(())
}

fn print_help(universe: &UniverseHandle) {
    let names: Vec<&str> = universe
        .catalog()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    println!("  commands:  {}", names.join(", "));
    println!("  avatar <body>; <appearance>; <clothing>");
    println!("  focus avatar|terminal|<id>");
    println!("  close      close the harmony panel");
    println!("  status     print a snapshot");
    println!("  quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_line("  ").unwrap(), ShellInput::Empty);
        assert_eq!(parse_line("QUIT").unwrap(), ShellInput::Quit);
        assert_eq!(
            parse_line("focus terminal").unwrap(),
            ShellInput::Focus(FocusTarget::OutputConsole)
        );
        assert_eq!(
            parse_line("awaken").unwrap(),
            ShellInput::Select("awaken".to_string())
        );
    }

    #[test]
    fn test_parse_avatar_line() {
        let input = parse_line("avatar cyborg; chrome skin ; a velvet cloak").unwrap();
        assert_eq!(
            input,
            ShellInput::Avatar(AvatarOptions {
                base_body: "cyborg".to_string(),
                appearance: "chrome skin".to_string(),
                clothing: "a velvet cloak".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_avatar_requires_three_parts() {
        assert!(matches!(
            parse_line("avatar cyborg; chrome skin"),
            Err(CliError::InvalidInput(_))
        ));
        assert!(parse_line("focus").is_err());
    }
}
