//! Tablecut CLI - scripted frontend for the grid segmentation engine.
//!
//! Binds the engine's abstract command surface to a line-oriented script so
//! sessions can be driven without a windowing toolkit: from a recorded
//! operator trace, from a test harness, or interactively via stdin.
//!
//! ```text
//! tablecut [--json] <image> <output_dir> [script]
//! ```
//!
//! Script grammar, one command per line, `#` starts a comment:
//!
//! ```text
//! row <y>     place a row separator         col <x>   place a column separator
//! undo        remove the latest separator   advance   next phase / segment
//! rotate      enter rotation                left      rotate 0.25 deg ccw
//! right       rotate 0.25 deg cw            confirm   leave rotation
//! cancel      abort the session
//! ```

use std::env;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tablecut_core::{load_table_image, segment_session, Command, Phase, Session, Step};

const USAGE: &str = "usage: tablecut [--json] <image> <output_dir> [script]";

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let Some(args) = CliArgs::parse(env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };
    run(args)
}

fn run(args: CliArgs) -> Result<()> {
    let source = load_table_image(&args.image)
        .with_context(|| format!("cannot load table image {:?}", args.image))?;
    log::info!(
        "loaded {:?} ({}x{})",
        args.image,
        source.width,
        source.height
    );

    let script = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read script {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read script from stdin")?;
            buf
        }
    };
    let commands = parse_script(&script)?;

    let mut session = Session::new(source);
    let mut ready = false;

    for (index, command) in commands.iter().enumerate() {
        match session.apply(*command) {
            Step::Continue => {
                if let Phase::Rotating { .. } = session.phase() {
                    log::info!("rotation angle: {:.2} degrees", session.angle_degrees());
                }
            }
            Step::Cancelled => {
                println!("Session cancelled; nothing written.");
                return Ok(());
            }
            Step::ReadyToSegment => {
                if index + 1 < commands.len() {
                    log::warn!(
                        "{} script command(s) after segmentation ignored",
                        commands.len() - index - 1
                    );
                }
                ready = true;
                break;
            }
        }
    }

    if !ready {
        bail!("script ended before segmentation (missing a second 'advance'?)");
    }

    let report = segment_session(session, &args.output_dir)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Wrote {} of {} cells ({} rows x {} cols) to {}",
            report.cells_written,
            report.cells(),
            report.rows,
            report.cols,
            args.output_dir.display()
        );
        if report.cells_failed > 0 {
            println!("{} cell(s) failed to write, see log.", report.cells_failed);
        }
    }
    Ok(())
}

/// Parsed command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    image: PathBuf,
    output_dir: PathBuf,
    script: Option<PathBuf>,
    json: bool,
}

impl CliArgs {
    /// Parse the argument list. `Ok(None)` means help was requested and
    /// the caller should print the usage and exit cleanly.
    fn parse(args: impl Iterator<Item = String>) -> Result<Option<Self>> {
        let mut json = false;
        let mut positional = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--json" => json = true,
                "--help" | "-h" => return Ok(None),
                other if other.starts_with('-') => bail!("unknown option: {}", other),
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        if positional.len() < 2 || positional.len() > 3 {
            bail!("{}", USAGE);
        }

        let script = if positional.len() == 3 {
            positional.pop()
        } else {
            None
        };
        let output_dir = positional.pop().unwrap();
        let image = positional.pop().unwrap();
        Ok(Some(Self {
            image,
            output_dir,
            script,
            json,
        }))
    }
}

/// Parse a whole script into commands, skipping blanks and comments.
fn parse_script(script: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (number, line) in script.lines().enumerate() {
        if let Some(command) =
            parse_line(line).with_context(|| format!("script line {}", number + 1))?
        {
            commands.push(command);
        }
    }
    Ok(commands)
}

/// Parse a single script line. Returns `None` for blank lines and comments.
fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let keyword = tokens.next().unwrap_or("");
    let command = match keyword {
        // The engine reads only the axis matching its phase, so a row
        // command carries its coordinate as y and a column command as x.
        "row" => Command::PointerPrimary {
            x: 0,
            y: parse_coordinate(tokens.next(), "row")?,
        },
        "col" => Command::PointerPrimary {
            x: parse_coordinate(tokens.next(), "col")?,
            y: 0,
        },
        "undo" => Command::PointerSecondary,
        "advance" => Command::Advance,
        "rotate" => Command::RotateEnter,
        "left" => Command::RotateLeft,
        "right" => Command::RotateRight,
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        other => bail!("unknown command: {}", other),
    };

    if let Some(extra) = tokens.next() {
        bail!("unexpected trailing token: {}", extra);
    }
    Ok(Some(command))
}

fn parse_coordinate(token: Option<&str>, keyword: &str) -> Result<u32> {
    let token = token.with_context(|| format!("'{}' needs a coordinate", keyword))?;
    token
        .parse()
        .with_context(|| format!("invalid coordinate for '{}': {}", keyword, token))
}
