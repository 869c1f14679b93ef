#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # tokanagrammar
//! ## Introduction
//!
//! Put the tokens back where they belong, then compile and run the program to
//! see whether it prints what it should.
//!
//! Puzzles are read from `./puzzles` (or `TOKANAGRAMMAR_PUZZLE_DIR`); `javac`
//! and `java` have to be on `PATH` to run a board.

use std::{collections::BTreeSet, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use tokanagrammar::{
    catalog::{Catalog, Category, SourceProvider},
    compile::{CompileRunner, Outcome, Verdict},
    config::{self, ConfigState},
    display::{render_bay, render_board, render_catalog, render_failure},
    java::{BracingStyle, JavaFacility},
    puzzle::{BayId, PlacementState, Shuffler, reassemble},
    session::{GameSession, SessionError},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
struct Globals {
    /// Where puzzles live
    puzzles: Option<PathBuf>,
    /// Compile timeout in milliseconds
    timeout: Option<u64>,
    /// Brace layout
    bracing: Option<BracingStyle>,
}

/// How a single puzzle is cut up.
#[derive(Debug, Clone)]
struct Deal {
    /// Puzzle id
    id:         String,
    /// Difficulty percentage
    difficulty: Option<i64>,
    /// Shuffle seed
    seed:       Option<u64>,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// List puzzles
    List,
    /// Print a shuffled board
    Show(Deal),
    /// Put a puzzle back together and run it
    Solve(Deal),
    /// Play interactively
    Play {
        /// Categories to play
        categories: Vec<String>,
        /// Difficulty percentage
        difficulty: Option<i64>,
        /// Shuffle seed
        seed:       Option<u64>,
    },
}

/// Parse the command line arguments and return the globals and a `Cmd`
fn options() -> (Globals, Cmd) {
    /// parses the puzzle directory
    fn puzzles() -> impl Parser<Option<PathBuf>> {
        long("puzzles")
            .help("Directory holding puzzle .java/.json pairs")
            .argument::<PathBuf>("DIR")
            .optional()
    }

    /// parses the compile timeout
    fn timeout() -> impl Parser<Option<u64>> {
        long("timeout")
            .help("How long a compile-and-run may take, in milliseconds")
            .argument::<u64>("MS")
            .optional()
    }

    /// parses the brace style
    fn bracing() -> impl Parser<Option<BracingStyle>> {
        long("bracing")
            .help("Brace layout: allman or kr")
            .argument::<String>("STYLE")
            .parse(|s| s.parse::<BracingStyle>())
            .optional()
    }

    /// parses a difficulty
    fn difficulty() -> impl Parser<Option<i64>> {
        short('d')
            .long("difficulty")
            .help("Percentage of tokens to take off the board (0-100)")
            .argument::<i64>("PERCENT")
            .optional()
    }

    /// parses a shuffle seed
    fn seed() -> impl Parser<Option<u64>> {
        long("seed")
            .help("Seed for a reproducible shuffle")
            .argument::<u64>("SEED")
            .optional()
    }

    /// parses a puzzle id
    fn id() -> impl Parser<String> {
        positional("PUZZLE").help("Puzzle id")
    }

    /// parses a puzzle deal
    fn deal() -> impl Parser<Deal> {
        let id = id();
        let difficulty = difficulty();
        let seed = seed();
        construct!(Deal {
            difficulty,
            seed,
            id
        })
    }

    let list = pure(Cmd::List)
        .to_options()
        .command("list")
        .help("List the available puzzles");

    let show = construct!(Cmd::Show(deal()))
        .to_options()
        .command("show")
        .help("Print a shuffled board and its bay");

    let solve = construct!(Cmd::Solve(deal()))
        .to_options()
        .command("solve")
        .help("Put every token back and run the program");

    let play = {
        let categories = long("category")
            .short('c')
            .help("Play only this category (repeatable)")
            .argument::<String>("NAME")
            .many();
        let difficulty = difficulty();
        let seed = seed();
        construct!(Cmd::Play {
            categories,
            difficulty,
            seed
        })
        .to_options()
        .command("play")
        .help("Play in the terminal")
    };

    let puzzles = puzzles();
    let timeout = timeout();
    let bracing = bracing();
    let globals = construct!(Globals {
        puzzles,
        timeout,
        bracing
    });
    let cmd = construct!([list, show, solve, play]);

    construct!(globals, cmd)
        .to_options()
        .descr("Token-shuffling puzzles for Java programs")
        .run()
}

/// Applies command line overrides to the environment configuration.
fn configure(globals: &Globals) -> Result<config::ConfigHandle> {
    let mut state = ConfigState::from_env()?;
    if let Some(dir) = &globals.puzzles {
        state = state.with_puzzle_dir(dir);
    }
    if let Some(ms) = globals.timeout {
        state = state.with_compile_timeout(Duration::from_millis(ms));
    }
    if let Some(style) = globals.bracing {
        state = state.with_bracing(style);
    }
    Ok(config::install(state))
}

/// A runner backed by the local JDK.
fn java_runner() -> CompileRunner {
    CompileRunner::with_configured_timeout(Arc::new(JavaFacility::from_config()))
}

/// Prints a verdict the way the game reports it.
fn print_verdict(verdict: &Verdict) {
    match verdict.outcome() {
        Outcome::Pass => {
            println!("{}", verdict.outcome().message().green().bold());
            println!("The output is:\n-----\n{}-----", verdict.output().unwrap_or_default());
        }
        Outcome::FailMismatch => {
            println!("{}", verdict.outcome().message().red());
            if let Some(diff) = verdict.diff() {
                println!("{diff}");
            }
        }
        Outcome::FailCompileError => {
            println!("{}", verdict.outcome().message().red());
            println!("{}", render_failure(verdict.output().unwrap_or_default()));
        }
        Outcome::Timeout => println!("{}", verdict.outcome().message().yellow()),
    }
}

/// Runs the `show` and `solve` subcommands.
async fn deal(catalog: &Catalog, deal: Deal, solve: bool) -> Result<()> {
    let cfg = config::get();
    let source = Arc::new(catalog.source_file(&deal.id, cfg.bracing())?);
    let mut shuffler = deal.seed.map(Shuffler::seeded).unwrap_or_default();
    let difficulty = deal
        .difficulty
        .unwrap_or_else(|| i64::from(cfg.difficulty().percent()));
    let shuffled = shuffler.shuffle(Arc::clone(&source), difficulty)?;

    if !solve {
        let placement = PlacementState::new(&shuffled);
        println!("{}", render_board(&shuffled, &placement));
        println!("{}", render_bay(&shuffled, &placement));
        println!(
            "Removed {} of {} removable tokens (seed {})",
            shuffled.removed_count(),
            shuffled.total_removable(),
            shuffler.seed()
        );
        return Ok(());
    }

    let placement = PlacementState::solved(&shuffled)?;
    let text = reassemble(placement.board(&shuffled))?;
    let verdict = java_runner().run(text, &source).await?;
    print_verdict(&verdict);
    if !verdict.is_pass() {
        bail!("Puzzle {} did not pass when solved", deal.id);
    }
    Ok(())
}

/// Help text for the interactive game.
const PLAY_HELP: &str = "\
commands:
  board | bay | status | actions | hint
  place <gap> <token>    remove <gap>    move <from> <to>
  run | refresh | reset | skip | pause | resume | stop
  difficulty <percent>   category <name>...
  help | quit";

/// Parses a bay token reference such as `#3` or `3`.
fn parse_token(word: &str) -> Result<BayId> {
    word.trim_start_matches('#')
        .parse()
        .map(BayId)
        .with_context(|| format!("`{word}` is not a token number"))
}

/// Parses a gap number.
fn parse_gap(word: &str) -> Result<usize> {
    word.parse()
        .with_context(|| format!("`{word}` is not a gap number"))
}

/// Prints the board and the bay of the running game.
fn print_board(session: &GameSession) {
    if let (Some(shuffled), Some(placement)) = (session.shuffled(), session.placement()) {
        println!("{}", render_board(shuffled, placement));
        println!("{}", render_bay(shuffled, placement));
    }
}

/// Handles one line of the interactive game; returns false to quit.
async fn play_command(session: &mut GameSession, line: &str) -> Result<bool> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((command, args)) = words.split_first() else {
        return Ok(true);
    };

    let outcome: Result<(), SessionError> = match (*command, args) {
        ("quit" | "exit", _) => return Ok(false),
        ("help", _) => {
            println!("{PLAY_HELP}");
            Ok(())
        }
        ("board", _) | ("bay", _) => {
            print_board(session);
            Ok(())
        }
        ("status", _) => {
            for line in session.status_lines() {
                println!("{}", line.cyan());
            }
            let (h, m, s) = session.timer().hms();
            println!("{}", format!("Time: {h:02}:{m:02}:{s:02}").cyan());
            Ok(())
        }
        ("actions", _) => {
            let actions: Vec<String> = session
                .allowed_actions()
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{} ({})", actions.join(", "), session.state());
            Ok(())
        }
        ("hint", _) => session.next_hint().map(|hint| {
            println!("Hint: {}", hint.unwrap_or("<NO hints available!>"));
        }),
        ("place", [gap, token]) => session.place(parse_gap(gap)?, parse_token(token)?),
        ("remove", [gap]) => session.remove(parse_gap(gap)?).map(|_| ()),
        ("move", [from, to]) => session.move_token(parse_gap(from)?, parse_gap(to)?),
        ("run", _) => match session.compile().await {
            Ok(verdict) => {
                print_verdict(&verdict);
                Ok(())
            }
            Err(e) => Err(e),
        },
        ("refresh", _) => session.refresh().map(|_| print_board(session)),
        ("reset", _) => session.reset().map(|_| print_board(session)),
        ("skip", _) => session.skip().map(|_| {
            for line in session.status_lines() {
                println!("{}", line.cyan());
            }
            print_board(session);
        }),
        ("pause", _) => session.pause().map(|_| println!("Paused.")),
        ("resume", _) => {
            session.resume();
            Ok(())
        }
        ("stop", _) => session.stop(),
        ("difficulty", [percent]) => {
            let percent: i64 = percent
                .parse()
                .with_context(|| format!("`{percent}` is not a number"))?;
            session
                .set_difficulty(percent)
                .map(|d| println!("Difficulty {d}; applies from the next puzzle."))
        }
        ("category", names) => {
            let categories: BTreeSet<Category> = names.iter().map(|n| Category::from(*n)).collect();
            session
                .set_categories(categories)
                .map(|_| println!("Categories updated; applies from the next puzzle."))
        }
        _ => {
            println!("Unknown command `{line}`; type `help`.");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        println!("{}", e.to_string().red());
    }
    Ok(true)
}

/// Runs the interactive game.
async fn play(
    catalog: Catalog,
    categories: Vec<String>,
    difficulty: Option<i64>,
    seed: Option<u64>,
) -> Result<()> {
    let mut session = GameSession::new(catalog, java_runner());
    if let Some(seed) = seed {
        session = session.with_shuffler(Shuffler::seeded(seed));
    }
    println!("{}", session.welcome_message().bold());

    if let Some(percent) = difficulty {
        session.set_difficulty(percent)?;
    }
    if !categories.is_empty() {
        session.set_categories(categories.iter().map(|c| Category::from(c.as_str())).collect())?;
    }
    session.start_game(true)?;

    for line in session.status_lines() {
        println!("{}", line.cyan());
    }
    print_board(&session);
    println!("{PLAY_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match play_command(&mut session, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", format!("{e:#}").red()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let (globals, cmd) = options();
    let cfg = configure(&globals)?;

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(cfg.log_level());
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let catalog = Catalog::load(cfg.puzzle_dir()).await?;

    match cmd {
        Cmd::List => println!("{}", render_catalog(catalog.puzzles())),
        Cmd::Show(d) => deal(&catalog, d, false).await?,
        Cmd::Solve(d) => deal(&catalog, d, true).await?,
        Cmd::Play {
            categories,
            difficulty,
            seed,
        } => play(catalog, categories, difficulty, seed).await?,
    };

    Ok(())
}
