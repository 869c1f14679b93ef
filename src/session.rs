#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeSet,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    catalog::{Catalog, Category, Playlist, Puzzle, SourceProvider},
    compile::{CompileRunner, Outcome, RunnerError, Verdict},
    config,
    java::BracingStyle,
    puzzle::{
        BayId, Difficulty, PlacementState, PuzzleError, ShuffledSource, Shuffler, Token,
        reassemble,
    },
};

/// Where a game is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Nothing picked yet.
    InitGui,
    /// A puzzle is on the board and some gaps are empty.
    StartGame,
    /// Every gap is filled.
    FullBoard,
    /// Waiting for a compile result.
    Compiling,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameState::InitGui => "INIT_GUI",
            GameState::StartGame => "START_GAME",
            GameState::FullBoard => "FULL_BOARD",
            GameState::Compiling => "COMPILING",
        })
    }
}

/// Things the player can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Compile and run the board.
    Run,
    /// Give up waiting for a compile.
    Stop,
    /// Pause the game.
    Pause,
    /// Move on to the next puzzle.
    Skip,
    /// Pick categories.
    Category,
    /// Pick a difficulty.
    Difficulty,
    /// Put every token back in the bay.
    ResetBoard,
    /// Show the about screen.
    Logo,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Run => "run",
            Action::Stop => "stop",
            Action::Pause => "pause",
            Action::Skip => "skip",
            Action::Category => "category",
            Action::Difficulty => "difficulty",
            Action::ResetBoard => "reset board",
            Action::Logo => "logo",
        })
    }
}

/// Actions available while a puzzle is on the board.
const IN_GAME: &[Action] = &[
    Action::Run,
    Action::Pause,
    Action::Skip,
    Action::Category,
    Action::Difficulty,
    Action::ResetBoard,
    Action::Logo,
];

/// Which actions each state allows.
const ALLOWED_ACTIONS: [(GameState, &[Action]); 4] = [
    (
        GameState::InitGui,
        &[Action::Category, Action::Logo, Action::Difficulty],
    ),
    (GameState::StartGame, IN_GAME),
    (GameState::FullBoard, IN_GAME),
    (GameState::Compiling, &[Action::Stop]),
];

/// The actions allowed in `state`.
pub fn allowed_actions(state: GameState) -> BTreeSet<Action> {
    ALLOWED_ACTIONS
        .iter()
        .find(|(s, _)| *s == state)
        .map(|(_, actions)| actions.iter().copied().collect())
        .unwrap_or_default()
}

#[derive(Debug, Error)]
/// Why the session refused a request.
pub enum SessionError {
    /// The request needs a puzzle on the board.
    #[error("No puzzle is loaded; start a game first")]
    NoPuzzleLoaded,
    /// The selected categories hold no puzzle.
    #[error("No puzzles are available for the selected categories")]
    NoPuzzles,
    /// The action is not available right now.
    #[error("Cannot {action} while the game is in state {state}")]
    ActionNotAllowed {
        /// what was asked for
        action: Action,
        /// the state the game was in
        state:  GameState,
    },
    /// The game is paused.
    #[error("The game is paused; resume it first")]
    Paused,
    /// A puzzle operation failed.
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    /// The runner refused the submission.
    #[error(transparent)]
    Runner(#[from] RunnerError),
    /// The puzzle could not be turned into tokens.
    #[error("Error retrieving puzzle: {0:#}")]
    Source(#[from] anyhow::Error),
}

/// Elapsed playing time, excluding pauses.
#[derive(Debug, Clone, Copy)]
pub struct GameTimer {
    /// When the clock started, shifted forward by every pause.
    start_time:     Instant,
    /// Time played when the clock was paused or stopped.
    pause_duration: Option<Duration>,
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTimer {
    /// A running timer starting now.
    pub fn new() -> Self {
        Self {
            start_time:     Instant::now(),
            pause_duration: None,
        }
    }

    /// Starts over from zero.
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    /// Freezes the clock.
    pub fn pause(&mut self) {
        if self.pause_duration.is_none() {
            self.pause_duration = Some(self.start_time.elapsed());
        }
    }

    /// Lets the clock run again; the paused time is not counted.
    pub fn resume(&mut self) {
        if let Some(d) = self.pause_duration.take() {
            self.start_time += self.start_time.elapsed() - d;
        }
    }

    /// Whether the clock is running.
    pub fn is_running(&self) -> bool {
        self.pause_duration.is_none()
    }

    /// Time played so far.
    pub fn elapsed(&self) -> Duration {
        self.pause_duration
            .unwrap_or_else(|| self.start_time.elapsed())
    }

    /// Time played so far in hours, minutes, and seconds.
    pub fn hms(&self) -> (u64, u64, u64) {
        let secs = self.elapsed().as_secs();
        (secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// The puzzle currently on the board.
#[derive(Debug)]
struct ActivePuzzle {
    /// catalog entry
    puzzle:    Puzzle,
    /// the shuffle being played
    shuffled:  ShuffledSource,
    /// what the player has put where
    placement: PlacementState,
    /// index of the hint shown last
    hint:      usize,
    /// set once the puzzle has been solved
    solved:    bool,
}

/// One player's game: which puzzle is up, what the board looks like, and
/// what the player may do next.
#[derive(Debug)]
pub struct GameSession {
    /// where puzzles come from
    catalog:    Catalog,
    /// compiles boards
    runner:     CompileRunner,
    /// picks tokens to remove
    shuffler:   Shuffler,
    /// share of tokens removed from new puzzles
    difficulty: Difficulty,
    /// brace layout of new puzzles
    bracing:    BracingStyle,
    /// categories being played; empty means all
    categories: BTreeSet<Category>,
    /// puzzles left to play, wrapping around
    playlist:   Playlist,
    /// current state
    state:      GameState,
    /// whether the player paused
    paused:     bool,
    /// playing time
    timer:      GameTimer,
    /// puzzle on the board
    active:     Option<ActivePuzzle>,
}

impl GameSession {
    /// A session over `catalog`, using the configured difficulty and brace
    /// style.
    pub fn new(catalog: Catalog, runner: CompileRunner) -> Self {
        let cfg = config::get();
        let categories = BTreeSet::new();
        let playlist = catalog.playlist(&categories);

        Self {
            catalog,
            runner,
            shuffler: Shuffler::new(),
            difficulty: cfg.difficulty(),
            bracing: cfg.bracing(),
            categories,
            playlist,
            state: GameState::InitGui,
            paused: false,
            timer: GameTimer::new(),
            active: None,
        }
    }

    /// Replaces the shuffler, e.g. with a seeded one.
    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Replaces the brace style used for new puzzles.
    pub fn with_bracing(mut self, bracing: BracingStyle) -> Self {
        self.bracing = bracing;
        self
    }

    /// Returns the state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// The actions allowed right now.
    pub fn allowed_actions(&self) -> BTreeSet<Action> {
        allowed_actions(self.state)
    }

    /// Whether `action` is allowed right now.
    pub fn is_allowed(&self, action: Action) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Fails unless `action` is allowed right now.
    fn require(&self, action: Action) -> Result<(), SessionError> {
        if self.is_allowed(action) {
            Ok(())
        } else {
            Err(SessionError::ActionNotAllowed {
                action,
                state: self.state,
            })
        }
    }

    /// Fails while paused.
    fn require_running(&self) -> Result<(), SessionError> {
        if self.paused {
            Err(SessionError::Paused)
        } else {
            Ok(())
        }
    }

    /// The puzzle on the board, mutably.
    fn active_mut(&mut self) -> Result<&mut ActivePuzzle, SessionError> {
        self.active.as_mut().ok_or(SessionError::NoPuzzleLoaded)
    }

    /// Returns the difficulty new puzzles are shuffled with.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Sets the difficulty used from the next puzzle on.
    pub fn set_difficulty(&mut self, percent: i64) -> Result<Difficulty, SessionError> {
        self.require(Action::Difficulty)?;
        self.difficulty = Difficulty::new(percent)?;
        tracing::info!("Difficulty set to {}", self.difficulty);
        Ok(self.difficulty)
    }

    /// Returns the brace style.
    pub fn bracing(&self) -> BracingStyle {
        self.bracing
    }

    /// Sets the brace style used from the next puzzle on.
    pub fn set_bracing(&mut self, bracing: BracingStyle) {
        self.bracing = bracing;
    }

    /// Returns the selected categories; empty means all of them.
    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    /// Every category the catalog has.
    pub fn available_categories(&self) -> BTreeSet<Category> {
        self.catalog.categories()
    }

    /// Plays only puzzles from `categories` from the next puzzle on.
    pub fn set_categories(&mut self, categories: BTreeSet<Category>) -> Result<(), SessionError> {
        self.require(Action::Category)?;
        let playlist = self.catalog.playlist(&categories);
        if playlist.is_empty() {
            return Err(SessionError::NoPuzzles);
        }
        tracing::info!(
            "Playing {} puzzles from {}",
            playlist.len(),
            if categories.is_empty() {
                "all categories".to_string()
            } else {
                categories.iter().join(", ")
            }
        );
        self.categories = categories;
        self.playlist = playlist;
        Ok(())
    }

    /// Puts a puzzle on the board.
    ///
    /// With `new_puzzle` (or when nothing is loaded yet) the next puzzle of
    /// the playlist is shuffled and the timer starts over. Otherwise the
    /// current shuffle is laid out again with every token back in the bay,
    /// unsolved, and the timer keeps going. If the next puzzle cannot be set up, the
    /// current one stays as it was.
    pub fn start_game(&mut self, new_puzzle: bool) -> Result<(), SessionError> {
        if self.state == GameState::Compiling {
            return Err(SessionError::ActionNotAllowed {
                action: Action::Skip,
                state:  self.state,
            });
        }

        match self.active.as_mut().filter(|_| !new_puzzle) {
            Some(active) => {
                active.placement = PlacementState::new(&active.shuffled);
                active.solved = false;
            }
            None => {
                let next = self.next_puzzle()?;
                tracing::info!(
                    "Starting puzzle {} ({} removable tokens, {} removed)",
                    next.puzzle.id(),
                    next.shuffled.total_removable(),
                    next.shuffled.removed_count()
                );
                self.active = Some(next);
                self.timer.restart();
            }
        }

        self.paused = false;
        self.timer.resume();
        self.sync_state();
        Ok(())
    }

    /// Shuffles the next playlist entry without touching the current puzzle.
    /// The playlist only moves on once the puzzle is dealt.
    fn next_puzzle(&mut self) -> Result<ActivePuzzle, SessionError> {
        let mut playlist = self.playlist.clone();
        let id = playlist
            .advance()
            .ok_or(SessionError::NoPuzzles)?
            .to_string();
        let puzzle = self
            .catalog
            .get(&id)
            .cloned()
            .ok_or(SessionError::NoPuzzles)?;
        let source = self.catalog.source_file(&id, self.bracing)?;
        let shuffled = self
            .shuffler
            .shuffle(Arc::new(source), i64::from(self.difficulty.percent()))?;
        let placement = PlacementState::new(&shuffled);
        self.playlist = playlist;

        Ok(ActivePuzzle {
            puzzle,
            shuffled,
            placement,
            hint: 0,
            solved: false,
        })
    }

    /// Moves to the next puzzle.
    pub fn skip(&mut self) -> Result<(), SessionError> {
        self.require(Action::Skip)?;
        self.start_game(true)
    }

    /// Puts every token back in the bay; the timer keeps running.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        self.require(Action::ResetBoard)?;
        if self.active.is_none() {
            return Err(SessionError::NoPuzzleLoaded);
        }
        self.start_game(false)
    }

    /// Puts every token back in the bay and starts the timer over.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.refresh()?;
        self.timer.restart();
        Ok(())
    }

    /// Pauses the game and the timer.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.require(Action::Pause)?;
        self.paused = true;
        self.timer.pause();
        Ok(())
    }

    /// Resumes after [`GameSession::pause`].
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if !self.active.as_ref().is_some_and(|a| a.solved) {
                self.timer.resume();
            }
        }
    }

    /// Whether the game is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns the timer.
    pub fn timer(&self) -> &GameTimer {
        &self.timer
    }

    /// Puts bay token `token` into gap `gap`.
    pub fn place(&mut self, gap: usize, token: BayId) -> Result<(), SessionError> {
        self.require_running()?;
        let active = self.active_mut()?;
        active.placement.place(gap, token)?;
        self.sync_state();
        Ok(())
    }

    /// Takes the token out of gap `gap`, returning it to the bay.
    pub fn remove(&mut self, gap: usize) -> Result<Option<BayId>, SessionError> {
        self.require_running()?;
        let active = self.active_mut()?;
        let removed = active.placement.remove(gap)?;
        self.sync_state();
        Ok(removed)
    }

    /// Moves the token in gap `from` to the empty gap `to`.
    pub fn move_token(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        self.require_running()?;
        self.active_mut()?.placement.move_token(from, to)?;
        Ok(())
    }

    /// Recomputes the state from the board.
    fn sync_state(&mut self) {
        self.state = match &self.active {
            None => GameState::InitGui,
            Some(active) if active.placement.is_complete() => GameState::FullBoard,
            Some(_) => GameState::StartGame,
        };
    }

    /// Reassembles the board and has it compiled and run.
    ///
    /// The timer is paused while waiting. A passing run stops the timer for
    /// good; anything else lets it run again so the player can retry.
    pub async fn compile(&mut self) -> Result<Verdict, SessionError> {
        self.require(Action::Run)?;
        self.require_running()?;

        let (text, source) = {
            let active = self.active.as_ref().ok_or(SessionError::NoPuzzleLoaded)?;
            let text = reassemble(active.placement.board(&active.shuffled))?;
            (text, Arc::clone(active.shuffled.source()))
        };

        self.state = GameState::Compiling;
        self.timer.pause();

        let result = self.runner.run(text, &source).await;

        self.sync_state();
        match &result {
            Ok(verdict) if verdict.outcome() == Outcome::Pass => {
                if let Some(active) = self.active.as_mut() {
                    active.solved = true;
                }
                tracing::info!("Puzzle solved in {:?}", self.timer.elapsed());
            }
            Ok(verdict) => {
                tracing::info!("Attempt ended with {}", verdict.outcome());
                self.timer.resume();
            }
            Err(_) => self.timer.resume(),
        }

        result.map_err(SessionError::from)
    }

    /// Abandons a compile that was interrupted before finishing, returning to
    /// the board.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.require(Action::Stop)?;
        self.sync_state();
        self.timer.resume();
        Ok(())
    }

    /// Returns the puzzle on the board.
    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.active.as_ref().map(|a| &a.puzzle)
    }

    /// Returns the shuffle on the board.
    pub fn shuffled(&self) -> Option<&ShuffledSource> {
        self.active.as_ref().map(|a| &a.shuffled)
    }

    /// Returns the placement on the board.
    pub fn placement(&self) -> Option<&PlacementState> {
        self.active.as_ref().map(|a| &a.placement)
    }

    /// The board with the player's placements applied.
    pub fn board(&self) -> Option<Vec<Option<&Token>>> {
        self.active
            .as_ref()
            .map(|a| a.placement.board(&a.shuffled))
    }

    /// Whether the puzzle on the board has been solved.
    pub fn is_solved(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.solved)
    }

    /// The hint shown last, if the puzzle has any.
    pub fn current_hint(&self) -> Option<&str> {
        let active = self.active.as_ref()?;
        active
            .puzzle
            .hints()
            .get(active.hint)
            .map(String::as_str)
    }

    /// Moves on to the next hint, starting over after the last one.
    pub fn next_hint(&mut self) -> Result<Option<&str>, SessionError> {
        let active = self.active_mut()?;
        let count = active.puzzle.hints().len();
        if count > 0 {
            active.hint = (active.hint + 1) % count;
        }
        Ok(self.current_hint())
    }

    /// Greeting shown before a game starts.
    pub fn welcome_message(&self) -> &'static str {
        "Welcome to Tokanagrammar, Java Edition! Please select a category to continue."
    }

    /// Lines describing the current puzzle: categories, difficulty, hint,
    /// and token counts.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = vec![];

        let categories = if self.categories.is_empty() {
            self.catalog.categories()
        } else {
            self.categories.clone()
        };
        lines.push(format!(
            "{}: {}",
            if categories.len() > 1 {
                "Categories"
            } else {
                "Category"
            },
            categories.iter().join(", ")
        ));
        lines.push(format!(
            "Difficulty: {}({})",
            self.difficulty.percent(),
            self.difficulty.label()
        ));

        if let Some(active) = &self.active {
            lines.push(format!(
                "Hint: {}",
                self.current_hint().unwrap_or("<NO hints available!>")
            ));
            lines.push(format!(
                "Total (removable) tokens: {}",
                active.shuffled.total_removable()
            ));
            lines.push(format!(
                "Removed: {}({}%)",
                active.shuffled.removed_count(),
                active.shuffled.difficulty().percent()
            ));
        }

        lines
    }
}
