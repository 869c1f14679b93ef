use std::{collections::BTreeSet, collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use futures::future::{BoxFuture, pending};
use tokanagrammar::{
    catalog::{Catalog, Category, Puzzle},
    compile::{CompileFacility, CompileRunner, Execution, Outcome},
    java::BracingStyle,
    puzzle::{BayId, PuzzleError, Shuffler},
    session::{Action, GameSession, GameState, SessionError},
};

const GREET: &str = "public class Greet\n{\n    public static void main(String[] args)\n    \
                     {\n        System.out.println(\"hi\");\n    }\n}\n";

const COUNT: &str = "public class Count\n{\n    public static void main(String[] args)\n    \
                     {\n        for (int i = 0; i < 2; i++)\n        {\n            \
                     System.out.println(i);\n        }\n    }\n}\n";

/// Knows the output of every intact catalog program; anything else fails to
/// compile.
struct Judge {
    outputs: HashMap<String, String>,
}

impl CompileFacility for Judge {
    fn compile_and_run(&self, source: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        let result = match self.outputs.get(&source) {
            Some(output) => Execution::success(output.clone()),
            None => Execution::error("Main.java:1: error: ';' expected"),
        };
        Box::pin(async move { Ok(result) })
    }
}

/// Never answers.
struct Silent;

impl CompileFacility for Silent {
    fn compile_and_run(&self, _: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        Box::pin(pending())
    }
}

fn catalog() -> Catalog {
    Catalog::from_puzzles(vec![
        Puzzle::builder()
            .id("greet")
            .category("basics")
            .code(GREET)
            .expected_output("hi\n")
            .hints(vec!["first hint".into(), "second hint".into()])
            .build(),
        Puzzle::builder()
            .id("count")
            .category("loops")
            .code(COUNT)
            .expected_output("0\n1\n")
            .build(),
    ])
    .expect("catalog")
}

fn judge(catalog: &Catalog) -> Judge {
    let outputs = catalog
        .puzzles()
        .iter()
        .map(|p| {
            let text = p
                .source_file(BracingStyle::Allman)
                .expect("tokenize")
                .text();
            (text, p.expected_output().to_string())
        })
        .collect();
    Judge { outputs }
}

fn session_with(facility: impl CompileFacility + 'static, timeout_ms: u64) -> GameSession {
    let catalog = catalog();
    let runner = CompileRunner::new(Arc::new(facility), Duration::from_millis(timeout_ms));
    GameSession::new(catalog, runner)
        .with_shuffler(Shuffler::seeded(9))
        .with_bracing(BracingStyle::Allman)
}

fn session() -> GameSession {
    session_with(judge(&catalog()), 2_000)
}

/// Gap and bay token pairs that restore the board.
fn solution(session: &GameSession) -> Vec<(usize, BayId)> {
    let shuffled = session.shuffled().expect("puzzle loaded");
    shuffled
        .bay_tokens()
        .iter()
        .map(|bay| {
            let slot = shuffled.original_slot_of(bay).expect("slot");
            (shuffled.gap_at_slot(slot).expect("gap"), bay.id())
        })
        .collect()
}

#[test]
fn new_sessions_wait_for_a_category() {
    let mut session = session();
    assert_eq!(session.state(), GameState::InitGui);
    assert!(session.is_allowed(Action::Category));
    assert!(!session.is_allowed(Action::Run));
    assert!(matches!(
        session.pause(),
        Err(SessionError::ActionNotAllowed {
            action: Action::Pause,
            state:  GameState::InitGui,
        })
    ));
    assert!(matches!(session.place(0, BayId(0)), Err(SessionError::NoPuzzleLoaded)));
}

#[test]
fn starting_deals_a_puzzle_and_reports_it() {
    let mut session = session();
    session.set_difficulty(50).expect("difficulty");
    session.start_game(true).expect("start");

    assert_eq!(session.state(), GameState::StartGame);
    let shuffled = session.shuffled().expect("shuffled");
    let total = shuffled.total_removable();
    let removed = shuffled.removed_count();
    assert_eq!(removed, (total * 50 + 50) / 100);

    let status = session.status_lines();
    assert!(status.contains(&"Difficulty: 50(MEDIUM)".to_string()));
    assert!(status.contains(&format!("Total (removable) tokens: {total}")));
    assert!(status.contains(&format!("Removed: {removed}(50%)")));
    assert!(status.contains(&"Categories: basics, loops".to_string()));
}

#[tokio::test]
async fn putting_everything_back_passes() {
    let mut session = session();
    session.start_game(true).expect("start");

    for (gap, id) in solution(&session) {
        session.place(gap, id).expect("place");
    }
    assert_eq!(session.state(), GameState::FullBoard);

    let verdict = session.compile().await.expect("compile");
    assert_eq!(verdict.outcome(), Outcome::Pass);
    assert!(session.is_solved());
    assert!(!session.timer().is_running());
    assert_eq!(session.state(), GameState::FullBoard);
}

#[tokio::test]
async fn refreshing_a_solved_puzzle_starts_the_clock_for_good() {
    let mut session = session();
    session.start_game(true).expect("start");
    for (gap, id) in solution(&session) {
        session.place(gap, id).expect("place");
    }
    let verdict = session.compile().await.expect("compile");
    assert_eq!(verdict.outcome(), Outcome::Pass);

    session.refresh().expect("refresh");
    assert!(!session.is_solved());
    assert!(session.timer().is_running());

    session.pause().expect("pause");
    session.resume();
    assert!(session.timer().is_running());
}

#[tokio::test]
async fn swapped_tokens_do_not_pass_and_the_clock_runs_again() {
    let mut session = session();
    session.set_difficulty(100).expect("difficulty");
    session.start_game(true).expect("start");

    let mut pairs = solution(&session);
    let shuffled = session.shuffled().expect("shuffled");
    let first = pairs[0].1;
    let other = pairs
        .iter()
        .position(|(_, id)| {
            shuffled.bay_token(*id).expect("token").token().image()
                != shuffled.bay_token(first).expect("token").token().image()
        })
        .expect("two distinct tokens");
    let swapped = pairs[other].1;
    pairs[0].1 = swapped;
    pairs[other].1 = first;

    for (gap, id) in pairs {
        session.place(gap, id).expect("place");
    }
    let verdict = session.compile().await.expect("compile");
    assert_ne!(verdict.outcome(), Outcome::Pass);
    assert!(session.timer().is_running());
    assert!(!session.is_solved());
}

#[tokio::test]
async fn incomplete_boards_are_not_compiled() {
    let mut session = session();
    session.start_game(true).expect("start");
    let before = session.placement().cloned();

    let result = session.compile().await;
    assert!(matches!(
        result,
        Err(SessionError::Puzzle(PuzzleError::IncompletePlacement { .. }))
    ));
    assert_eq!(session.state(), GameState::StartGame);
    assert_eq!(session.placement().cloned(), before);
}

#[tokio::test]
async fn timeouts_return_to_the_board() {
    let mut session = session_with(Silent, 30);
    session.start_game(true).expect("start");
    for (gap, id) in solution(&session) {
        session.place(gap, id).expect("place");
    }

    let verdict = session.compile().await.expect("compile");
    assert_eq!(verdict.outcome(), Outcome::Timeout);
    assert_eq!(session.state(), GameState::FullBoard);
    assert!(session.timer().is_running());
    assert!(session.is_allowed(Action::Run));
}

#[test]
fn skip_wraps_around_the_playlist() {
    let mut session = session();
    session.start_game(true).expect("start");
    let first = session.puzzle().expect("puzzle").id().to_string();

    session.skip().expect("skip");
    let second = session.puzzle().expect("puzzle").id().to_string();
    assert_ne!(first, second);

    session.skip().expect("skip");
    assert_eq!(session.puzzle().expect("puzzle").id(), first);
}

#[test]
fn refresh_keeps_the_shuffle_and_empties_the_board() {
    let mut session = session();
    session.start_game(true).expect("start");
    let bay_before: Vec<String> = session
        .shuffled()
        .expect("shuffled")
        .bay_tokens()
        .iter()
        .map(|b| b.token().image().to_string())
        .collect();

    let (gap, id) = solution(&session)[0];
    session.place(gap, id).expect("place");
    session.refresh().expect("refresh");

    let bay_after: Vec<String> = session
        .shuffled()
        .expect("shuffled")
        .bay_tokens()
        .iter()
        .map(|b| b.token().image().to_string())
        .collect();
    assert_eq!(bay_before, bay_after);
    assert_eq!(session.placement().expect("placement").occupant(gap), None);
}

#[test]
fn bad_difficulty_leaves_the_old_one() {
    let mut session = session();
    let before = session.difficulty();
    assert!(matches!(
        session.set_difficulty(150),
        Err(SessionError::Puzzle(PuzzleError::InvalidDifficulty(150)))
    ));
    assert_eq!(session.difficulty(), before);
}

#[test]
fn categories_filter_the_playlist() {
    let mut session = session();
    assert!(matches!(
        session.set_categories(BTreeSet::from([Category::from("graphs")])),
        Err(SessionError::NoPuzzles)
    ));

    session
        .set_categories(BTreeSet::from([Category::from("loops")]))
        .expect("categories");
    session.start_game(true).expect("start");
    assert_eq!(session.puzzle().expect("puzzle").id(), "count");
    session.skip().expect("skip");
    assert_eq!(session.puzzle().expect("puzzle").id(), "count");
    assert!(
        session
            .status_lines()
            .contains(&"Category: loops".to_string())
    );
}

#[test]
fn paused_games_refuse_moves() {
    let mut session = session();
    session.start_game(true).expect("start");
    session.pause().expect("pause");
    assert!(session.is_paused());
    assert!(!session.timer().is_running());

    let (gap, id) = solution(&session)[0];
    assert!(matches!(session.place(gap, id), Err(SessionError::Paused)));

    session.resume();
    session.place(gap, id).expect("place after resume");
}

#[test]
fn hints_cycle() {
    let mut session = session();
    session
        .set_categories(BTreeSet::from([Category::from("basics")]))
        .expect("categories");
    session.start_game(true).expect("start");

    assert_eq!(session.current_hint(), Some("first hint"));
    assert_eq!(session.next_hint().expect("hint"), Some("second hint"));
    assert_eq!(session.next_hint().expect("hint"), Some("first hint"));
}

#[test]
fn zero_difficulty_is_a_full_board_right_away() {
    let mut session = session();
    session.set_difficulty(0).expect("difficulty");
    session.start_game(true).expect("start");
    assert_eq!(session.state(), GameState::FullBoard);
    assert_eq!(session.shuffled().expect("shuffled").removed_count(), 0);
}
