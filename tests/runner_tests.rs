use std::{sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use futures::future::{BoxFuture, pending};
use tokanagrammar::{
    compile::{
        CompileFacility, CompileRunner, Completion, Execution, Outcome, RunnerError,
        RunnerState,
    },
    puzzle::{PlacementState, Shuffler, SourceFile, Token, reassemble},
};
use tokio::sync::Notify;

/// Prints `output` for the one program it knows, and fails to compile
/// anything else.
struct Oracle {
    solution: String,
    output:   String,
}

impl CompileFacility for Oracle {
    fn compile_and_run(&self, source: String, _class: String) -> BoxFuture<'static, Result<Execution>> {
        let result = if source == self.solution {
            Execution::success(self.output.clone())
        } else {
            Execution::error("Main.java:1: error: cannot find symbol")
        };
        Box::pin(async move { Ok(result) })
    }
}

/// Echoes the source back as output.
struct Echo;

impl CompileFacility for Echo {
    fn compile_and_run(&self, source: String, _class: String) -> BoxFuture<'static, Result<Execution>> {
        Box::pin(async move { Ok(Execution::success(source)) })
    }
}

/// Never answers.
struct Silent;

impl CompileFacility for Silent {
    fn compile_and_run(&self, _: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        Box::pin(pending())
    }
}

/// Answers after `delay`.
struct Slow {
    delay: Duration,
}

impl CompileFacility for Slow {
    fn compile_and_run(&self, source: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(Execution::success(source))
        })
    }
}

/// Echoes once the gate opens.
struct Gated {
    gate: Arc<Notify>,
}

impl CompileFacility for Gated {
    fn compile_and_run(&self, source: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        let gate = Arc::clone(&self.gate);
        Box::pin(async move {
            gate.notified().await;
            Ok(Execution::success(source))
        })
    }
}

/// Breaks before it gets to compile anything.
struct Broken;

impl CompileFacility for Broken {
    fn compile_and_run(&self, _: String, _: String) -> BoxFuture<'static, Result<Execution>> {
        Box::pin(async { Err(anyhow!("Cannot find a Java Compiler on path (javac)")) })
    }
}

fn ten_token_source() -> Arc<SourceFile> {
    let mut tokens = vec![];
    for i in 0..10 {
        if i > 0 {
            tokens.push(Token::structural(" "));
        }
        tokens.push(Token::code(format!("t{i}")));
    }
    Arc::new(SourceFile::new(tokens, "Main", "ok\n"))
}

fn runner(facility: impl CompileFacility + 'static, timeout_ms: u64) -> CompileRunner {
    CompileRunner::new(Arc::new(facility), Duration::from_millis(timeout_ms))
}

#[tokio::test]
async fn solved_board_passes() {
    let source = ten_token_source();
    let shuffled = Shuffler::seeded(1)
        .shuffle(Arc::clone(&source), 50)
        .expect("shuffle");
    assert_eq!(shuffled.removed_count(), 5);

    let placement = PlacementState::solved(&shuffled).expect("solve");
    let text = reassemble(placement.board(&shuffled)).expect("reassemble");
    assert_eq!(text, source.text());

    let oracle = Oracle {
        solution: source.text(),
        output:   "ok\n".into(),
    };
    let verdict = runner(oracle, 1_000)
        .run(text, &source)
        .await
        .expect("run");
    assert_eq!(verdict.outcome(), Outcome::Pass);
    assert_eq!(verdict.output(), Some("ok\n"));
}

#[tokio::test]
async fn misplaced_token_never_passes() {
    let source = ten_token_source();
    let shuffled = Shuffler::seeded(2)
        .shuffle(Arc::clone(&source), 50)
        .expect("shuffle");

    let solved = PlacementState::solved(&shuffled).expect("solve");
    let first = solved.occupant(0).expect("gap 0");
    let second = solved.occupant(1).expect("gap 1");
    let mut placement = solved.clone();
    placement.remove(0).expect("remove");
    placement.remove(1).expect("remove");
    placement.place(0, second).expect("place");
    placement.place(1, first).expect("place");
    let text = reassemble(placement.board(&shuffled)).expect("reassemble");

    let oracle = Oracle {
        solution: source.text(),
        output:   "ok\n".into(),
    };
    let verdict = runner(oracle, 1_000)
        .run(text, &source)
        .await
        .expect("run");
    assert_ne!(verdict.outcome(), Outcome::Pass);
    assert_eq!(verdict.outcome(), Outcome::FailCompileError);
}

#[tokio::test]
async fn wrong_output_is_a_mismatch() {
    let source = ten_token_source();
    let verdict = runner(Echo, 1_000)
        .run("not ok\n".into(), &source)
        .await
        .expect("run");
    assert_eq!(verdict.outcome(), Outcome::FailMismatch);
    assert_eq!(verdict.output(), Some("not ok\n"));
    assert!(verdict.diff().expect("diff").contains("+ not ok"));
}

#[tokio::test]
async fn silent_facility_times_out_once_and_frees_the_runner() {
    let runner = runner(Silent, 50);

    let submission = runner
        .submit("class A {}".into(), "A".into())
        .expect("submit");
    assert_eq!(runner.state(), RunnerState::Submitted);
    assert_eq!(submission.wait().await, Completion::TimedOut);
    assert_eq!(runner.state(), RunnerState::Idle);

    let again = runner
        .submit("class A {}".into(), "A".into())
        .expect("runner is ready right after a timeout");
    assert_eq!(again.wait().await, Completion::TimedOut);
}

#[tokio::test]
async fn timed_out_verdict_has_no_output() {
    let source = ten_token_source();
    let verdict = runner(Silent, 30)
        .run(source.text(), &source)
        .await
        .expect("run");
    assert_eq!(verdict.outcome(), Outcome::Timeout);
    assert_eq!(verdict.output(), None);
}

#[tokio::test]
async fn late_results_are_discarded() {
    let runner = runner(
        Slow {
            delay: Duration::from_millis(150),
        },
        20,
    );

    let first = runner.submit("late".into(), "A".into()).expect("submit");
    assert_eq!(first.wait().await, Completion::TimedOut);

    let second = runner.submit("late".into(), "A".into()).expect("submit");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(second.wait().await, Completion::TimedOut);
    assert_eq!(runner.state(), RunnerState::Idle);
}

#[tokio::test]
async fn second_submit_is_busy_and_leaves_the_first_alone() {
    let gate = Arc::new(Notify::new());
    let runner = runner(
        Gated {
            gate: Arc::clone(&gate),
        },
        2_000,
    );

    let first = runner.submit("first".into(), "A".into()).expect("submit");
    let second = runner.submit("second".into(), "A".into());
    assert!(matches!(second, Err(RunnerError::CompilationBusy)));

    gate.notify_one();
    assert_eq!(
        first.wait().await,
        Completion::Completed(Execution::success("first"))
    );
    assert_eq!(runner.state(), RunnerState::Idle);
}

#[tokio::test]
async fn clones_share_the_submission_slot() {
    let runner = runner(Silent, 1_000);
    let other = runner.clone();
    let _pending = runner.submit("a".into(), "A".into()).expect("submit");
    assert!(matches!(
        other.submit("b".into(), "A".into()),
        Err(RunnerError::CompilationBusy)
    ));
}

#[tokio::test]
async fn abandoned_submission_frees_the_runner() {
    let runner = runner(Silent, 1_000);
    let submission = runner.submit("a".into(), "A".into()).expect("submit");
    drop(submission);
    assert_eq!(runner.state(), RunnerState::Idle);
    runner
        .submit("b".into(), "A".into())
        .expect("runner is free again");
}

#[tokio::test]
async fn facility_failures_become_compile_errors() {
    let source = ten_token_source();
    let verdict = runner(Broken, 1_000)
        .run(source.text(), &source)
        .await
        .expect("run");
    assert_eq!(verdict.outcome(), Outcome::FailCompileError);
    assert!(verdict.output().expect("output").contains("javac"));
}

#[test]
fn submitting_outside_a_runtime_is_an_error() {
    let runner = runner(Echo, 1_000);
    let result = runner.submit("a".into(), "A".into());
    assert!(matches!(result, Err(RunnerError::Unknown(_))));
    assert_eq!(runner.state(), RunnerState::Idle);
}
