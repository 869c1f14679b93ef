use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tokanagrammar::{
    catalog::Puzzle,
    java::BracingStyle,
    puzzle::{PlacementState, Shuffler, Slot, SourceFile, Token, TokenKind, reassemble},
};

fn puzzle_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("puzzles")
}

fn fixture_sources() -> Vec<Arc<SourceFile>> {
    let mut metas: Vec<PathBuf> = std::fs::read_dir(puzzle_dir())
        .expect("read puzzle dir")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    metas.sort();
    assert!(!metas.is_empty(), "no puzzle fixtures found");

    metas
        .iter()
        .map(|path| {
            let puzzle = Puzzle::from_metadata(path).expect("load puzzle");
            Arc::new(
                puzzle
                    .source_file(BracingStyle::Allman)
                    .expect("tokenize puzzle"),
            )
        })
        .collect()
}

fn expected_removed(removable: usize, percent: usize) -> usize {
    ((removable * percent + 50) / 100).min(removable)
}

fn image_counts<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.image().to_string()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn bay_size_follows_difficulty_on_real_programs() {
    for source in fixture_sources() {
        for percent in [0, 1, 33, 50, 64, 90, 100] {
            let shuffled = Shuffler::seeded(percent as u64)
                .shuffle(Arc::clone(&source), percent as i64)
                .expect("shuffle");
            assert_eq!(
                shuffled.bay_tokens().len(),
                expected_removed(source.removable_count(), percent),
                "{} at {percent}%",
                source.class_name()
            );
            assert_eq!(shuffled.total_removable(), source.removable_count());
            assert_eq!(shuffled.removed_count(), shuffled.bay_tokens().len());
        }
    }
}

#[test]
fn remaining_and_bay_partition_the_removable_tokens() {
    for source in fixture_sources() {
        let shuffled = Shuffler::seeded(11)
            .shuffle(Arc::clone(&source), 60)
            .expect("shuffle");

        let kept = shuffled
            .remaining_sequence()
            .iter()
            .filter_map(|slot| match slot {
                Slot::Fixed(token) if token.is_removable() => Some(token),
                _ => None,
            });
        let bay = shuffled.bay_tokens().iter().map(|b| b.token());
        let together = image_counts(kept.chain(bay));

        let original = image_counts(source.tokens().iter().filter(|t| t.is_removable()));
        assert_eq!(together, original, "{}", source.class_name());

        assert!(
            shuffled
                .bay_tokens()
                .iter()
                .all(|b| b.token().kind() == TokenKind::Code)
        );
    }
}

#[test]
fn restoring_every_token_gives_back_the_program() {
    for source in fixture_sources() {
        for percent in [0, 50, 100] {
            let shuffled = Shuffler::seeded(3)
                .shuffle(Arc::clone(&source), percent)
                .expect("shuffle");
            let placement = PlacementState::solved(&shuffled).expect("solve");
            let text = reassemble(placement.board(&shuffled)).expect("reassemble");
            assert_eq!(text, source.text(), "{} at {percent}%", source.class_name());
        }
    }
}

#[test]
fn original_slots_point_at_matching_tokens() {
    for source in fixture_sources() {
        let shuffled = Shuffler::seeded(5)
            .shuffle(Arc::clone(&source), 80)
            .expect("shuffle");
        for bay in shuffled.bay_tokens() {
            let slot = shuffled.original_slot_of(bay).expect("slot");
            assert_eq!(&source.tokens()[slot], bay.token());
            assert!(shuffled.remaining_sequence()[slot].is_gap());
            assert_eq!(shuffled.original_slot_of(bay).expect("slot"), slot);
        }
    }
}

#[test]
fn brace_styles_do_not_change_removable_tokens() {
    let code = std::fs::read_to_string(puzzle_dir().join("Countdown.java")).expect("read");
    let allman = tokanagrammar::java::source_file(code.as_str(), "", BracingStyle::Allman)
        .expect("allman");
    let kr = tokanagrammar::java::source_file(code.as_str(), "", BracingStyle::KAndR).expect("kr");

    let removable = |s: &SourceFile| -> Vec<String> {
        s.tokens()
            .iter()
            .filter(|t| t.is_removable())
            .map(|t| t.image().to_string())
            .collect()
    };
    assert_eq!(removable(&allman), removable(&kr));
    assert!(kr.text().contains("public class Countdown {"));
    assert!(allman.text().contains("public class Countdown\n{"));
}
