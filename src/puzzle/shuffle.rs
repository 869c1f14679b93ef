#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt::{self, Display},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};

use super::{PuzzleError, source::SourceFile, token::Token};
use crate::constants::{DEFAULT_DIFFICULTY, DIFFICULTY_BANDS};

/// Hands out a distinct identity to every shuffle, so bay tokens can be traced
/// back to the shuffle that produced them.
static NEXT_SHUFFLE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Percentage of removable tokens taken off the board.
pub struct Difficulty(u8);

impl Difficulty {
    /// Validates `percent` and wraps it.
    pub fn new(percent: i64) -> Result<Self, PuzzleError> {
        if (0..=100).contains(&percent) {
            Ok(Self(percent as u8))
        } else {
            Err(PuzzleError::InvalidDifficulty(percent))
        }
    }

    /// The wrapped percentage.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// How many of `removable` tokens this difficulty takes away:
    /// `round(removable * percent / 100)`, halves rounding up.
    pub fn removal_target(self, removable: usize) -> usize {
        ((removable * self.0 as usize + 50) / 100).min(removable)
    }

    /// EASY, MEDIUM, HARD or INSANE.
    pub fn label(self) -> &'static str {
        DIFFICULTY_BANDS
            .iter()
            .find(|(upper, _)| self.0 <= *upper)
            .map(|(_, label)| *label)
            .unwrap_or("INSANE")
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = PuzzleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% ({})", self.0, self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Position of a token in the bay.
pub struct BayId(pub usize);

impl Display for BayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A token that was taken off the board.
pub struct BayToken {
    /// identity of the shuffle that removed it
    shuffle: u64,
    /// position in the bay
    id:      BayId,
    /// the removed token itself
    token:   Token,
}

impl BayToken {
    /// Get the token's bay id.
    pub fn id(&self) -> BayId {
        self.id
    }

    /// Get a reference to the removed token.
    pub fn token(&self) -> &Token {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One position of the shuffled board.
pub enum Slot {
    /// A token that stayed where it was.
    Fixed(Token),
    /// A hole; the number counts gaps from the top of the program.
    Gap(usize),
}

impl Slot {
    /// True for gap markers.
    pub fn is_gap(&self) -> bool {
        matches!(self, Slot::Gap(_))
    }
}

#[derive(Debug, Clone)]
/// The outcome of shuffling a [`SourceFile`].
///
/// Any index into `remaining` is also an index into the original token
/// sequence: gaps take the place of the tokens they stand for.
pub struct ShuffledSource {
    /// identity handed to every bay token
    id:              u64,
    /// the intact program
    source:          Arc<SourceFile>,
    /// the board, gaps included
    remaining:       Vec<Slot>,
    /// removed tokens, in the order they were drawn
    bay:             Vec<BayToken>,
    /// original index of each bay token, indexed by bay id
    origins:         Vec<usize>,
    /// board index of each gap, indexed by gap number
    gaps:            Vec<usize>,
    /// how many tokens could have been removed
    total_removable: usize,
    /// difficulty used for this shuffle
    difficulty:      Difficulty,
}

impl ShuffledSource {
    /// The board with gap markers.
    pub fn remaining_sequence(&self) -> &[Slot] {
        self.remaining.as_ref()
    }

    /// Removed tokens. The order is only meant for display.
    pub fn bay_tokens(&self) -> &[BayToken] {
        self.bay.as_ref()
    }

    /// Number of tokens the source offered for removal.
    pub fn total_removable(&self) -> usize {
        self.total_removable
    }

    /// Number of tokens actually removed.
    pub fn removed_count(&self) -> usize {
        self.bay.len()
    }

    /// Number of gaps on the board; always equal to [`Self::removed_count`].
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// The program this shuffle was cut from.
    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    /// Difficulty the shuffle was made with.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Where `token` sat before it was removed.
    pub fn original_slot_of(&self, token: &BayToken) -> Result<usize, PuzzleError> {
        if token.shuffle != self.id {
            return Err(PuzzleError::UnknownToken(token.id.0));
        }
        self.original_slot_of_id(token.id)
    }

    /// Where the token with bay id `id` sat before it was removed.
    pub fn original_slot_of_id(&self, id: BayId) -> Result<usize, PuzzleError> {
        self.origins
            .get(id.0)
            .copied()
            .ok_or(PuzzleError::UnknownToken(id.0))
    }

    /// Looks up a bay token by id.
    pub fn bay_token(&self, id: BayId) -> Result<&BayToken, PuzzleError> {
        self.bay.get(id.0).ok_or(PuzzleError::UnknownToken(id.0))
    }

    /// Board index of gap number `gap`.
    pub fn gap_slot(&self, gap: usize) -> Option<usize> {
        self.gaps.get(gap).copied()
    }

    /// Gap number of the gap at board index `slot`, if there is one.
    pub fn gap_at_slot(&self, slot: usize) -> Option<usize> {
        self.gaps.binary_search(&slot).ok()
    }
}

/// Draws tokens off source files.
///
/// Two shufflers built with the same seed make the same selections, call for
/// call.
#[derive(Debug)]
pub struct Shuffler {
    /// seed the generator started from
    seed: u64,
    /// the generator
    rng:  StdRng,
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl Shuffler {
    /// Creates a shuffler with a random seed.
    pub fn new() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// Creates a shuffler with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this shuffler started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Removes `round(R * difficulty / 100)` of the `R` removable tokens of
    /// `source`, uniformly and without replacement.
    ///
    /// * `source`: the program to cut up; it is left untouched
    /// * `difficulty_percent`: between 0 and 100
    pub fn shuffle(
        &mut self,
        source: Arc<SourceFile>,
        difficulty_percent: i64,
    ) -> Result<ShuffledSource, PuzzleError> {
        let difficulty = Difficulty::new(difficulty_percent)?;
        if source.is_empty() {
            return Err(PuzzleError::EmptySource);
        }

        let removable: Vec<usize> = source
            .tokens()
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is_removable())
            .map(|(index, _)| index)
            .collect();
        let target = difficulty.removal_target(removable.len());
        let drawn = index::sample(&mut self.rng, removable.len(), target);

        let id = NEXT_SHUFFLE.fetch_add(1, Ordering::Relaxed);
        let mut remaining: Vec<Slot> = source.tokens().iter().cloned().map(Slot::Fixed).collect();
        let mut bay = Vec::with_capacity(target);
        let mut origins = Vec::with_capacity(target);

        for (position, pick) in drawn.into_iter().enumerate() {
            let index = removable[pick];
            bay.push(BayToken {
                shuffle: id,
                id:      BayId(position),
                token:   source.tokens()[index].clone(),
            });
            origins.push(index);
            remaining[index] = Slot::Gap(0);
        }

        let mut gaps = Vec::with_capacity(target);
        for (index, slot) in remaining.iter_mut().enumerate() {
            if let Slot::Gap(number) = slot {
                *number = gaps.len();
                gaps.push(index);
            }
        }

        tracing::debug!(
            seed = self.seed,
            removable = removable.len(),
            removed = target,
            "shuffled {} at {}",
            source.class_name(),
            difficulty
        );

        Ok(ShuffledSource {
            id,
            total_removable: removable.len(),
            source,
            remaining,
            bay,
            origins,
            gaps,
            difficulty,
        })
    }
}
