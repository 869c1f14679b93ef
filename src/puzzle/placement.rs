#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use super::{
    PuzzleError,
    shuffle::{BayId, ShuffledSource, Slot},
    token::Token,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Which bay token currently fills which gap.
///
/// A gap holds at most one token and a token sits in at most one gap. Gaps
/// nobody filled are simply absent.
pub struct PlacementState {
    /// gap number -> token sitting in it
    occupants: BTreeMap<usize, BayId>,
    /// token -> gap it sits in
    positions: BTreeMap<BayId, usize>,
    /// number of gaps on the board
    gaps:      usize,
    /// number of tokens in the bay
    bay:       usize,
}

impl PlacementState {
    /// An empty placement for the board of `shuffled`.
    pub fn new(shuffled: &ShuffledSource) -> Self {
        Self {
            occupants: BTreeMap::new(),
            positions: BTreeMap::new(),
            gaps:      shuffled.gap_count(),
            bay:       shuffled.removed_count(),
        }
    }

    /// The placement that puts every bay token back where it came from.
    pub fn solved(shuffled: &ShuffledSource) -> Result<Self, PuzzleError> {
        let mut placement = Self::new(shuffled);
        for token in shuffled.bay_tokens() {
            let slot = shuffled.original_slot_of(token)?;
            let gap = shuffled
                .gap_at_slot(slot)
                .ok_or(PuzzleError::UnknownToken(token.id().0))?;
            placement.place(gap, token.id())?;
        }
        Ok(placement)
    }

    /// Puts `token` into the empty gap `gap`.
    pub fn place(&mut self, gap: usize, token: BayId) -> Result<(), PuzzleError> {
        self.check_gap(gap)?;
        if token.0 >= self.bay {
            return Err(PuzzleError::UnknownToken(token.0));
        }
        if let Some(current) = self.positions.get(&token) {
            return Err(PuzzleError::TokenAlreadyPlaced {
                token: token.0,
                gap:   *current,
            });
        }
        if self.occupants.contains_key(&gap) {
            return Err(PuzzleError::GapOccupied(gap));
        }

        self.occupants.insert(gap, token);
        self.positions.insert(token, gap);
        Ok(())
    }

    /// Empties `gap`, returning the token that sat there, if any.
    pub fn remove(&mut self, gap: usize) -> Result<Option<BayId>, PuzzleError> {
        self.check_gap(gap)?;
        let token = self.occupants.remove(&gap);
        if let Some(token) = token {
            self.positions.remove(&token);
        }
        Ok(token)
    }

    /// Moves whatever sits in `from` into the empty gap `to`.
    pub fn move_token(&mut self, from: usize, to: usize) -> Result<(), PuzzleError> {
        self.check_gap(from)?;
        self.check_gap(to)?;
        if from == to {
            return Ok(());
        }
        if self.occupants.contains_key(&to) {
            return Err(PuzzleError::GapOccupied(to));
        }
        if let Some(token) = self.remove(from)? {
            self.place(to, token)?;
        }
        Ok(())
    }

    /// Takes every token back off the board.
    pub fn clear(&mut self) {
        self.occupants.clear();
        self.positions.clear();
    }

    /// Token sitting in `gap`, if any.
    pub fn occupant(&self, gap: usize) -> Option<BayId> {
        self.occupants.get(&gap).copied()
    }

    /// Gap `token` sits in, if it is on the board.
    pub fn gap_of(&self, token: BayId) -> Option<usize> {
        self.positions.get(&token).copied()
    }

    /// True once every gap is filled.
    pub fn is_complete(&self) -> bool {
        self.occupants.len() == self.gaps
    }

    /// Gap numbers still waiting for a token, in board order.
    pub fn unfilled_gaps(&self) -> Vec<usize> {
        (0..self.gaps)
            .filter(|gap| !self.occupants.contains_key(gap))
            .collect()
    }

    /// Bay tokens not placed anywhere yet, in bay order.
    pub fn unplaced_tokens(&self) -> Vec<BayId> {
        (0..self.bay)
            .map(BayId)
            .filter(|token| !self.positions.contains_key(token))
            .collect()
    }

    /// A snapshot of the board: every slot in order, gaps resolved to the
    /// token filling them or `None`.
    pub fn board<'a>(&self, shuffled: &'a ShuffledSource) -> Vec<Option<&'a Token>> {
        shuffled
            .remaining_sequence()
            .iter()
            .map(|slot| match slot {
                Slot::Fixed(token) => Some(token),
                Slot::Gap(gap) => self
                    .occupant(*gap)
                    .and_then(|id| shuffled.bay_token(id).ok())
                    .map(|bay| bay.token()),
            })
            .collect()
    }

    /// Fails with [`PuzzleError::GapOutOfRange`] for gaps not on the board.
    fn check_gap(&self, gap: usize) -> Result<(), PuzzleError> {
        if gap < self.gaps {
            Ok(())
        } else {
            Err(PuzzleError::GapOutOfRange {
                gap,
                gaps: self.gaps,
            })
        }
    }
}
