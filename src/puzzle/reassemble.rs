#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{
    PuzzleError,
    token::{Token, TokenKind},
};

/// Concatenates the images of a board, slot by slot. Empty placeholders
/// contribute nothing.
///
/// `None` marks a gap nobody filled; any such gap makes the board unfit for
/// compilation and the call fails with [`PuzzleError::IncompletePlacement`].
pub fn reassemble<'a, I>(board: I) -> Result<String, PuzzleError>
where
    I: IntoIterator<Item = Option<&'a Token>>,
{
    let mut text = String::new();
    let mut unfilled = 0;

    for slot in board {
        match slot {
            Some(token) if token.kind() == TokenKind::Empty => {}
            Some(token) => text.push_str(token.image()),
            None => unfilled += 1,
        }
    }

    if unfilled > 0 {
        Err(PuzzleError::IncompletePlacement { unfilled })
    } else {
        Ok(text)
    }
}

/// Like [`reassemble`], but unfilled gaps contribute no text.
pub fn reassemble_lenient<'a, I>(board: I) -> String
where
    I: IntoIterator<Item = Option<&'a Token>>,
{
    board
        .into_iter()
        .flatten()
        .filter(|token| token.kind() != TokenKind::Empty)
        .map(Token::image)
        .collect()
}
