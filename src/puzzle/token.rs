#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Kinds of tokens -
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// - a piece of program text the player may have to put back
    Code,
    /// - layout kept on the board: whitespace, line breaks, comments
    Structural,
    /// - a zero-width placeholder, e.g. for a blank line
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The smallest unit of source text carried through a puzzle.
///
/// A token's image is fixed at construction; there is no way to change it
/// afterwards.
pub struct Token {
    /// what the token is
    kind:  TokenKind,
    /// literal text of the token, as it appears in the program
    image: String,
}

impl Token {
    /// Creates a new token of `kind` with the literal text `image`.
    pub fn new(kind: TokenKind, image: impl Into<String>) -> Self {
        Self {
            kind,
            image: image.into(),
        }
    }

    /// Creates a code token.
    pub fn code(image: impl Into<String>) -> Self {
        Self::new(TokenKind::Code, image)
    }

    /// Creates a structural token (whitespace or comment).
    pub fn structural(image: impl Into<String>) -> Self {
        Self::new(TokenKind::Structural, image)
    }

    /// Creates an empty placeholder.
    pub fn empty() -> Self {
        Self::new(TokenKind::Empty, String::new())
    }

    /// Get the token's kind.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Get a reference to the token's literal text.
    pub fn image(&self) -> &str {
        self.image.as_str()
    }

    /// Only code tokens can be pulled off the board.
    pub fn is_removable(&self) -> bool {
        self.kind == TokenKind::Code
    }

    /// True for structural tokens made of whitespace only.
    pub fn is_layout(&self) -> bool {
        match self.kind {
            TokenKind::Empty => true,
            TokenKind::Structural => self.image.chars().all(char::is_whitespace),
            TokenKind::Code => false,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.image)
    }
}
