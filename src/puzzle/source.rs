#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

use super::token::Token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One compilable program, cut into tokens.
///
/// Token order is the literal program order: concatenating every image gives
/// back the program text.
pub struct SourceFile {
    /// tokens in program order
    tokens:          Vec<Token>,
    /// name of the class `java` has to run
    class_name:      String,
    /// what the program prints when it is put back together correctly
    expected_output: String,
}

impl SourceFile {
    /// Creates a new `SourceFile`.
    ///
    /// * `tokens`: tokens in program order
    /// * `class_name`: the compilable unit the tokens form
    /// * `expected_output`: recorded output of the intact program
    pub fn new(
        tokens: Vec<Token>,
        class_name: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            class_name: class_name.into(),
            expected_output: expected_output.into(),
        }
    }

    /// Get a reference to the source's tokens.
    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_ref()
    }

    /// Number of tokens, removable or not.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the source holds no token at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Get the class name.
    pub fn class_name(&self) -> &str {
        self.class_name.as_ref()
    }

    /// Get the expected output.
    pub fn expected_output(&self) -> &str {
        self.expected_output.as_ref()
    }

    /// Number of tokens a shuffle may pick.
    pub fn removable_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_removable()).count()
    }

    /// The program text, i.e. every token image in order.
    pub fn text(&self) -> String {
        self.tokens.iter().map(Token::image).collect()
    }
}
