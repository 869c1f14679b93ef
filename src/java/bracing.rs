#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, str::FromStr};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::puzzle::{Token, TokenKind};

/// Code tokens after which `{` opens an initializer rather than a block.
const INITIALIZER_PREFIXES: [&str; 5] = ["=", "]", ",", "(", "{"];

/// Where opening braces go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracingStyle {
    /// On a line of their own, indented like the header they open.
    #[default]
    Allman,
    /// At the end of the header line.
    KAndR,
}

impl FromStr for BracingStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allman" => Ok(Self::Allman),
            "kr" | "k&r" | "knr" | "kandr" => Ok(Self::KAndR),
            other => bail!("Unknown bracing style `{other}` (expected `allman` or `kr`)"),
        }
    }
}

impl fmt::Display for BracingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allman => "allman",
            Self::KAndR => "kr",
        })
    }
}

/// Re-lays the whitespace in front of every block-opening `{` in `style`.
///
/// Only layout tokens between a header and its brace are replaced; code
/// tokens and comments come out exactly as they went in. Braces that open
/// array initializers, and braces separated from their header by a comment,
/// are left where they are.
pub fn relayout(tokens: Vec<Token>, style: BracingStyle) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if token.kind() == TokenKind::Code && token.image() == "{" {
            let header = out.iter().rposition(|t| !t.is_layout());
            let opens_block = header.is_some_and(|at| {
                let prev = &out[at];
                prev.kind() == TokenKind::Code && !INITIALIZER_PREFIXES.contains(&prev.image())
            });

            if let Some(at) = header.filter(|_| opens_block) {
                out.truncate(at + 1);
                match style {
                    BracingStyle::KAndR => out.push(Token::structural(" ")),
                    BracingStyle::Allman => {
                        let indent = current_indent(&out);
                        out.push(Token::structural("\n"));
                        if !indent.is_empty() {
                            out.push(Token::structural(indent));
                        }
                    }
                }
            }
        }
        out.push(token);
    }

    out
}

/// Leading whitespace of the line the last token of `tokens` is on.
fn current_indent(tokens: &[Token]) -> String {
    let mut line = String::new();
    for token in tokens.iter().rev() {
        match token.image().rfind('\n') {
            Some(at) => {
                line.insert_str(0, &token.image()[at + 1..]);
                break;
            }
            None => line.insert_str(0, token.image()),
        }
    }
    line.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::{Parser, tokenizer::tokenize};

    fn relaid(code: &str, style: BracingStyle) -> String {
        let parser = Parser::new(code.to_string()).unwrap();
        relayout(tokenize(&parser), style)
            .iter()
            .map(Token::image)
            .collect()
    }

    #[test]
    fn allman_moves_braces_down() {
        let code = "class A {\n    void f() {\n        g();\n    }\n}\n";
        assert_eq!(
            relaid(code, BracingStyle::Allman),
            "class A\n{\n    void f()\n    {\n        g();\n    }\n}\n"
        );
    }

    #[test]
    fn kr_pulls_braces_up() {
        let code = "class A\n{\n    void f()\n    {\n    }\n}\n";
        assert_eq!(
            relaid(code, BracingStyle::KAndR),
            "class A {\n    void f() {\n    }\n}\n"
        );
    }

    #[test]
    fn initializers_are_left_alone() {
        let code = "class A { int[] xs = {1, 2}; int[][] ys = new int[][] {{1}, {2}}; }";
        assert_eq!(
            relaid(code, BracingStyle::KAndR),
            "class A { int[] xs = {1, 2}; int[][] ys = new int[][] {{1}, {2}}; }"
        );
    }

    #[test]
    fn comments_before_a_brace_block_the_move() {
        let code = "class A // note\n{\n}\n";
        assert_eq!(relaid(code, BracingStyle::KAndR), code);
    }

    #[test]
    fn parses_style_names() {
        assert_eq!("Allman".parse::<BracingStyle>().unwrap(), BracingStyle::Allman);
        assert_eq!("k&r".parse::<BracingStyle>().unwrap(), BracingStyle::KAndR);
        assert!("gnu".parse::<BracingStyle>().is_err());
    }
}
