#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Result, anyhow, bail};

use super::{
    bracing::{self, BracingStyle},
    parser::Parser,
    queries::{CLASSNAME_QUERY, MAIN_METHOD_QUERY, PACKAGE_QUERY, PUBLIC_CLASS_QUERY},
};
use crate::puzzle::{SourceFile, Token};

/// Cuts parsed Java code into tokens.
///
/// Syntax leaves become code tokens, comments and whitespace become
/// structural tokens, and every blank line gets an empty placeholder in front
/// of it. Concatenating the images gives the parser's code back unchanged.
pub fn tokenize(parser: &Parser) -> Vec<Token> {
    let code = parser.code();
    let mut tokens = Vec::new();
    let mut at = 0;

    for span in parser.spans() {
        if span.start > at {
            push_layout(&code[at..span.start], &mut tokens);
        }
        let image = &code[span.start..span.end];
        tokens.push(if span.comment {
            Token::structural(image)
        } else {
            Token::code(image)
        });
        at = span.end;
    }

    if at < code.len() {
        push_layout(&code[at..], &mut tokens);
    }

    tokens
}

/// Splits the whitespace between two tokens at line breaks.
fn push_layout(gap: &str, tokens: &mut Vec<Token>) {
    for (line, piece) in gap.split_inclusive('\n').enumerate() {
        if line > 0 && piece.ends_with('\n') {
            tokens.push(Token::empty());
        }
        tokens.push(Token::structural(piece));
    }
}

/// Returns the first value captured as `capture` by query `q`.
fn first_capture(parser: &Parser, q: &str, capture: &str) -> Result<Option<String>> {
    Ok(parser
        .query(q)?
        .into_iter()
        .find_map(|mut captures| captures.remove(capture)))
}

/// Name `java` needs to run the program: the public top-level class, or else
/// the first class with a `main` method, or else the first class; qualified
/// with the package if there is one.
pub fn class_name(parser: &Parser) -> Result<String> {
    let simple = match first_capture(parser, PUBLIC_CLASS_QUERY, "name")? {
        Some(name) => name,
        None => match first_capture(parser, MAIN_METHOD_QUERY, "class")? {
            Some(name) => name,
            None => first_capture(parser, CLASSNAME_QUERY, "name")?
                .ok_or_else(|| anyhow!("Could not find a top-level class declaration"))?,
        },
    };

    Ok(match first_capture(parser, PACKAGE_QUERY, "name")? {
        Some(package) => format!("{}.{simple}", package.trim()),
        None => simple,
    })
}

/// Parses `code` and cuts it into a [`SourceFile`] laid out in `style`.
///
/// * `code`: a complete Java program
/// * `expected_output`: what the program prints
/// * `style`: where opening braces go
pub fn source_file(
    code: impl Into<String>,
    expected_output: impl Into<String>,
    style: BracingStyle,
) -> Result<SourceFile> {
    let parser = Parser::new(code.into())?;
    if let Some((line, column)) = parser.first_error() {
        bail!("Java source does not parse: syntax error at line {line}, column {column}");
    }

    let tokens = bracing::relayout(tokenize(&parser), style);
    if tokens.is_empty() {
        bail!("Java source is empty");
    }

    Ok(SourceFile::new(tokens, class_name(&parser)?, expected_output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::TokenKind;

    const HELLO: &str = "public class Hello {\n    // greet\n    public static void \
                         main(String[] args) {\n\n        System.out.println(\"hi there\");\n    \
                         }\n}\n";

    fn parse(code: &str) -> Parser {
        Parser::new(code.to_string()).expect("parser should initialize")
    }

    #[test]
    fn tokens_concatenate_to_the_input() {
        let tokens = tokenize(&parse(HELLO));
        let text: String = tokens.iter().map(Token::image).collect();
        assert_eq!(text, HELLO);
    }

    #[test]
    fn string_literals_stay_whole() {
        let tokens = tokenize(&parse(HELLO));
        assert!(
            tokens
                .iter()
                .any(|t| t.kind() == TokenKind::Code && t.image() == "\"hi there\"")
        );
        assert!(!tokens.iter().any(|t| t.image() == "hi there"));
    }

    #[test]
    fn comments_and_whitespace_are_structural() {
        let tokens = tokenize(&parse(HELLO));
        let comment = tokens.iter().find(|t| t.image() == "// greet").unwrap();
        assert_eq!(comment.kind(), TokenKind::Structural);
        assert!(
            tokens
                .iter()
                .filter(|t| t.kind() == TokenKind::Code)
                .all(|t| !t.image().trim().is_empty())
        );
    }

    #[test]
    fn blank_lines_get_a_placeholder() {
        let tokens = tokenize(&parse(HELLO));
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.kind() == TokenKind::Empty)
                .count(),
            1
        );
    }

    #[test]
    fn picks_the_public_class() {
        let parser = parse("class Helper {}\npublic class Main { }\n");
        assert_eq!(class_name(&parser).unwrap(), "Main");
    }

    #[test]
    fn falls_back_to_the_class_with_main() {
        let parser = parse(
            "class Helper {}\nclass Runner { static void main(String[] a) {} }\n",
        );
        assert_eq!(class_name(&parser).unwrap(), "Runner");
    }

    #[test]
    fn qualifies_with_the_package() {
        let parser = parse("package demo.puzzles;\nclass Solo {}\n");
        assert_eq!(class_name(&parser).unwrap(), "demo.puzzles.Solo");
    }

    #[test]
    fn rejects_broken_code() {
        let err = source_file("class Broken { void f( }", "", BracingStyle::Allman).unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn rejects_code_without_a_class() {
        let err = source_file("interface Shape {}", "", BracingStyle::Allman).unwrap_err();
        assert!(err.to_string().contains("top-level class"));
    }
}
