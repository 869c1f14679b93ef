#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::java::diagnostics::{DiagnosticSeverity, JavacDiagnostic, LineRef};

peg::parser! {
    /// includes some useful grammars for parsing javac/java outputs.
    pub grammar parser() for str {
        /// matches any sequence of 1 or more numbers
        rule number() -> u32
            = n:$(['0'..='9']+) {? n.parse().or(Err("u32")) }

        /// matches any number of spaces or tabs
        rule blank() = quiet!{[' ' | '\t']*}

        /// matches line numbers (colon followed by numbers, eg. :23:)
        rule line_number() -> u32
            = ":" n:number() ":" { n }

        /// matches everything up to the first `:<digits>:`
        rule path() -> &'input str
            = $((!line_number() [_])+)

        /// matches "error" or "warning"
        rule severity() -> DiagnosticSeverity
            = "error" { DiagnosticSeverity::Error }
            / "warning" { DiagnosticSeverity::Warning }

        /// matches the rest of the line
        rule rest() -> &'input str
            = $([_]*)

        /// parses the first line of a javac diagnostic message and returns a `JavacDiagnostic`
        pub rule diagnostic() -> JavacDiagnostic
            = p:path() l:line_number() blank() s:severity() ":" blank() m:rest()
            {
                let name = std::path::Path::new(p.trim())
                    .file_name()
                    .map(|value| value.to_string_lossy().to_string())
                    .unwrap_or_else(|| p.trim().to_string());

                JavacDiagnostic::builder()
                    .file_name(name)
                    .line_number(l)
                    .severity(s)
                    .message(m.trim_end())
                    .build()
            }

        /// parses javac's closing summary line, e.g. `2 errors`
        pub rule error_count() -> u32
            = blank() n:number() " error" "s"? blank() { n }

        /// matches a qualified method name in a stack frame
        rule frame_method() = (!"(" [_])+

        /// matches the file name inside a stack frame
        rule frame_file() -> &'input str
            = $((!(":" / ")") [_])+)

        /// Parses a LineRef out of a `java` stack trace line
        pub rule stack_frame() -> LineRef
            = blank() "at " frame_method() "(" f:frame_file() ":" n:number() ")" rest()
            {
                LineRef { file_name: f.to_string(), line_number: n as usize }
            }
    }
}
