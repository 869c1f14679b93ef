#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// How long a player's program may take to compile and run, in milliseconds
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;

/// Hard ceiling for a single `javac`/`java` process, in seconds. Runs past the
/// compile timeout are abandoned by the game but keep going in the background
/// until this limit kills them.
pub const DEFAULT_PROCESS_LIMIT_SECS: u64 = 60;

/// Difficulty a session starts with
pub const DEFAULT_DIFFICULTY: u8 = 50;

/// Directory puzzles are loaded from, relative to the working directory
pub const DEFAULT_PUZZLE_DIR: &str = "puzzles";

/// Upper bound (inclusive) and label of each difficulty band
pub const DIFFICULTY_BANDS: [(u8, &str); 4] =
    [(32, "EASY"), (64, "MEDIUM"), (90, "HARD"), (100, "INSANE")];

/// Prefix of the scratch directories candidate programs are compiled in
pub const SCRATCH_PREFIX: &str = "tokanagrammar";

/// Tree-sitter node kinds kept whole even though the grammar splits them
pub const ATOMIC_NODE_KINDS: [&str; 3] = ["string_literal", "character_literal", "text_block"];

/// Tree-sitter node kinds turned into structural tokens
pub const COMMENT_NODE_KINDS: [&str; 2] = ["line_comment", "block_comment"];

/// Longest program output kept in a verdict, in bytes
pub const OUTPUT_LIMIT: usize = 16 * 1024;
