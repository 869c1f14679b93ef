#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use bon::Builder;
use futures::{future::join_all, stream::FuturesUnordered};
use serde::{Deserialize, Serialize};

use crate::{
    java::{self, BracingStyle},
    puzzle::SourceFile,
    util::find_files,
};

/// A puzzle category, e.g. `loops` or `strings`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Creates a category.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The category name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `<Name>.json` file sitting next to a puzzle's `<Name>.java`.
#[derive(Debug, Deserialize)]
struct PuzzleMeta {
    /// unique puzzle id
    id:              String,
    /// category the puzzle is filed under
    category:        String,
    /// what the program prints
    expected_output: String,
    /// hints shown on request
    #[serde(default)]
    hints:           Vec<String>,
    /// source file, relative to the metadata; `<Name>.java` when absent
    #[serde(default)]
    source:          Option<PathBuf>,
}

/// One puzzle: a Java program and what it should print.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Puzzle {
    /// Unique id.
    #[builder(into)]
    id:              String,
    /// Category.
    #[builder(into)]
    category:        Category,
    /// The program text.
    #[builder(into)]
    code:            String,
    /// What the intact program prints.
    #[builder(into)]
    expected_output: String,
    /// Hints, in the order they are handed out.
    #[builder(default)]
    hints:           Vec<String>,
    /// Where the program was read from, if it came from disk.
    #[builder(into)]
    path:            Option<PathBuf>,
}

impl Puzzle {
    /// Reads a puzzle from its metadata file.
    ///
    /// The program is parsed once here so broken puzzles are noticed at load
    /// time rather than mid-game.
    pub fn from_metadata(meta_path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(meta_path)
            .with_context(|| format!("Could not read {}", meta_path.display()))?;
        let meta: PuzzleMeta = serde_json::from_str(&raw)
            .with_context(|| format!("Could not parse {}", meta_path.display()))?;

        let code_path = match meta.source {
            Some(relative) => meta_path
                .parent()
                .map(|dir| dir.join(&relative))
                .unwrap_or(relative),
            None => meta_path.with_extension("java"),
        };
        let code = std::fs::read_to_string(&code_path)
            .with_context(|| format!("Could not read {}", code_path.display()))?;

        let puzzle = Puzzle::builder()
            .id(meta.id)
            .category(meta.category.as_str())
            .code(code)
            .expected_output(meta.expected_output)
            .hints(meta.hints)
            .path(code_path)
            .build();

        puzzle
            .source_file(BracingStyle::default())
            .with_context(|| format!("Puzzle {} is not valid Java", puzzle.id))?;
        Ok(puzzle)
    }

    /// Returns the id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the category.
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Returns the program text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the expected output.
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Returns the hints.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Returns the path the program was read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Tokenizes the program, with braces laid out in `style`.
    pub fn source_file(&self, style: BracingStyle) -> Result<SourceFile> {
        java::source_file(self.code.as_str(), self.expected_output.as_str(), style)
    }
}

/// Hands out tokenized programs by puzzle id.
pub trait SourceProvider {
    /// The [`SourceFile`] for puzzle `id`, laid out in `style`.
    fn source_file(&self, id: &str, style: BracingStyle) -> Result<SourceFile>;
}

/// Every puzzle that could be loaded, ordered by category then id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// the puzzles
    puzzles: Vec<Puzzle>,
}

impl Catalog {
    /// Loads every puzzle under `dir`.
    ///
    /// Metadata files are parsed concurrently. Puzzles that fail to load are
    /// logged and left out; duplicate ids are an error.
    pub async fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Puzzle directory {} does not exist", dir.display());
        }
        let found = find_files("json", 1, dir)?;

        let handles = FuturesUnordered::new();
        for path in found {
            handles.push(tokio::task::spawn_blocking(move || {
                let loaded = Puzzle::from_metadata(&path);
                (path, loaded)
            }));
        }

        let mut puzzles = vec![];
        for result in join_all(handles).await {
            let (path, loaded) = result.context("Puzzle loading task panicked")?;
            match loaded {
                Ok(puzzle) => puzzles.push(puzzle),
                Err(e) => tracing::warn!("Skipping {}: {e:#}", path.display()),
            }
        }

        let catalog = Self::from_puzzles(puzzles)?;
        tracing::info!(
            "Loaded {} puzzles in {} categories from {}",
            catalog.len(),
            catalog.categories().len(),
            dir.display()
        );
        Ok(catalog)
    }

    /// Builds a catalog from puzzles already in memory.
    ///
    /// Every program must tokenize; duplicate ids are an error.
    pub fn from_puzzles(mut puzzles: Vec<Puzzle>) -> Result<Self> {
        puzzles.sort_by(|a, b| (&a.category, &a.id).cmp(&(&b.category, &b.id)));

        let mut seen = BTreeSet::new();
        for puzzle in &puzzles {
            if !seen.insert(puzzle.id.as_str()) {
                bail!("Two puzzles share the id `{}`", puzzle.id);
            }
            puzzle
                .source_file(BracingStyle::default())
                .with_context(|| format!("Puzzle `{}` is not a usable program", puzzle.id))?;
        }

        Ok(Self { puzzles })
    }

    /// Returns all puzzles.
    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    /// Number of puzzles.
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    /// True when no puzzle was loaded.
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Finds a puzzle by id.
    pub fn get(&self, id: &str) -> Option<&Puzzle> {
        self.puzzles.iter().find(|p| p.id == id)
    }

    /// Every category, sorted.
    pub fn categories(&self) -> BTreeSet<Category> {
        self.puzzles.iter().map(|p| p.category.clone()).collect()
    }

    /// Puzzles in any of `categories`; all puzzles when the set is empty.
    pub fn in_categories<'a>(
        &'a self,
        categories: &'a BTreeSet<Category>,
    ) -> impl Iterator<Item = &'a Puzzle> + 'a {
        self.puzzles
            .iter()
            .filter(move |p| categories.is_empty() || categories.contains(&p.category))
    }

    /// A wrap-around playlist over the puzzles in `categories`.
    pub fn playlist(&self, categories: &BTreeSet<Category>) -> Playlist {
        Playlist {
            ids:  self
                .in_categories(categories)
                .map(|p| p.id.clone())
                .collect(),
            next: 0,
        }
    }
}

impl SourceProvider for Catalog {
    fn source_file(&self, id: &str, style: BracingStyle) -> Result<SourceFile> {
        self.get(id)
            .with_context(|| format!("No puzzle with id `{id}`"))?
            .source_file(style)
    }
}

/// Puzzle ids in play order; starts over after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// ids in order
    ids:  Vec<String>,
    /// index of the id handed out next
    next: usize,
}

impl Playlist {
    /// The next id, wrapping around; `None` for an empty playlist.
    pub fn advance(&mut self) -> Option<&str> {
        if self.ids.is_empty() {
            return None;
        }
        let at = self.next % self.ids.len();
        self.next = at + 1;
        self.ids.get(at).map(String::as_str)
    }

    /// Number of puzzles in the playlist.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when no puzzle matched.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
