//! Input-deck discovery: root deck plus single-level `<File>` includes.

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{EvalError, EvalResult};

/// Glob selecting candidate root decks in the working directory.
pub const ROOT_DECK_GLOB: &str = "*.xml";

/// Ordered deck files for one simulation case. Element 0 is the root deck,
/// the one handed to the simulator; the rest are its direct includes in
/// document order.
#[derive(Debug, Clone)]
pub struct InputDeckSet {
    paths: Vec<PathBuf>,
}

impl InputDeckSet {
    pub fn root(&self) -> &Path {
        &self.paths[0]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn get(&self, idx: usize) -> Option<&Path> {
        self.paths.get(idx).map(PathBuf::as_path)
    }
}

/// Discover the deck set for the case in `workdir`.
///
/// The root is the lexicographically first file matching [`ROOT_DECK_GLOB`]
/// (an explicit deterministic tie-break; include decks usually live in the
/// same directory and match the glob too). Includes are expanded a single
/// level: every descendant `File` element of the root whose `name`
/// attribute contains `.xml`, in document order. Listed includes are
/// appended whether or not they exist on disk; a dangling reference
/// surfaces later when the deck is scanned.
pub fn locate(workdir: &Path) -> EvalResult<InputDeckSet> {
    let matcher = Glob::new(ROOT_DECK_GLOB)
        .map_err(|e| EvalError::deck_parse(workdir, e))?
        .compile_matcher();

    let entries = fs::read_dir(workdir).map_err(|e| EvalError::io(workdir, e))?;
    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EvalError::io(workdir, e))?;
        let name = entry.file_name();
        if matcher.is_match(&name) {
            candidates.push(workdir.join(name));
        }
    }
    candidates.sort();

    let root = candidates
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::MissingInputDeck {
            pattern: ROOT_DECK_GLOB.to_string(),
            dir: workdir.to_path_buf(),
        })?;

    let mut paths = vec![root.clone()];
    for name in included_deck_names(&root)? {
        let included = Path::new(&name);
        if included.is_absolute() {
            paths.push(included.to_path_buf());
        } else {
            paths.push(workdir.join(included));
        }
    }

    debug!(root = %root.display(), decks = paths.len(), "input decks located");
    Ok(InputDeckSet { paths })
}

/// `name` attributes of `File` elements referencing `.xml` decks,
/// in document order.
fn included_deck_names(root: &Path) -> EvalResult<Vec<String>> {
    let xml = fs::read_to_string(root).map_err(|e| EvalError::io(root, e))?;
    let mut reader = Reader::from_str(&xml);
    let mut names = Vec::new();

    loop {
        match reader.read_event() {
            Err(e) => return Err(EvalError::deck_parse(root, e)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() != b"File" {
                    continue;
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| EvalError::deck_parse(root, e))?;
                    if attr.key.as_ref() == b"name" {
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        if value.contains(".xml") {
                            names.push(value);
                        }
                    }
                }
            }
            Ok(_) => {}
        }
    }

    Ok(names)
}
