use std::fmt;
use std::fs;
use std::path::PathBuf;

use ahash::AHashMap;

use crate::expressions::Block;

/// Failure to produce a module's code for an import.
#[derive(Debug)]
pub enum LoadError {
    NotFound(String),
    Io(String),
    Parse(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "no module named '{path}'"),
            Self::Io(msg) => write!(f, "cannot read module: {msg}"),
            Self::Parse(msg) => write!(f, "cannot parse module: {msg}"),
        }
    }
}

/// Source of module code for `import` statements.
///
/// The interpreter owns the module cache; a loader is only asked once per
/// path and returns the parsed top-level block. Discovery, reading and
/// parsing are the loader's concern.
pub trait ModuleLoader {
    fn load(&mut self, path: &str) -> Result<Block, LoadError>;
}

/// Loader serving a fixed set of preloaded modules.
///
/// Used in tests and by [`crate::interpret`], where the default empty map
/// refuses every import.
#[derive(Debug, Default)]
pub struct MapLoader(AHashMap<String, Block>);

impl MapLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, block: Block) {
        self.0.insert(path.into(), block);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_module(mut self, path: impl Into<String>, block: Block) -> Self {
        self.insert(path, block);
        self
    }
}

impl ModuleLoader for MapLoader {
    fn load(&mut self, path: &str) -> Result<Block, LoadError> {
        self.0.get(path).cloned().ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

/// Loader that reads `<root>/<path>.py` from disk and hands the source to a
/// caller-supplied parse callback. The parser itself lives outside this
/// crate.
pub struct DiskLoader<P> {
    root: PathBuf,
    parse: P,
}

impl<P> DiskLoader<P>
where
    P: FnMut(&str) -> Result<Block, String>,
{
    pub fn new(root: impl Into<PathBuf>, parse: P) -> Self {
        Self { root: root.into(), parse }
    }
}

impl<P> ModuleLoader for DiskLoader<P>
where
    P: FnMut(&str) -> Result<Block, String>,
{
    fn load(&mut self, path: &str) -> Result<Block, LoadError> {
        let file = self.root.join(format!("{}.py", path.replace('.', "/")));
        if !file.is_file() {
            return Err(LoadError::NotFound(path.to_string()));
        }
        let source = fs::read_to_string(&file).map_err(|e| LoadError::Io(e.to_string()))?;
        (self.parse)(&source).map_err(LoadError::Parse)
    }
}
