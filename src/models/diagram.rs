use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

/// Extension of diagram source files
pub const SOURCE_EXTENSION: &str = "puml";

/// Extension of the raster output written by the renderer
pub const IMAGE_EXTENSION: &str = "png";

/// MIME type of rendered images
pub const IMAGE_MIME: &str = "image/png";

/// Filename prefix shared by all saved records
pub const SAVED_PREFIX: &str = "diagram_";

/// Identity token of a saved diagram (Unix time in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagramId(i64);

impl DiagramId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Parse the id out of a saved filename such as `diagram_1700000000000.puml`
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix(SAVED_PREFIX)?;
        let (digits, _ext) = stem.split_once('.')?;
        digits.parse().ok().map(Self)
    }

    pub fn source_file_name(&self) -> String {
        format!("{SAVED_PREFIX}{}.{SOURCE_EXTENSION}", self.0)
    }

    pub fn image_file_name(&self) -> String {
        format!("{SAVED_PREFIX}{}.{IMAGE_EXTENSION}", self.0)
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing [`DiagramId`]s.
///
/// Ids follow the wall clock in milliseconds. When two calls land in the same
/// millisecond (or the clock steps backwards) the previous id plus one is used
/// instead, so no two ids from one generator are ever equal.
#[derive(Debug, Default)]
pub struct DiagramIdGenerator {
    last: AtomicI64,
}

impl DiagramIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> DiagramId {
        self.next_after(chrono::Utc::now().timestamp_millis())
    }

    fn next_after(&self, now_millis: i64) -> DiagramId {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_millis.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return DiagramId(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

/// A source file and the image path the renderer derives from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramFiles {
    pub source: PathBuf,
    pub image: PathBuf,
}

impl DiagramFiles {
    /// Pair a source path with the renderer's output path (same stem, `.png`)
    pub fn for_source(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let image = rendered_image_path(&source);
        Self { source, image }
    }
}

/// Path where the renderer writes its output for `source`
pub fn rendered_image_path(source: &Path) -> PathBuf {
    source.with_extension(IMAGE_EXTENSION)
}
