//! Locating and reading translation units
//!
//! A file is a header (`.h`) or a source file (`.c`); anything else is
//! refused before any tokenization happens. Source files are opened as
//! given. Headers are looked up through an ordered list of search
//! directories, first match wins, and finally as given.

use crate::parser::parser::{ParseOutcome, Parser};
use crate::parser::tree::NodeKind;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Header or source file, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Header,
    Source,
}

impl SourceKind {
    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("h") => Some(SourceKind::Header),
            Some("c") => Some(SourceKind::Source),
            _ => None,
        }
    }

    /// Kind of the root node of a tree parsed from this kind of file.
    pub fn root_kind(self) -> NodeKind {
        match self {
            SourceKind::Header => NodeKind::HeaderUnit,
            SourceKind::Source => NodeKind::SourceUnit,
        }
    }
}

/// Errors raised while locating or reading a file, before parsing starts
#[derive(Debug)]
pub enum SourceError {
    /// The file name is neither a C header nor a C source file
    NotCFile { path: PathBuf },

    /// No search directory contains the header
    NotFound {
        path: PathBuf,
        searched: Vec<PathBuf>,
    },

    /// The file exists but could not be read
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotCFile { path } => write!(
                f,
                "'{}' is neither a C header file nor a C source file",
                path.display()
            ),
            SourceError::NotFound { path, searched } => {
                write!(f, "cannot find '{}'", path.display())?;
                if !searched.is_empty() {
                    let dirs: Vec<String> = searched.iter().map(|d| d.display().to_string()).collect();
                    write!(f, " (searched: {})", dirs.join(", "))?;
                }
                Ok(())
            }
            SourceError::Io { path, source } => {
                write!(f, "cannot read '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Ordered list of directories searched for headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory; earlier directories win.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// First existing candidate for `name`: each search directory in order,
    /// then `name` itself. Absolute names are only tried as given.
    pub fn resolve(&self, name: &Path) -> Option<PathBuf> {
        if name.is_absolute() {
            return name.is_file().then(|| name.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .chain(std::iter::once(name.to_path_buf()))
            .find(|candidate| candidate.is_file())
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SearchPaths {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            dirs: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A translation unit read into memory
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub kind: SourceKind,
    /// Path the file was actually read from
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Locate and read `path`: sources directly, headers through `paths`.
    pub fn open(path: &Path, paths: &SearchPaths) -> Result<Self, SourceError> {
        let kind = SourceKind::from_path(path).ok_or_else(|| SourceError::NotCFile {
            path: path.to_path_buf(),
        })?;

        let resolved = match kind {
            SourceKind::Source => path.to_path_buf(),
            SourceKind::Header => paths.resolve(path).ok_or_else(|| SourceError::NotFound {
                path: path.to_path_buf(),
                searched: paths.dirs.clone(),
            })?,
        };

        let bytes = fs::read(&resolved).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound {
                path: path.to_path_buf(),
                searched: Vec::new(),
            },
            _ => SourceError::Io {
                path: resolved.clone(),
                source,
            },
        })?;

        log::debug!("read {} bytes from {}", bytes.len(), resolved.display());
        Ok(Self {
            kind,
            path: resolved,
            bytes,
        })
    }

    /// Contents as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Parse the file. The root payload is the name the caller asked for.
    pub fn parse(&self, filename: &str) -> ParseOutcome {
        Parser::from_bytes(&self.bytes, self.kind, filename).parse()
    }
}

/// Locate, read and parse one translation unit.
pub fn parse_file(path: impl AsRef<Path>, paths: &SearchPaths) -> Result<ParseOutcome, SourceError> {
    let path = path.as_ref();
    let file = SourceFile::open(path, paths)?;
    Ok(file.parse(&path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::ParseStatus;

    /// Fresh scratch directory under the system temp dir
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cdecl-tree-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("gl.h")), Some(SourceKind::Header));
        assert_eq!(SourceKind::from_path(Path::new("src/main.c")), Some(SourceKind::Source));
        assert_eq!(SourceKind::from_path(Path::new("main.cpp")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_first_search_dir_wins() {
        let root = scratch_dir("search");
        let first = root.join("first");
        let second = root.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("a.h"), "int from_first;").unwrap();
        fs::write(second.join("a.h"), "int from_second;").unwrap();
        fs::write(second.join("b.h"), "int only_second;").unwrap();

        let paths: SearchPaths = [first.clone(), second.clone()].into_iter().collect();
        assert_eq!(paths.resolve(Path::new("a.h")), Some(first.join("a.h")));
        assert_eq!(paths.resolve(Path::new("b.h")), Some(second.join("b.h")));
        assert_eq!(paths.resolve(Path::new("missing.h")), None);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_parse_header_through_search_paths() {
        let root = scratch_dir("parse");
        fs::write(root.join("config.h"), "#define VERSION 3\nextern const char *name;\n").unwrap();

        let mut paths = SearchPaths::new();
        paths.push(&root);
        let outcome = parse_file("config.h", &paths).expect("header should resolve");
        assert_eq!(outcome.status, ParseStatus::Completed);
        let tree = &outcome.tree;
        assert_eq!(tree.kind(tree.root()), NodeKind::HeaderUnit);
        assert_eq!(tree.node(tree.root()).payload.as_deref(), Some("config.h"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_resource_errors() {
        let paths = SearchPaths::new();
        assert!(matches!(
            parse_file("notes.txt", &paths),
            Err(SourceError::NotCFile { .. })
        ));
        assert!(matches!(
            parse_file("definitely/not/here.h", &paths),
            Err(SourceError::NotFound { .. })
        ));
        assert!(matches!(
            parse_file("definitely/not/here.c", &paths),
            Err(SourceError::NotFound { .. })
        ));
    }
}
