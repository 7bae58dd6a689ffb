//! Reader for "dotted" outline files.
//!
//! Each line of an outline is a header: a run of `.` characters giving its depth, a single
//! space, and then a name that runs to the end of the line. This is the format `gcc -H` uses to
//! report the tree of headers a translation unit includes:
//!
//! ```text
//! . /usr/include/stdio.h
//! .. /usr/include/features.h
//! . util.h
//! Multiple include guards may be useful for:
//! ```
//!
//! Reading stops at the first line that is not a header, the rest of the input is available
//! from [`Outline::remaining`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error("failed to read outline {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single entry in an [`Outline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    /// Number of leading dots, always at least one.
    pub depth: usize,
    pub children: Vec<Header>,
}

impl Header {
    fn new(name: &str, depth: usize) -> Self {
        Header {
            name: name.to_string(),
            depth,
            children: Vec::new(),
        }
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Header)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A parsed outline, a forest of [`Header`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    roots: Vec<Header>,
    remaining: String,
}

impl Outline {
    /// Parse the leading run of header lines in `input`.
    pub fn parse(input: &str) -> Outline {
        let mut builder = TreeBuilder::default();
        let mut consumed = 0;

        for line in input.split_inclusive('\n') {
            let Some((depth, name)) = parse_line(line) else {
                break;
            };
            builder.push(Header::new(name, depth));
            consumed += line.len();
        }

        let remaining = input[consumed..].to_string();
        tracing::trace!(consumed, remaining = remaining.len(), "parsed outline");

        Outline {
            roots: builder.finish(),
            remaining,
        }
    }

    /// Read and parse the outline stored at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Outline, OutlineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| OutlineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Outline::parse(&contents))
    }

    /// The top level headers, in the order they appeared.
    pub fn roots(&self) -> &[Header] {
        &self.roots
    }

    /// Input that followed the last header line.
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    /// Every header name, depth first, keeping only the first occurrence of each name.
    pub fn names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for root in &self.roots {
            root.walk(&mut |header| {
                if seen.insert(header.name.as_str()) {
                    names.push(header.name.clone());
                }
            });
        }
        names
    }
}

/// Splits a header line into its depth and name, `None` if the line isn't a header.
fn parse_line(line: &str) -> Option<(usize, &str)> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let depth = line.bytes().take_while(|b| *b == b'.').count();
    if depth == 0 {
        return None;
    }
    let name = line[depth..].strip_prefix(' ')?;
    if name.is_empty() {
        return None;
    }
    Some((depth, name))
}

/// Assembles headers into a tree, keeping the chain of still "open" headers on a stack.
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Header>,
    open: Vec<Header>,
}

impl TreeBuilder {
    fn push(&mut self, header: Header) {
        // Anything at the same depth or deeper is finished, it can't get more children.
        self.close_to(header.depth);
        self.open.push(header);
    }

    fn close_to(&mut self, depth: usize) {
        while self.open.last().is_some_and(|top| top.depth >= depth) {
            let Some(done) = self.open.pop() else {
                break;
            };
            match self.open.last_mut() {
                Some(parent) => parent.children.push(done),
                None => self.roots.push(done),
            }
        }
    }

    fn finish(mut self) -> Vec<Header> {
        self.close_to(0);
        self.roots
    }
}
