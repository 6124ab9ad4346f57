// src/packages/pkgbuild.rs

//! PKGBUILD dependency extraction
//!
//! Only `depends` and `makedepends` arrays are read (including
//! architecture-specific `depends_x86_64=` forms and `+=` appends);
//! `optdepends` and `checkdepends` are not needed to build a package.

use crate::error::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DEPENDS_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:make)?depends(?:_[A-Za-z0-9_]+)?[ \t]*\+?=[ \t]*\(")
        .expect("valid depends regex")
});

/// Dependency names declared in a PKGBUILD, in declaration order
///
/// Quotes are removed and version constraints (`<`, `>`, `=`) stripped.
/// Words that are empty or start with a shell expansion are skipped.
pub fn parse_dependencies(recipe: &str) -> Vec<String> {
    let mut deps: Vec<String> = Vec::new();

    for found in DEPENDS_START.find_iter(recipe) {
        for word in array_words(&recipe[found.end()..]) {
            let name = strip_constraint(&word);
            if name.is_empty() || name.starts_with('$') {
                continue;
            }
            if !deps.iter().any(|d| d == name) {
                deps.push(name.to_string());
            }
        }
    }

    debug!("Found {} dependencies in PKGBUILD", deps.len());
    deps
}

/// Read and parse a PKGBUILD from disk
pub fn read_dependencies(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_dependencies(&content))
}

/// Words of a bash array body up to the closing parenthesis
fn array_words(body: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_comment = false;

    for c in body.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }

        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => quote = Some(c),
                ')' => break,
                '#' if current.is_empty() => in_comment = true,
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// "glibc>=2.34" → "glibc"
fn strip_constraint(dep: &str) -> &str {
    match dep.find(['<', '>', '=']) {
        Some(pos) => dep[..pos].trim(),
        None => dep.trim(),
    }
}
