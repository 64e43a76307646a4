//! Local file name policy: sanitization and sibling collision handling.

use std::collections::HashSet;

/// Makes a remote name safe to use as a single path component.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Hands out unique names among the children of one folder.
///
/// The first sibling keeps its name. Later duplicates get ` (n)` inserted
/// before the extension.
#[derive(Debug, Default)]
pub struct SiblingNames {
    taken: HashSet<String>,
}

impl SiblingNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique name and whether it differs from the requested one.
    pub fn claim(&mut self, name: &str) -> (String, bool) {
        if self.taken.insert(name.to_string()) {
            return (name.to_string(), false);
        }

        let (stem, ext) = split_extension(name);
        let mut n = 1usize;
        loop {
            let candidate = format!("{} ({}){}", stem, n, ext);
            if self.taken.insert(candidate.clone()) {
                return (candidate, true);
            }
            n += 1;
        }
    }
}

/// Splits `a.tar.gz` into `("a.tar", ".gz")`. Dotfiles have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
