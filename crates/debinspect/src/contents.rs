//! Queryable listing of a package's contents.

use crate::entry::Entry;
use serde::Serialize;

/// Longest line excerpt written to the log when a line is skipped.
const MAX_LOGGED_LINE: usize = 512;

/// Entries of a package in the order `dpkg-deb --contents` printed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentsIndex {
    entries: Vec<Entry>,
}

impl ContentsIndex {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Builds an index from the full output of `dpkg-deb --contents`.
    ///
    /// Lines that fail to parse, blank lines included, are logged and skipped
    /// so that one odd line does not spoil an otherwise valid listing.
    pub fn from_listing(listing: &str) -> Self {
        let entries = listing
            .lines()
            .filter_map(|line| match Entry::parse(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    if !line.trim().is_empty() {
                        tracing::debug!(
                            "skipping contents line {:?}: {}",
                            abbreviate(line, MAX_LOGGED_LINE),
                            e
                        );
                    }
                    None
                }
            })
            .collect();

        Self { entries }
    }

    /// Returns the first entry accepted by a predicate.
    pub fn find_first<P>(&self, mut predicate: P) -> Option<&Entry>
    where
        P: FnMut(&Entry) -> bool,
    {
        self.entries.iter().find(|&entry| predicate(entry))
    }

    /// Finds an entry by its exact path.
    ///
    /// The path must start with `/`, and directories must be queried with
    /// their trailing `/`. No normalization is performed.
    pub fn find_by_path(&self, path: &str) -> Option<&Entry> {
        self.find_first(|entry| entry.path == path)
    }

    /// All entries, in listing order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ContentsIndex {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn abbreviate(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use indoc::indoc;

    const HELLO_LISTING: &str = indoc! {"
        drwxr-xr-x root/root         0 2016-04-16 00:57 ./
        drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/
        drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/bin/
        -rwxr-xr-x root/root     31136 2016-04-16 00:57 ./usr/bin/hello

        this line is not an entry
        -rw-r--r-- root/root      2264 2014-11-16 17:21 ./usr/share/doc/hello/copyright
        lrwxrwxrwx root/root         0 2016-04-16 00:57 ./usr/bin/hi -> hello
    "};

    #[test]
    fn test_from_listing_skips_bad_lines() {
        let index = ContentsIndex::from_listing(HELLO_LISTING);
        assert_eq!(index.len(), 6);
        let paths: Vec<&str> = index.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/",
                "/usr/",
                "/usr/bin/",
                "/usr/bin/hello",
                "/usr/share/doc/hello/copyright",
                "/usr/bin/hi",
            ]
        );
    }

    #[test]
    fn test_find_by_path_is_exact() {
        let index = ContentsIndex::from_listing(HELLO_LISTING);
        assert_eq!(
            index.find_by_path("/usr/bin/").map(|e| e.kind().unwrap()),
            Some(EntryKind::Directory)
        );
        assert!(index.find_by_path("/usr/bin").is_none());
        assert!(index.find_by_path("/usr/bin/hell").is_none());
        assert!(index.find_by_path("usr/bin/hello").is_none());
        assert_eq!(index.find_by_path("/usr/bin/hello").unwrap().size_bytes, 31136);
    }

    #[test]
    fn test_find_first_respects_order() {
        let index = ContentsIndex::from_listing(HELLO_LISTING);
        let first_dir = index
            .find_first(|e| e.path.starts_with("/usr/b"))
            .unwrap();
        assert_eq!(first_dir.path, "/usr/bin/");
        assert!(index.find_first(|e| e.size_bytes > 1_000_000).is_none());
    }

    #[test]
    fn test_empty_listing() {
        let index = ContentsIndex::from_listing("");
        assert!(index.is_empty());
        assert!(index.find_by_path("/").is_none());
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("abcdef", 3), "abc...");
        assert_eq!(abbreviate("abc", 3), "abc");
    }
}
