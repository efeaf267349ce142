use std::cmp::Ordering;
use std::path::Path;

/// File names collected from a manifest or a directory listing.
///
/// Insertion order is kept until [`sort`](Self::sort) or
/// [`sort_by_full_path`](Self::sort_by_full_path) is called. Lookups use a
/// binary search once the set is sorted by name.
#[derive(Debug, Clone, Default)]
pub struct FileNameSet {
    names:  Vec<String>,
    sorted: bool,
}

fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

fn compare_names(a: &str, b: &str) -> Ordering {
    if cfg!(windows) {
        a.to_lowercase().cmp(&b.to_lowercase())
    } else {
        a.cmp(b)
    }
}

impl FileNameSet {
    pub fn new() -> Self { Self::default() }

    /// Add the base name of `path`.
    pub fn add(&mut self, path: &str) {
        self.names.push(base_name(path).to_owned());
        self.sorted = false;
    }

    pub fn contains(&self, name: &str) -> bool {
        if self.sorted {
            self.names
                .binary_search_by(|entry| compare_names(entry, name))
                .is_ok()
        } else {
            self.names
                .iter()
                .any(|entry| compare_names(entry, name) == Ordering::Equal)
        }
    }

    /// Sort by name and drop duplicates.
    pub fn sort(&mut self) {
        self.names.sort_by(|a, b| compare_names(a, b));
        self.names.dedup_by(|a, b| compare_names(a, b) == Ordering::Equal);
        self.sorted = true;
    }

    /// Sort by the whole stored path, byte-wise.
    pub fn sort_by_full_path(&mut self) {
        self.names.sort();
        self.sorted = !cfg!(windows);
    }

    pub fn len(&self) -> usize { self.names.len() }

    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    pub fn get(&self, index: usize) -> Option<&str> { self.names.get(index).map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = &str> { self.names.iter().map(String::as_str) }
}

impl<S: AsRef<str>> Extend<S> for FileNameSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for name in iter {
            self.add(name.as_ref());
        }
    }
}
