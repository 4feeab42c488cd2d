use log::{debug, warn};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, SubalignError};
use crate::model::Video;

/// A node of the corpus tree: a directory or a loaded video
#[derive(Debug, Clone)]
pub enum CorpusNode {
    Directory(BTreeMap<String, CorpusNode>),
    Video(Video),
}

/// Videos arranged the way their subtitle files are laid out on disk
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    root: PathBuf,
    tree: BTreeMap<String, CorpusNode>,
}

impl Corpus {
    /// Walk `root` and load every `.vtt` file below it with `loader`.
    ///
    /// Files the loader rejects are logged and left out.
    pub fn build<F>(root: &Path, mut loader: F) -> Result<Self>
    where
        F: FnMut(&Path) -> Result<Video>,
    {
        let mut corpus = Corpus {
            root: root.to_path_buf(),
            tree: BTreeMap::new(),
        };

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| SubalignError::Processing {
                message: format!("Failed to walk {}: {}", root.display(), e),
            })?;
            if !entry.file_type().is_file() || !is_vtt(entry.path()) {
                continue;
            }

            let video = match loader(entry.path()) {
                Ok(video) => video,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let branches: Vec<String> = relative
                .parent()
                .map(|p| {
                    p.components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default();
            corpus.insert(&branches, video);
        }

        debug!("Loaded {} videos from {}", corpus.len(), root.display());
        Ok(corpus)
    }

    /// Place `video` under the directory path `branches`, creating
    /// directories on the way
    pub fn insert(&mut self, branches: &[String], video: Video) {
        let mut level = &mut self.tree;
        for branch in branches {
            let node = level
                .entry(branch.clone())
                .or_insert_with(|| CorpusNode::Directory(BTreeMap::new()));
            if let CorpusNode::Video(_) = node {
                // a video id shadowing a directory name
                *node = CorpusNode::Directory(BTreeMap::new());
            }
            level = match node {
                CorpusNode::Directory(children) => children,
                CorpusNode::Video(_) => unreachable!("replaced by a directory above"),
            };
        }
        if level.insert(video.id.clone(), CorpusNode::Video(video)).is_some() {
            warn!("Duplicate video id under {:?}, keeping the last one", branches.join("/"));
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `(path_key, video)` pairs in path order; every call starts over
    pub fn iter(&self) -> CorpusIter<'_> {
        CorpusIter {
            stack: vec![(String::new(), self.tree.iter())],
        }
    }

    /// Find a video by id anywhere in the tree
    pub fn get(&self, id: &str) -> Option<&Video> {
        self.iter().map(|(_, video)| video).find(|video| video.id == id)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Consume the corpus into owned `(path_key, video)` pairs, same order as `iter`
    pub fn into_entries(self) -> Vec<(String, Video)> {
        let mut entries = Vec::new();
        let mut stack = vec![(String::new(), self.tree.into_iter())];
        while let Some((prefix, level)) = stack.last_mut() {
            match level.next() {
                None => {
                    stack.pop();
                }
                Some((name, node)) => {
                    let key = join_key(prefix, &name);
                    match node {
                        CorpusNode::Video(video) => entries.push((key, video)),
                        CorpusNode::Directory(children) => stack.push((key, children.into_iter())),
                    }
                }
            }
        }
        entries
    }
}

/// Depth-first walk over the corpus tree
pub struct CorpusIter<'a> {
    stack: Vec<(String, btree_map::Iter<'a, String, CorpusNode>)>,
}

impl<'a> Iterator for CorpusIter<'a> {
    type Item = (String, &'a Video);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, level) = self.stack.last_mut()?;
            match level.next() {
                None => {
                    self.stack.pop();
                }
                Some((name, node)) => {
                    let key = join_key(prefix, name);
                    match node {
                        CorpusNode::Video(video) => return Some((key, video)),
                        CorpusNode::Directory(children) => self.stack.push((key, children.iter())),
                    }
                }
            }
        }
    }
}

fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn is_vtt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vtt"))
}
