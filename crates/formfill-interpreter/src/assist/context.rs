use crate::Result;
use formfill_core::FieldCategory;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A snippet of background text offered to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDocument {
    pub title: String,
    pub text: String,
}

impl ContextDocument {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Small in-memory document index searched by term overlap
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    documents: Vec<(ContextDocument, HashSet<String>)>,
}

impl ContextIndex {
    pub fn new(documents: Vec<ContextDocument>) -> Self {
        let mut index = Self::default();
        index.extend(documents);
        index
    }

    /// One document per profile category describing what belongs there
    pub fn with_defaults() -> Self {
        Self::new(
            FieldCategory::ALL
                .iter()
                .map(|c| {
                    ContextDocument::new(
                        c.as_str(),
                        format!("{}: {}", c.as_str().replace('_', " "), c.description()),
                    )
                })
                .collect(),
        )
    }

    pub fn extend(&mut self, documents: impl IntoIterator<Item = ContextDocument>) {
        for doc in documents {
            let terms = tokenize(&format!("{} {}", doc.title, doc.text));
            self.documents.push((doc, terms));
        }
    }

    /// Load every `.txt` and `.md` file of a directory as a document
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_text = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            );
            if !path.is_file() || !is_text {
                continue;
            }

            let text = fs::read_to_string(&path)?;
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            loaded.push(ContextDocument::new(title, text));
        }

        let count = loaded.len();
        tracing::debug!("Loaded {} context document(s) from {}", count, dir.display());
        self.extend(loaded);
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Up to `limit` documents sharing the most terms with the query
    pub fn search(&self, query: &str, limit: usize) -> Vec<&ContextDocument> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, (_, terms))| (i, terms.intersection(&query_terms).count()))
            .filter(|(_, score)| *score > 0)
            .collect();

        // Stable: ties keep insertion order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(limit)
            .map(|(i, _)| &self.documents[i].0)
            .collect()
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}
