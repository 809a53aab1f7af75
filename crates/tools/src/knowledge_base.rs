//! Knowledge base search tool.
//!
//! Keyword-overlap retrieval over an in-memory document set. Documents come
//! from a directory of `.md` / `.txt` files when one is configured, and from a
//! small built-in set otherwise, so the agent always has something to ground
//! answers in.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chatclaw_core::error::ToolError;
use chatclaw_core::tool::{ToolDescriptor, ToolHandler};
use serde::Serialize;
use tracing::debug;

pub const NAME: &str = "search_knowledge_base";

const DEFAULT_TOP_K: usize = 3;
const MAX_TOP_K: usize = 10;

/// A single searchable document.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub content: String,
    terms: HashSet<String>,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        let content = content.into();
        let terms = terms(&format!("{title} {content}"));
        Self {
            title,
            content,
            terms,
        }
    }
}

#[derive(Debug, Serialize)]
struct Hit<'a> {
    title: &'a str,
    content: &'a str,
    score: f64,
}

/// The searchable corpus.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl KnowledgeBase {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load every `.md` / `.txt` file in `dir` (non-recursive). The file stem
    /// becomes the document title. Files are read in name order.
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("md") | Some("txt")
                    )
            })
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string();
            documents.push(Document::new(title, content.trim()));
        }
        debug!(dir = %dir.display(), documents = documents.len(), "Loaded knowledge base");
        Ok(Self { documents })
    }

    /// The built-in document set.
    pub fn builtin() -> Self {
        Self::new(vec![
            Document::new(
                "Account password reset",
                "To reset your password open Settings, choose Security, then select Reset password. A reset link is emailed and expires after 30 minutes.",
            ),
            Document::new(
                "Refund policy",
                "Purchases can be refunded within 14 days. Refunds are returned to the original payment method within 5 business days of approval.",
            ),
            Document::new(
                "Shipping times",
                "Standard shipping takes 3 to 5 business days. Express shipping delivers within 1 business day for orders placed before noon.",
            ),
            Document::new(
                "Support hours",
                "Human support is available Monday to Friday, 9:00 to 18:00 UTC. Outside those hours the assistant answers and escalates urgent issues.",
            ),
            Document::new(
                "Subscription plans",
                "The Basic plan includes one seat. The Team plan includes ten seats and shared workspaces. Plans can be upgraded at any time and are billed monthly.",
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Rank documents by the fraction of query terms they contain.
    /// Documents sharing no term with the query are dropped.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(&Document, f64)> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Document, f64)> = self
            .documents
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| {
                let overlap = query_terms.intersection(&doc.terms).count();
                (overlap > 0).then(|| (i, doc, overlap as f64 / query_terms.len() as f64))
            })
            .collect();

        // Highest score first; ties keep corpus order.
        scored.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(top_k)
            .map(|(_, doc, score)| (doc, score))
            .collect()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "can", "how", "what", "when", "where", "which", "who", "why",
    "with", "you", "your", "does", "did", "this", "that", "from", "into", "about", "there",
];

/// Tool handler over a shared [`KnowledgeBase`].
pub struct KnowledgeBaseTool {
    kb: Arc<KnowledgeBase>,
}

impl KnowledgeBaseTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb: Arc::new(kb) }
    }

    pub fn descriptor(kb: KnowledgeBase) -> ToolDescriptor {
        ToolDescriptor::new(
            NAME,
            "Search the knowledge base for documents relevant to a query. Returns the best matching documents with a relevance score.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look for"
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Maximum number of documents to return (default 3, max 10)"
                    }
                },
                "required": ["query"]
            }),
            Self::new(kb),
        )
    }
}

#[async_trait]
impl ToolHandler for KnowledgeBaseTool {
    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let top_k = arguments["top_k"]
            .as_u64()
            .map(|k| (k as usize).clamp(1, MAX_TOP_K))
            .unwrap_or(DEFAULT_TOP_K);

        let hits: Vec<Hit<'_>> = self
            .kb
            .search(query, top_k)
            .into_iter()
            .map(|(doc, score)| Hit {
                title: &doc.title,
                content: &doc.content,
                score: (score * 100.0).round() / 100.0,
            })
            .collect();

        if hits.is_empty() {
            return Ok(format!("No relevant documents found for '{query}'."));
        }

        serde_json::to_string_pretty(&hits).map_err(|e| ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ranks_by_overlap() {
        let kb = KnowledgeBase::builtin();
        let hits = kb.search("How do I reset my password?", 3);
        assert_eq!(hits[0].0.title, "Account password reset");
        assert!(hits[0].1 > 0.5);
    }

    #[test]
    fn search_respects_top_k() {
        let kb = KnowledgeBase::builtin();
        let hits = kb.search("business days shipping refund", 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn stopword_only_query_matches_nothing() {
        let kb = KnowledgeBase::builtin();
        assert!(kb.search("what is the", 3).is_empty());
    }

    #[test]
    fn loads_markdown_and_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_warranty.md"), "Warranty lasts two years.").unwrap();
        std::fs::write(dir.path().join("a_returns.txt"), "Returns need a receipt.").unwrap();
        std::fs::write(dir.path().join("ignored.json"), "{}").unwrap();

        let kb = KnowledgeBase::from_dir(dir.path()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.documents[0].title, "a_returns");
        assert_eq!(kb.search("warranty", 3)[0].0.title, "b_warranty");
    }

    #[tokio::test]
    async fn tool_returns_json_hits() {
        let tool = KnowledgeBaseTool::new(KnowledgeBase::builtin());
        let out = tool
            .call(serde_json::json!({"query": "refund policy", "top_k": 2}))
            .await
            .unwrap();
        let hits: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(hits[0]["title"], "Refund policy");
        assert!(hits.as_array().unwrap().len() <= 2);
    }

    #[tokio::test]
    async fn tool_reports_no_match() {
        let tool = KnowledgeBaseTool::new(KnowledgeBase::builtin());
        let out = tool
            .call(serde_json::json!({"query": "quantum chromodynamics"}))
            .await
            .unwrap();
        assert!(out.starts_with("No relevant documents found"));
    }
}
