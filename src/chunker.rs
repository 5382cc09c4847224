use crate::tokens::TokenCounter;
use anyhow::{anyhow, Result};
use serde::Serialize;
use text_splitter::{ChunkConfig, CodeSplitter};
use tree_sitter_language::LanguageFn;

/// A bounded fragment of the fetched text, annotated with its token count.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
}

pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "typescript",
    "tsx",
    "javascript",
    "rust",
    "python",
    "go",
    "java",
];

fn language_for(name: &str) -> Result<LanguageFn> {
    let grammar = match name {
        "typescript" | "ts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX,
        "javascript" | "js" => tree_sitter_javascript::LANGUAGE,
        "rust" => tree_sitter_rust::LANGUAGE,
        "python" => tree_sitter_python::LANGUAGE,
        "go" => tree_sitter_go::LANGUAGE,
        "java" => tree_sitter_java::LANGUAGE,
        other => {
            return Err(anyhow!(
                "Unsupported language '{other}'. Supported: {}",
                SUPPORTED_LANGUAGES.join(", ")
            ))
        }
    };
    Ok(grammar)
}

/// Split source code at syntax-tree boundaries, sized in tokens.
///
/// Splitting is delegated to `CodeSplitter`; only the chunk text and its
/// token count survive, no structural node metadata.
pub fn chunk_code(
    text: &str,
    language: &str,
    counter: &TokenCounter,
    max_tokens: usize,
) -> Result<Vec<Chunk>> {
    let grammar = language_for(language)?;
    let config = ChunkConfig::new(max_tokens).with_sizer(counter.tokenizer().clone());
    let splitter = CodeSplitter::new(grammar, config)
        .map_err(|e| anyhow!("Could not build splitter for '{language}': {e}"))?;

    let mut chunks = Vec::new();
    for piece in splitter.chunks(text) {
        chunks.push(Chunk {
            text: piece.to_string(),
            token_count: counter.count(piece)?,
        });
    }
    Ok(chunks)
}

/// Drop chunks whose token count exceeds the budget. Never truncates.
pub fn filter_oversized(chunks: Vec<Chunk>, max_tokens: usize) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter(|chunk| chunk.token_count <= max_tokens)
        .collect()
}
