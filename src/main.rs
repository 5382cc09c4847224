mod chunker;
mod config;
mod embeddings;
mod fetch;
mod semantic;
mod tokens;

use crate::chunker::{chunk_code, filter_oversized};
use crate::config::{DEFAULT_LANGUAGE, MAX_CHUNK_TOKENS, MIN_SENTENCES};
use crate::embeddings::EmbeddingEngine;
use crate::fetch::fetch_text;
use crate::semantic::{SemanticChunker, Threshold};
use crate::tokens::TokenCounter;
use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "chunk-runner")]
#[command(about = "Fetch a remote text resource and split it into token-bounded chunks", long_about = None)]
struct Cli {
    /// URL of the resource to fetch
    url: String,

    /// Chunking mode
    #[arg(value_enum)]
    chunk_type: ChunkType,

    /// Source language, used only for code chunking
    #[arg(default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Similarity cutoff for docs chunking: a cosine value in [0, 1],
    /// a percentile in 1..=100, or "auto"
    #[arg(long, default_value = "0.5")]
    threshold: Threshold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ChunkType {
    /// Split at syntax-tree boundaries for the given language
    Code,
    /// Group sentences by embedding similarity
    Docs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let text = fetch_text(&cli.url)?;
    let counter = TokenCounter::from_hub()?;

    let chunks = match cli.chunk_type {
        ChunkType::Code => chunk_code(&text, &cli.language, &counter, MAX_CHUNK_TOKENS)?,
        ChunkType::Docs => {
            let engine = EmbeddingEngine::new()?;
            let chunker = SemanticChunker {
                threshold: cli.threshold,
                chunk_size: MAX_CHUNK_TOKENS,
                min_sentences: MIN_SENTENCES,
            };
            chunker.chunk(&text, &engine, &counter)?
        }
    };

    // Over-budget chunks are dropped, never truncated
    let kept = filter_oversized(chunks, MAX_CHUNK_TOKENS);
    println!("{}", serde_json::to_string(&kept)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_language_to_typescript() {
        let cli = Cli::try_parse_from(["chunk-runner", "https://example.com/a.ts", "code"])
            .expect("valid args");
        assert_eq!(cli.chunk_type, ChunkType::Code);
        assert_eq!(cli.language, "typescript");
    }

    #[test]
    fn test_cli_accepts_explicit_language() {
        let cli =
            Cli::try_parse_from(["chunk-runner", "https://example.com/a.rs", "code", "rust"])
                .expect("valid args");
        assert_eq!(cli.language, "rust");
    }

    #[test]
    fn test_cli_docs_mode() {
        let cli = Cli::try_parse_from(["chunk-runner", "https://example.com/guide.md", "docs"])
            .expect("valid args");
        assert_eq!(cli.chunk_type, ChunkType::Docs);
    }

    #[test]
    fn test_cli_threshold_defaults_and_forms() {
        let cli = Cli::try_parse_from(["chunk-runner", "https://example.com", "docs"])
            .expect("valid args");
        assert_eq!(cli.threshold, Threshold::Similarity(0.5));

        let cli = Cli::try_parse_from([
            "chunk-runner",
            "https://example.com",
            "docs",
            "--threshold",
            "auto",
        ])
        .expect("valid args");
        assert_eq!(cli.threshold, Threshold::Auto);

        let result = Cli::try_parse_from([
            "chunk-runner",
            "https://example.com",
            "docs",
            "--threshold",
            "2.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_chunk_type() {
        let result = Cli::try_parse_from(["chunk-runner", "https://example.com", "bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_url_and_chunk_type() {
        assert!(Cli::try_parse_from(["chunk-runner"]).is_err());
        assert!(Cli::try_parse_from(["chunk-runner", "https://example.com"]).is_err());
    }
}
