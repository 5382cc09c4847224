pub const EMBEDDING_MODEL_ID: &str = "BAAI/bge-small-en-v1.5";
pub const TOKENIZER_MODEL_ID: &str = "openai-community/gpt2";

pub const MAX_CHUNK_TOKENS: usize = 8192;
pub const DEFAULT_LANGUAGE: &str = "typescript";
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;
pub const MIN_SENTENCES: usize = 1;
