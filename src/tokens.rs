use crate::config::TOKENIZER_MODEL_ID;
use anyhow::{Context, Result};
use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;

/// Token counting backed by the GPT-2 vocabulary.
///
/// The same counter sizes chunks inside the splitter and produces the
/// `token_count` reported for every emitted chunk.
pub struct TokenCounter {
    tokenizer: Tokenizer,
}

impl TokenCounter {
    pub fn from_hub() -> Result<Self> {
        let api = Api::new()?;
        let repo = api.model(TOKENIZER_MODEL_ID.to_string());
        let tokenizer_path = repo
            .get("tokenizer.json")
            .with_context(|| format!("Could not download tokenizer for {TOKENIZER_MODEL_ID}"))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {e}"))?;

        Ok(Self { tokenizer })
    }

    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Encode error: {e}"))?;
        Ok(encoding.get_ids().len())
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

/// Whitespace word-level counter for tests: one token per word, no downloads.
#[cfg(test)]
pub(crate) fn word_counter() -> TokenCounter {
    use std::collections::HashMap;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;

    let vocab: HashMap<String, u32> = HashMap::from([("[UNK]".to_string(), 0)]);
    let model = WordLevel::builder()
        .vocab(vocab.into_iter().collect())
        .unk_token("[UNK]".to_string())
        .build()
        .unwrap();

    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(Some(Whitespace::default()));
    TokenCounter::new(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() -> Result<()> {
        let counter = word_counter();
        assert_eq!(counter.count("fn main")?, 2);
        assert_eq!(counter.count("one two three four")?, 4);
        Ok(())
    }

    #[test]
    fn test_count_empty() -> Result<()> {
        let counter = word_counter();
        assert_eq!(counter.count("")?, 0);
        Ok(())
    }

    #[test]
    fn test_counter_loads_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tokenizer.json");
        word_counter()
            .tokenizer()
            .save(&path, false)
            .map_err(|e| anyhow::anyhow!("Save error: {e}"))?;

        let loaded = Tokenizer::from_file(&path).map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(TokenCounter::new(loaded).count("alpha beta")?, 2);
        Ok(())
    }
}
