use crate::chunker::Chunk;
use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::tokens::TokenCounter;
use anyhow::Result;

/// Anything that can turn a batch of sentences into embedding vectors.
pub trait Embedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Similarity cutoff for starting a new chunk: a fixed cosine value, a
/// percentile of the adjacent-sentence similarity distribution, or an
/// automatic pick (the median of that distribution).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Similarity(f32),
    Percentile(u8),
    Auto,
}

impl std::str::FromStr for Threshold {
    type Err = anyhow::Error;

    // "auto", an integer percentile in 1..=100, or a cosine value in [0, 1]
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Threshold::Auto);
        }
        if !s.contains('.') {
            let p: u8 = s
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid threshold '{s}'"))?;
            if !(1..=100).contains(&p) {
                return Err(anyhow::anyhow!(
                    "Percentile threshold must be in 1..=100, got {p}"
                ));
            }
            return Ok(Threshold::Percentile(p));
        }
        let value: f32 = s
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid threshold '{s}'"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(anyhow::anyhow!(
                "Similarity threshold must be in [0, 1], got {value}"
            ));
        }
        Ok(Threshold::Similarity(value))
    }
}

impl Threshold {
    fn resolve(&self, adjacent: &[f32]) -> f32 {
        match *self {
            Threshold::Similarity(value) => value,
            Threshold::Percentile(p) => percentile(adjacent, p),
            Threshold::Auto => percentile(adjacent, 50),
        }
    }
}

fn percentile(values: &[f32], p: u8) -> f32 {
    if values.is_empty() {
        return DEFAULT_SIMILARITY_THRESHOLD;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p.min(100) as f32 / 100.0) * (sorted.len() - 1) as f32;
    sorted[rank.round() as usize]
}

/// Groups consecutive sentences while they stay similar to the running group
/// and the group stays within the token budget.
pub struct SemanticChunker {
    pub threshold: Threshold,
    pub chunk_size: usize,
    pub min_sentences: usize,
}

impl SemanticChunker {
    pub fn chunk(
        &self,
        text: &str,
        embedder: &dyn Embedder,
        counter: &TokenCounter,
    ) -> Result<Vec<Chunk>> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = embedder.embed(&sentences)?;
        let mut sentence_tokens = Vec::with_capacity(sentences.len());
        for sentence in &sentences {
            sentence_tokens.push(counter.count(sentence)?);
        }

        let adjacent: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| cosine(&pair[0], &pair[1]))
            .collect();
        let cutoff = self.threshold.resolve(&adjacent);

        let mut chunks = Vec::new();
        let mut group = vec![0usize];
        let mut centroid = embeddings[0].clone();
        let mut group_tokens = sentence_tokens[0];

        for i in 1..sentences.len() {
            let similar = cosine(&centroid, &embeddings[i]) >= cutoff;
            let fits = group_tokens + sentence_tokens[i] <= self.chunk_size;

            if group.len() < self.min_sentences || (similar && fits) {
                group_tokens += sentence_tokens[i];
                extend_centroid(&mut centroid, &embeddings[i], group.len());
                group.push(i);
            } else {
                chunks.push(finish_group(&sentences, &group, counter)?);
                group = vec![i];
                centroid = embeddings[i].clone();
                group_tokens = sentence_tokens[i];
            }
        }
        chunks.push(finish_group(&sentences, &group, counter)?);

        Ok(chunks)
    }
}

fn finish_group(sentences: &[String], group: &[usize], counter: &TokenCounter) -> Result<Chunk> {
    let text = group
        .iter()
        .map(|&i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let token_count = counter.count(&text)?;
    Ok(Chunk { text, token_count })
}

// Running mean over the group members
fn extend_centroid(centroid: &mut [f32], embedding: &[f32], members: usize) {
    let n = members as f32;
    for (c, e) in centroid.iter_mut().zip(embedding) {
        *c = (*c * n + e) / (n + 1.0);
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Segment text into sentences at terminator punctuation followed by
/// whitespace, and at paragraph breaks.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        let boundary = match ch {
            '.' | '!' | '?' => chars.peek().map_or(true, |next| next.is_whitespace()),
            '\n' => chars.peek() == Some(&'\n'),
            _ => false,
        };
        if boundary {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}
