//! # Consulta e N-gramas
//!
//! Uma [`Query`] é imutável: identificador + texto bruto. As menções candidatas são
//! todos os n-gramas contíguos de tokens da consulta.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::tokenizer::{tokenize, Token};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

/// Consulta de entrada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: u64,
    pub text: String,
}

/// Um n-grama de tokens da consulta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ngram {
    /// Tokens em minúsculas unidos por um espaço
    pub text: String,
    /// Offset de byte inicial no texto original
    pub start: usize,
    /// Offset de byte final no texto original (exclusivo)
    pub end: usize,
    pub token_count: usize,
}

impl Query {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self { id, text: text.into() }
    }

    /// Cria uma consulta com identificador gerado (contador do processo)
    pub fn with_next_id(text: impl Into<String>) -> Self {
        Self::new(NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed), text)
    }

    pub fn tokens(&self) -> Vec<Token> {
        tokenize(&self.text)
    }

    /// Todos os n-gramas contíguos, ordenados por token inicial e depois tamanho.
    ///
    /// N-gramas repetidos (mesmo texto) ficam só com a primeira ocorrência.
    pub fn ngrams(&self) -> Vec<Ngram> {
        self.ngrams_up_to(usize::MAX)
    }

    /// N-gramas com no máximo `max_tokens` tokens; o total fica em O(n · max_tokens).
    pub fn ngrams_up_to(&self, max_tokens: usize) -> Vec<Ngram> {
        let tokens = self.tokens();
        let mut seen = HashSet::new();
        let mut ngrams = Vec::new();

        for i in 0..tokens.len() {
            let last = tokens.len().min(i.saturating_add(max_tokens));
            for j in i..last {
                let text = tokens[i..=j]
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !seen.insert(text.clone()) {
                    continue;
                }
                ngrams.push(Ngram {
                    text,
                    start: tokens[i].start,
                    end: tokens[j].end,
                    token_count: j - i + 1,
                });
            }
        }
        ngrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngrams_count() {
        let q = Query::new(0, "target yield mexico");
        let ngrams = q.ngrams();
        // 3 + 2 + 1
        assert_eq!(ngrams.len(), 6);
        assert_eq!(ngrams[0].text, "target");
        assert_eq!(ngrams[1].text, "target yield");
        assert_eq!(ngrams[2].text, "target yield mexico");
        assert_eq!(ngrams[2].token_count, 3);
    }

    #[test]
    fn test_ngram_offsets() {
        let q = Query::new(0, "Mexico Bond");
        let ngrams = q.ngrams();
        let full = ngrams.iter().find(|n| n.text == "mexico bond").unwrap();
        assert_eq!(&q.text[full.start..full.end], "Mexico Bond");
    }

    #[test]
    fn test_duplicates_keep_first() {
        let q = Query::new(0, "bond and bond");
        let ngrams = q.ngrams();
        let bonds: Vec<&Ngram> = ngrams.iter().filter(|n| n.text == "bond").collect();
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].start, 0);
    }

    #[test]
    fn test_ngrams_up_to_bounds_length() {
        let q = Query::new(0, "target yield mexico");
        let texts: Vec<String> = q.ngrams_up_to(2).into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["target", "target yield", "yield", "yield mexico", "mexico"]);
        assert!(q.ngrams_up_to(0).is_empty());
    }

    #[test]
    fn test_long_query_is_linear_in_tokens() {
        let text = (0..600).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let q = Query::new(0, text);
        let ngrams = q.ngrams_up_to(6);
        // 600 inícios × 6 tamanhos, menos os que passariam do fim (0+1+...+5)
        assert_eq!(ngrams.len(), 600 * 6 - 15);
        assert!(ngrams.iter().all(|n| n.token_count <= 6));
    }

    #[test]
    fn test_generated_ids_increase() {
        let a = Query::with_next_id("a");
        let b = Query::with_next_id("b");
        assert!(b.id > a.id);
    }
}
