//! # Tokenizador de Consultas
//!
//! Divide o texto da consulta em palavras usando as fronteiras de palavra Unicode
//! (UAX #29). Pontuação não vira token. Cada token preserva sua posição original
//! (offset em bytes) para que a resposta consiga apontar onde cada menção aparece.
//!
//! ```rust
//! use tagme_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Mexico 10 Year Government Bond");
//! assert_eq!(tokens[2].text, "year");
//! assert_eq!(tokens.len(), 5);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token, em minúsculas (ex: "bond").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Tokeniza o texto em palavras minúsculas com offsets.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.unicode_word_indices()
        .enumerate()
        .map(|(index, (start, word))| Token {
            text: word.to_lowercase(),
            start,
            end: start + word.len(),
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("What Is Target Yield?");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["what", "is", "target", "yield"]);
    }

    #[test]
    fn test_offsets_point_into_original() {
        let text = "Government  Bond, 2018";
        let tokens = tokenize(text);
        assert_eq!(tokens.len(), 3);
        assert_eq!(&text[tokens[1].start..tokens[1].end], "Bond");
        assert_eq!(tokens[2].index, 2);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ?! ").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        let tokens = tokenize("São Paulo");
        assert_eq!(tokens[0].text, "são");
        assert_eq!(tokens[0].end, "São".len());
    }
}
