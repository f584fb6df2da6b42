//! # Parsers Complementares de Frases
//!
//! Parsers que encontram frases por outros meios (léxico, gazetteer, padrões regex) e
//! apenas **anotam** a resposta: se o texto de um trecho encontrado coincide com uma menção
//! já presente na resposta, o nome do parser entra como método de extração adicional.
//! Eles nunca criam menções nem alteram pontuações.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::{ExtractionMethod, QueryResponse};
use crate::tokenizer::tokenize;

/// Um trecho encontrado por um parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub trait PhraseParser: Send + Sync {
    fn name(&self) -> &str;
    fn spans(&self, text: &str) -> Vec<ParsedSpan>;
}

/// Adjetivos comuns em consultas (inglês)
const ADJECTIVES: &[&str] = &[
    "annual", "average", "central", "current", "economic", "federal", "final", "financial",
    "fixed", "foreign", "global", "gross", "high", "international", "large", "local", "long",
    "low", "major", "national", "net", "new", "nominal", "old", "political", "public", "real",
    "short", "small", "total",
];

/// Substantivos compostos conhecidos
const COMPOUND_NOUNS: &[&str] = &[
    "government bond", "interest rate", "exchange rate", "stock market", "bond yield",
    "target yield", "inflation rate", "credit rating", "trade deficit", "central bank",
];

/// Adjetivo seguido de uma palavra (`simple_adj_n`)
pub struct AdjectiveNounParser {
    pattern: Regex,
}

impl AdjectiveNounParser {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_adjectives(ADJECTIVES)
    }

    pub fn with_adjectives(adjectives: &[&str]) -> Result<Self, regex::Error> {
        let alternatives = adjectives
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\s+\p{{L}}+\b", alternatives))?;
        Ok(Self { pattern })
    }
}

impl PhraseParser for AdjectiveNounParser {
    fn name(&self) -> &str {
        "simple_adj_n"
    }

    fn spans(&self, text: &str) -> Vec<ParsedSpan> {
        self.pattern
            .find_iter(text)
            .map(|m| ParsedSpan {
                text: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

/// Gazetteer de substantivos compostos (`simple_n_n`)
pub struct CompoundNounParser {
    compounds: Vec<Vec<String>>,
}

impl CompoundNounParser {
    pub fn new() -> Self {
        Self::with_compounds(COMPOUND_NOUNS)
    }

    pub fn with_compounds(compounds: &[&str]) -> Self {
        Self {
            compounds: compounds
                .iter()
                .map(|c| c.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
                .filter(|parts| !parts.is_empty())
                .collect(),
        }
    }
}

impl Default for CompoundNounParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseParser for CompoundNounParser {
    fn name(&self) -> &str {
        "simple_n_n"
    }

    fn spans(&self, text: &str) -> Vec<ParsedSpan> {
        let tokens = tokenize(text);
        let mut spans = Vec::new();
        for i in 0..tokens.len() {
            for parts in &self.compounds {
                let end = i + parts.len();
                if end > tokens.len() {
                    continue;
                }
                if tokens[i..end].iter().zip(parts).all(|(t, p)| &t.text == p) {
                    let (start, stop) = (tokens[i].start, tokens[end - 1].end);
                    spans.push(ParsedSpan {
                        text: text[start..stop].to_string(),
                        start,
                        end: stop,
                    });
                }
            }
        }
        spans
    }
}

/// Sequências de duas ou mais palavras capitalizadas (`capitalized_run`)
pub struct CapitalizedRunParser {
    pattern: Regex,
}

impl CapitalizedRunParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"\b\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)+\b")?,
        })
    }
}

impl PhraseParser for CapitalizedRunParser {
    fn name(&self) -> &str {
        "capitalized_run"
    }

    fn spans(&self, text: &str) -> Vec<ParsedSpan> {
        self.pattern
            .find_iter(text)
            .map(|m| ParsedSpan {
                text: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

/// Parsers padrão do serviço
pub fn default_parsers() -> Result<Vec<Box<dyn PhraseParser>>, regex::Error> {
    Ok(vec![
        Box::new(AdjectiveNounParser::new()?),
        Box::new(CompoundNounParser::new()),
        Box::new(CapitalizedRunParser::new()?),
    ])
}

/// Normaliza um trecho para o mesmo formato dos n-gramas (minúsculo, um espaço entre tokens)
fn normalize(text: &str) -> String {
    tokenize(text)
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Acrescenta o nome do parser às menções da resposta cujo texto ele também encontrou.
pub fn annotate_with_parsers(text: &str, parsers: &[Box<dyn PhraseParser>], response: &mut QueryResponse) {
    for parser in parsers {
        let found: HashSet<String> = parser.spans(text).iter().map(|s| normalize(&s.text)).collect();
        for entry in &mut response.el_cands {
            if !found.contains(&entry.mention_text) {
                continue;
            }
            if entry.extraction_methods.iter().any(|m| m.name == parser.name()) {
                continue;
            }
            entry.extraction_methods.push(ExtractionMethod::new(parser.name()));
        }
    }
}
