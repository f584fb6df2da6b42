//! # Extração de Menções (Parsing)
//!
//! Transforma os n-gramas da consulta num mapa filtrado menção → {entidade: commonness}.
//!
//! ## Filtros por n-grama
//! Um n-grama é descartado se:
//! - tem um único caractere;
//! - é puramente numérico;
//! - tem mais de `max_mention_tokens` tokens (6);
//! - aparece menos de `min_anchor_occurrences` vezes (2) como âncora;
//! - sua link probability (`ocorrências como âncora / frequência da frase`) é menor que `link_prob_th`.
//!   Frequência zero dá link probability 0.
//!
//! ## Filtro de contenção
//! Se uma menção `m_i` é substring de outra `m_j` com pelo menos tantos tokens quanto ela, e
//! `lp(m_i) < lp(m_j)`, então `m_i` é descartada. Link probabilities iguais nunca descartam.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LinkerConfig, SurfaceFormSource};
use crate::error::IndexError;
use crate::index::Indices;
use crate::query::Ngram;

/// menção -> (entidade -> commonness)
pub type CandidateSet = BTreeMap<String, BTreeMap<String, f64>>;

/// Uma menção que sobreviveu à extração
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub token_count: usize,
    pub anchor_occurrences: u64,
    pub link_probability: f64,
}

/// Saída do extrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Menções sobreviventes, na ordem dos n-gramas da consulta
    pub mentions: Vec<Mention>,
    /// Candidatos de cada menção sobrevivente
    pub candidates: CandidateSet,
    /// Link probability de cada menção sobrevivente
    pub link_probs: BTreeMap<String, f64>,
}

/// Extrator de menções
#[derive(Debug, Clone)]
pub struct MentionExtractor {
    pub link_prob_th: f64,
    pub commonness_floor: f64,
    pub max_mention_tokens: usize,
    pub min_anchor_occurrences: u64,
    pub sf_source: SurfaceFormSource,
}

impl MentionExtractor {
    pub fn new(config: &LinkerConfig, link_prob_th: f64) -> Self {
        Self {
            link_prob_th,
            commonness_floor: config.commonness_floor,
            max_mention_tokens: config.max_mention_tokens,
            min_anchor_occurrences: config.min_anchor_occurrences,
            sf_source: config.sf_source,
        }
    }

    /// Executa os filtros por n-grama e o filtro de contenção.
    pub fn extract(&self, ngrams: &[Ngram], indices: &Indices) -> Result<Extraction, IndexError> {
        let mut kept: Vec<(Mention, BTreeMap<String, f64>)> = Vec::new();

        for ngram in ngrams {
            if ngram.text.chars().count() == 1
                || ngram.text.chars().all(char::is_numeric)
                || ngram.token_count > self.max_mention_tokens
            {
                continue;
            }

            let stats = indices
                .candidates
                .candidates(&ngram.text, self.commonness_floor)?;
            let anchor_occurrences = stats.anchor_occurrences(self.sf_source);
            if anchor_occurrences < self.min_anchor_occurrences {
                continue;
            }

            let link_probability = self.link_probability(&ngram.text, anchor_occurrences, indices)?;
            if link_probability == 0.0 || link_probability < self.link_prob_th {
                continue;
            }

            debug!(
                mention = %ngram.text,
                link_probability,
                candidates = stats.entities.len(),
                "Menção mantida"
            );
            kept.push((
                Mention {
                    text: ngram.text.clone(),
                    start: ngram.start,
                    end: ngram.end,
                    token_count: ngram.token_count,
                    anchor_occurrences,
                    link_probability,
                },
                stats.entities,
            ));
        }

        let dropped = containment_filter(&kept.iter().map(|(m, _)| m).collect::<Vec<_>>());

        let mut extraction = Extraction::default();
        for (i, (mention, entities)) in kept.into_iter().enumerate() {
            if dropped[i] {
                debug!(mention = %mention.text, "Menção descartada por contenção");
                continue;
            }
            extraction
                .link_probs
                .insert(mention.text.clone(), mention.link_probability);
            extraction.candidates.insert(mention.text.clone(), entities);
            extraction.mentions.push(mention);
        }
        Ok(extraction)
    }

    /// `ocorrências como âncora / frequência de documentos da frase`; 0 se a frase nunca aparece.
    fn link_probability(
        &self,
        text: &str,
        anchor_occurrences: u64,
        indices: &Indices,
    ) -> Result<f64, IndexError> {
        let frequency = indices.text.phrase_document_frequency(text)?;
        if frequency == 0 {
            return Ok(0.0);
        }
        Ok(anchor_occurrences as f64 / frequency as f64)
    }
}

/// Marca as menções contidas em outra mais longa (ou de mesmo tamanho) com link probability maior.
///
/// Retorna um vetor paralelo a `mentions`: `true` = descartar.
pub fn containment_filter(mentions: &[&Mention]) -> Vec<bool> {
    let mut order: Vec<usize> = (0..mentions.len()).collect();
    order.sort_by_key(|&i| mentions[i].token_count);

    let mut dropped = vec![false; mentions.len()];
    for (pos, &i) in order.iter().enumerate() {
        let m_i = mentions[i];
        // Os candidatos a conter m_i têm pelo menos tantos tokens quanto ela,
        // incluindo os empates que ficaram antes na ordenação.
        let first_same_len = order[..pos]
            .iter()
            .rposition(|&k| mentions[k].token_count < m_i.token_count)
            .map_or(0, |p| p + 1);
        dropped[i] = order[first_same_len..]
            .iter()
            .filter(|&&j| j != i)
            .any(|&j| {
                let m_j = mentions[j];
                m_j.text.contains(m_i.text.as_str()) && m_i.link_probability < m_j.link_probability
            });
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::store::{StatsSnapshot, StatsStore};
    use std::sync::Arc;

    fn extractor(link_prob_th: f64) -> MentionExtractor {
        MentionExtractor::new(&LinkerConfig::default(), link_prob_th)
    }

    fn indices(snapshot: StatsSnapshot) -> Indices {
        Indices::from_store(Arc::new(StatsStore::new(snapshot)))
    }

    fn mention(text: &str, link_probability: f64) -> Mention {
        Mention {
            text: text.to_string(),
            start: 0,
            end: text.len(),
            token_count: text.split_whitespace().count(),
            anchor_occurrences: 10,
            link_probability,
        }
    }

    #[test]
    fn test_bond_link_probability() {
        let idx = indices(
            StatsSnapshot::new(1000)
                .with_phrase("bond", 100)
                .with_anchor("bond", 50, 0, &[("Bond_(finance)", 0.6)]),
        );
        let extraction = extractor(0.2)
            .extract(&Query::new(0, "bond").ngrams(), &idx)
            .unwrap();
        assert_eq!(extraction.link_probs["bond"], 0.5);
        assert_eq!(extraction.mentions.len(), 1);
        assert_eq!(extraction.candidates["bond"]["Bond_(finance)"], 0.6);
    }

    #[test]
    fn test_link_probability_threshold() {
        let idx = indices(
            StatsSnapshot::new(1000)
                .with_phrase("bond", 100)
                .with_anchor("bond", 50, 0, &[("Bond_(finance)", 0.6)]),
        );
        let extraction = extractor(0.6)
            .extract(&Query::new(0, "bond").ngrams(), &idx)
            .unwrap();
        assert!(extraction.mentions.is_empty());
    }

    #[test]
    fn test_basic_filters() {
        let idx = indices(
            StatsSnapshot::new(1000)
                // numérico
                .with_phrase("2018", 10)
                .with_anchor("2018", 10, 0, &[("2018", 1.0)])
                // um caractere
                .with_phrase("x", 10)
                .with_anchor("x", 10, 0, &[("X", 1.0)])
                // poucas ocorrências como âncora
                .with_phrase("yield", 10)
                .with_anchor("yield", 1, 0, &[("Yield_(finance)", 1.0)])
                // frequência zero
                .with_anchor("mexico", 10, 0, &[("Mexico", 1.0)]),
        );
        let extraction = extractor(0.0)
            .extract(&Query::new(0, "2018 x yield mexico").ngrams(), &idx)
            .unwrap();
        assert!(extraction.mentions.is_empty(), "{:?}", extraction.mentions);
    }

    #[test]
    fn test_long_mentions_are_discarded() {
        let text = "a1 a2 a3 a4 a5 a6 a7";
        let idx = indices(
            StatsSnapshot::new(1000)
                .with_phrase(text, 10)
                .with_anchor(text, 10, 0, &[("Seven", 1.0)]),
        );
        let extraction = extractor(0.0)
            .extract(&Query::new(0, text).ngrams(), &idx)
            .unwrap();
        assert!(extraction.mentions.is_empty());
    }

    #[test]
    fn test_facc_source_uses_alternative_counts() {
        let idx = indices(
            StatsSnapshot::new(1000)
                .with_phrase("bond", 100)
                .with_anchor("bond", 50, 20, &[("Bond_(finance)", 0.6)]),
        );
        let mut ex = extractor(0.0);
        ex.sf_source = SurfaceFormSource::Facc;
        let extraction = ex.extract(&Query::new(0, "bond").ngrams(), &idx).unwrap();
        assert_eq!(extraction.link_probs["bond"], 0.2);
    }

    #[test]
    fn test_containment_drops_weaker_substring() {
        let target = mention("target", 0.3);
        let target_yield = mention("target yield", 0.6);
        let dropped = containment_filter(&[&target, &target_yield]);
        assert_eq!(dropped, vec![true, false]);
    }

    #[test]
    fn test_containment_keeps_equal_or_stronger_substring() {
        let target = mention("target", 0.6);
        let target_yield = mention("target yield", 0.6);
        assert_eq!(containment_filter(&[&target, &target_yield]), vec![false, false]);

        let strong = mention("target", 0.9);
        assert_eq!(containment_filter(&[&target_yield, &strong]), vec![false, false]);
    }

    #[test]
    fn test_containment_same_token_count() {
        // "bond" ⊂ "bonds", ambos com um token
        let bonds = mention("bonds", 0.7);
        let bond = mention("bond", 0.4);
        assert_eq!(containment_filter(&[&bonds, &bond]), vec![false, true]);
    }

    #[test]
    fn test_containment_in_extraction() {
        let idx = indices(
            StatsSnapshot::new(1000)
                .with_phrase("target", 100)
                .with_anchor("target", 30, 0, &[("Target_Corporation", 0.7)])
                .with_phrase("target yield", 10)
                .with_anchor("target yield", 6, 0, &[("Target_yield", 1.0)]),
        );
        let extraction = extractor(0.001)
            .extract(&Query::new(0, "target yield").ngrams(), &idx)
            .unwrap();
        assert!(!extraction.candidates.contains_key("target"));
        assert!(!extraction.link_probs.contains_key("target"));
        assert_eq!(extraction.mentions.len(), 1);
        assert_eq!(extraction.mentions[0].text, "target yield");
    }
}
