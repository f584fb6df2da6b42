//! # Desambiguação Coletiva por Votação
//!
//! Cada menção vota nos candidatos das outras menções. O voto de `m_j` para a entidade `e`
//! (candidata de `m_i`) é:
//!
//! ```text
//! vote(e, m_j) = Σ_{e_k ∈ cand(m_j)} cmn(e_k) · rel(e, e_k) / |cand(m_j)|
//! ```
//!
//! e a relevância de `e` é a soma dos votos de todas as outras menções.
//!
//! ## Etapas
//! 1. **Votação**: quadrática no número de menções; paralela por par (menção, entidade) com rayon.
//! 2. **Filtro de commonness**: só ficam candidatos com `cmn >= cmn_th`.
//! 3. **Top-k com empates**: `k = max(1, round(n · k_th))` valores *distintos* de relevância;
//!    empates na fronteira entram todos.
//! 4. **Vencedor**: no top-k, a maior commonness; empate fica com o primeiro na ordem de relevância.
//!
//! A ordem de soma é fixa (mapas ordenados), então a mesma consulta sempre produz os mesmos bits.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::mention::CandidateSet;
use crate::relatedness::RelatednessEngine;

/// menção -> (entidade -> relevância acumulada)
pub type RelevanceScores = BTreeMap<String, BTreeMap<String, f64>>;

/// menção -> candidatos ordenados por relevância decrescente (lista completa)
pub type TopKEntities = BTreeMap<String, Vec<(String, f64)>>;

/// menção -> entidade vencedora
pub type Disambiguation = BTreeMap<String, String>;

/// Resultado completo da desambiguação
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationOutcome {
    /// Relevâncias após o filtro de commonness
    pub rel_scores: RelevanceScores,
    /// Ranking completo por menção
    pub top_k_entities: TopKEntities,
    /// Subconjunto top-k (com empates) por menção
    pub selected: BTreeMap<String, Vec<String>>,
    pub disambiguated: Disambiguation,
    /// A votação foi abandonada por estourar o prazo
    pub timed_out: bool,
}

pub struct DisambiguationEngine<'a> {
    relatedness: &'a RelatednessEngine,
    cmn_th: f64,
    k_th: f64,
    parallel: bool,
    deadline: Option<Instant>,
}

impl<'a> DisambiguationEngine<'a> {
    pub fn new(relatedness: &'a RelatednessEngine, cmn_th: f64, k_th: f64) -> Self {
        Self {
            relatedness,
            cmn_th,
            k_th,
            parallel: true,
            deadline: None,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Prazo após o qual a votação é abandonada
    pub fn deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Executa votação, filtro de commonness, top-k e escolha do vencedor.
    pub fn disambiguate(&self, candidates: &CandidateSet) -> Result<DisambiguationOutcome, IndexError> {
        let Some(raw_scores) = self.relevance_scores(candidates)? else {
            return Ok(DisambiguationOutcome {
                timed_out: true,
                ..Default::default()
            });
        };

        let mut outcome = DisambiguationOutcome::default();
        for (mention, scores) in raw_scores {
            let commonness = &candidates[&mention];
            let kept: BTreeMap<String, f64> = scores
                .into_iter()
                .filter(|(entity, _)| commonness[entity] >= self.cmn_th)
                .collect();
            if kept.is_empty() {
                debug!(mention = %mention, "Nenhum candidato acima de cmn_th");
                continue;
            }

            let (ranked, selected) = select_top_k(&kept, self.k_th);
            if let Some(winner) = pick_winner(&selected, commonness) {
                debug!(mention = %mention, entity = %winner, top_k = selected.len(), "Menção desambiguada");
                outcome.disambiguated.insert(mention.clone(), winner);
            }
            outcome.top_k_entities.insert(mention.clone(), ranked);
            outcome.selected.insert(mention.clone(), selected);
            outcome.rel_scores.insert(mention, kept);
        }
        Ok(outcome)
    }

    /// Relevância de cada candidato de cada menção. `None` se o prazo estourou.
    pub fn relevance_scores(&self, candidates: &CandidateSet) -> Result<Option<RelevanceScores>, IndexError> {
        let tasks: Vec<(&str, &str)> = candidates
            .iter()
            .flat_map(|(mention, entities)| {
                entities
                    .keys()
                    .map(move |entity| (mention.as_str(), entity.as_str()))
            })
            .collect();

        let expired = AtomicBool::new(false);
        let score = |&(mention, entity): &(&str, &str)| -> Result<(String, String, f64), IndexError> {
            let mut total = 0.0;
            for (other, other_entities) in candidates {
                if other == mention || other_entities.is_empty() {
                    continue;
                }
                if self.past_deadline() {
                    expired.store(true, Ordering::Relaxed);
                    break;
                }
                total += self.vote(entity, other_entities)?;
            }
            Ok((mention.to_string(), entity.to_string(), total))
        };

        let results: Vec<(String, String, f64)> = if self.parallel {
            tasks.par_iter().map(score).collect::<Result<_, _>>()?
        } else {
            tasks.iter().map(score).collect::<Result<_, _>>()?
        };

        if expired.load(Ordering::Relaxed) {
            warn!(tasks = tasks.len(), "Prazo da votação estourado; desambiguação abandonada");
            return Ok(None);
        }

        let mut scores = RelevanceScores::new();
        for (mention, entity, total) in results {
            scores.entry(mention).or_default().insert(entity, total);
        }
        Ok(Some(scores))
    }

    /// Voto dos candidatos de outra menção para `entity`
    pub fn vote(&self, entity: &str, other_candidates: &BTreeMap<String, f64>) -> Result<f64, IndexError> {
        if other_candidates.is_empty() {
            return Ok(0.0);
        }
        let mut vote = 0.0;
        for (other_entity, cmn) in other_candidates {
            vote += cmn * self.relatedness.relatedness(entity, other_entity)?;
        }
        Ok(vote / other_candidates.len() as f64)
    }

    fn past_deadline(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Ordena por relevância decrescente e seleciona os `k` primeiros valores distintos.
///
/// Retorna `(ranking completo, selecionados)`. Empates mantêm a ordem do identificador.
pub fn select_top_k(scores: &BTreeMap<String, f64>, k_th: f64) -> (Vec<(String, f64)>, Vec<String>) {
    let mut ranked: Vec<(String, f64)> = scores.iter().map(|(e, s)| (e.clone(), *s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let k = ((ranked.len() as f64 * k_th).round() as usize).max(1);
    let mut selected = Vec::new();
    let mut distinct = 0usize;
    let mut prev: Option<f64> = None;
    for (entity, score) in &ranked {
        if prev != Some(*score) {
            distinct += 1;
        }
        if distinct > k {
            break;
        }
        selected.push(entity.clone());
        prev = Some(*score);
    }
    (ranked, selected)
}

/// Escolhe a entidade de maior commonness; empate fica com a primeira da lista.
pub fn pick_winner(selected: &[String], commonness: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for entity in selected {
        let cmn = commonness.get(entity).copied().unwrap_or(0.0);
        if best.map_or(true, |(_, best_cmn)| cmn > best_cmn) {
            best = Some((entity, cmn));
        }
    }
    best.map(|(entity, _)| entity.clone())
}
