//! # Pipeline TAGME — Orquestrador com Eventos Observáveis
//!
//! O [`QueryProcessor`] roda, para uma consulta, as três etapas em sequência:
//!
//! 1. **Extração** ([`MentionExtractor`]): n-gramas → menções com candidatos.
//! 2. **Desambiguação** ([`DisambiguationEngine`]): votação coletiva → uma entidade por menção.
//! 3. **Poda** ([`PruningEngine`]): rho → links aceitos.
//!
//! Cada consulta ganha um estado novo (cache de relacionamento, mapas de votos); nada é
//! compartilhado entre consultas além dos índices somente-leitura. Os passos são emitidos
//! como [`LinkingEvent`] por um canal (`mpsc`), permitindo que o servidor WebSocket
//! transmita o progresso para o cliente.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{LinkerConfig, ThresholdOverrides, Thresholds};
use crate::disambiguation::{Disambiguation, DisambiguationEngine, DisambiguationOutcome};
use crate::error::{LinkError, Result};
use crate::index::Indices;
use crate::mention::{Extraction, Mention, MentionExtractor};
use crate::parsers::{annotate_with_parsers, PhraseParser};
use crate::pruning::{PrunedLinks, PruningEngine};
use crate::query::Query;
use crate::relatedness::RelatednessEngine;

/// Método que encontrou uma menção (ex: `tagme_anchor`, `simple_adj_n`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMethod {
    pub name: String,
}

impl ExtractionMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Menções vindas do índice de âncoras
    pub fn tagme_anchor() -> Self {
        Self::new("tagme_anchor")
    }
}

/// Um candidato do ranking de uma menção linkada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiLink {
    pub entity_id: String,
    /// Relevância acumulada na votação
    pub vote_score: f64,
    pub commonness: f64,
    /// Presente apenas para a entidade vencedora
    pub rho: Option<f64>,
}

/// Uma menção da resposta, linkada ou não
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub mention_text: String,
    /// Offsets de byte da primeira ocorrência no texto da consulta
    pub start: usize,
    pub end: usize,
    pub link_probability: f64,
    pub extraction_methods: Vec<ExtractionMethod>,
    /// Ranking completo se a menção foi linkada; vazio caso contrário
    pub wiki_links: Vec<WikiLink>,
}

/// Resposta de uma consulta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// A votação estourou o prazo; nenhuma menção foi linkada
    pub timed_out: bool,
    /// Candidatos de elemento: toda menção que sobreviveu à extração
    pub el_cands: Vec<CandidateEntry>,
}

impl QueryResponse {
    /// Pares (menção, entidade, rho) aceitos
    pub fn accepted_links(&self) -> Vec<(&str, &str, f64)> {
        self.el_cands
            .iter()
            .flat_map(|entry| {
                entry.wiki_links.iter().filter_map(move |link| {
                    link.rho
                        .map(|rho| (entry.mention_text.as_str(), link.entity_id.as_str(), rho))
                })
            })
            .collect()
    }
}

/// Eventos emitidos durante o processamento de uma consulta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LinkingEvent {
    /// **Passo 1**: menções extraídas, com link probability.
    MentionsExtracted {
        query_id: u64,
        mentions: Vec<Mention>,
    },
    /// **Passo 2**: ranking de uma menção após a votação e o filtro de commonness.
    MentionVoted {
        mention: String,
        ranking: Vec<(String, f64)>,
        selected: Vec<String>,
    },
    /// **Passo 3**: entidade escolhida por menção.
    Disambiguated { entities: Disambiguation },
    /// **Passo 4**: links que passaram pelo limiar de rho.
    Pruned { links: PrunedLinks },
    /// **Conclusão**
    Done {
        response: QueryResponse,
        processing_ms: u64,
    },
    /// **Falha**: a consulta foi rejeitada ou um índice falhou.
    Error { message: String },
}

/// Orquestra extração, desambiguação e poda.
///
/// Só contém handles somente-leitura, então pode ser compartilhado entre threads
/// (`Arc<QueryProcessor>`) e atender várias consultas ao mesmo tempo.
pub struct QueryProcessor {
    config: LinkerConfig,
    indices: Indices,
    parsers: Vec<Box<dyn PhraseParser>>,
}

impl QueryProcessor {
    pub fn new(config: LinkerConfig, indices: Indices) -> Self {
        Self {
            config,
            indices,
            parsers: Vec::new(),
        }
    }

    /// Parsers complementares que anotam a resposta
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn PhraseParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Processa a consulta de forma síncrona.
    pub fn process_query(&self, text: &str, overrides: &ThresholdOverrides) -> Result<QueryResponse> {
        self.run(text, overrides, &mut |_| {})
    }

    /// Processa a consulta enviando os eventos de cada passo pelo canal `tx`.
    ///
    /// O último evento é sempre `Done` ou `Error`.
    pub fn process_streaming(&self, text: &str, overrides: &ThresholdOverrides, tx: mpsc::Sender<LinkingEvent>) {
        let mut emit = |event: LinkingEvent| {
            let _ = tx.send(event);
        };
        if let Err(err) = self.run(text, overrides, &mut emit) {
            emit(LinkingEvent::Error {
                message: err.to_string(),
            });
        }
    }

    fn run(
        &self,
        text: &str,
        overrides: &ThresholdOverrides,
        emit: &mut dyn FnMut(LinkingEvent),
    ) -> Result<QueryResponse> {
        let start = Instant::now();
        if text.trim().is_empty() {
            return Err(LinkError::EmptyQuery);
        }
        let thresholds = self.config.thresholds.with_overrides(overrides)?;
        let query = Query::with_next_id(text);
        debug!(query_id = query.id, ?thresholds, "Processando consulta");

        // === Passo 1: Extração de menções ===
        let ngrams = query.ngrams_up_to(self.config.max_mention_tokens);
        let extraction = MentionExtractor::new(&self.config, thresholds.link_prob_th)
            .extract(&ngrams, &self.indices)?;
        emit(LinkingEvent::MentionsExtracted {
            query_id: query.id,
            mentions: extraction.mentions.clone(),
        });

        // === Passo 2: Votação e desambiguação ===
        let relatedness = RelatednessEngine::new(self.indices.cooccurrence.clone());
        let deadline = self
            .config
            .voting_deadline_ms
            .map(|ms| start + Duration::from_millis(ms));
        let outcome = DisambiguationEngine::new(&relatedness, thresholds.cmn_th, thresholds.k_th)
            .parallel(self.config.parallel_voting)
            .deadline(deadline)
            .disambiguate(&extraction.candidates)?;
        for (mention, ranking) in &outcome.top_k_entities {
            emit(LinkingEvent::MentionVoted {
                mention: mention.clone(),
                ranking: ranking.clone(),
                selected: outcome.selected.get(mention).cloned().unwrap_or_default(),
            });
        }
        emit(LinkingEvent::Disambiguated {
            entities: outcome.disambiguated.clone(),
        });

        // === Passo 3: Poda por rho ===
        let links = PruningEngine::new(&relatedness, thresholds.rho_th)
            .prune(&outcome.disambiguated, &extraction.link_probs)?;
        emit(LinkingEvent::Pruned { links: links.clone() });

        let mut response = build_response(&extraction, &outcome, &links);
        annotate_with_parsers(&query.text, &self.parsers, &mut response);

        let processing_ms = start.elapsed().as_millis() as u64;
        info!(
            query_id = query.id,
            mentions = response.el_cands.len(),
            links = links.len(),
            cache_entries = relatedness.cache().len(),
            timed_out = outcome.timed_out,
            processing_ms,
            "Consulta processada"
        );
        emit(LinkingEvent::Done {
            response: response.clone(),
            processing_ms,
        });
        Ok(response)
    }

    /// Limiares efetivos para um conjunto de sobrescritas
    pub fn thresholds(&self, overrides: &ThresholdOverrides) -> Result<Thresholds> {
        self.config.thresholds.with_overrides(overrides)
    }
}

/// Monta a resposta: uma entrada por menção extraída, com o ranking completo se linkada.
fn build_response(
    extraction: &Extraction,
    outcome: &DisambiguationOutcome,
    links: &PrunedLinks,
) -> QueryResponse {
    let el_cands = extraction
        .mentions
        .iter()
        .map(|mention| {
            let wiki_links = match (links.get(&mention.text), outcome.top_k_entities.get(&mention.text)) {
                (Some((selected, rho)), Some(ranking)) => {
                    let commonness = extraction.candidates.get(&mention.text);
                    ranking
                        .iter()
                        .map(|(entity, vote_score)| WikiLink {
                            entity_id: entity.clone(),
                            vote_score: *vote_score,
                            commonness: commonness
                                .and_then(|c| c.get(entity))
                                .copied()
                                .unwrap_or(0.0),
                            rho: (entity == selected).then_some(*rho),
                        })
                        .collect()
                }
                _ => Vec::new(),
            };
            CandidateEntry {
                mention_text: mention.text.clone(),
                start: mention.start,
                end: mention.end,
                link_probability: mention.link_probability,
                extraction_methods: vec![ExtractionMethod::tagme_anchor()],
                wiki_links,
            }
        })
        .collect();

    QueryResponse {
        timed_out: outcome.timed_out,
        el_cands,
    }
}
