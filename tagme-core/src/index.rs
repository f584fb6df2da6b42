//! # Índices de Apoio
//!
//! O TAGME lê três fontes de estatísticas, todas somente-leitura durante a consulta:
//!
//! 1. [`TextFrequencyIndex`]: em quantos documentos uma frase exata aparece.
//! 2. [`CooccurrenceIndex`]: em quantos documentos um conjunto de entidades aparece junto (AND).
//! 3. [`CandidateSource`]: estatísticas de âncora de uma menção e suas entidades candidatas.
//!
//! As implementações devem ser `Send + Sync`: um único handle (`Arc<dyn ...>`) é
//! compartilhado por todas as consultas em andamento, sem travas.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SurfaceFormSource;
use crate::error::IndexError;

/// Frequência de documentos por frase exata
pub trait TextFrequencyIndex: Send + Sync {
    fn phrase_document_frequency(&self, text: &str) -> Result<u64, IndexError>;
}

/// Contagem de documentos por conjunto de entidades
pub trait CooccurrenceIndex: Send + Sync {
    /// Documentos que contêm TODAS as entidades de `entity_ids` (AND booleano).
    fn document_count(&self, entity_ids: &[&str]) -> Result<u64, IndexError>;

    /// Total de documentos do corpus anotado
    fn total_document_count(&self) -> Result<u64, IndexError>;
}

/// Fonte de candidatos de uma menção
pub trait CandidateSource: Send + Sync {
    /// Estatísticas da menção, com candidatos restritos a commonness >= `commonness_floor`.
    fn candidates(&self, mention: &str, commonness_floor: f64) -> Result<MentionStats, IndexError>;
}

/// Estatísticas de uma menção vindas da fonte de candidatos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionStats {
    /// Vezes que a frase aparece como âncora na Wikipedia
    #[serde(default)]
    pub wiki_occurrences: u64,
    /// Vezes que a frase aparece anotada no corpus alternativo (FACC)
    #[serde(default)]
    pub facc_occurrences: u64,
    /// entidade -> commonness P(entidade | menção)
    #[serde(default)]
    pub entities: BTreeMap<String, f64>,
}

impl MentionStats {
    /// Contagem "como âncora" segundo a fonte configurada
    pub fn anchor_occurrences(&self, source: SurfaceFormSource) -> u64 {
        match source {
            SurfaceFormSource::Wiki => self.wiki_occurrences,
            SurfaceFormSource::Facc => self.facc_occurrences,
        }
    }

    /// Mantém apenas candidatos com commonness >= `floor`
    pub fn above_floor(mut self, floor: f64) -> Self {
        self.entities.retain(|_, cmn| *cmn >= floor);
        self
    }
}

/// Conjunto de handles dos índices injetados no processador.
#[derive(Clone)]
pub struct Indices {
    pub text: Arc<dyn TextFrequencyIndex>,
    pub cooccurrence: Arc<dyn CooccurrenceIndex>,
    pub candidates: Arc<dyn CandidateSource>,
}

impl Indices {
    /// Usa a mesma implementação para os três papéis
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TextFrequencyIndex + CooccurrenceIndex + CandidateSource + 'static,
    {
        Self {
            text: store.clone(),
            cooccurrence: store.clone(),
            candidates: store,
        }
    }
}

impl std::fmt::Debug for Indices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indices").finish_non_exhaustive()
    }
}
