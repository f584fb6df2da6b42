//! # tagme-core — Entity Linking por Desambiguação Coletiva (TAGME)
//!
//! Dada uma consulta curta em texto livre, este crate identifica frases ("menções") que
//! provavelmente se referem a entidades conhecidas (ex: artigos da Wikipedia) e escolhe,
//! para cada menção, a melhor entidade com um score de confiança, descartando as menções
//! que não consegue resolver com segurança.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por um pipeline linear:
//!
//! 1.  **Entrada**: Texto bruto ([`Query`]) → n-gramas ([`tokenizer`], [`query`]).
//! 2.  **Extração** ([`mention`]): filtros por n-grama, link probability e contenção.
//! 3.  **Relacionamento** ([`relatedness`]): Milne & Witten sobre co-ocorrência, com cache por consulta.
//! 4.  **Desambiguação** ([`disambiguation`]): votação coletiva, filtro de commonness, top-k com empates.
//! 5.  **Poda** ([`pruning`]): rho = (link probability + coerência) / 2.
//! 6.  **Saída**: [`QueryResponse`] com todas as menções extraídas e os links aceitos.
//!
//! As estatísticas vêm de índices externos somente-leitura ([`index`]); [`store`] traz uma
//! implementação em memória e [`demo`] um snapshot de exemplo.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use tagme_core::{demo, Indices, LinkerConfig, QueryProcessor, ThresholdOverrides};
//!
//! // 1. Injeta os índices (aqui, o store de demonstração)
//! let indices = Indices::from_store(Arc::new(demo::demo_store()));
//! let processor = QueryProcessor::new(LinkerConfig::default(), indices);
//!
//! // 2. Processa a consulta com os limiares padrão
//! let response = processor
//!     .process_query(demo::DEMO_QUERY, &ThresholdOverrides::default())
//!     .unwrap();
//!
//! // 3. Exibe os links aceitos
//! for (mention, entity, rho) in response.accepted_links() {
//!     println!("{} -> {} (rho={:.3})", mention, entity, rho);
//! }
//! ```

pub mod config;
pub mod demo;
pub mod disambiguation;
pub mod error;
pub mod index;
pub mod mention;
pub mod parsers;
pub mod pipeline;
pub mod pruning;
pub mod query;
pub mod relatedness;
pub mod store;
pub mod tokenizer;

pub use config::{LinkerConfig, SurfaceFormSource, ThresholdOverrides, Thresholds};
pub use error::{IndexError, LinkError};
pub use index::{CandidateSource, CooccurrenceIndex, Indices, MentionStats, TextFrequencyIndex};
pub use pipeline::{CandidateEntry, LinkingEvent, QueryProcessor, QueryResponse, WikiLink};
pub use query::Query;
pub use store::{StatsSnapshot, StatsStore};
