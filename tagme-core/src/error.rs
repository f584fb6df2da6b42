//! # Erros do Entity Linking
//!
//! Dois níveis de erro:
//! - [`IndexError`]: falhas dos índices externos (frequência de frases, co-ocorrência, candidatos).
//! - [`LinkError`]: falhas de uma consulta inteira (entrada inválida, limiar fora da faixa, índice).
//!
//! Uma falha de índice durante uma consulta derruba apenas aquela consulta, nunca o processo.

use thiserror::Error;

/// Erros dos índices de apoio
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexError {
    /// O índice não está disponível (ex: snapshot não carregado ou corpus vazio)
    #[error("Índice indisponível: {0}")]
    Unavailable(String),
    /// Uma consulta ao índice falhou
    #[error("Falha na consulta ao índice: {0}")]
    LookupFailed(String),
}

/// Erros de processamento de uma consulta
#[derive(Debug, Error)]
pub enum LinkError {
    /// O texto da consulta está vazio ou ausente
    #[error("Texto da consulta vazio")]
    EmptyQuery,
    /// Um limiar (padrão ou sobrescrito) está fora de [0, 1] ou não é finito
    #[error("Limiar inválido {name}={value}: deve estar em [0, 1]")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Falha ao ler ou interpretar a configuração
    #[error("Configuração inválida: {0}")]
    Config(String),
}

impl LinkError {
    /// Erros causados pelo cliente (entrada), e não pelo serviço
    pub fn is_client_error(&self) -> bool {
        matches!(self, LinkError::EmptyQuery | LinkError::InvalidThreshold { .. })
    }
}

pub type Result<T, E = LinkError> = std::result::Result<T, E>;
