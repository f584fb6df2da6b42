//! Servidor web Axum para o entity linking TAGME (HTTP + WebSocket)

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tagme_core::{
    demo::{demo_queries, demo_store},
    parsers::default_parsers,
    Indices, LinkError, LinkerConfig, LinkingEvent, QueryProcessor, StatsStore, ThresholdOverrides,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Variável de ambiente com o caminho do YAML de configuração
const CONFIG_ENV: &str = "TAGME_CONFIG";

/// Estado compartilhado da aplicação
struct AppState {
    processor: QueryProcessor,
}

/// Corpo de `POST /api/tagme/proc_query/v1` (e mensagens do WebSocket)
#[derive(Deserialize)]
struct ProcQueryRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(flatten)]
    overrides: ThresholdOverrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!(path = %path, "Carregando configuração");
            LinkerConfig::from_file(&path)?
        }
        Err(_) => LinkerConfig::default(),
    };

    // Sem índice funcional o serviço não sobe
    let store = match &config.stats_path {
        Some(path) => {
            info!(path = %path.display(), "Carregando snapshot de estatísticas");
            StatsStore::from_file(path)?
        }
        None => {
            warn!("stats_path não configurado; usando estatísticas de demonstração");
            demo_store()
        }
    };
    store.check_ready()?;

    let bind_addr = config.server.bind_addr.clone();
    let processor = QueryProcessor::new(config, Indices::from_store(Arc::new(store)))
        .with_parsers(default_parsers()?);
    let state = Arc::new(AppState { processor });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("🚀 Servidor TAGME iniciado em http://{}", bind_addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tagme/proc_query/v1", post(proc_query_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-queries", get(demo_queries_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Entity linking via HTTP POST (sem streaming)
async fn proc_query_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcQueryRequest>,
) -> Response {
    let Some(text) = req.text.filter(|t| !t.trim().is_empty()) else {
        return error_json(StatusCode::BAD_REQUEST, "Campo obrigatório ausente: text");
    };
    let overrides = req.overrides;

    // O pipeline é síncrono (e usa rayon): roda fora do runtime async
    let result =
        tokio::task::spawn_blocking(move || state.processor.process_query(&text, &overrides)).await;

    match result {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(err)) => link_error_response(err),
        Err(join_err) => {
            error!(error = %join_err, "Tarefa do pipeline falhou");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Falha interna")
        }
    }
}

fn link_error_response(err: LinkError) -> Response {
    if err.is_client_error() {
        error_json(StatusCode::BAD_REQUEST, &err.to_string())
    } else {
        error!(error = %err, "Consulta falhou");
        error_json(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
    }
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Retorna consultas de demonstração
async fn demo_queries_handler() -> impl IntoResponse {
    Json(demo_queries())
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Recebe consultas e devolve os eventos de cada passo do pipeline
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                for event in &ws_events(Arc::clone(&state), &text).await {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

/// Processa uma mensagem do WebSocket e devolve os eventos na ordem emitida.
///
/// Mensagem inválida vira um único `LinkingEvent::Error`, como o 400 da rota HTTP.
async fn ws_events(state: Arc<AppState>, message: &str) -> Vec<LinkingEvent> {
    let (query_text, overrides) = match parse_ws_message(message) {
        Ok(parsed) => parsed,
        Err(message) => return vec![LinkingEvent::Error { message }],
    };

    info!("Processando via WebSocket: {} chars", query_text.len());

    let (tx, rx) = std::sync::mpsc::channel::<LinkingEvent>();
    let handle = tokio::task::spawn_blocking(move || {
        state.processor.process_streaming(&query_text, &overrides, tx);
    });
    if let Err(join_err) = handle.await {
        error!(error = %join_err, "Tarefa do pipeline falhou");
        return vec![LinkingEvent::Error {
            message: "Falha interna".to_string(),
        }];
    }
    rx.try_iter().collect()
}

/// Objeto JSON `{text, rho_th, ...}` ou texto puro.
fn parse_ws_message(message: &str) -> Result<(String, ThresholdOverrides), String> {
    let trimmed = message.trim();
    if trimmed.starts_with('{') {
        let req: ProcQueryRequest =
            serde_json::from_str(trimmed).map_err(|e| format!("Requisição inválida: {}", e))?;
        let text = req
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "Campo obrigatório ausente: text".to_string())?;
        return Ok((text, req.overrides));
    }
    if trimmed.is_empty() {
        return Err(LinkError::EmptyQuery.to_string());
    }
    Ok((trimmed.to_string(), ThresholdOverrides::default()))
}
