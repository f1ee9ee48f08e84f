use std::{
	future::IntoFuture,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use braid_config::EmbeddingProviderConfig;
use braid_providers::{EmbeddingProvider, Error, HttpEmbedding};

async fn start_embed_server(request_count: Arc<AtomicUsize>) -> (String, Sender<()>) {
	let app =
		Router::new().route("/embeddings", routing::post(embed_handler)).with_state(request_count);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind embed server.");
	let addr = listener.local_addr().expect("Failed to read embed server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

/// Echoes each input's length as a 3-dim vector, listing items in reverse order.
/// Any input equal to "boom" fails the whole request.
async fn embed_handler(
	State(counter): State<Arc<AtomicUsize>>,
	Json(payload): Json<Value>,
) -> impl IntoResponse {
	counter.fetch_add(1, Ordering::SeqCst);

	let inputs =
		payload.get("input").and_then(|value| value.as_array()).cloned().unwrap_or_default();

	if inputs.iter().any(|input| input.as_str() == Some("boom")) {
		return StatusCode::INTERNAL_SERVER_ERROR.into_response();
	}

	let data: Vec<_> = inputs
		.iter()
		.enumerate()
		.rev()
		.map(|(index, input)| {
			let len = input.as_str().map(str::len).unwrap_or_default() as f32;

			serde_json::json!({
				"index": index,
				"embedding": [len, 1.0, 0.0]
			})
		})
		.collect();

	(StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
}

fn provider_config(api_base: String) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "mock".to_string(),
		api_base,
		api_key: Some("secret".to_string()),
		path: "/embeddings".to_string(),
		model: "mock-embed".to_string(),
		dimensions: 3,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers = braid_providers::auth_headers(Some("secret"), &Map::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn omits_auth_header_without_key() {
	let mut defaults = Map::new();

	defaults.insert("x-team".to_string(), Value::String("search".to_string()));

	let headers =
		braid_providers::auth_headers(None, &defaults).expect("Failed to build headers.");

	assert!(headers.get(AUTHORIZATION).is_none());
	assert_eq!(headers.get("x-team").expect("Missing default header."), "search");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = braid_providers::auth_headers(None, &defaults).expect_err("Expected an error.");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[tokio::test]
async fn http_embedding_preserves_input_order() {
	let request_count = Arc::new(AtomicUsize::new(0));
	let (api_base, shutdown) = start_embed_server(request_count.clone()).await;
	let cfg = provider_config(api_base);
	let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
	let vectors = HttpEmbedding.embed(&cfg, &texts).await.expect("Embedding failed.");

	assert_eq!(vectors, vec![vec![1.0, 1.0, 0.0], vec![3.0, 1.0, 0.0], vec![2.0, 1.0, 0.0]]);
	assert_eq!(request_count.load(Ordering::SeqCst), 1);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn http_embedding_skips_empty_batches() {
	let request_count = Arc::new(AtomicUsize::new(0));
	let (api_base, shutdown) = start_embed_server(request_count.clone()).await;
	let vectors =
		HttpEmbedding.embed(&provider_config(api_base), &[]).await.expect("Embedding failed.");

	assert!(vectors.is_empty());
	assert_eq!(request_count.load(Ordering::SeqCst), 0);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn http_embedding_surfaces_server_errors() {
	let request_count = Arc::new(AtomicUsize::new(0));
	let (api_base, shutdown) = start_embed_server(request_count).await;
	let err = HttpEmbedding
		.embed(&provider_config(api_base), &["boom".to_string()])
		.await
		.expect_err("Expected a server error.");

	assert!(matches!(err, Error::Reqwest(_)), "unexpected error: {err:?}");

	let _ = shutdown.send(());
}
