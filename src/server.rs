use crate::config::FormDefaults;
use crate::error::SwapError;
use crate::form::SwapForm;
use crate::metrics::encode_metrics;
use crate::swap::{explorer_url, QuoteSummary, SwapController};

use hyper::body::HttpBody;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");
const MAX_BODY_BYTES: usize = 16 * 1024;

pub struct AppState {
    pub controller: SwapController,
    pub index_html: String,
}

impl AppState {
    pub fn new(controller: SwapController, defaults: &FormDefaults) -> Self {
        let index_html = INDEX_HTML
            .replace("{{TOKEN_MINT}}", &escape_attr(&defaults.token_mint))
            .replace("{{SLIPPAGE}}", &escape_attr(&defaults.slippage))
            .replace("{{PRIORITY_FEE}}", &escape_attr(&defaults.priority_fee));

        Self {
            controller,
            index_html,
        }
    }
}

/// Body of `POST /swap` and `POST /quote` replies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapStatus {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteSummary>,
}

impl SwapStatus {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            signature: None,
            explorer_url: None,
            quote: None,
        }
    }

    fn from_error(err: &SwapError) -> (StatusCode, Self) {
        let status = match err {
            SwapError::Validation(_) => StatusCode::BAD_REQUEST,
            SwapError::Busy => StatusCode::CONFLICT,
            SwapError::Api(_) | SwapError::Transaction { .. } => StatusCode::BAD_GATEWAY,
        };
        let signature = err.signature();
        (
            status,
            Self {
                success: false,
                message: err.to_string(),
                signature: signature.map(|s| s.to_string()),
                explorer_url: signature.as_ref().map(explorer_url),
                quote: None,
            },
        )
    }
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| route(state.clone(), req))) }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    info!("Swap form available at http://{}", server.local_addr());

    server
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

pub async fn route(state: Arc<AppState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let resp = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => respond(
            StatusCode::OK,
            "text/html; charset=utf-8",
            Body::from(state.index_html.clone()),
        ),
        (&Method::POST, "/swap") => handle_swap(&state, req).await,
        (&Method::POST, "/quote") => handle_quote(&state, req).await,
        (&Method::GET, "/metrics") => match encode_metrics() {
            Ok(buf) => respond(StatusCode::OK, "text/plain; version=0.0.4", Body::from(buf)),
            Err(e) => {
                warn!("Failed to encode metrics: {:?}", e);
                respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", Body::empty())
            }
        },
        _ => respond(StatusCode::NOT_FOUND, "text/plain", Body::from("not found")),
    };
    Ok(resp)
}

async fn handle_swap(state: &AppState, req: Request<Body>) -> Response<Body> {
    if state.controller.is_busy() {
        let (status, body) = SwapStatus::from_error(&SwapError::Busy);
        return json(status, &body);
    }

    let form = match read_form(req).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    match state.controller.execute(&form).await {
        Ok(receipt) => json(
            StatusCode::OK,
            &SwapStatus {
                success: true,
                message: receipt.success_message(),
                signature: Some(receipt.signature.to_string()),
                explorer_url: Some(receipt.explorer_url()),
                quote: Some(receipt.quote),
            },
        ),
        Err(e) => {
            let (status, body) = SwapStatus::from_error(&e);
            json(status, &body)
        }
    }
}

async fn handle_quote(state: &AppState, req: Request<Body>) -> Response<Body> {
    let form = match read_form(req).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    match state.controller.quote(&form).await {
        Ok(summary) => json(
            StatusCode::OK,
            &SwapStatus {
                success: true,
                message: summary.render(),
                signature: None,
                explorer_url: None,
                quote: Some(summary),
            },
        ),
        Err(e) => {
            let (status, body) = SwapStatus::from_error(&e);
            json(status, &body)
        }
    }
}

/// Reads the body chunk by chunk, giving up once it passes `MAX_BODY_BYTES`.
async fn read_form(req: Request<Body>) -> Result<SwapForm, Response<Body>> {
    let too_large = || {
        json(
            StatusCode::PAYLOAD_TOO_LARGE,
            &SwapStatus::failure("Request body too large".to_string()),
        )
    };

    let mut body = req.into_body();
    if body.size_hint().lower() > MAX_BODY_BYTES as u64 {
        return Err(too_large());
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| {
            json(
                StatusCode::BAD_REQUEST,
                &SwapStatus::failure(format!("Invalid request body: {}", e)),
            )
        })?;
        if bytes.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    serde_json::from_slice(&bytes).map_err(|e| {
        json(
            StatusCode::BAD_REQUEST,
            &SwapStatus::failure(format!("Invalid request body: {}", e)),
        )
    })
}

fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    match serde_json::to_vec(body) {
        Ok(buf) => respond(status, "application/json", Body::from(buf)),
        Err(e) => {
            warn!("Failed to serialize response: {:?}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", Body::empty())
        }
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: Body) -> Response<Body> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
