use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::football_api::ForecastService;
use crate::predictions::{MatchForecast, PredictionBatch};
use crate::telegram::{broadcast, format_predictions, ChatDelivery, DeliveryOutcome};

#[derive(Clone)]
pub struct AppState {
    pub forecasts: ForecastService,
    pub delivery: Arc<dyn ChatDelivery>,
    /// Chats preloaded into the page's chat list.
    pub chat_ids: Vec<String>,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/predictions", get(predictions_handler))
        .route("/api/chats", get(chats_handler))
        .route("/api/send-predictions", post(send_predictions_handler))
        .route("/api/send-current-predictions", post(send_current_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn failure(status: StatusCode, error: &str) -> ApiError {
    (status, Json(json!({ "success": false, "error": error })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictionsResponse {
    success: bool,
    predictions: Vec<MatchForecast>,
    is_backup: bool,
    count: usize,
    recommended: usize,
}

/// Telegram chat ids arrive either as strings or as bare JSON integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatId {
    Text(String),
    Number(i64),
}

impl ChatId {
    fn to_text(&self) -> String {
        match self {
            ChatId::Text(s) => s.trim().to_string(),
            ChatId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ChatTargets {
    chat_id: Option<ChatId>,
    #[serde(default)]
    chat_ids: Vec<ChatId>,
}

impl ChatTargets {
    /// `chatIds` followed by `chatId`, trimmed, blanks and duplicates dropped.
    fn resolve(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for id in self.chat_ids.iter().chain(self.chat_id.iter()) {
            let id = id.to_text();
            if !id.is_empty() && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// Unwrap a JSON body, turning axum's plain-text rejection into the
/// dashboard's `{ success: false, error }` shape.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        failure(StatusCode::BAD_REQUEST, &rejection.body_text())
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCurrentRequest {
    #[serde(flatten)]
    targets: ChatTargets,
    #[serde(default)]
    predictions: Vec<MatchForecast>,
    #[serde(default)]
    is_backup: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    success: bool,
    message: &'static str,
    count: usize,
    recommended: usize,
    is_backup: bool,
    delivered: usize,
    failed: usize,
    deliveries: Vec<DeliveryOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    predictions: Option<Vec<MatchForecast>>,
}

/// Serve the dashboard HTML page.
async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// GET /api/predictions
async fn predictions_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let batch = state.forecasts.forecasts_or_fallback(Utc::now()).await;
    let recommended = batch.over25_count();
    Json(PredictionsResponse {
        success: true,
        count: batch.predictions.len(),
        recommended,
        is_backup: batch.is_backup,
        predictions: batch.predictions,
    })
}

/// GET /api/chats
async fn chats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "chatIds": state.chat_ids }))
}

/// POST /api/send-predictions: fetch a fresh batch and send it.
async fn send_predictions_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatTargets>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let chats = json_body(body)?.resolve();
    if chats.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Chat ID is required"));
    }

    info!("Sending new predictions to {} chat(s)", chats.len());
    let batch = state.forecasts.forecasts_or_fallback(Utc::now()).await;
    let mut resp = deliver(&state, &chats, &batch, "New predictions sent successfully").await?;
    resp.predictions = Some(batch.predictions);
    Ok(Json(resp))
}

/// POST /api/send-current-predictions: send the forecasts the page already shows.
async fn send_current_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SendCurrentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    let chats = req.targets.resolve();
    if chats.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Chat ID is required"));
    }
    if req.predictions.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "No predictions to send"));
    }

    info!("Sending current predictions to {} chat(s)", chats.len());
    let batch = PredictionBatch {
        predictions: req.predictions,
        is_backup: req.is_backup,
    };
    let resp = deliver(&state, &chats, &batch, "Current predictions sent successfully").await?;
    Ok(Json(resp))
}

/// Format the batch once and send it to every chat. Fails only when no chat
/// received the message.
async fn deliver(
    state: &AppState,
    chats: &[String],
    batch: &PredictionBatch,
    message: &'static str,
) -> Result<SendResponse, ApiError> {
    let text = format_predictions(&batch.predictions, batch.is_backup);
    let deliveries = broadcast(state.delivery.as_ref(), chats, &text).await;
    let delivered = deliveries.iter().filter(|d| d.delivered).count();
    let failed = deliveries.len() - delivered;

    if delivered == 0 {
        warn!("Delivery failed for all {} chat(s)", failed);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Failed to send message",
                "deliveries": deliveries,
            })),
        ));
    }

    Ok(SendResponse {
        success: true,
        message,
        count: batch.predictions.len(),
        recommended: batch.over25_count(),
        is_backup: batch.is_backup,
        delivered,
        failed,
        deliveries,
        predictions: None,
    })
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Football Predictions Bot</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --yellow: #ffb020;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  .badge { padding: .2rem .6rem; border-radius: 4px; font-size: .75rem; font-weight: 700; text-transform: uppercase; }
  .badge.backup { background: var(--yellow); color: #000; }
  .badge.live { background: var(--green); color: #000; }
  .badge.off { background: var(--border); color: var(--muted); }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .stats-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }
  .stat-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; }
  .stat-card .label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; margin-bottom: .4rem; }
  .stat-card .value { font-size: 1.7rem; font-weight: 700; }
  .stat-card .value.small { font-size: 1rem; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; justify-content: space-between; align-items: center; gap: .5rem; }
  .panel-body { padding: 1rem 1.2rem; display: grid; gap: .8rem; }
  .row { display: flex; gap: .6rem; align-items: center; flex-wrap: wrap; }
  input[type=text] { background: var(--bg); border: 1px solid var(--border); color: var(--text); padding: .45rem .7rem; border-radius: 6px; font-size: .85rem; }
  .btn { background: none; border: 1px solid var(--border); color: var(--muted); padding: .35rem .8rem; border-radius: 6px; cursor: pointer; font-size: .8rem; }
  .btn:hover { border-color: var(--accent); color: var(--accent); }
  .btn.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
  .btn.danger:hover { border-color: var(--red); color: var(--red); }
  .btn:disabled { opacity: .4; cursor: not-allowed; }
  .chat { display: flex; justify-content: space-between; align-items: center; padding: .6rem .8rem; border: 1px solid var(--border); border-radius: 8px; }
  .chat .id { color: var(--muted); font-size: .8rem; }
  .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 1rem; }
  .card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.1rem; display: grid; gap: .6rem; }
  .card h3 { font-size: 1.05rem; }
  .card .league { color: var(--yellow); font-size: .85rem; }
  .card .when { color: var(--muted); font-size: .8rem; }
  .bar { height: 6px; background: var(--border); border-radius: 3px; overflow: hidden; }
  .bar > div { height: 100%; background: var(--accent); }
  .prob { display: flex; justify-content: space-between; font-size: .85rem; }
  .over { border: 1px solid var(--green); background: rgba(0,200,150,.08); border-radius: 8px; padding: .6rem; font-size: .85rem; }
  .dot { width: 8px; height: 8px; border-radius: 50%; display: inline-block; margin-right: .3rem; }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  #toast { position: fixed; bottom: 1.5rem; right: 1.5rem; background: var(--card); border: 1px solid var(--border); padding: .8rem 1.1rem; border-radius: 8px; font-size: .85rem; display: none; }
  #toast.error { border-color: var(--red); }
</style>
</head>
<body>
<header>
  <h1>⚽ Football Predictions Bot</h1>
  <span class="badge off" id="api-badge">…</span>
  <span style="margin-left:auto;color:var(--muted);font-size:.8rem;" id="last-updated"></span>
</header>

<main>
  <div class="stats-grid">
    <div class="stat-card"><div class="label">Total Partidos</div><div class="value" id="s-total">–</div></div>
    <div class="stat-card"><div class="label">Recomendados</div><div class="value" id="s-recommended">–</div></div>
    <div class="stat-card"><div class="label">Chats Activos</div><div class="value" id="s-chats">–</div></div>
    <div class="stat-card"><div class="label">Estado API</div><div class="value small" id="s-api">–</div></div>
  </div>

  <div class="panel">
    <div class="panel-header">Gestión de Chats de Telegram
      <span class="row">
        <button class="btn" onclick="selectAll(true)">Seleccionar Todos</button>
        <button class="btn" onclick="selectAll(false)">Deseleccionar Todos</button>
      </span>
    </div>
    <div class="panel-body">
      <div class="row">
        <input type="text" id="new-name" placeholder="Nombre (ej: Canal VIP)">
        <input type="text" id="new-id" placeholder="Chat ID (ej: -1001234567890)">
        <button class="btn" onclick="addChat()">+ Agregar</button>
      </div>
      <div id="chat-list"></div>
    </div>
  </div>

  <div class="panel">
    <div class="panel-header">Controles del Bot</div>
    <div class="panel-body">
      <div class="row">
        <button class="btn" id="refresh-btn" onclick="loadPredictions()">↻ Actualizar Predicciones</button>
        <button class="btn primary" id="send-btn" onclick="sendPredictions()">Enviar</button>
      </div>
      <div style="color:var(--muted);font-size:.85rem;" id="selection-info"></div>
    </div>
  </div>

  <div class="cards" id="cards"><div class="empty">Cargando…</div></div>
</main>

<div id="toast"></div>

<script>
const state = { predictions: [], isBackup: false, chats: [], loading: false, sending: false };

const esc = s => String(s).replace(/[&<>"']/g, c => ({ '&':'&amp;', '<':'&lt;', '>':'&gt;', '"':'&quot;', "'":'&#39;' }[c]));

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = isError ? 'error' : '';
  el.style.display = 'block';
  clearTimeout(toast.timer);
  toast.timer = setTimeout(() => { el.style.display = 'none'; }, 4000);
}

const isRecommended = p => p.isLikelyOver25 || p.confidence >= 50;
const activeChats = () => state.chats.filter(c => c.active);
const selectedChats = () => state.chats.filter(c => c.active && c.selected);

function winnerText(p) {
  if (p.predictedWinner === 'home') return p.homeTeam;
  if (p.predictedWinner === 'away') return p.awayTeam;
  return 'Empate';
}

function confidenceColor(c) {
  if (c >= 60) return 'var(--green)';
  if (c >= 40) return 'var(--yellow)';
  return 'var(--red)';
}

function probRow(label, value) {
  return `<div class="prob"><span>${label}</span><b>${value}%</b></div>
    <div class="bar"><div style="width:${value}%"></div></div>`;
}

function renderCards() {
  const el = document.getElementById('cards');
  const shown = state.predictions.filter(isRecommended);
  if (!shown.length) {
    el.innerHTML = '<div class="empty">No hay predicciones disponibles</div>';
    return;
  }
  el.innerHTML = shown.map(p => `<div class="card">
    <div style="color:var(--accent);font-weight:700;">🔮 PRONÓSTICO REAL</div>
    <h3>⚽ ${esc(p.homeTeam)} vs ${esc(p.awayTeam)}</h3>
    <div class="league">🏆 ${esc(p.league)}</div>
    <div class="when">🕐 ${esc(p.matchDate)}, ${esc(p.matchTime)}</div>
    <div><b>Ganador probable:</b> ${esc(winnerText(p))}</div>
    ${probRow('Victoria local', p.homeWinProb)}
    ${probRow('Empate', p.drawProb)}
    ${probRow('Victoria visitante', p.awayWinProb)}
    ${p.isLikelyOver25 ? `<div class="over"><b>Over 2.5 Goles</b><br>
      Promedio: ${p.avgGoals.toFixed(1)} goles<br>Probabilidad: ${p.over25Pct}%<br>✅ RECOMENDADO</div>` : ''}
    <div class="prob"><span>Confianza</span>
      <span><span class="dot" style="background:${confidenceColor(p.confidence)}"></span><b>${p.confidence}%</b></span></div>
  </div>`).join('');
}

function renderStats() {
  document.getElementById('s-total').textContent = state.predictions.length;
  document.getElementById('s-recommended').textContent = state.predictions.filter(p => p.isLikelyOver25).length;
  document.getElementById('s-chats').textContent = activeChats().length;
  document.getElementById('s-api').textContent = state.isBackup ? 'Datos de respaldo' : 'API funcionando';
  const badge = document.getElementById('api-badge');
  badge.textContent = state.isBackup ? 'Respaldo' : 'En vivo';
  badge.className = 'badge ' + (state.isBackup ? 'backup' : 'live');
}

function renderChats() {
  const el = document.getElementById('chat-list');
  if (!state.chats.length) {
    el.innerHTML = '<div class="empty">No hay chats configurados</div>';
  } else {
    el.innerHTML = state.chats.map((c, i) => `<div class="chat">
      <label class="row">
        <input type="checkbox" ${c.selected ? 'checked' : ''} ${c.active ? '' : 'disabled'} onchange="toggleSelected(${i})">
        <span><b>${esc(c.name)}</b> <span class="badge ${c.active ? 'live' : 'off'}">${c.active ? 'Activo' : 'Inactivo'}</span><br>
        <span class="id">${esc(c.chatId)}</span></span>
      </label>
      <span class="row">
        <button class="btn" onclick="toggleActive(${i})">${c.active ? 'Desactivar' : 'Activar'}</button>
        <button class="btn danger" onclick="removeChat(${i})">✕</button>
      </span>
    </div>`).join('');
  }
  const sel = selectedChats().length;
  document.getElementById('selection-info').textContent = `Chats seleccionados: ${sel} de ${activeChats().length} activos`;
  const sendBtn = document.getElementById('send-btn');
  sendBtn.textContent = state.sending ? 'Enviando…' : `Enviar a ${sel} Chat(s)`;
  sendBtn.disabled = state.sending || sel === 0 || !state.predictions.length;
  renderStats();
}

function addChat() {
  const name = document.getElementById('new-name').value.trim();
  const chatId = document.getElementById('new-id').value.trim();
  if (!name || !chatId) return;
  state.chats.push({ name, chatId, active: true, selected: true });
  document.getElementById('new-name').value = '';
  document.getElementById('new-id').value = '';
  toast(`${name} ha sido agregado`);
  renderChats();
}

function removeChat(i) {
  const [c] = state.chats.splice(i, 1);
  toast(`${c.name} ha sido eliminado`);
  renderChats();
}

function toggleActive(i) { state.chats[i].active = !state.chats[i].active; renderChats(); }
function toggleSelected(i) { state.chats[i].selected = !state.chats[i].selected; renderChats(); }
function selectAll(on) { state.chats.forEach(c => { c.selected = on && c.active; }); renderChats(); }

async function loadChats() {
  const r = await fetch('/api/chats');
  if (!r.ok) return;
  const data = await r.json();
  state.chats = (data.chatIds || []).map((chatId, i) => ({
    name: i === 0 ? 'Chat Principal' : `Chat ${i + 1}`, chatId, active: true, selected: true,
  }));
  renderChats();
}

async function loadPredictions() {
  if (state.loading) return;
  state.loading = true;
  document.getElementById('refresh-btn').disabled = true;
  try {
    const r = await fetch('/api/predictions');
    const data = await r.json();
    if (!data.success) throw new Error(data.error);
    state.predictions = data.predictions;
    state.isBackup = data.isBackup;
    toast(`${data.recommended} recomendaciones de ${data.count} partidos`);
    document.getElementById('last-updated').textContent = 'Actualizado ' + new Date().toLocaleTimeString();
  } catch (e) {
    toast('No se pudieron obtener las predicciones', true);
  } finally {
    state.loading = false;
    document.getElementById('refresh-btn').disabled = false;
    renderCards();
    renderChats();
  }
}

async function sendPredictions() {
  const chats = selectedChats();
  if (!chats.length) { toast('Por favor selecciona al menos un chat activo', true); return; }
  state.sending = true;
  renderChats();
  try {
    const r = await fetch('/api/send-current-predictions', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ chatIds: chats.map(c => c.chatId), predictions: state.predictions, isBackup: state.isBackup }),
    });
    const data = await r.json();
    if (data.success) {
      toast(`Predicciones enviadas a ${data.delivered} chat(s)` + (data.failed ? `. ${data.failed} falló(s)` : ''));
    } else {
      toast('No se pudo enviar a ningún chat', true);
    }
  } catch (e) {
    toast('No se pudo enviar a ningún chat', true);
  } finally {
    state.sending = false;
    renderChats();
  }
}

loadChats();
loadPredictions();
</script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::football_api::tests::{fixture, StubSource};
    use crate::football_api::ForecastService;
    use crate::predictions::fallback::fallback_forecasts;
    use crate::telegram::tests::RecordingDelivery;
    use axum::body::{self, Body};
    use axum::http::Request;
    use chrono::FixedOffset;
    use serde_json::Value;
    use tower::ServiceExt as _;

    const BODY_LIMIT: usize = 1024 * 1024;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn app(source: StubSource, delivery: Arc<RecordingDelivery>) -> Router {
        router(AppState {
            forecasts: ForecastService::new(Arc::new(source), 5, utc()),
            delivery,
            chat_ids: vec!["6097718185".into()],
        })
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(v) => post_raw(app, uri, v.to_string()).await,
            None => {
                let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
                send(app, req).await
            }
        }
    }

    async fn post_raw(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        send(app, req).await
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let app = app(StubSource::default(), Arc::default());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Football Predictions Bot"));
    }

    #[tokio::test]
    async fn test_predictions_fallback_when_upstream_down() {
        let source = StubSource {
            fail_fixtures: true,
            ..Default::default()
        };
        let (status, v) = call(app(source, Arc::default()), "GET", "/api/predictions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["isBackup"], true);
        assert_eq!(v["count"], 5);
        assert_eq!(v["recommended"], 4);
        assert_eq!(v["predictions"][0]["homeTeam"], "Olimpia Asunción");
        assert_eq!(v["predictions"][0]["predictedWinner"], "home");
        assert_eq!(v["predictions"][2]["awayWinProb"], 43);
        assert_eq!(v["predictions"][3]["isLikelyOver25"], false);
    }

    #[tokio::test]
    async fn test_predictions_live() {
        let mut source = StubSource::default();
        let kickoff = Utc::now() + chrono::Duration::hours(2);
        source.fixtures.insert(kickoff.date_naive(), vec![fixture(100, 200, kickoff)]);
        source.stats.insert(100, json!({}));
        source.stats.insert(200, json!({}));

        let (status, v) = call(app(source, Arc::default()), "GET", "/api/predictions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["isBackup"], false);
        assert_eq!(v["count"], 1);
        let p = &v["predictions"][0];
        assert_eq!((p["homeWinProb"].as_u64(), p["drawProb"].as_u64(), p["awayWinProb"].as_u64()), (Some(35), Some(29), Some(36)));
        assert_eq!(p["predictedWinner"], "away");
        assert_eq!(p["confidence"], 36);
    }

    #[tokio::test]
    async fn test_chats_lists_configured_ids() {
        let (status, v) = call(app(StubSource::default(), Arc::default()), "GET", "/api/chats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["chatIds"], json!(["6097718185"]));
    }

    #[tokio::test]
    async fn test_send_predictions_requires_chat() {
        let (status, v) = call(
            app(StubSource::default(), Arc::default()),
            "POST",
            "/api/send-predictions",
            Some(json!({ "chatId": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "Chat ID is required");
    }

    #[tokio::test]
    async fn test_send_predictions_formats_and_delivers() {
        let delivery = Arc::new(RecordingDelivery::default());
        let (status, v) = call(
            app(StubSource::default(), delivery.clone()),
            "POST",
            "/api/send-predictions",
            Some(json!({ "chatId": "42", "chatIds": ["7", "42"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["isBackup"], true);
        assert_eq!(v["delivered"], 2);
        assert_eq!(v["predictions"].as_array().map(Vec::len), Some(5));

        let sent = delivery.sent.lock().unwrap();
        let chats: Vec<&str> = sent.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(chats, vec!["7", "42"]);
        assert!(sent[0].1.contains("Usando datos de respaldo"));
        assert!(sent[0].1.ends_with("Total pronósticos: 4</b>"));
    }

    #[tokio::test]
    async fn test_send_current_predictions() {
        let delivery = Arc::new(RecordingDelivery {
            failing: vec!["-1".into()],
            ..Default::default()
        });
        let preds = fallback_forecasts(Utc::now(), utc());
        let (status, v) = call(
            app(StubSource::default(), delivery.clone()),
            "POST",
            "/api/send-current-predictions",
            Some(json!({ "chatIds": ["-1", "99"], "predictions": preds, "isBackup": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["delivered"], 1);
        assert_eq!(v["failed"], 1);
        assert_eq!(v["recommended"], 4);
        assert!(v.get("predictions").is_none());

        let sent = delivery.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].1.contains("respaldo"));
    }

    #[tokio::test]
    async fn test_send_current_rejects_empty_predictions() {
        let (status, v) = call(
            app(StubSource::default(), Arc::default()),
            "POST",
            "/api/send-current-predictions",
            Some(json!({ "chatId": "1", "predictions": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "No predictions to send");
    }

    #[tokio::test]
    async fn test_numeric_chat_ids_are_accepted() {
        let delivery = Arc::new(RecordingDelivery::default());
        let (status, v) = call(
            app(StubSource::default(), delivery.clone()),
            "POST",
            "/api/send-predictions",
            Some(json!({ "chatId": 6097718185_i64, "chatIds": [-1001234567890_i64, "6097718185"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["delivered"], 2);

        let sent = delivery.sent.lock().unwrap();
        let chats: Vec<&str> = sent.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(chats, vec!["-1001234567890", "6097718185"]);
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        for uri in ["/api/send-predictions", "/api/send-current-predictions"] {
            let (status, v) =
                post_raw(app(StubSource::default(), Arc::default()), uri, "not json".into()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(v["success"], false, "{uri}");
            assert!(v["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}: {v}");
        }

        let (status, v) = call(
            app(StubSource::default(), Arc::default()),
            "POST",
            "/api/send-predictions",
            Some(json!({ "chatId": { "id": 1 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["success"], false);
    }

    #[tokio::test]
    async fn test_all_deliveries_failing_is_500() {
        let delivery = Arc::new(RecordingDelivery {
            failing: vec!["1".into()],
            ..Default::default()
        });
        let (status, v) = call(
            app(StubSource::default(), delivery),
            "POST",
            "/api/send-predictions",
            Some(json!({ "chatId": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["success"], false);
        assert_eq!(v["deliveries"][0]["delivered"], false);
    }
}
