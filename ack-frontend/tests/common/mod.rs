#![allow(dead_code)]

use ack_frontend::config::ApiSettings;
use ack_frontend::error::RenderError;
use ack_frontend::preview::{OpenedDocument, PageImage, RenderBackend};
use ack_frontend::services::DocumentClient;
use ack_frontend::DocumentWorkflow;
use async_trait::async_trait;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const CURRENT_USER: &str = "alice";
pub const PASSWORD: &str = "correct-horse";

/// Parks a request until released. Both signals keep a permit, so the
/// order of `release` and arrival does not matter.
#[derive(Default)]
pub struct Hold {
    arrived: Notify,
    release: Notify,
}

impl Hold {
    pub async fn wait_arrived(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.arrived.notified())
            .await
            .expect("held request never arrived");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn park(&self) {
        self.arrived.notify_one();
        self.release.notified().await;
    }
}

#[derive(Clone)]
pub struct FakeDocument {
    pub id: i64,
    pub filename: String,
    pub filepath: String,
    pub uploader: String,
    pub special_requirements: String,
    pub signers: Vec<String>,
}

pub struct FakeState {
    users: Vec<(i64, &'static str)>,
    documents: Mutex<Vec<FakeDocument>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
    detail_holds: Mutex<HashMap<i64, Arc<Hold>>>,
    sign_holds: Mutex<HashMap<i64, Arc<Hold>>>,
    pub list_requests: AtomicUsize,
    pub detail_requests: AtomicUsize,
    pub sign_requests: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_sign: AtomicBool,
}

impl FakeState {
    fn status_for(&self, doc: &FakeDocument) -> &'static str {
        if doc.signers.iter().any(|s| s == CURRENT_USER) {
            "Acknowledged"
        } else {
            "Pending Acknowledgment"
        }
    }

    fn hold_for(holds: &Mutex<HashMap<i64, Arc<Hold>>>, id: i64) -> Option<Arc<Hold>> {
        holds.lock().unwrap().remove(&id)
    }
}

pub struct TestApp {
    pub address: String,
    pub state: Arc<FakeState>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState {
            users: vec![(1, "alice"), (2, "bob")],
            documents: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            detail_holds: Mutex::new(HashMap::new()),
            sign_holds: Mutex::new(HashMap::new()),
            list_requests: AtomicUsize::new(0),
            detail_requests: AtomicUsize::new(0),
            sign_requests: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            fail_sign: AtomicBool::new(false),
        });

        let app = Router::new()
            .route("/login", get(login_page).post(login))
            .route("/", get(|| async { "index" }))
            .route("/api/documents", get(list_documents).post(upload_document))
            .route(
                "/api/documents/:id",
                get(get_document).delete(delete_document),
            )
            .route("/api/documents/:id/sign", post(sign_document))
            .route("/uploads/*path", get(serve_upload))
            .route("/download/signed/:id", get(download_document))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        TestApp { address, state }
    }

    pub fn client(&self) -> DocumentClient {
        DocumentClient::new(ApiSettings::new(self.address.clone()))
            .expect("Failed to build document client")
    }

    pub fn workflow(&self, backend: Arc<FakeBackend>) -> DocumentWorkflow {
        DocumentWorkflow::new(Arc::new(self.client()), backend, 1.0)
    }

    /// Add a document whose raw bytes are `content`. Returns its id.
    pub fn add_document(&self, filename: &str, content: &[u8]) -> i64 {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let filepath = format!("{}-{}", id, filename);
        self.state
            .files
            .lock()
            .unwrap()
            .insert(filepath.clone(), content.to_vec());
        self.state.documents.lock().unwrap().push(FakeDocument {
            id,
            filename: filename.to_string(),
            filepath,
            uploader: "admin".to_string(),
            special_requirements: "No special requirements provided.".to_string(),
            signers: Vec::new(),
        });
        id
    }

    /// Add a document without stored bytes.
    pub fn add_document_without_file(&self, filename: &str) -> i64 {
        let id = self.add_document(filename, b"");
        let doc = self.document(id).unwrap();
        self.state.files.lock().unwrap().remove(&doc.filepath);
        id
    }

    pub fn sign_as(&self, id: i64, username: &str) {
        let mut docs = self.state.documents.lock().unwrap();
        if let Some(doc) = docs.iter_mut().find(|d| d.id == id) {
            doc.signers.push(username.to_string());
        }
    }

    pub fn remove_all(&self) {
        self.state.documents.lock().unwrap().clear();
    }

    pub fn document(&self, id: i64) -> Option<FakeDocument> {
        self.state
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn documents(&self) -> Vec<FakeDocument> {
        self.state.documents.lock().unwrap().clone()
    }

    pub fn hold_detail(&self, id: i64) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        self.state
            .detail_holds
            .lock()
            .unwrap()
            .insert(id, hold.clone());
        hold
    }

    pub fn hold_sign(&self, id: i64) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        self.state
            .sign_holds
            .lock()
            .unwrap()
            .insert(id, hold.clone());
        hold
    }

    pub fn sign_requests(&self) -> usize {
        self.state.sign_requests.load(Ordering::SeqCst)
    }

    pub fn detail_requests(&self) -> usize {
        self.state.detail_requests.load(Ordering::SeqCst)
    }

    pub fn list_requests(&self) -> usize {
        self.state.list_requests.load(Ordering::SeqCst)
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_page() -> &'static str {
    "login"
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username == CURRENT_USER && form.password == PASSWORD {
        Redirect::to("/").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

async fn list_documents(State(state): State<Arc<FakeState>>) -> Response {
    state.list_requests.fetch_add(1, Ordering::SeqCst);
    if state.fail_list.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    let docs = state.documents.lock().unwrap().clone();
    let documents: Vec<_> = docs
        .iter()
        .map(|doc| {
            json!({
                "id": doc.id,
                "filename": doc.filename,
                "uploader": doc.uploader,
                "status": state.status_for(doc),
            })
        })
        .collect();
    Json(json!({ "documents": documents })).into_response()
}

async fn get_document(State(state): State<Arc<FakeState>>, Path(id): Path<i64>) -> Response {
    state.detail_requests.fetch_add(1, Ordering::SeqCst);
    if let Some(hold) = FakeState::hold_for(&state.detail_holds, id) {
        hold.park().await;
    }

    let doc = state
        .documents
        .lock()
        .unwrap()
        .iter()
        .find(|d| d.id == id)
        .cloned();
    let Some(doc) = doc else {
        return error(StatusCode::NOT_FOUND, "Not found");
    };

    let signed_by: Vec<_> = state
        .users
        .iter()
        .filter(|(_, name)| doc.signers.iter().any(|s| s == name))
        .map(|(id, name)| json!({ "id": id, "username": name }))
        .collect();
    let not_signed_by: Vec<_> = state
        .users
        .iter()
        .filter(|(_, name)| !doc.signers.iter().any(|s| s == name))
        .map(|(id, name)| json!({ "id": id, "username": name }))
        .collect();

    Json(json!({
        "id": doc.id,
        "filename": doc.filename,
        "filepath": doc.filepath,
        "uploader": doc.uploader,
        "special_requirements": doc.special_requirements,
        "signed_by": signed_by,
        "not_signed_by": not_signed_by,
    }))
    .into_response()
}

async fn upload_document(State(state): State<Arc<FakeState>>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut special_requirements = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                file = Some((name, data));
            }
            Some("special_requirements") => {
                special_requirements = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let Some((filename, data)) = file else {
        return error(StatusCode::BAD_REQUEST, "No file part");
    };
    if !filename.to_lowercase().ends_with(".pdf") {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "File conversion to PDF failed",
        );
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst) as i64;
    let filepath = format!("{}-{}", id, filename);
    state.files.lock().unwrap().insert(filepath.clone(), data);
    state.documents.lock().unwrap().push(FakeDocument {
        id,
        filename,
        filepath,
        uploader: CURRENT_USER.to_string(),
        special_requirements,
        signers: Vec::new(),
    });

    (
        StatusCode::CREATED,
        Json(json!({ "message": "File processed successfully" })),
    )
        .into_response()
}

async fn delete_document(State(state): State<Arc<FakeState>>, Path(id): Path<i64>) -> Response {
    let mut docs = state.documents.lock().unwrap();
    let before = docs.len();
    docs.retain(|d| d.id != id);
    if docs.len() == before {
        return error(StatusCode::NOT_FOUND, "Not found");
    }
    Json(json!({ "message": "Document deleted successfully" })).into_response()
}

async fn sign_document(State(state): State<Arc<FakeState>>, Path(id): Path<i64>) -> Response {
    state.sign_requests.fetch_add(1, Ordering::SeqCst);
    if let Some(hold) = FakeState::hold_for(&state.sign_holds, id) {
        hold.park().await;
    }
    if state.fail_sign.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    let mut docs = state.documents.lock().unwrap();
    let Some(doc) = docs.iter_mut().find(|d| d.id == id) else {
        return error(StatusCode::NOT_FOUND, "Not found");
    };
    if doc.signers.iter().any(|s| s == CURRENT_USER) {
        return error(
            StatusCode::CONFLICT,
            "You have already acknowledged this document",
        );
    }
    doc.signers.push(CURRENT_USER.to_string());
    Json(json!({ "message": "Document acknowledged successfully" })).into_response()
}

async fn serve_upload(State(state): State<Arc<FakeState>>, Path(path): Path<String>) -> Response {
    match state.files.lock().unwrap().get(&path) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn download_document(State(state): State<Arc<FakeState>>, Path(id): Path<i64>) -> Response {
    let filepath = state
        .documents
        .lock()
        .unwrap()
        .iter()
        .find(|d| d.id == id)
        .map(|d| d.filepath.clone());
    let Some(filepath) = filepath else {
        return error(StatusCode::NOT_FOUND, "Not found");
    };

    match state.files.lock().unwrap().get(&filepath) {
        Some(bytes) => (
            [(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filepath),
            )],
            bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Scriptable render backend.
///
/// Source bytes `pages:N` open a document with N pages; `pages:N:fail:K`
/// fails on page K. Anything else cannot be opened.
#[derive(Default)]
pub struct FakeBackend {
    page_holds: Mutex<HashMap<u32, Arc<Hold>>>,
    started: Arc<Mutex<Vec<u32>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Park the render of page `number` (of whichever document renders it next).
    pub fn hold_page(&self, number: u32) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        self.page_holds
            .lock()
            .unwrap()
            .insert(number, hold.clone());
        hold
    }

    pub fn started_pages(&self) -> Vec<u32> {
        self.started.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for FakeBackend {
    async fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn OpenedDocument>, RenderError> {
        let text = String::from_utf8_lossy(&bytes).to_string();
        let mut parts = text.trim().split(':');
        if parts.next() != Some("pages") {
            return Err(RenderError::Open("unrecognized document".to_string()));
        }
        let page_count = parts
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| RenderError::Open("bad page count".to_string()))?;
        let fail_at = match (parts.next(), parts.next()) {
            (Some("fail"), Some(k)) => k.parse().ok(),
            _ => None,
        };

        let holds = std::mem::take(&mut *self.page_holds.lock().unwrap());
        Ok(Box::new(FakeDocumentPages {
            page_count,
            fail_at,
            holds,
            started: self.started.clone(),
            in_flight: self.in_flight.clone(),
            max_in_flight: self.max_in_flight.clone(),
        }))
    }
}

struct FakeDocumentPages {
    page_count: u32,
    fail_at: Option<u32>,
    holds: HashMap<u32, Arc<Hold>>,
    started: Arc<Mutex<Vec<u32>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl OpenedDocument for FakeDocumentPages {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn render_page(&self, number: u32, _scale: f32) -> Result<PageImage, RenderError> {
        self.started.lock().unwrap().push(number);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(hold) = self.holds.get(&number) {
            hold.park().await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_at == Some(number) {
            return Err(RenderError::Page {
                page: number,
                message: "corrupt page stream".to_string(),
            });
        }
        Ok(PageImage {
            number,
            png: format!("png-{number}").into_bytes(),
        })
    }
}
