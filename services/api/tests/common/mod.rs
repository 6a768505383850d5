//! Shared harness for the HTTP-level tests: in-memory fakes for the store and
//! the generative model, plus small document builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use api_lib::{
    config::Config,
    web::{build_router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Request, Response},
    Router,
};
use chrono::{DateTime, Utc};
use health_assistant_core::{
    domain::{ImageAttachment, Reminder, SymptomCheck, UploadSummary},
    ports::{DatabaseService, GenerativeModel, PortError, PortResult},
};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// Fake Store
//=========================================================================================

#[derive(Default)]
pub struct FakeDb {
    sessions: Mutex<HashMap<String, Uuid>>,
    reminders: Mutex<Vec<(Uuid, Reminder)>>,
    symptom_checks: Mutex<Vec<SymptomCheck>>,
    uploads: Mutex<Vec<UploadSummary>>,
    fail_writes: AtomicBool,
}

impl FakeDb {
    pub fn add_session(&self, token: &str, user_id: Uuid) {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id);
    }

    pub fn add_reminder(&self, user_id: Uuid, title: &str, at: DateTime<Utc>) {
        self.reminders.lock().unwrap().push((
            user_id,
            Reminder {
                title: title.to_string(),
                scheduled_time: at,
                description: format!("{} description", title),
            },
        ));
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn symptom_checks(&self) -> Vec<SymptomCheck> {
        self.symptom_checks.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<UploadSummary> {
        self.uploads.lock().unwrap().clone()
    }

    fn check_writable(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("connection reset by peer".to_string()));
        }
        Ok(())
    }

    fn upcoming(&self, user_id: Uuid, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut upcoming: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, r)| *owner == user_id && r.scheduled_time >= now)
            .map(|(_, r)| r.clone())
            .collect();
        upcoming.sort_by_key(|r| r.scheduled_time);
        upcoming
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn resolve_session(&self, session_token: &str) -> PortResult<Option<Uuid>> {
        Ok(self.sessions.lock().unwrap().get(session_token).copied())
    }

    async fn next_upcoming_reminder(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Reminder>> {
        Ok(self.upcoming(user_id, now).into_iter().next())
    }

    async fn upcoming_reminders(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> PortResult<Vec<Reminder>> {
        Ok(self
            .upcoming(user_id, now)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn create_reminder(&self, user_id: Uuid, reminder: &Reminder) -> PortResult<()> {
        self.check_writable()?;
        self.reminders
            .lock()
            .unwrap()
            .push((user_id, reminder.clone()));
        Ok(())
    }

    async fn insert_symptom_check(&self, check: &SymptomCheck) -> PortResult<()> {
        self.check_writable()?;
        self.symptom_checks.lock().unwrap().push(check.clone());
        Ok(())
    }

    async fn insert_upload(&self, upload: &UploadSummary) -> PortResult<()> {
        self.check_writable()?;
        self.uploads.lock().unwrap().push(upload.clone());
        Ok(())
    }

    async fn recent_symptom_checks(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> PortResult<Vec<SymptomCheck>> {
        let mut checks: Vec<SymptomCheck> = self
            .symptom_checks()
            .into_iter()
            .filter(|c| c.user_id == user_id)
            .collect();
        checks.sort_by(|a, b| b.checked_at.cmp(&a.checked_at));
        checks.truncate(limit as usize);
        Ok(checks)
    }

    async fn recent_uploads(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<UploadSummary>> {
        let mut uploads: Vec<UploadSummary> = self
            .uploads()
            .into_iter()
            .filter(|u| u.user_id == user_id)
            .collect();
        uploads.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        uploads.truncate(limit as usize);
        Ok(uploads)
    }

    async fn find_upload(
        &self,
        user_id: Uuid,
        storage_key: &str,
    ) -> PortResult<Option<UploadSummary>> {
        Ok(self
            .uploads()
            .into_iter()
            .find(|u| u.user_id == user_id && u.storage_key == storage_key))
    }
}

//=========================================================================================
// Fake Generative Model
//=========================================================================================

/// One recorded call to the model.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub prompt: String,
    pub attachment: Option<ImageAttachment>,
}

/// Answers every call with the same scripted outcome and records what it was asked.
pub struct FakeModel {
    reply: Result<Option<String>, String>,
    calls: Mutex<Vec<ModelCall>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(Some(text.to_string())))
    }

    pub fn silent() -> Self {
        Self::with_reply(Ok(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_reply(Err(message.to_string()))
    }

    fn with_reply(reply: Result<Option<String>, String>) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<&ImageAttachment>,
    ) -> PortResult<Option<String>> {
        self.calls.lock().unwrap().push(ModelCall {
            prompt: prompt.to_string(),
            attachment: attachment.cloned(),
        });
        self.reply.clone().map_err(PortError::Unexpected)
    }
}

//=========================================================================================
// Test Application
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub db: Arc<FakeDb>,
    pub model: Arc<FakeModel>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new(model: FakeModel) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let upload_path = upload_dir.path().to_string_lossy().to_string();
        let config = Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgres://unused/test".to_string()),
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "UPLOAD_DIR" => Some(upload_path.clone()),
            _ => None,
        })
        .unwrap();

        let db = Arc::new(FakeDb::default());
        let model = Arc::new(model);
        let state = AppState::new(db.clone(), model.clone(), Arc::new(config));

        Self {
            router: build_router(Arc::new(state)),
            db,
            model,
            upload_dir,
        }
    }

    /// Registers a fresh user with a live session and returns both.
    pub fn login(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = format!("token-{}", user_id.simple());
        self.db.add_session(&token, user_id);
        (user_id, token)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Number of files currently in the upload directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

//=========================================================================================
// Request and Body Helpers
//=========================================================================================

pub fn json_request(uri: &str, session: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("theme=dark; session={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "health-assistant-test-boundary";

/// A multipart request with a single part named `field_name`.
pub fn multipart_request(
    session: Option<&str>,
    field_name: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload_report")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

//=========================================================================================
// Document Builders
//=========================================================================================

/// A single-page PDF whose page draws `text`.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![20.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let kids: Vec<Object> = vec![page_id.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(8, 8, Rgb([10, 120, 200]));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}
