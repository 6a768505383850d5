pub mod context;
pub mod domain;
pub mod ports;
pub mod prompts;

pub use context::ContextFact;
pub use domain::{
    Dashboard, DeclaredKind, DocumentUpload, ExtractedContent, GeneratedResult, ImageAttachment,
    IngestRequest, Reminder, StoredArtifact, SymptomCheck, UploadSummary,
};
pub use ports::{DatabaseService, GenerativeModel, PortError, PortResult};
pub use prompts::{compose, PromptInput, MAX_DOCUMENT_CHARS};
