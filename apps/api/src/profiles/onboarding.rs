//! Onboarding: completes a provisioned profile with personal details, a
//! declared skill, and an uploaded résumé.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::OnboardingUpdate;
use crate::state::AppState;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeKind {
    Pdf,
    Doc,
    Docx,
}

impl ResumeKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/msword" => Some(Self::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            _ => None,
        }
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Declared content type wins; the file name is consulted only when the
    /// client sent no specific type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        match content_type {
            Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => {
                Self::from_content_type(ct)
            }
            _ => file_name.and_then(Self::from_file_name),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Raw multipart fields as received.
#[derive(Debug, Clone, Default)]
pub struct OnboardingForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<String>,
    pub skill: Option<String>,
    pub resume: Option<ResumeUpload>,
}

#[derive(Debug)]
pub struct ValidOnboarding {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub skill: String,
    pub resume_kind: ResumeKind,
    pub resume: Bytes,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn validate(form: OnboardingForm) -> Result<ValidOnboarding, String> {
    let (Some(first_name), Some(last_name), Some(age), Some(skill)) = (
        required(form.first_name),
        required(form.last_name),
        required(form.age),
        required(form.skill),
    ) else {
        return Err("All fields are required".to_string());
    };

    let age = age
        .parse::<i32>()
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| "Age must be a positive whole number".to_string())?;

    let resume = form
        .resume
        .filter(|r| !r.bytes.is_empty())
        .ok_or_else(|| "Resume file is required".to_string())?;

    if resume.bytes.len() > MAX_RESUME_BYTES {
        return Err("Resume file size must be less than 10MB".to_string());
    }

    let resume_kind = ResumeKind::detect(resume.content_type.as_deref(), resume.file_name.as_deref())
        .ok_or_else(|| "Resume must be a PDF, DOC, or DOCX file".to_string())?;

    Ok(ValidOnboarding {
        first_name,
        last_name,
        age,
        skill,
        resume_kind,
        resume: resume.bytes,
    })
}

pub fn resume_key(external_id: &str, unix_millis: i64, kind: ResumeKind) -> String {
    format!("resumes/{external_id}-{unix_millis}.{}", kind.extension())
}

async fn read_form(multipart: &mut Multipart) -> Result<OnboardingForm, AppError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Invalid form data: {e}"))
    };

    let mut form = OnboardingForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await.map_err(bad_form)?;
                form.resume = Some(ResumeUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "firstName" => form.first_name = Some(field.text().await.map_err(bad_form)?),
            "lastName" => form.last_name = Some(field.text().await.map_err(bad_form)?),
            "age" => form.age = Some(field.text().await.map_err(bad_form)?),
            "skill" => form.skill = Some(field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }
    Ok(form)
}

/// POST /api/v1/onboarding
///
/// Multipart fields: `firstName`, `lastName`, `age`, `skill`, file `resume`.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    AuthUser(external_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = read_form(&mut multipart).await?;
    let valid = validate(form).map_err(AppError::Validation)?;

    if state.users.find_by_external_id(&external_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let key = resume_key(
        &external_id,
        chrono::Utc::now().timestamp_millis(),
        valid.resume_kind,
    );
    state
        .resumes
        .put(&key, valid.resume_kind.content_type(), valid.resume)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let update = OnboardingUpdate {
        first_name: valid.first_name,
        last_name: valid.last_name,
        age: valid.age,
        skill: valid.skill,
        resume_reference: key,
    };
    let user = state
        .users
        .complete_onboarding(&external_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!("Onboarding completed for {external_id}");

    Ok(Json(json!({
        "message": "Onboarding completed successfully",
        "user": {
            "firstName": user.first_name,
            "lastName": user.last_name,
            "age": user.age,
            "skill": user.skill,
        }
    })))
}
