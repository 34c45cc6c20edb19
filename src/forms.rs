//! Public Form Submissions
//!
//! Quote, contact and project-intake requests posted to the backend's
//! public endpoints. Input is validated before anything is sent; a failed
//! submission carries a `mailto:` link the user can fall back to.

use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9\s().-]+$").expect("valid regex"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_re().is_match(value.trim())
}

/// Digits with optional leading `+` and separators; 7 to 15 digits
pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    phone_re().is_match(value) && (7..=15).contains(&digits)
}

fn require(field: &str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Invalid(format!("Missing {}", field)));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), FormError> {
    if !is_valid_email(value) {
        return Err(FormError::Invalid("Invalid email".to_string()));
    }
    Ok(())
}

fn require_phone(value: &str) -> Result<(), FormError> {
    if !is_valid_phone(value) {
        return Err(FormError::Invalid("Invalid phone".to_string()));
    }
    Ok(())
}

/// Contact message (`POST /api/contact`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), FormError> {
        require("name", &self.name)?;
        require_email(&self.email)?;
        require("message", &self.message)
    }
}

/// Quick quote (`POST /api/quote`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Project type
    pub ptype: String,
    #[serde(default)]
    pub voltage: String,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub notes: String,
}

impl QuoteRequest {
    pub fn validate(&self) -> Result<(), FormError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        require("ptype", &self.ptype)?;
        require_email(&self.email)?;
        require_phone(&self.phone)
    }
}

/// Project intake fields; also what gets saved as a draft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDraft {
    pub org: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub ptype: String,
    pub mode: String,
    pub voltage: String,
    pub podate: String,
    pub notes: String,
    pub visit: bool,
}

impl ProjectDraft {
    pub fn is_empty(&self) -> bool {
        *self == ProjectDraft::default()
    }

    fn text_fields(&self) -> [(&'static str, &str); 10] {
        [
            ("org", &self.org),
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("location", &self.location),
            ("ptype", &self.ptype),
            ("mode", &self.mode),
            ("voltage", &self.voltage),
            ("podate", &self.podate),
            ("notes", &self.notes),
        ]
    }
}

/// Project intake (`POST /api/project`, multipart with attachments)
#[derive(Debug, Clone, Default)]
pub struct ProjectRequest {
    pub fields: ProjectDraft,
    pub files: Vec<PathBuf>,
}

impl ProjectRequest {
    pub fn validate(&self) -> Result<(), FormError> {
        require("name", &self.fields.name)?;
        require_email(&self.fields.email)?;
        if !self.fields.phone.trim().is_empty() {
            require_phone(&self.fields.phone)?;
        }
        Ok(())
    }

    async fn into_form(self) -> Result<Form, FormError> {
        let mut form = Form::new();
        for (key, value) in self.fields.text_fields() {
            form = form.text(key, value.trim().to_string());
        }
        if self.fields.visit {
            form = form.text("visit", "on");
        }

        for path in &self.files {
            let bytes = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "file".to_string());
            form = form.part("files", Part::bytes(bytes).file_name(name));
        }
        Ok(form)
    }
}

/// Errors submitting a public form
#[derive(Error, Debug)]
pub enum FormError {
    /// Rejected before sending
    #[error("{0}")]
    Invalid(String),

    #[error("Submission rejected ({status}); email us instead: {fallback}")]
    Rejected { status: u16, fallback: String },

    #[error("Submission failed ({source}); email us instead: {fallback}")]
    Transport {
        #[source]
        source: reqwest::Error,
        fallback: String,
    },

    #[error("Cannot read attachment: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// The mailto link to offer, for failures past validation
    pub fn fallback(&self) -> Option<&str> {
        match self {
            FormError::Rejected { fallback, .. } | FormError::Transport { fallback, .. } => {
                Some(fallback)
            }
            _ => None,
        }
    }
}

/// Client for the public submission endpoints
pub struct FormClient {
    client: Client,
    base_url: String,
    contact_email: String,
}

impl FormClient {
    pub fn new(base_url: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            contact_email: contact_email.into(),
        }
    }

    /// `mailto:` link with a prefilled subject
    pub fn mailto(&self, subject: &str) -> String {
        format!(
            "mailto:{}?subject={}",
            self.contact_email,
            urlencoding::encode(subject)
        )
    }

    pub async fn submit_contact(&self, request: &ContactRequest) -> Result<(), FormError> {
        request.validate()?;
        let builder = self.client.post(self.url("/api/contact")).json(request);
        self.send(builder, "Contact").await
    }

    pub async fn submit_quote(&self, request: &QuoteRequest) -> Result<(), FormError> {
        request.validate()?;
        let builder = self.client.post(self.url("/api/quote")).json(request);
        self.send(builder, "Quote request").await
    }

    pub async fn submit_project(&self, request: ProjectRequest) -> Result<(), FormError> {
        request.validate()?;
        let form = request.into_form().await?;
        let builder = self.client.post(self.url("/api/project")).multipart(form);
        self.send(builder, "Project enquiry").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder, subject: &str) -> Result<(), FormError> {
        match builder.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(form = subject, "Form submitted");
                Ok(())
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!(form = subject, status, "Form submission rejected");
                Err(FormError::Rejected {
                    status,
                    fallback: self.mailto(subject),
                })
            }
            Err(source) => {
                tracing::warn!(form = subject, error = %source, "Form submission failed");
                Err(FormError::Transport {
                    source,
                    fallback: self.mailto(subject),
                })
            }
        }
    }
}
