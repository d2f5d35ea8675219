// Contact form state and its submission animation.
//
// Idle -> Submitting -> Succeeded | Failed(notice). The shell renders the
// phase and hides the success overlay / error notice after the configured delays.
use crate::config::ContactSettings;
use crate::services::contact_client::{ContactClient, SubmissionError, DEFAULT_FAILURE};
use crate::services::performance::{Details, ErrorSink};
use crate::state::{ComponentKind, Widget};
use shared::models::{ContactRequest, ContactResponse};
use shared::utils::validate_submission;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub const SUBMIT_LABEL: &str = "Send Message";
pub const SUBMITTING_LABEL: &str = "Sending...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Timeout,
    Network,
    Rejected,
}

/// User-facing failure copy. Never carries raw transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn validation(errors: &[&str]) -> Self {
        Self { kind: NoticeKind::Validation, title: "Validation Error".into(), message: errors.join(", ") }
    }

    fn from_submission(error: &SubmissionError) -> Self {
        match error {
            SubmissionError::Timeout => Self {
                kind: NoticeKind::Timeout,
                title: "Request Timeout".into(),
                message: "The request took too long. Please try again.".into(),
            },
            SubmissionError::Network(_) => Self {
                kind: NoticeKind::Network,
                title: "Network Error".into(),
                message: "Please check your connection and try again.".into(),
            },
            SubmissionError::Rejected { message, .. } => {
                // The client substitutes its own default when the server gave no reason.
                let message =
                    if message.is_empty() || message == DEFAULT_FAILURE { "Please try again later." } else { message };
                Self { kind: NoticeKind::Rejected, title: DEFAULT_FAILURE.into(), message: message.to_string() }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed(Notice),
}

pub struct ContactForm {
    settings: ContactSettings,
    client: ContactClient,
    sink: Rc<dyn ErrorSink>,
    fields: RefCell<ContactRequest>,
    phase: RefCell<FormPhase>,
    // Bumped by every begin_submit that changes the phase.
    attempt: Cell<u64>,
}

impl ContactForm {
    pub fn new(settings: ContactSettings, sink: Rc<dyn ErrorSink>) -> anyhow::Result<Rc<Self>> {
        let client = ContactClient::new(&settings.endpoint, settings.timeout())?;
        tracing::info!(endpoint = %client.endpoint(), "Contact form ready");
        Ok(Rc::new(Self {
            settings,
            client,
            sink,
            fields: RefCell::new(ContactRequest::default()),
            phase: RefCell::new(FormPhase::Idle),
            attempt: Cell::new(0),
        }))
    }

    pub fn update_field(&self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let mut fields = self.fields.borrow_mut();
        match field {
            Field::Name => fields.name = value,
            Field::Email => fields.email = value,
            Field::Subject => fields.subject = value,
            Field::Message => fields.message = value,
            Field::Token => fields.token = (!value.is_empty()).then_some(value),
        }
    }

    pub fn fields(&self) -> ContactRequest {
        self.fields.borrow().clone()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(*self.phase.borrow(), FormPhase::Submitting)
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Validates and moves to Submitting. Returns the payload to send, or `None`
    /// when a submission is already in flight or validation failed.
    pub fn begin_submit(&self) -> Option<ContactRequest> {
        if self.is_submitting() {
            return None;
        }
        self.attempt.set(self.attempt.get() + 1);
        let payload = self.fields();
        let errors = validate_submission(&payload);
        if !errors.is_empty() {
            tracing::debug!(errors = ?errors, "Contact form failed validation");
            *self.phase.borrow_mut() = FormPhase::Failed(Notice::validation(&errors));
            return None;
        }
        *self.phase.borrow_mut() = FormPhase::Submitting;
        Some(payload)
    }

    pub fn finish_submit(&self, result: Result<ContactResponse, SubmissionError>) -> FormPhase {
        let phase = match result {
            Ok(_) => {
                tracing::info!("Contact message sent");
                FormPhase::Succeeded
            }
            Err(e) => {
                if !matches!(e, SubmissionError::Rejected { .. }) {
                    let mut details = Details::new();
                    details.insert("endpoint".to_string(), self.client.endpoint().as_str().into());
                    self.sink.handle_error("Contact Form Submission Error", &anyhow::Error::new(e.clone()), details);
                }
                FormPhase::Failed(Notice::from_submission(&e))
            }
        };
        *self.phase.borrow_mut() = phase.clone();
        phase
    }

    pub async fn submit(&self) -> FormPhase {
        let Some(payload) = self.begin_submit() else {
            return self.phase();
        };
        self.send(&payload).await
    }

    /// Second half of [`ContactForm::submit`], for callers that already ran `begin_submit`.
    pub async fn send(&self, payload: &ContactRequest) -> FormPhase {
        let result = self.client.submit(payload).await;
        self.finish_submit(result)
    }

    /// Closes the success overlay and clears the form.
    pub fn dismiss_success(&self) {
        let mut phase = self.phase.borrow_mut();
        if *phase == FormPhase::Succeeded {
            *phase = FormPhase::Idle;
            *self.fields.borrow_mut() = ContactRequest::default();
        }
    }

    /// Closes the error notice; the fields are kept for another try.
    pub fn dismiss_error(&self) {
        let mut phase = self.phase.borrow_mut();
        if matches!(*phase, FormPhase::Failed(_)) {
            *phase = FormPhase::Idle;
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt.get()
    }

    /// Auto-hide for the notice of submission `attempt`. Does nothing once a
    /// newer submission has started.
    pub fn dismiss_notice(&self, attempt: u64) -> bool {
        if attempt != self.attempt.get() {
            return false;
        }
        match self.phase() {
            FormPhase::Succeeded => self.dismiss_success(),
            FormPhase::Failed(_) => self.dismiss_error(),
            FormPhase::Idle | FormPhase::Submitting => return false,
        }
        true
    }

    pub fn success_display(&self) -> Duration {
        self.settings.success_display()
    }

    pub fn error_display(&self) -> Duration {
        self.settings.error_display()
    }
}

impl Widget for ContactForm {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Contact
    }
}
