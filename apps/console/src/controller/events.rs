//! Banners, retry actions and error modeling for the console controller.

use client_core::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    LoadEvents,
    LoadLookups,
    LoadEvent,
    SubmitForm,
    DeleteEvent,
}

impl UiErrorContext {
    fn describe(self) -> &'static str {
        match self {
            Self::LoadEvents => "Não foi possível carregar os eventos",
            Self::LoadLookups => "Não foi possível carregar os dados de referência",
            Self::LoadEvent => "Não foi possível carregar o evento",
            Self::SubmitForm => "Não foi possível salvar o evento",
            Self::DeleteEvent => "Não foi possível excluir o evento",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    details: Vec<String>,
}

impl UiError {
    pub fn from_client(context: UiErrorContext, error: &ClientError) -> Self {
        let (category, details) = match error {
            ClientError::Transport { .. } => (UiErrorCategory::Transport, Vec::new()),
            ClientError::Validation(_) => (UiErrorCategory::Validation, Vec::new()),
            ClientError::Aggregate { failures, .. } => (
                UiErrorCategory::Aggregate,
                failures
                    .iter()
                    .map(|failure| format!("{}: {}", failure.operation, failure.message))
                    .collect(),
            ),
        };
        Self {
            category,
            context,
            message: error.to_string(),
            details,
        }
    }

    /// Local form problems never reach the network and are always validation.
    pub fn validation(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn headline(&self) -> String {
        format!("{}: {}", self.context.describe(), self.message)
    }
}

/// What a retry re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    ReloadEvents,
    /// Reopens the form that failed to load its lookups.
    ReloadLookups(LookupTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    Create,
    Edit(shared::domain::EventId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub category: Option<UiErrorCategory>,
    pub message: String,
    pub details: Vec<String>,
    pub retry: Option<RetryAction>,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            category: None,
            message: message.into(),
            details: Vec::new(),
            retry: None,
        }
    }

    pub fn warning(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            category: None,
            message: message.into(),
            details,
            retry: None,
        }
    }

    pub fn error(error: &UiError, retry: Option<RetryAction>) -> Self {
        Self {
            kind: BannerKind::Error,
            category: Some(error.category()),
            message: error.headline(),
            details: error.details().to_vec(),
            retry,
        }
    }
}
