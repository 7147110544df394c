//! Controller layer: screen state, form session and banner handling over an
//! `EventHandle`.

pub mod events;
pub mod form;

use std::sync::Arc;

use client_core::{EventHandle, LookupData};
use shared::{domain::EventId, protocol::Event};
use tracing::{info, warn};

use self::{
    events::{Banner, LookupTarget, RetryAction, UiError, UiErrorContext},
    form::EventForm,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Idle,
    Creating,
    Editing { id: EventId },
}

pub struct Controller {
    handle: Arc<dyn EventHandle>,
    screen: Screen,
    events: Vec<Event>,
    form: Option<EventForm>,
    lookups: Option<LookupData>,
    banner: Option<Banner>,
}

impl Controller {
    pub fn new(handle: Arc<dyn EventHandle>) -> Self {
        Self {
            handle,
            screen: Screen::Idle,
            events: Vec::new(),
            form: None,
            lookups: None,
            banner: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn form(&self) -> Option<&EventForm> {
        self.form.as_ref()
    }

    /// The open form together with the lookups it was opened with.
    pub fn form_parts(&mut self) -> Option<(&mut EventForm, &LookupData)> {
        match (self.form.as_mut(), self.lookups.as_ref()) {
            (Some(form), Some(lookups)) => Some((form, lookups)),
            _ => None,
        }
    }

    pub fn lookups(&self) -> Option<&LookupData> {
        self.lookups.as_ref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Reloads the event list. Returns false and shows a retryable banner on failure.
    pub async fn refresh(&mut self) -> bool {
        match self.handle.list_events().await {
            Ok(events) => {
                self.events = events;
                true
            }
            Err(err) => {
                let error = UiError::from_client(UiErrorContext::LoadEvents, &err);
                self.banner = Some(Banner::error(&error, Some(RetryAction::ReloadEvents)));
                false
            }
        }
    }

    /// Fetches one event fresh from the API.
    pub async fn fetch_event(&mut self, id: EventId) -> Option<Event> {
        match self.handle.get_event(id).await {
            Ok(event) => Some(event),
            Err(err) => {
                let error = UiError::from_client(UiErrorContext::LoadEvent, &err);
                self.banner = Some(Banner::error(&error, None));
                None
            }
        }
    }

    pub async fn open_create(&mut self) -> bool {
        if !self.load_lookups(LookupTarget::Create).await {
            return false;
        }
        self.form = Some(EventForm::blank());
        self.screen = Screen::Creating;
        true
    }

    /// Opens the edit form pre-populated from the stored event.
    pub async fn open_edit(&mut self, id: EventId) -> bool {
        if !self.load_lookups(LookupTarget::Edit(id)).await {
            return false;
        }
        let Some(event) = self.fetch_event(id).await else {
            return false;
        };
        self.form = Some(EventForm::from_event(&event));
        self.screen = Screen::Editing { id };
        true
    }

    /// Drops the form without touching the API.
    pub fn cancel(&mut self) {
        self.form = None;
        self.screen = Screen::Idle;
    }

    /// Sends the form. On failure the form stays open with an error banner.
    pub async fn submit(&mut self) -> bool {
        let Some(form) = self.form.as_ref() else {
            return false;
        };
        let draft = match form.submit() {
            Ok(draft) => draft,
            Err(err) => {
                let error = UiError::validation(UiErrorContext::SubmitForm, err.to_string());
                self.banner = Some(Banner::error(&error, None));
                return false;
            }
        };

        let result = match self.screen {
            Screen::Creating => self.handle.create_event(&draft).await,
            Screen::Editing { id } => self.handle.update_event(id, &draft).await,
            Screen::Idle => return false,
        };
        let saved = match result {
            Ok(event) => event,
            Err(err) => {
                if let (Screen::Creating, Some(id)) = (self.screen, err.saved_event()) {
                    warn!(event_id = %id, "event created with child failures, next save updates it");
                    self.screen = Screen::Editing { id };
                    if let Some(form) = self.form.as_mut() {
                        form.attach_to(id);
                    }
                }
                let error = UiError::from_client(UiErrorContext::SubmitForm, &err);
                self.banner = Some(Banner::error(&error, None));
                return false;
            }
        };

        let verb = match self.screen {
            Screen::Editing { .. } => "atualizado",
            _ => "criado",
        };
        info!(event_id = %saved.id, "event saved");
        self.cancel();
        self.refresh_after(Banner::success(format!(
            "Evento '{}' {verb} com sucesso",
            saved.fields.title
        )))
        .await;
        true
    }

    /// Deletes an event and its children. Confirmation is the caller's job.
    pub async fn delete(&mut self, id: EventId) -> bool {
        match self.handle.delete_event(id).await {
            Ok(outcome) => {
                let banner = if outcome.may_have_orphans() {
                    warn!(
                        event_id = %id,
                        failures = outcome.child_failures.len(),
                        "event deleted with child failures"
                    );
                    Banner::warning(
                        "Evento excluído, mas algumas atividades não puderam ser removidas",
                        outcome
                            .child_failures
                            .iter()
                            .map(|failure| format!("{}: {}", failure.operation, failure.message))
                            .collect(),
                    )
                } else {
                    Banner::success("Evento excluído com sucesso")
                };
                self.refresh_after(banner).await;
                true
            }
            Err(err) => {
                let error = UiError::from_client(UiErrorContext::DeleteEvent, &err);
                self.banner = Some(Banner::error(&error, None));
                false
            }
        }
    }

    /// Re-runs whatever the current banner offers to retry.
    pub async fn retry(&mut self) -> bool {
        let Some(action) = self.banner.as_ref().and_then(|banner| banner.retry) else {
            return false;
        };
        self.banner = None;
        match action {
            RetryAction::ReloadEvents => self.refresh().await,
            RetryAction::ReloadLookups(LookupTarget::Create) => self.open_create().await,
            RetryAction::ReloadLookups(LookupTarget::Edit(id)) => self.open_edit(id).await,
        }
    }

    /// Shows `outcome` and reloads the list. If the reload fails, the outcome
    /// is kept as detail lines under the load error.
    async fn refresh_after(&mut self, outcome: Banner) {
        self.banner = Some(outcome.clone());
        if self.refresh().await {
            return;
        }
        if let Some(banner) = self.banner.as_mut() {
            let mut details = vec![outcome.message];
            details.extend(outcome.details);
            details.append(&mut banner.details);
            banner.details = details;
        }
    }

    async fn load_lookups(&mut self, target: LookupTarget) -> bool {
        match self.handle.load_lookups().await {
            Ok(lookups) => {
                self.lookups = Some(lookups);
                true
            }
            Err(err) => {
                let error = UiError::from_client(UiErrorContext::LoadLookups, &err);
                self.banner = Some(Banner::error(
                    &error,
                    Some(RetryAction::ReloadLookups(target)),
                ));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
