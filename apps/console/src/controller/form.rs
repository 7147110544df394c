//! In-memory state of one create/edit session.

use chrono::NaiveDate;
use client_core::{EventDraft, EventKind, LookupData};
use shared::{
    domain::{
        ActivityTypeId, EventId, EventMode, InstitutionId, Modality, ResponsiblePartyId,
        TargetAudienceId, ThemeId,
    },
    protocol::{Activity, Event, EventFields, Theme, UniqueActivity},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("o título do evento é obrigatório")]
    MissingTitle,
    #[error("o nome da atividade é obrigatório")]
    MissingActivityName,
    #[error("campo desconhecido '{0}'")]
    UnknownField(String),
    #[error("valor inválido para {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("não há atividade na posição {0}")]
    NoSuchActivity(usize),
    #[error("tema {0} não existe")]
    UnknownTheme(ThemeId),
    #[error("este campo só existe no modo {0}")]
    WrongMode(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    event_id: Option<EventId>,
    fields: EventFields,
    mode: EventMode,
    activities: Vec<Activity>,
    unique: UniqueActivity,
    draft: Activity,
}

impl Default for EventForm {
    fn default() -> Self {
        Self::blank()
    }
}

impl EventForm {
    pub fn blank() -> Self {
        Self {
            event_id: None,
            fields: EventFields::default(),
            mode: EventMode::UniqueActivity,
            activities: Vec::new(),
            unique: UniqueActivity::default(),
            draft: Activity::default(),
        }
    }

    /// Pre-populates the form from a stored event; persisted child ids are kept.
    pub fn from_event(event: &Event) -> Self {
        let draft = EventDraft::from(event.clone());
        let mut form = Self {
            event_id: Some(event.id),
            fields: draft.fields,
            ..Self::blank()
        };
        match draft.kind {
            EventKind::MultiActivity(activities) => {
                form.mode = EventMode::MultiActivity;
                form.activities = activities;
            }
            EventKind::UniqueActivity(unique) => {
                form.mode = EventMode::UniqueActivity;
                form.unique = unique.unwrap_or_default();
            }
        }
        form
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    /// Binds a create form to the event row a partially failed save left behind.
    pub fn attach_to(&mut self, event_id: EventId) {
        self.event_id = Some(event_id);
    }

    pub fn fields(&self) -> &EventFields {
        &self.fields
    }

    pub fn mode(&self) -> EventMode {
        self.mode
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn unique(&self) -> &UniqueActivity {
        &self.unique
    }

    pub fn draft(&self) -> &Activity {
        &self.draft
    }

    /// Switching modes drops whatever the previous mode had collected.
    pub fn set_mode(&mut self, mode: EventMode) {
        if self.mode == mode {
            return;
        }
        match mode {
            EventMode::UniqueActivity => {
                self.activities.clear();
                self.draft = Activity::default();
            }
            EventMode::MultiActivity => self.unique = UniqueActivity::default(),
        }
        self.mode = mode;
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let fields = &mut self.fields;
        match name {
            "titulo" => fields.title = value.trim().to_string(),
            "data_inicio" => fields.start_date = parse_date(name, value)?,
            "data_fim" => fields.end_date = parse_date(name, value)?,
            "descricao" => fields.description = optional_text(value),
            "valor" => fields.price = optional_text(value),
            "modalidade" => {
                fields.modality = match optional_text(value) {
                    None => None,
                    Some(raw) => Some(raw.parse::<Modality>().map_err(|err| {
                        FormError::InvalidValue {
                            field: name.to_string(),
                            reason: err.to_string(),
                        }
                    })?),
                }
            }
            "link_inscricao" => fields.registration_link = optional_text(value),
            "imagem_url" => fields.image_url = optional_text(value),
            "data_limite_inscricoes" => fields.registration_deadline = parse_date(name, value)?,
            other => return Err(FormError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    pub fn set_draft_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        self.require_mode(EventMode::MultiActivity)?;
        let draft = &mut self.draft;
        match name {
            "nome" => draft.name = value.trim().to_string(),
            "data" => draft.date = parse_date(name, value)?,
            "descricao" => draft.description = optional_text(value),
            "tipo" => draft.type_id = parse_id(name, value)?.map(ActivityTypeId),
            _ => return set_schedule_field(&mut ScheduleFields::of_activity(draft), name, value),
        }
        Ok(())
    }

    pub fn set_unique_field(
        &mut self,
        name: &str,
        value: &str,
        lookups: &LookupData,
    ) -> Result<(), FormError> {
        self.require_mode(EventMode::UniqueActivity)?;
        set_schedule_field(&mut ScheduleFields::of_unique(&mut self.unique), name, value)?;
        lookups.resolve_unique_activity(&mut self.unique);
        Ok(())
    }

    pub fn toggle_draft_theme(
        &mut self,
        theme_id: ThemeId,
        lookups: &LookupData,
    ) -> Result<bool, FormError> {
        self.require_mode(EventMode::MultiActivity)?;
        toggle_theme(&mut self.draft.themes, theme_id, lookups)
    }

    pub fn toggle_unique_theme(
        &mut self,
        theme_id: ThemeId,
        lookups: &LookupData,
    ) -> Result<bool, FormError> {
        self.require_mode(EventMode::UniqueActivity)?;
        toggle_theme(&mut self.unique.themes, theme_id, lookups)
    }

    /// Appends the draft to the in-memory list and starts a fresh draft.
    pub fn add_draft_activity(&mut self, lookups: &LookupData) -> Result<&Activity, FormError> {
        self.require_mode(EventMode::MultiActivity)?;
        if self.draft.name.trim().is_empty() {
            return Err(FormError::MissingActivityName);
        }
        let mut activity = std::mem::take(&mut self.draft);
        lookups.resolve_activity(&mut activity);
        self.activities.push(activity);
        Ok(&self.activities[self.activities.len() - 1])
    }

    pub fn remove_activity(&mut self, index: usize) -> Result<Activity, FormError> {
        if index >= self.activities.len() {
            return Err(FormError::NoSuchActivity(index));
        }
        Ok(self.activities.remove(index))
    }

    /// Builds what gets sent. The unique activity is only included when at
    /// least one of its fields is filled.
    pub fn submit(&self) -> Result<EventDraft, FormError> {
        if self.fields.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        let kind = match self.mode {
            EventMode::MultiActivity => EventKind::MultiActivity(self.activities.clone()),
            EventMode::UniqueActivity => EventKind::UniqueActivity(
                self.unique.has_content().then(|| self.unique.clone()),
            ),
        };
        Ok(EventDraft {
            fields: self.fields.clone(),
            kind,
        })
    }

    fn require_mode(&self, mode: EventMode) -> Result<(), FormError> {
        if self.mode == mode {
            return Ok(());
        }
        Err(FormError::WrongMode(match mode {
            EventMode::MultiActivity => "múltiplas atividades",
            EventMode::UniqueActivity => "atividade única",
        }))
    }
}

/// Fields activities and unique activities have in common.
struct ScheduleFields<'a> {
    start_time: &'a mut Option<String>,
    end_time: &'a mut Option<String>,
    location_detail: &'a mut Option<String>,
    institution_id: &'a mut Option<InstitutionId>,
    audience_id: &'a mut Option<TargetAudienceId>,
    responsible_id: &'a mut Option<ResponsiblePartyId>,
}

impl<'a> ScheduleFields<'a> {
    fn of_activity(activity: &'a mut Activity) -> Self {
        Self {
            start_time: &mut activity.start_time,
            end_time: &mut activity.end_time,
            location_detail: &mut activity.location_detail,
            institution_id: &mut activity.institution_id,
            audience_id: &mut activity.audience_id,
            responsible_id: &mut activity.responsible_id,
        }
    }

    fn of_unique(activity: &'a mut UniqueActivity) -> Self {
        Self {
            start_time: &mut activity.start_time,
            end_time: &mut activity.end_time,
            location_detail: &mut activity.location_detail,
            institution_id: &mut activity.institution_id,
            audience_id: &mut activity.audience_id,
            responsible_id: &mut activity.responsible_id,
        }
    }
}

fn set_schedule_field(
    target: &mut ScheduleFields<'_>,
    name: &str,
    value: &str,
) -> Result<(), FormError> {
    match name {
        "horario_inicio" => *target.start_time = optional_text(value),
        "horario_fim" => *target.end_time = optional_text(value),
        "detalhe_local" => *target.location_detail = optional_text(value),
        "instituicao" => *target.institution_id = parse_id(name, value)?.map(InstitutionId),
        "publico_alvo" => *target.audience_id = parse_id(name, value)?.map(TargetAudienceId),
        "responsavel" => *target.responsible_id = parse_id(name, value)?.map(ResponsiblePartyId),
        other => return Err(FormError::UnknownField(other.to_string())),
    }
    Ok(())
}

fn toggle_theme(
    themes: &mut Vec<Theme>,
    theme_id: ThemeId,
    lookups: &LookupData,
) -> Result<bool, FormError> {
    if let Some(position) = themes.iter().position(|theme| theme.id == theme_id) {
        themes.remove(position);
        return Ok(false);
    }
    let theme = lookups
        .theme(theme_id)
        .ok_or(FormError::UnknownTheme(theme_id))?;
    themes.push(theme.clone());
    Ok(true)
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Accepts `dd/mm/yyyy` as typed by users and ISO `yyyy-mm-dd`.
pub fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>, FormError> {
    let Some(value) = optional_text(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&value, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(&value, "%Y-%m-%d"))
        .map(Some)
        .map_err(|_| FormError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{value}' não é uma data dd/mm/aaaa"),
        })
}

fn parse_id(field: &str, value: &str) -> Result<Option<i64>, FormError> {
    let Some(value) = optional_text(value) else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| FormError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{value}' não é um identificador"),
        })
}

#[cfg(test)]
#[path = "../tests/form_tests.rs"]
mod tests;
