use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActivityId, ActivityTypeId, EventId, EventMode, InstitutionId, Modality, ResponsiblePartyId,
    TargetAudienceId, ThemeId, UniqueActivityId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: ActivityTypeId,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: InstitutionId,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAudience {
    pub id: TargetAudienceId,
    #[serde(rename = "descricao")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleParty {
    pub id: ResponsiblePartyId,
    #[serde(rename = "nome")]
    pub name: String,
}

/// Bare event record, without child collections. Body of `POST/PUT /eventos`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFields {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "data_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "valor", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(rename = "modalidade", skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
    #[serde(rename = "link_inscricao", skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
    #[serde(rename = "imagem_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "data_limite_inscricoes", skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(flatten)]
    pub fields: EventFields,
    #[serde(rename = "atividades", default)]
    pub activities: Vec<Activity>,
    #[serde(rename = "atividadesUnicas", default)]
    pub unique_activities: Vec<UniqueActivity>,
}

impl Event {
    pub fn mode(&self) -> EventMode {
        if self.activities.is_empty() {
            EventMode::UniqueActivity
        } else {
            EventMode::MultiActivity
        }
    }
}

/// Scheduled sub-item of a multi-activity event, as the API returns it: bare
/// foreign keys plus the expanded reference objects used for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "horario_inicio", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "horario_fim", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "detalhe_local", skip_serializing_if = "Option::is_none")]
    pub location_detail: Option<String>,
    #[serde(rename = "idEvento", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(rename = "idTipo", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<ActivityTypeId>,
    #[serde(rename = "idInstituicao", skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<InstitutionId>,
    #[serde(rename = "idPublicoAlvo", skip_serializing_if = "Option::is_none")]
    pub audience_id: Option<TargetAudienceId>,
    #[serde(rename = "idResponsavel", skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<ResponsiblePartyId>,
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(rename = "instituicao", skip_serializing_if = "Option::is_none")]
    pub institution: Option<Institution>,
    #[serde(rename = "publicoAlvo", skip_serializing_if = "Option::is_none")]
    pub audience: Option<TargetAudience>,
    #[serde(rename = "responsavel", skip_serializing_if = "Option::is_none")]
    pub responsible: Option<ResponsibleParty>,
    #[serde(rename = "temas")]
    pub themes: Vec<Theme>,
}

/// The single embedded schedule detail of a simple event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UniqueActivityId>,
    #[serde(rename = "horario_inicio", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "horario_fim", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "detalhe_local", skip_serializing_if = "Option::is_none")]
    pub location_detail: Option<String>,
    #[serde(rename = "idEvento", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(rename = "idInstituicao", skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<InstitutionId>,
    #[serde(rename = "idPublicoAlvo", skip_serializing_if = "Option::is_none")]
    pub audience_id: Option<TargetAudienceId>,
    #[serde(rename = "idResponsavel", skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<ResponsiblePartyId>,
    #[serde(rename = "instituicao", skip_serializing_if = "Option::is_none")]
    pub institution: Option<Institution>,
    #[serde(rename = "publicoAlvo", skip_serializing_if = "Option::is_none")]
    pub audience: Option<TargetAudience>,
    #[serde(rename = "responsavel", skip_serializing_if = "Option::is_none")]
    pub responsible: Option<ResponsibleParty>,
    #[serde(rename = "temas")]
    pub themes: Vec<Theme>,
}

impl UniqueActivity {
    /// True when at least one user-editable field carries a value.
    pub fn has_content(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.start_time)
            || filled(&self.end_time)
            || filled(&self.location_detail)
            || self.institution_id.is_some()
            || self.audience_id.is_some()
            || self.responsible_id.is_some()
            || !self.themes.is_empty()
    }
}

/// Body of `POST /eventos/{id}/atividades` and `PUT /atividades/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityPayload {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "data")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "horario_inicio")]
    pub start_time: Option<String>,
    #[serde(rename = "horario_fim")]
    pub end_time: Option<String>,
    #[serde(rename = "detalhe_local")]
    pub location_detail: Option<String>,
    #[serde(rename = "idTipo")]
    pub type_id: Option<ActivityTypeId>,
    #[serde(rename = "idInstituicao")]
    pub institution_id: Option<InstitutionId>,
    #[serde(rename = "idPublicoAlvo")]
    pub audience_id: Option<TargetAudienceId>,
    #[serde(rename = "idResponsavel")]
    pub responsible_id: Option<ResponsiblePartyId>,
    #[serde(rename = "temas")]
    pub theme_ids: Vec<ThemeId>,
}

/// Body of `POST /eventos/{id}/atividades-unicas` and `PUT /atividades-unicas/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueActivityPayload {
    #[serde(rename = "horario_inicio")]
    pub start_time: Option<String>,
    #[serde(rename = "horario_fim")]
    pub end_time: Option<String>,
    #[serde(rename = "detalhe_local")]
    pub location_detail: Option<String>,
    #[serde(rename = "idInstituicao")]
    pub institution_id: Option<InstitutionId>,
    #[serde(rename = "idPublicoAlvo")]
    pub audience_id: Option<TargetAudienceId>,
    #[serde(rename = "idResponsavel")]
    pub responsible_id: Option<ResponsiblePartyId>,
    #[serde(rename = "temas")]
    pub theme_ids: Vec<ThemeId>,
}

impl From<&Activity> for ActivityPayload {
    fn from(activity: &Activity) -> Self {
        Self {
            name: activity.name.clone(),
            date: activity.date,
            description: activity.description.clone(),
            start_time: activity.start_time.clone(),
            end_time: activity.end_time.clone(),
            location_detail: activity.location_detail.clone(),
            type_id: activity.type_id,
            institution_id: activity.institution_id,
            audience_id: activity.audience_id,
            responsible_id: activity.responsible_id,
            theme_ids: activity.themes.iter().map(|theme| theme.id).collect(),
        }
    }
}

impl From<&UniqueActivity> for UniqueActivityPayload {
    fn from(activity: &UniqueActivity) -> Self {
        Self {
            start_time: activity.start_time.clone(),
            end_time: activity.end_time.clone(),
            location_detail: activity.location_detail.clone(),
            institution_id: activity.institution_id,
            audience_id: activity.audience_id,
            responsible_id: activity.responsible_id,
            theme_ids: activity.themes.iter().map(|theme| theme.id).collect(),
        }
    }
}
