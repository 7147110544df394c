use shared::{
    domain::{ActivityTypeId, InstitutionId, ResponsiblePartyId, TargetAudienceId, ThemeId},
    protocol::{
        Activity, ActivityType, Institution, ResponsibleParty, TargetAudience, Theme,
        UniqueActivity,
    },
};
use tracing::debug;

use crate::{error::ClientResult, stores::LookupStore};

/// The five reference collections a form needs before it can be filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupData {
    pub themes: Vec<Theme>,
    pub activity_types: Vec<ActivityType>,
    pub institutions: Vec<Institution>,
    pub target_audiences: Vec<TargetAudience>,
    pub responsible_parties: Vec<ResponsibleParty>,
}

/// Fetches all five collections concurrently; the first failure wins.
pub async fn load_lookup_data(store: &dyn LookupStore) -> ClientResult<LookupData> {
    let (themes, activity_types, institutions, target_audiences, responsible_parties) = futures::try_join!(
        store.themes(),
        store.activity_types(),
        store.institutions(),
        store.target_audiences(),
        store.responsible_parties(),
    )?;
    debug!(
        themes = themes.len(),
        activity_types = activity_types.len(),
        institutions = institutions.len(),
        target_audiences = target_audiences.len(),
        responsible_parties = responsible_parties.len(),
        "lookup data loaded"
    );
    Ok(LookupData {
        themes,
        activity_types,
        institutions,
        target_audiences,
        responsible_parties,
    })
}

impl LookupData {
    pub fn theme(&self, id: ThemeId) -> Option<&Theme> {
        self.themes.iter().find(|theme| theme.id == id)
    }

    pub fn activity_type(&self, id: ActivityTypeId) -> Option<&ActivityType> {
        self.activity_types.iter().find(|kind| kind.id == id)
    }

    pub fn institution(&self, id: InstitutionId) -> Option<&Institution> {
        self.institutions.iter().find(|institution| institution.id == id)
    }

    pub fn target_audience(&self, id: TargetAudienceId) -> Option<&TargetAudience> {
        self.target_audiences
            .iter()
            .find(|audience| audience.id == id)
    }

    pub fn responsible_party(&self, id: ResponsiblePartyId) -> Option<&ResponsibleParty> {
        self.responsible_parties
            .iter()
            .find(|party| party.id == id)
    }

    /// Fills the display objects of an activity from its bare foreign keys.
    /// Unknown ids leave the display object empty.
    pub fn resolve_activity(&self, activity: &mut Activity) {
        activity.activity_type = activity
            .type_id
            .and_then(|id| self.activity_type(id))
            .cloned();
        activity.institution = activity
            .institution_id
            .and_then(|id| self.institution(id))
            .cloned();
        activity.audience = activity
            .audience_id
            .and_then(|id| self.target_audience(id))
            .cloned();
        activity.responsible = activity
            .responsible_id
            .and_then(|id| self.responsible_party(id))
            .cloned();
        self.resolve_themes(&mut activity.themes);
    }

    pub fn resolve_unique_activity(&self, activity: &mut UniqueActivity) {
        activity.institution = activity
            .institution_id
            .and_then(|id| self.institution(id))
            .cloned();
        activity.audience = activity
            .audience_id
            .and_then(|id| self.target_audience(id))
            .cloned();
        activity.responsible = activity
            .responsible_id
            .and_then(|id| self.responsible_party(id))
            .cloned();
        self.resolve_themes(&mut activity.themes);
    }

    fn resolve_themes(&self, themes: &mut [Theme]) {
        for theme in themes.iter_mut() {
            if let Some(known) = self.theme(theme.id) {
                theme.name = known.name.clone();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
