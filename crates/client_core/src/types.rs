use shared::{
    domain::EventMode,
    protocol::{Activity, Event, EventFields, UniqueActivity},
};

/// Child collection of an event, with the mode made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    MultiActivity(Vec<Activity>),
    UniqueActivity(Option<UniqueActivity>),
}

impl Default for EventKind {
    fn default() -> Self {
        Self::UniqueActivity(None)
    }
}

impl EventKind {
    pub fn mode(&self) -> EventMode {
        match self {
            Self::MultiActivity(_) => EventMode::MultiActivity,
            Self::UniqueActivity(_) => EventMode::UniqueActivity,
        }
    }

    /// Desired activities; empty in unique mode so that reconciling purges them.
    pub fn activities(&self) -> &[Activity] {
        match self {
            Self::MultiActivity(activities) => activities,
            Self::UniqueActivity(_) => &[],
        }
    }

    /// Desired unique activity, if any; empty in multi mode.
    pub fn unique_activities(&self) -> &[UniqueActivity] {
        match self {
            Self::UniqueActivity(Some(activity)) => std::slice::from_ref(activity),
            _ => &[],
        }
    }

    /// Reads the mode the way a stored event implies it: any activity means
    /// multi-activity, otherwise the first unique activity (if any) is kept.
    pub fn from_collections(
        activities: Vec<Activity>,
        unique_activities: Vec<UniqueActivity>,
    ) -> Self {
        if activities.is_empty() {
            Self::UniqueActivity(unique_activities.into_iter().next())
        } else {
            Self::MultiActivity(activities)
        }
    }
}

/// What a form submits: bare event fields plus the desired children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub fields: EventFields,
    pub kind: EventKind,
}

impl From<Event> for EventDraft {
    fn from(event: Event) -> Self {
        Self {
            fields: event.fields,
            kind: EventKind::from_collections(event.activities, event.unique_activities),
        }
    }
}
