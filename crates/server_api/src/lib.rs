use shared::{
    domain::{ActivityId, EventId, UniqueActivityId},
    error::{ApiError, ErrorCode},
    protocol::{
        Activity, ActivityPayload, ActivityType, Event, EventFields, Institution,
        ResponsibleParty, TargetAudience, Theme, UniqueActivity, UniqueActivityPayload,
    },
};
use storage::{is_reference_violation, Storage};
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_themes(ctx: &ApiContext) -> Result<Vec<Theme>, ApiError> {
    ctx.storage.list_themes().await.map_err(internal)
}

pub async fn list_activity_types(ctx: &ApiContext) -> Result<Vec<ActivityType>, ApiError> {
    ctx.storage.list_activity_types().await.map_err(internal)
}

pub async fn list_institutions(ctx: &ApiContext) -> Result<Vec<Institution>, ApiError> {
    ctx.storage.list_institutions().await.map_err(internal)
}

pub async fn list_target_audiences(ctx: &ApiContext) -> Result<Vec<TargetAudience>, ApiError> {
    ctx.storage.list_target_audiences().await.map_err(internal)
}

pub async fn list_responsible_parties(
    ctx: &ApiContext,
) -> Result<Vec<ResponsibleParty>, ApiError> {
    ctx.storage.list_responsible_parties().await.map_err(internal)
}

pub async fn list_events(ctx: &ApiContext) -> Result<Vec<Event>, ApiError> {
    ctx.storage.list_events().await.map_err(internal)
}

pub async fn get_event(ctx: &ApiContext, event_id: EventId) -> Result<Event, ApiError> {
    ctx.storage
        .load_event(event_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| event_not_found(event_id))
}

pub async fn create_event(ctx: &ApiContext, fields: EventFields) -> Result<Event, ApiError> {
    validate_event_fields(&fields)?;
    let event_id = ctx
        .storage
        .insert_event(&fields)
        .await
        .map_err(internal)?;
    info!(%event_id, title = %fields.title.trim(), "event created");
    get_event(ctx, event_id).await
}

pub async fn update_event(
    ctx: &ApiContext,
    event_id: EventId,
    fields: EventFields,
) -> Result<Event, ApiError> {
    validate_event_fields(&fields)?;
    let updated = ctx
        .storage
        .update_event(event_id, &fields)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(event_not_found(event_id));
    }
    get_event(ctx, event_id).await
}

pub async fn delete_event(ctx: &ApiContext, event_id: EventId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_event(event_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(event_not_found(event_id));
    }
    info!(%event_id, "event deleted");
    Ok(())
}

pub async fn list_activities(ctx: &ApiContext) -> Result<Vec<Activity>, ApiError> {
    ctx.storage.list_activities().await.map_err(internal)
}

pub async fn list_event_activities(
    ctx: &ApiContext,
    event_id: EventId,
) -> Result<Vec<Activity>, ApiError> {
    ensure_event_exists(ctx, event_id).await?;
    ctx.storage
        .list_activities_for_event(event_id)
        .await
        .map_err(internal)
}

pub async fn get_activity(ctx: &ApiContext, activity_id: ActivityId) -> Result<Activity, ApiError> {
    ctx.storage
        .load_activity(activity_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(format!("activity {activity_id} not found")))
}

pub async fn create_activity(
    ctx: &ApiContext,
    event_id: EventId,
    payload: ActivityPayload,
) -> Result<Activity, ApiError> {
    validate_activity_payload(&payload)?;
    ensure_event_exists(ctx, event_id).await?;
    let activity_id = ctx
        .storage
        .insert_activity(event_id, &payload)
        .await
        .map_err(storage_write)?;
    get_activity(ctx, activity_id).await
}

pub async fn update_activity(
    ctx: &ApiContext,
    activity_id: ActivityId,
    payload: ActivityPayload,
) -> Result<Activity, ApiError> {
    validate_activity_payload(&payload)?;
    let updated = ctx
        .storage
        .update_activity(activity_id, &payload)
        .await
        .map_err(storage_write)?;
    if !updated {
        return Err(ApiError::not_found(format!(
            "activity {activity_id} not found"
        )));
    }
    get_activity(ctx, activity_id).await
}

pub async fn delete_activity(ctx: &ApiContext, activity_id: ActivityId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_activity(activity_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found(format!(
            "activity {activity_id} not found"
        )));
    }
    Ok(())
}

pub async fn list_unique_activities(ctx: &ApiContext) -> Result<Vec<UniqueActivity>, ApiError> {
    ctx.storage.list_unique_activities().await.map_err(internal)
}

pub async fn list_event_unique_activities(
    ctx: &ApiContext,
    event_id: EventId,
) -> Result<Vec<UniqueActivity>, ApiError> {
    ensure_event_exists(ctx, event_id).await?;
    ctx.storage
        .list_unique_activities_for_event(event_id)
        .await
        .map_err(internal)
}

pub async fn get_unique_activity(
    ctx: &ApiContext,
    unique_activity_id: UniqueActivityId,
) -> Result<UniqueActivity, ApiError> {
    ctx.storage
        .load_unique_activity(unique_activity_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| unique_activity_not_found(unique_activity_id))
}

pub async fn create_unique_activity(
    ctx: &ApiContext,
    event_id: EventId,
    payload: UniqueActivityPayload,
) -> Result<UniqueActivity, ApiError> {
    ensure_event_exists(ctx, event_id).await?;
    let unique_activity_id = ctx
        .storage
        .insert_unique_activity(event_id, &payload)
        .await
        .map_err(storage_write)?;
    get_unique_activity(ctx, unique_activity_id).await
}

pub async fn update_unique_activity(
    ctx: &ApiContext,
    unique_activity_id: UniqueActivityId,
    payload: UniqueActivityPayload,
) -> Result<UniqueActivity, ApiError> {
    let updated = ctx
        .storage
        .update_unique_activity(unique_activity_id, &payload)
        .await
        .map_err(storage_write)?;
    if !updated {
        return Err(unique_activity_not_found(unique_activity_id));
    }
    get_unique_activity(ctx, unique_activity_id).await
}

pub async fn delete_unique_activity(
    ctx: &ApiContext,
    unique_activity_id: UniqueActivityId,
) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_unique_activity(unique_activity_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(unique_activity_not_found(unique_activity_id));
    }
    Ok(())
}

fn validate_event_fields(fields: &EventFields) -> Result<(), ApiError> {
    if fields.title.trim().is_empty() {
        return Err(ApiError::validation("titulo is required"));
    }
    if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
        if end < start {
            return Err(ApiError::validation(
                "data_fim must not be earlier than data_inicio",
            ));
        }
    }
    Ok(())
}

fn validate_activity_payload(payload: &ActivityPayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("nome is required"));
    }
    Ok(())
}

async fn ensure_event_exists(ctx: &ApiContext, event_id: EventId) -> Result<(), ApiError> {
    let exists = ctx
        .storage
        .event_exists(event_id)
        .await
        .map_err(internal)?;
    if !exists {
        return Err(event_not_found(event_id));
    }
    Ok(())
}

fn event_not_found(event_id: EventId) -> ApiError {
    ApiError::not_found(format!("event {event_id} not found"))
}

fn unique_activity_not_found(unique_activity_id: UniqueActivityId) -> ApiError {
    ApiError::not_found(format!("unique activity {unique_activity_id} not found"))
}

fn storage_write(err: anyhow::Error) -> ApiError {
    if is_reference_violation(&err) {
        return ApiError::validation("payload references an unknown record");
    }
    internal(err)
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::domain::{InstitutionId, ThemeId};

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        storage.seed_reference_defaults().await.expect("seed");
        ApiContext { storage }
    }

    fn fields(title: &str) -> EventFields {
        EventFields {
            title: title.to_string(),
            ..EventFields::default()
        }
    }

    #[tokio::test]
    async fn blank_title_is_a_validation_error() {
        let ctx = setup().await;
        let err = create_event(&ctx, fields("   ")).await.expect_err("blank");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn end_date_before_start_date_is_rejected() {
        let ctx = setup().await;
        let err = create_event(
            &ctx,
            EventFields {
                title: "Hackathon".into(),
                start_date: NaiveDate::from_ymd_opt(2024, 5, 10),
                end_date: NaiveDate::from_ymd_opt(2024, 5, 9),
                ..EventFields::default()
            },
        )
        .await
        .expect_err("inverted range");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn missing_event_maps_to_not_found() {
        let ctx = setup().await;
        for err in [
            get_event(&ctx, EventId(42)).await.expect_err("get"),
            update_event(&ctx, EventId(42), fields("x"))
                .await
                .expect_err("update"),
            delete_event(&ctx, EventId(42)).await.expect_err("delete"),
            list_event_activities(&ctx, EventId(42))
                .await
                .expect_err("children"),
        ] {
            assert_eq!(err.code, ErrorCode::NotFound);
        }
    }

    #[tokio::test]
    async fn creating_activity_for_unknown_event_is_not_found() {
        let ctx = setup().await;
        let err = create_activity(
            &ctx,
            EventId(7),
            ActivityPayload {
                name: "Keynote".into(),
                ..ActivityPayload::default()
            },
        )
        .await
        .expect_err("unknown event");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_reference_id_maps_to_validation() {
        let ctx = setup().await;
        let event = create_event(&ctx, fields("Meetup")).await.expect("event");

        let err = create_unique_activity(
            &ctx,
            event.id,
            UniqueActivityPayload {
                institution_id: Some(InstitutionId(9_999)),
                ..UniqueActivityPayload::default()
            },
        )
        .await
        .expect_err("unknown institution");
        assert_eq!(err.code, ErrorCode::Validation);

        let err = create_activity(
            &ctx,
            event.id,
            ActivityPayload {
                name: "Painel".into(),
                theme_ids: vec![ThemeId(9_999)],
                ..ActivityPayload::default()
            },
        )
        .await
        .expect_err("unknown theme");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn created_activity_comes_back_expanded() {
        let ctx = setup().await;
        let event = create_event(&ctx, fields("Summit")).await.expect("event");
        let theme = list_themes(&ctx).await.expect("themes")[0].clone();
        let institution = list_institutions(&ctx).await.expect("institutions")[0].clone();

        let activity = create_activity(
            &ctx,
            event.id,
            ActivityPayload {
                name: "Oficina".into(),
                institution_id: Some(institution.id),
                theme_ids: vec![theme.id],
                ..ActivityPayload::default()
            },
        )
        .await
        .expect("activity");

        assert_eq!(activity.institution, Some(institution));
        assert_eq!(activity.themes, vec![theme]);

        let event = get_event(&ctx, event.id).await.expect("event");
        assert_eq!(event.activities, vec![activity]);
    }

    #[tokio::test]
    async fn deleting_activity_twice_reports_not_found() {
        let ctx = setup().await;
        let event = create_event(&ctx, fields("Summit")).await.expect("event");
        let activity = create_activity(
            &ctx,
            event.id,
            ActivityPayload {
                name: "Abertura".into(),
                ..ActivityPayload::default()
            },
        )
        .await
        .expect("activity");
        let activity_id = activity.id.expect("persisted id");

        delete_activity(&ctx, activity_id).await.expect("delete");
        let err = delete_activity(&ctx, activity_id)
            .await
            .expect_err("second delete");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
