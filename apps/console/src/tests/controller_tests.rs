use client_core::{DeleteOutcome, OperationFailure};
use shared::domain::{EventMode, ThemeId};

use super::*;
use crate::{
    controller::events::{BannerKind, UiErrorCategory},
    test_support::{stored_event, FakeHandle},
};

fn controller_over(handle: &Arc<FakeHandle>) -> Controller {
    Controller::new(Arc::clone(handle) as Arc<dyn EventHandle>)
}

#[tokio::test]
async fn refresh_failure_offers_a_reload_retry() {
    let handle = FakeHandle::with_events(vec![stored_event(1, "Tech Talk")]);
    handle.fail("list");
    let mut controller = controller_over(&handle);

    assert!(!controller.refresh().await);
    let banner = controller.banner().expect("banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.category, Some(UiErrorCategory::Transport));
    assert_eq!(banner.retry, Some(RetryAction::ReloadEvents));

    handle.heal("list");
    assert!(controller.retry().await);
    assert!(controller.banner().is_none());
    assert_eq!(controller.events().len(), 1);
}

#[tokio::test]
async fn create_flow_returns_to_idle_with_success_banner() {
    let handle = FakeHandle::with_events(Vec::new());
    let mut controller = controller_over(&handle);

    assert!(controller.open_create().await);
    assert_eq!(controller.screen(), Screen::Creating);
    {
        let (form, lookups) = controller.form_parts().expect("form");
        form.set_field("titulo", "Tech Talk").expect("title");
        form.set_mode(EventMode::MultiActivity);
        for name in ["Abertura", "Painel"] {
            form.set_draft_field("nome", name).expect("name");
            form.add_draft_activity(lookups).expect("add");
        }
    }
    // nothing but the lookups went out before submit
    assert_eq!(handle.calls(), vec!["lookups".to_string()]);

    assert!(controller.submit().await);

    assert_eq!(controller.screen(), Screen::Idle);
    assert!(controller.form().is_none());
    let banner = controller.banner().expect("banner");
    assert_eq!(banner.kind, BannerKind::Success);
    assert!(banner.message.contains("Tech Talk"));
    assert_eq!(controller.events().len(), 1);
    assert_eq!(controller.events()[0].activities.len(), 2);
    assert_eq!(handle.calls(), vec!["lookups", "create", "list"]);
}

#[tokio::test]
async fn lookup_failure_keeps_the_form_closed_until_retry() {
    let handle = FakeHandle::with_events(Vec::new());
    handle.fail("lookups");
    let mut controller = controller_over(&handle);

    assert!(!controller.open_create().await);
    assert_eq!(controller.screen(), Screen::Idle);
    assert!(controller.form().is_none());
    assert_eq!(
        controller.banner().and_then(|banner| banner.retry),
        Some(RetryAction::ReloadLookups(LookupTarget::Create))
    );

    handle.heal("lookups");
    assert!(controller.retry().await);
    assert_eq!(controller.screen(), Screen::Creating);
    assert!(controller.lookups().is_some());
}

#[tokio::test]
async fn missing_title_never_reaches_the_api() {
    let handle = FakeHandle::with_events(Vec::new());
    let mut controller = controller_over(&handle);
    controller.open_create().await;

    assert!(!controller.submit().await);

    assert_eq!(controller.screen(), Screen::Creating);
    let banner = controller.banner().expect("banner");
    assert_eq!(banner.category, Some(UiErrorCategory::Validation));
    assert_eq!(handle.calls(), vec!["lookups".to_string()]);
}

#[tokio::test]
async fn aggregate_failure_keeps_the_form_open_with_details() {
    let handle = FakeHandle::with_events(Vec::new());
    handle.fail("create");
    let mut controller = controller_over(&handle);
    controller.open_create().await;
    controller
        .form_parts()
        .expect("form")
        .0
        .set_field("titulo", "Tech Talk")
        .expect("title");

    assert!(!controller.submit().await);

    assert_eq!(
        controller.form().map(|form| form.fields().title.clone()),
        Some("Tech Talk".to_string())
    );
    let banner = controller.banner().expect("banner");
    assert_eq!(banner.category, Some(UiErrorCategory::Aggregate));
    assert_eq!(banner.details.len(), 1);
    assert!(banner.details[0].starts_with("create activity"));

    controller.dismiss_banner();
    assert!(controller.banner().is_none());
}

#[tokio::test]
async fn saving_again_after_a_partial_create_updates_instead_of_duplicating() {
    let handle = FakeHandle::with_events(Vec::new());
    handle.fail("create");
    let mut controller = controller_over(&handle);
    controller.open_create().await;
    {
        let (form, lookups) = controller.form_parts().expect("form");
        form.set_field("titulo", "Hackathon").expect("title");
        form.set_mode(EventMode::MultiActivity);
        form.set_draft_field("nome", "Mentoria").expect("name");
        form.add_draft_activity(lookups).expect("add");
    }

    assert!(!controller.submit().await);

    assert_eq!(controller.screen(), Screen::Editing { id: EventId(1) });
    assert_eq!(
        controller.form().and_then(|form| form.event_id()),
        Some(EventId(1))
    );
    assert_eq!(handle.stored().len(), 1);

    handle.heal("create");
    assert!(controller.submit().await);

    assert_eq!(handle.calls(), vec!["lookups", "create", "update 1", "list"]);
    let stored = handle.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].activities.len(), 1);
    assert!(controller
        .banner()
        .is_some_and(|banner| banner.message.contains("atualizado")));
}

#[tokio::test]
async fn failed_reload_after_save_keeps_the_success_message() {
    let handle = FakeHandle::with_events(Vec::new());
    let mut controller = controller_over(&handle);
    controller.open_create().await;
    controller
        .form_parts()
        .expect("form")
        .0
        .set_field("titulo", "Tech Talk")
        .expect("title");
    handle.fail("list");

    assert!(controller.submit().await);

    assert_eq!(controller.screen(), Screen::Idle);
    let banner = controller.banner().expect("banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.retry, Some(RetryAction::ReloadEvents));
    assert_eq!(banner.details, vec!["Evento 'Tech Talk' criado com sucesso"]);
}

#[tokio::test]
async fn edit_prepopulates_and_updates() {
    let handle = FakeHandle::with_events(vec![stored_event(4, "Meetup")]);
    let mut controller = controller_over(&handle);

    assert!(controller.open_edit(EventId(4)).await);
    assert_eq!(controller.screen(), Screen::Editing { id: EventId(4) });
    {
        let (form, lookups) = controller.form_parts().expect("form");
        assert_eq!(form.fields().title, "Meetup");
        form.set_field("titulo", "Meetup de Rust").expect("title");
        form.toggle_unique_theme(ThemeId(1), lookups).expect("theme");
    }

    assert!(controller.submit().await);

    let stored = handle.stored();
    assert_eq!(stored[0].fields.title, "Meetup de Rust");
    assert_eq!(stored[0].unique_activities.len(), 1);
    assert!(handle.calls().contains(&"update 4".to_string()));
    assert!(controller
        .banner()
        .is_some_and(|banner| banner.message.contains("atualizado")));
}

#[tokio::test]
async fn cancel_makes_no_network_call() {
    let handle = FakeHandle::with_events(vec![stored_event(4, "Meetup")]);
    let mut controller = controller_over(&handle);
    controller.open_edit(EventId(4)).await;
    let before = handle.calls().len();

    controller.cancel();

    assert_eq!(controller.screen(), Screen::Idle);
    assert!(controller.form().is_none());
    assert_eq!(handle.calls().len(), before);
}

#[tokio::test]
async fn delete_with_child_failures_warns() {
    let handle = FakeHandle::with_events(vec![stored_event(2, "Workshop")]);
    handle.set_delete_outcome(DeleteOutcome {
        activities_deleted: 2,
        unique_activities_deleted: 1,
        child_failures: vec![OperationFailure {
            operation: "delete activity 9".into(),
            message: "DELETE atividades/9 failed with status 500".into(),
        }],
    });
    let mut controller = controller_over(&handle);

    assert!(controller.delete(EventId(2)).await);

    let banner = controller.banner().expect("banner");
    assert_eq!(banner.kind, BannerKind::Warning);
    assert_eq!(banner.details.len(), 1);
    assert!(controller.events().is_empty());
}

#[tokio::test]
async fn failed_delete_shows_an_error() {
    let handle = FakeHandle::with_events(vec![stored_event(2, "Workshop")]);
    handle.fail("delete");
    let mut controller = controller_over(&handle);

    assert!(!controller.delete(EventId(2)).await);
    assert_eq!(
        controller.banner().map(|banner| banner.kind),
        Some(BannerKind::Error)
    );
    assert_eq!(handle.stored().len(), 1);
}
