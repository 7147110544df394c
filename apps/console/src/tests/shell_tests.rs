use std::sync::Arc;

use client_core::EventHandle;

use super::*;
use crate::test_support::{stored_event, FakeHandle};

#[test]
fn parses_commands_and_arguments() {
    assert_eq!(parse_command("  list "), Ok(Command::List));
    assert_eq!(parse_command("show 12"), Ok(Command::Show(EventId(12))));
    assert_eq!(
        parse_command("set titulo  Tech Talk 2025 "),
        Ok(Command::Set {
            field: "titulo".into(),
            value: "Tech Talk 2025".into()
        })
    );
    assert_eq!(
        parse_command("set descricao"),
        Ok(Command::Set {
            field: "descricao".into(),
            value: String::new()
        })
    );
    assert_eq!(
        parse_command("mode multi"),
        Ok(Command::Mode(EventMode::MultiActivity))
    );
    assert_eq!(parse_command("tema 3"), Ok(Command::Theme(ThemeId(3))));
    assert_eq!(parse_command("rm 0"), Ok(Command::Remove(0)));
    assert_eq!(parse_command("QUIT"), Ok(Command::Quit));
}

#[test]
fn rejects_bad_input() {
    assert_eq!(parse_command("   "), Err(ParseError::Empty));
    assert_eq!(
        parse_command("launch"),
        Err(ParseError::Unknown("launch".into()))
    );
    assert!(matches!(parse_command("show abc"), Err(ParseError::Usage(_))));
    assert!(matches!(parse_command("mode sideways"), Err(ParseError::Usage(_))));
    assert!(matches!(parse_command("set"), Err(ParseError::Usage(_))));
}

async fn run_script(handle: &Arc<FakeHandle>, script: &str) -> String {
    let mut controller = Controller::new(Arc::clone(handle) as Arc<dyn EventHandle>);
    let mut output = Vec::new();
    run(&mut controller, script.as_bytes(), &mut output)
        .await
        .expect("shell");
    String::from_utf8(output).expect("utf8")
}

#[tokio::test]
async fn scripted_session_creates_an_event() {
    let handle = FakeHandle::with_events(Vec::new());
    let script = "new\nset titulo Tech Talk\nmode multi\nact nome Abertura\nadd\nact nome Painel\nadd\nsave\nquit\n";

    let output = run_script(&handle, script).await;

    assert!(output.contains("Nenhum evento cadastrado."));
    assert!(output.contains("Atividade 'Painel' incluída."));
    assert!(output.contains("[ok] Evento 'Tech Talk' criado com sucesso"));
    let stored = handle.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].activities.len(), 2);
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let handle = FakeHandle::with_events(vec![stored_event(1, "Workshop")]);

    let output = run_script(&handle, "delete 1\nn\n").await;
    assert!(output.contains("Exclusão cancelada."));
    assert_eq!(handle.stored().len(), 1);

    run_script(&handle, "delete 1\ns\n").await;
    assert!(handle.stored().is_empty());
    assert!(handle.calls().contains(&"delete 1".to_string()));
}

#[tokio::test]
async fn form_edits_without_open_form_are_refused() {
    let handle = FakeHandle::with_events(Vec::new());
    let output = run_script(&handle, "set titulo X\nbogus\n").await;
    assert!(output.contains("Nenhum formulário aberto"));
    assert!(output.contains("comando desconhecido 'bogus'"));
}
