//! Line-oriented interactive shell driving the controller.

use anyhow::Result;
use shared::domain::{EventId, EventMode, ThemeId};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    controller::{Controller, Screen},
    ui::render,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Show(EventId),
    New,
    Edit(EventId),
    Set { field: String, value: String },
    Mode(EventMode),
    Activity { field: String, value: String },
    Unique { field: String, value: String },
    Theme(ThemeId),
    Add,
    Remove(usize),
    Lookups,
    Form,
    Save,
    Cancel,
    Delete(EventId),
    Retry,
    Dismiss,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("comando vazio")]
    Empty,
    #[error("comando desconhecido '{0}', digite 'help'")]
    Unknown(String),
    #[error("uso: {0}")]
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));
    match verb.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "help" | "?" => Ok(Command::Help),
        "list" | "ls" => Ok(Command::List),
        "show" => parse_id(rest, "show <id>").map(Command::Show),
        "new" => Ok(Command::New),
        "edit" => parse_id(rest, "edit <id>").map(Command::Edit),
        "set" => {
            parse_assignment(rest, "set <campo> <valor>").map(|(field, value)| Command::Set {
                field,
                value,
            })
        }
        "mode" => match rest.to_ascii_lowercase().as_str() {
            "multi" | "multipla" | "múltipla" => Ok(Command::Mode(EventMode::MultiActivity)),
            "unique" | "unica" | "única" => Ok(Command::Mode(EventMode::UniqueActivity)),
            _ => Err(ParseError::Usage("mode multi|unica")),
        },
        "act" => parse_assignment(rest, "act <campo> <valor>")
            .map(|(field, value)| Command::Activity { field, value }),
        "unica" => parse_assignment(rest, "unica <campo> <valor>")
            .map(|(field, value)| Command::Unique { field, value }),
        "tema" | "theme" => rest
            .parse::<i64>()
            .map(|id| Command::Theme(ThemeId(id)))
            .map_err(|_| ParseError::Usage("tema <id>")),
        "add" => Ok(Command::Add),
        "remove" | "rm" => rest
            .parse::<usize>()
            .map(Command::Remove)
            .map_err(|_| ParseError::Usage("remove <posição>")),
        "lookups" => Ok(Command::Lookups),
        "form" => Ok(Command::Form),
        "save" | "submit" => Ok(Command::Save),
        "cancel" => Ok(Command::Cancel),
        "delete" | "del" => parse_id(rest, "delete <id>").map(Command::Delete),
        "retry" => Ok(Command::Retry),
        "dismiss" => Ok(Command::Dismiss),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_id(raw: &str, usage: &'static str) -> Result<EventId, ParseError> {
    raw.parse::<i64>()
        .map(EventId)
        .map_err(|_| ParseError::Usage(usage))
}

/// `<field> <value...>`; the value may be empty to clear the field.
fn parse_assignment(raw: &str, usage: &'static str) -> Result<(String, String), ParseError> {
    let (field, value) = raw
        .split_once(char::is_whitespace)
        .map(|(field, value)| (field, value.trim()))
        .unwrap_or((raw, ""));
    if field.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    Ok((field.to_ascii_lowercase(), value.to_string()))
}

const HELP: &str = "\
Comandos:
  list                       lista os eventos
  show <id>                  detalhes de um evento
  new | edit <id>            abre o formulário
  set <campo> <valor>        titulo, data_inicio, data_fim, descricao, valor,
                             modalidade, link_inscricao, imagem_url,
                             data_limite_inscricoes
  mode multi|unica           alterna o formato do evento
  act <campo> <valor>        rascunho de atividade: nome, data, descricao, tipo,
                             horario_inicio, horario_fim, detalhe_local,
                             instituicao, publico_alvo, responsavel
  unica <campo> <valor>      atividade única (mesmos campos de horário e local)
  tema <id>                  marca/desmarca um tema
  add | remove <posição>     inclui o rascunho / remove uma atividade
  lookups | form             dados de referência / estado do formulário
  save | cancel              envia / descarta o formulário
  delete <id>                exclui um evento (pede confirmação)
  retry | dismiss            tenta novamente / fecha o aviso
  quit
";

/// Runs until `quit` or end of input.
pub async fn run<R, W>(controller: &mut Controller, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    controller.refresh().await;
    write_out(&mut output, &render::render_event_list(controller.events())).await?;
    flush_banner(controller, &mut output).await?;

    loop {
        write_out(&mut output, prompt(controller.screen())).await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(err) => {
                write_out(&mut output, &format!("{err}\n")).await?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Command::Delete(id) = command {
            write_out(&mut output, &format!("Excluir o evento #{id}? (s/N) ")).await?;
            let answer = lines.next_line().await?.unwrap_or_default();
            if !matches!(answer.trim().to_ascii_lowercase().as_str(), "s" | "sim" | "y" | "yes") {
                write_out(&mut output, "Exclusão cancelada.\n").await?;
                continue;
            }
        }
        let text = execute(controller, command).await;
        write_out(&mut output, &text).await?;
        flush_banner(controller, &mut output).await?;
    }
    Ok(())
}

/// Applies one command and returns what should be printed for it.
pub async fn execute(controller: &mut Controller, command: Command) -> String {
    match command {
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
        Command::List => {
            if controller.refresh().await {
                render::render_event_list(controller.events())
            } else {
                String::new()
            }
        }
        Command::Show(id) => controller
            .fetch_event(id)
            .await
            .map(|event| render::render_event(&event))
            .unwrap_or_default(),
        Command::New => {
            if controller.open_create().await {
                form_view(controller)
            } else {
                String::new()
            }
        }
        Command::Edit(id) => {
            if controller.open_edit(id).await {
                form_view(controller)
            } else {
                String::new()
            }
        }
        Command::Save => {
            if controller.submit().await {
                render::render_event_list(controller.events())
            } else {
                String::new()
            }
        }
        Command::Cancel => {
            controller.cancel();
            "Formulário descartado.\n".to_string()
        }
        Command::Delete(id) => {
            if controller.delete(id).await {
                render::render_event_list(controller.events())
            } else {
                String::new()
            }
        }
        Command::Retry => {
            if controller.retry().await {
                match controller.screen() {
                    Screen::Idle => render::render_event_list(controller.events()),
                    _ => form_view(controller),
                }
            } else {
                String::new()
            }
        }
        Command::Dismiss => {
            controller.dismiss_banner();
            String::new()
        }
        Command::Lookups => controller
            .lookups()
            .map(render::render_lookups)
            .unwrap_or_else(|| "Abra um formulário para carregar os dados de referência.\n".into()),
        Command::Form => form_view(controller),
        edit => edit_form(controller, edit),
    }
}

fn edit_form(controller: &mut Controller, command: Command) -> String {
    let Some((form, lookups)) = controller.form_parts() else {
        return "Nenhum formulário aberto; use 'new' ou 'edit <id>'.\n".to_string();
    };
    let result = match command {
        Command::Set { field, value } => form.set_field(&field, &value).map(|_| String::new()),
        Command::Mode(mode) => {
            form.set_mode(mode);
            Ok(format!("Formato: {}\n", render::mode_label(mode)))
        }
        Command::Activity { field, value } => {
            form.set_draft_field(&field, &value).map(|_| String::new())
        }
        Command::Unique { field, value } => {
            form.set_unique_field(&field, &value, lookups).map(|_| String::new())
        }
        Command::Theme(theme_id) => {
            let toggled = match form.mode() {
                EventMode::MultiActivity => form.toggle_draft_theme(theme_id, lookups),
                EventMode::UniqueActivity => form.toggle_unique_theme(theme_id, lookups),
            };
            toggled.map(|selected| {
                if selected {
                    format!("Tema {theme_id} marcado.\n")
                } else {
                    format!("Tema {theme_id} desmarcado.\n")
                }
            })
        }
        Command::Add => form
            .add_draft_activity(lookups)
            .map(|activity| format!("Atividade '{}' incluída.\n", activity.name)),
        Command::Remove(index) => form
            .remove_activity(index)
            .map(|activity| format!("Atividade '{}' removida.\n", activity.name)),
        _ => Ok(String::new()),
    };
    match result {
        Ok(text) => text,
        Err(err) => format!("{err}\n"),
    }
}

fn form_view(controller: &Controller) -> String {
    controller
        .form()
        .map(render::render_form)
        .unwrap_or_else(|| "Nenhum formulário aberto.\n".to_string())
}

fn prompt(screen: Screen) -> &'static str {
    match screen {
        Screen::Idle => "eventos> ",
        Screen::Creating => "novo> ",
        Screen::Editing { .. } => "editar> ",
    }
}

/// Prints the current banner. Banners without a retry are shown only once.
async fn flush_banner<W>(controller: &mut Controller, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(banner) = controller.banner().cloned() else {
        return Ok(());
    };
    if banner.retry.is_none() {
        controller.dismiss_banner();
    }
    write_out(output, &render::render_banner(&banner)).await
}

async fn write_out<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/shell_tests.rs"]
mod tests;
