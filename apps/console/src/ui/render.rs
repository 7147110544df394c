use std::fmt::Write as _;

use chrono::NaiveDate;
use client_core::LookupData;
use shared::{
    domain::EventMode,
    protocol::{Activity, Event, EventFields, Theme, UniqueActivity},
};

use crate::controller::{
    events::{Banner, BannerKind},
    form::EventForm,
};

const UNDEFINED_DATE: &str = "Data não definida";

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| UNDEFINED_DATE.to_string())
}

/// A single date when both ends agree or the end is missing.
pub fn format_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (None, _) => UNDEFINED_DATE.to_string(),
        (Some(start), Some(end)) if end != start => {
            format!("{} até {}", format_date(Some(start)), format_date(Some(end)))
        }
        (Some(start), _) => format_date(Some(start)),
    }
}

pub fn mode_label(mode: EventMode) -> &'static str {
    match mode {
        EventMode::MultiActivity => "Múltiplas atividades",
        EventMode::UniqueActivity => "Atividade única",
    }
}

fn event_mode_label(event: &Event) -> &'static str {
    if !event.activities.is_empty() {
        mode_label(EventMode::MultiActivity)
    } else if !event.unique_activities.is_empty() {
        mode_label(EventMode::UniqueActivity)
    } else {
        "Sem atividades"
    }
}

pub fn render_event_list(events: &[Event]) -> String {
    if events.is_empty() {
        return "Nenhum evento cadastrado.\n".to_string();
    }
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "[{}] {} | {} | {}",
            event.id,
            event.fields.title,
            format_date_range(event.fields.start_date, event.fields.end_date),
            event_mode_label(event)
        );
    }
    out
}

pub fn render_event(event: &Event) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", event.id, event.fields.title);
    render_fields(&mut out, &event.fields);
    let _ = writeln!(out, "  Formato: {}", event_mode_label(event));

    if !event.activities.is_empty() {
        let _ = writeln!(out, "  Atividades ({}):", event.activities.len());
        for activity in &event.activities {
            render_activity(&mut out, activity);
        }
    }
    for unique in &event.unique_activities {
        let _ = writeln!(out, "  Atividade única:");
        render_unique(&mut out, unique);
    }
    out
}

fn render_fields(out: &mut String, fields: &EventFields) {
    if let Some(description) = &fields.description {
        let _ = writeln!(out, "  {description}");
    }
    let _ = writeln!(
        out,
        "  Data: {}",
        format_date_range(fields.start_date, fields.end_date)
    );
    if let Some(modality) = fields.modality {
        let _ = writeln!(out, "  Modalidade: {}", modality.label());
    }
    if let Some(price) = &fields.price {
        let _ = writeln!(out, "  Valor: {price}");
    }
    if fields.registration_deadline.is_some() {
        let _ = writeln!(
            out,
            "  Inscrições até: {}",
            format_date(fields.registration_deadline)
        );
    }
    if let Some(link) = &fields.registration_link {
        let _ = writeln!(out, "  Link de inscrição: {link}");
    }
    if let Some(image) = &fields.image_url {
        let _ = writeln!(out, "  Imagem: {image}");
    }
}

fn render_activity(out: &mut String, activity: &Activity) {
    let id = activity
        .id
        .map(|id| format!("#{id} "))
        .unwrap_or_else(|| "(nova) ".to_string());
    let _ = write!(out, "    - {id}{}", activity.name);
    if let Some(date) = activity.date {
        let _ = write!(out, " em {}", format_date(Some(date)));
    }
    let _ = writeln!(out);
    render_schedule(
        out,
        &activity.start_time,
        &activity.end_time,
        &activity.location_detail,
    );
    if let Some(kind) = &activity.activity_type {
        let _ = writeln!(out, "      Tipo: {}", kind.name);
    }
    render_parties(
        out,
        activity.responsible.as_ref().map(|party| party.name.as_str()),
        activity.institution.as_ref().map(|inst| inst.name.as_str()),
        activity
            .audience
            .as_ref()
            .map(|audience| audience.description.as_str()),
    );
    render_themes(out, &activity.themes);
}

fn render_unique(out: &mut String, activity: &UniqueActivity) {
    render_schedule(
        out,
        &activity.start_time,
        &activity.end_time,
        &activity.location_detail,
    );
    render_parties(
        out,
        activity.responsible.as_ref().map(|party| party.name.as_str()),
        activity.institution.as_ref().map(|inst| inst.name.as_str()),
        activity
            .audience
            .as_ref()
            .map(|audience| audience.description.as_str()),
    );
    render_themes(out, &activity.themes);
}

fn render_schedule(
    out: &mut String,
    start: &Option<String>,
    end: &Option<String>,
    location: &Option<String>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        let _ = writeln!(out, "      Horário: {start} - {end}");
    }
    if let Some(location) = location {
        let _ = writeln!(out, "      Local: {location}");
    }
}

fn render_parties(
    out: &mut String,
    responsible: Option<&str>,
    institution: Option<&str>,
    audience: Option<&str>,
) {
    if let Some(name) = responsible {
        let _ = writeln!(out, "      Responsável: {name}");
    }
    if let Some(name) = institution {
        let _ = writeln!(out, "      Instituição: {name}");
    }
    if let Some(description) = audience {
        let _ = writeln!(out, "      Público-alvo: {description}");
    }
}

fn render_themes(out: &mut String, themes: &[Theme]) {
    if themes.is_empty() {
        return;
    }
    let names: Vec<&str> = themes.iter().map(|theme| theme.name.as_str()).collect();
    let _ = writeln!(out, "      Temas: {}", names.join(", "));
}

pub fn render_form(form: &EventForm) -> String {
    let mut out = String::new();
    let heading = match form.event_id() {
        Some(id) => format!("Editando evento #{id}"),
        None => "Novo evento".to_string(),
    };
    let title = if form.fields().title.is_empty() {
        "(sem título)"
    } else {
        form.fields().title.as_str()
    };
    let _ = writeln!(out, "{heading}: {title}");
    render_fields(&mut out, form.fields());
    let _ = writeln!(out, "  Formato: {}", mode_label(form.mode()));

    match form.mode() {
        EventMode::MultiActivity => {
            let _ = writeln!(out, "  Atividades ({}):", form.activities().len());
            for (index, activity) in form.activities().iter().enumerate() {
                let _ = write!(out, "   [{index}]");
                render_activity(&mut out, activity);
            }
            let draft = form.draft();
            if !draft.name.is_empty() {
                let _ = writeln!(out, "  Rascunho: {}", draft.name);
            }
        }
        EventMode::UniqueActivity => {
            if form.unique().has_content() {
                let _ = writeln!(out, "  Atividade única:");
                render_unique(&mut out, form.unique());
            } else {
                let _ = writeln!(out, "  Atividade única: (vazia, não será enviada)");
            }
        }
    }
    out
}

/// Reference ids the user can type into the form.
pub fn render_lookups(lookups: &LookupData) -> String {
    let mut out = String::new();
    let mut section = |heading: &str, rows: Vec<(i64, &str)>| {
        let _ = writeln!(out, "{heading}:");
        if rows.is_empty() {
            let _ = writeln!(out, "  (nenhum)");
        }
        for (id, label) in rows {
            let _ = writeln!(out, "  {id}: {label}");
        }
    };
    section(
        "Temas",
        lookups.themes.iter().map(|t| (t.id.0, t.name.as_str())).collect(),
    );
    section(
        "Tipos",
        lookups
            .activity_types
            .iter()
            .map(|t| (t.id.0, t.name.as_str()))
            .collect(),
    );
    section(
        "Instituições",
        lookups
            .institutions
            .iter()
            .map(|i| (i.id.0, i.name.as_str()))
            .collect(),
    );
    section(
        "Públicos-alvo",
        lookups
            .target_audiences
            .iter()
            .map(|a| (a.id.0, a.description.as_str()))
            .collect(),
    );
    section(
        "Responsáveis",
        lookups
            .responsible_parties
            .iter()
            .map(|r| (r.id.0, r.name.as_str()))
            .collect(),
    );
    out
}

pub fn render_banner(banner: &Banner) -> String {
    let tag = match banner.kind {
        BannerKind::Success => "ok",
        BannerKind::Warning => "aviso",
        BannerKind::Error => "erro",
    };
    let mut out = format!("[{tag}] {}\n", banner.message);
    for detail in &banner.details {
        let _ = writeln!(out, "  - {detail}");
    }
    if banner.retry.is_some() {
        out.push_str("  (digite 'retry' para tentar novamente ou 'dismiss' para fechar)\n");
    }
    out
}

#[cfg(test)]
#[path = "../tests/render_tests.rs"]
mod tests;
