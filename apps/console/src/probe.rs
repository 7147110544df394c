//! Connectivity check: hits the event list and every lookup endpoint once.

use std::fmt::Write as _;

use client_core::{ClientResult, EventStore, LookupStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub endpoint: &'static str,
    pub result: Result<usize, String>,
}

impl Probe {
    fn from_result<T>(endpoint: &'static str, result: ClientResult<Vec<T>>) -> Self {
        Self {
            endpoint,
            result: result.map(|rows| rows.len()).map_err(|err| err.to_string()),
        }
    }
}

pub async fn run_probes(events: &dyn EventStore, lookups: &dyn LookupStore) -> Vec<Probe> {
    let (list, themes, types, institutions, audiences, responsibles) = tokio::join!(
        events.list(),
        lookups.themes(),
        lookups.activity_types(),
        lookups.institutions(),
        lookups.target_audiences(),
        lookups.responsible_parties(),
    );
    vec![
        Probe::from_result("eventos", list),
        Probe::from_result("temas", themes),
        Probe::from_result("tipos", types),
        Probe::from_result("instituicoes", institutions),
        Probe::from_result("publicos-alvo", audiences),
        Probe::from_result("responsaveis", responsibles),
    ]
}

pub fn all_ok(probes: &[Probe]) -> bool {
    probes.iter().all(|probe| probe.result.is_ok())
}

pub fn render_probes(base_url: &str, probes: &[Probe]) -> String {
    let mut out = format!("API: {base_url}\n");
    for probe in probes {
        let _ = match &probe.result {
            Ok(count) => writeln!(out, "  ok    {:<14} {count} registro(s)", probe.endpoint),
            Err(message) => writeln!(out, "  falha {:<14} {message}", probe.endpoint),
        };
    }
    out
}

#[cfg(test)]
#[path = "tests/probe_tests.rs"]
mod tests;
