//! Built-in scenarios
//!
//! Both ship as YAML inside the binary. The reservation journey starts by
//! replaying the login steps inline, with the login verdict turned into a
//! checkpoint: a failed login ends the run before any store is touched.
//! The replay takes no screenshots, so the reservation files are numbered
//! from its first own checkpoint (`reservation_01_list.png`).

use super::config::{Scenario, Step, Vars};
use crate::common::{Config, Error, Result};

const LOGIN_YAML: &str = include_str!("../../scenarios/login.yaml");
const RESERVATION_YAML: &str = include_str!("../../scenarios/reservation.yaml");

/// Names accepted by [`by_name`]
pub const NAMES: &[&str] = &["login", "reservation"];

/// Template variables drawn from configuration
pub fn vars(config: &Config) -> Vars {
    let mut vars = Vars::new();
    vars.insert(
        "base_url",
        config.target.base_url.trim_end_matches('/').to_string(),
    );
    vars.insert("email", config.credentials.email.clone());
    vars.insert("password", config.credentials.password.clone());
    vars
}

/// The login scenario
pub fn login(config: &Config) -> Result<Scenario> {
    let mut scenario = Scenario::from_yaml("login", LOGIN_YAML)?;
    scenario.render(&vars(config));
    Ok(scenario)
}

/// The reservation scenario, login phase included
pub fn reservation(config: &Config) -> Result<Scenario> {
    let login = login(config)?;
    let mut scenario = Scenario::from_yaml("reservation", RESERVATION_YAML)?;
    scenario.render(&vars(config));

    let mut steps: Vec<Step> = login
        .steps
        .into_iter()
        .filter_map(|step| match step {
            Step::Screenshot { .. } => None,
            Step::Classify {
                success,
                failure,
                timeout_secs,
                ..
            } => Some(Step::Classify {
                success,
                failure,
                timeout_secs,
                stop_on_failure: true,
            }),
            other => Some(other),
        })
        .collect();
    steps.append(&mut scenario.steps);
    scenario.steps = steps;
    scenario.url = scenario.url.or(login.url);

    Ok(scenario)
}

/// Look up a built-in scenario by name
pub fn by_name(name: &str, config: &Config) -> Result<Scenario> {
    match name {
        "login" => login(config),
        "reservation" | "reserve" => reservation(config),
        _ => Err(Error::Config(format!(
            "Unknown scenario '{}'. Built-in scenarios: {}",
            name,
            NAMES.join(", ")
        ))),
    }
}
