// ABOUTME: Builds engine, ITSM, and callback clients from configuration.
// ABOUTME: Secrets are resolved here, right before a client needs them.

use std::path::Path;

use stagegate::approval::{CallbackTarget, HttpCallback};
use stagegate::cm::ProcessEngine;
use stagegate::config::Config;
use stagegate::error::Result;
use stagegate::itsm::Client;

/// Load the config from `path`, or discover it in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&std::env::current_dir()?),
    }
}

pub fn connect_engine(config: &Config) -> Result<ProcessEngine> {
    let engine = config.engine()?;
    Ok(ProcessEngine::new(
        &engine.program,
        engine.args.clone(),
        engine.max_connections,
    ))
}

pub fn connect_itsm(config: &Config) -> Result<Client> {
    let itsm = config.itsm()?;
    let password = itsm.password.resolve()?;
    Ok(Client::new(
        &itsm.url,
        &itsm.api_version,
        &itsm.username,
        &password,
        itsm.timeout,
    )?)
}

pub fn connect_callback(config: &Config) -> Result<(HttpCallback, CallbackTarget)> {
    let callback = config.callback()?;
    let password = callback.password.resolve()?;
    let target = CallbackTarget::new(&callback.url, &callback.username, &password);
    Ok((HttpCallback::new(callback.timeout)?, target))
}
