//! Application execution logic.
//!
//! This module wires the configured definitions and value stores into a
//! [`SettingsManager`] and runs one CLI command against it.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;

use layered_settings::config::{Command, ValidatedConfig};
use layered_settings::provider::{FileValueStore, SettingValueProvider, StaticSettingsProvider};
use layered_settings::setting::{BlankCategoryError, SettingCategory, SettingId, Value};
use layered_settings::{
    ManagedSetting, SettingValueResolver, SettingsCatalog, SettingsError, SettingsManager,
    SettingsService,
};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for command execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A settings operation failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A `set` argument is not `ID=VALUE`.
    #[error("Invalid assignment '{0}': expected 'ID=VALUE'")]
    InvalidAssignment(String),

    /// The `--category` filter is blank.
    #[error("Invalid category: {0}")]
    InvalidCategory(#[from] BlankCategoryError),

    /// The setting may not be edited.
    #[error("Setting {0} is read-only")]
    ReadOnly(SettingId),

    /// Writing command output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Builds the manager over the configured definitions and value stores.
fn build_manager(config: &ValidatedConfig) -> SettingsManager {
    let catalog = SettingsCatalog::new(vec![Arc::new(StaticSettingsProvider::new(
        config.settings.clone(),
    ))]);

    let stores: Vec<Arc<dyn SettingValueProvider>> = config
        .stores
        .iter()
        .map(|store| {
            Arc::new(FileValueStore::new(&store.path, store.rank)) as Arc<dyn SettingValueProvider>
        })
        .collect();
    tracing::debug!("Opened {} value store(s)", stores.len());

    SettingsManager::new(SettingsService::new(
        catalog,
        SettingValueResolver::new(stores),
    ))
}

/// Executes `command` (default: `list`) and prints its output to stdout.
///
/// # Errors
///
/// Returns an error if the command fails; nothing is left staged.
pub async fn execute(config: ValidatedConfig, command: Option<Command>) -> Result<(), RunError> {
    let mut stdout = std::io::stdout().lock();
    execute_with(&config, command, &mut stdout).await
}

async fn execute_with<W: Write>(
    config: &ValidatedConfig,
    command: Option<Command>,
    out: &mut W,
) -> Result<(), RunError> {
    let mut manager = build_manager(config);

    match command {
        None | Some(Command::Init { .. }) => list(&mut manager, None, 0, config.page_size, out).await,
        Some(Command::List {
            category,
            skip,
            take,
        }) => {
            let category = category.map(SettingCategory::new).transpose()?;
            let take = take.unwrap_or(config.page_size);
            list(&mut manager, category.as_ref(), skip, take, out).await
        }
        Some(Command::Get { id }) => get(&mut manager, id, out).await,
        Some(Command::Set { assignments }) => set(&mut manager, &assignments, out).await,
        Some(Command::Delete { id }) => delete(&mut manager, id, out).await,
    }
}

async fn list<W: Write>(
    manager: &mut SettingsManager,
    category: Option<&SettingCategory>,
    skip: usize,
    take: usize,
    out: &mut W,
) -> Result<(), RunError> {
    let page = manager.get_settings_by_page(category, skip, take).await?;

    for managed in &page.items {
        writeln!(out, "{}", format_line(managed))?;
    }
    writeln!(
        out,
        "-- {} of {} setting(s), starting at {}",
        page.items.len(),
        page.total,
        page.skip
    )?;
    Ok(())
}

async fn get<W: Write>(
    manager: &mut SettingsManager,
    id: SettingId,
    out: &mut W,
) -> Result<(), RunError> {
    let pair = manager.service_mut().get_effective_value_pair(id).await?;
    writeln!(out, "{} = {}", pair.setting().name, pair.value())?;
    Ok(())
}

/// Validates every assignment, then applies them as one batch.
async fn set<W: Write>(
    manager: &mut SettingsManager,
    assignments: &[String],
    out: &mut W,
) -> Result<(), RunError> {
    let parsed = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>, _>>()?;
    let page = manager.get_settings_by_page(None, 0, usize::MAX).await?;

    for &(id, text) in &parsed {
        let managed = find(&page.items, id)?;
        let setting = managed.setting();
        if setting.is_read_only {
            manager.reset_staged_updates();
            return Err(RunError::ReadOnly(id));
        }

        let staged = Value::parse(setting.kind(), text)
            .and_then(|value| manager.stage_setting_update(managed, value));
        if let Err(e) = staged {
            manager.reset_staged_updates();
            return Err(e.into());
        }
    }

    // Nothing stored anywhere yet: seed the first store so new ids have an owner
    if !manager.service().values().has_values() {
        if let Some(&(id, _)) = parsed.first() {
            let value = find(&page.items, id)?.pair().setting_value();
            manager.service_mut().create_setting_value(value).await?;
        }
    }

    let count = manager.staged_count();
    manager.apply_settings().await?;
    writeln!(out, "Applied {count} value(s)")?;
    Ok(())
}

async fn delete<W: Write>(
    manager: &mut SettingsManager,
    id: SettingId,
    out: &mut W,
) -> Result<(), RunError> {
    let service = manager.service_mut();
    let setting = service.get_setting(id).await?;
    service.delete_setting_value(id).await?;
    writeln!(out, "Removed stored value of {}", setting.name)?;
    Ok(())
}

fn find(items: &[ManagedSetting], id: SettingId) -> Result<&ManagedSetting, SettingsError> {
    items
        .iter()
        .find(|m| m.setting_id() == id)
        .ok_or_else(|| SettingsError::setting_not_found(id))
}

fn parse_assignment(s: &str) -> Result<(SettingId, &str), RunError> {
    let invalid = || RunError::InvalidAssignment(s.to_string());
    let (id, value) = s.split_once('=').ok_or_else(invalid)?;
    let id = id.trim().parse::<SettingId>().map_err(|_| invalid())?;
    Ok((id, value))
}

fn format_line(managed: &ManagedSetting) -> String {
    let setting = managed.setting();
    let category = setting
        .category
        .as_ref()
        .map_or("-", SettingCategory::name);
    format!(
        "{:>4}  {:<24} {:<10} {:<12} {}",
        setting.id,
        setting.name,
        setting.kind().as_str(),
        category,
        managed.value()
    )
}
