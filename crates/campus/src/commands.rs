use campus_backend::{FileUpdate, Semester};
use campus_core::{ConfigurationManager, JsonPreferences, UpdateCallbacks};
use campus_platform::AppPaths;
use log::{debug, info};

use crate::error::AppError;
use crate::lock::UpdateLock;

pub async fn status(manager: &ConfigurationManager, paths: &AppPaths) -> Result<(), AppError> {
    if !manager.init().await {
        return Err(AppError::ConfigurationUnavailable);
    }

    if let Some(university) = manager.university() {
        let name = university.name().unwrap_or("(unnamed)");
        match university.short_name() {
            Some(short_name) => println!("University: {name} ({short_name})"),
            None => println!("University: {name}"),
        }
    }

    if let Some(bus) = manager.city_bus_info() {
        let link = bus.link().unwrap_or(manager.default_link());
        println!("City buses: {} <{link}>", bus.name().unwrap_or("(unnamed)"));
    }

    let current = JsonPreferences::new(paths.preferences_file())
        .current_semester()
        .await
        .unwrap_or(0);
    let semesters = manager.available_semesters();
    if semesters.is_empty() {
        println!("Semesters: none");
    } else {
        println!("Semesters:");
        for (index, semester) in semesters.iter().enumerate() {
            println!("{}", format_semester(index, semester, index == current));
        }
    }

    Ok(())
}

pub async fn check(manager: &ConfigurationManager) -> Result<(), AppError> {
    if !manager
        .is_config_update_available()
        .await
        .map_err(AppError::update_check_failed)?
    {
        println!("Configuration is up to date.");
        return Ok(());
    }

    println!("Updates available:");
    for update in manager.pending_updates() {
        println!("{}", format_update(&update));
    }
    Ok(())
}

pub async fn update(manager: &ConfigurationManager, paths: &AppPaths) -> Result<(), AppError> {
    let _lock = UpdateLock::acquire(&paths.update_lock_file())
        .map_err(|error| AppError::update_failed("locking", error))?;

    if !manager
        .is_config_update_available()
        .await
        .map_err(AppError::update_check_failed)?
    {
        println!("Configuration is up to date.");
        return Ok(());
    }

    let pending = manager.pending_updates();
    manager
        .update_config(&progress_callbacks())
        .await
        .map_err(|error| AppError::update_failed("download", error))?;

    println!(
        "Installed {} file(s), {}.",
        pending.len(),
        format_size(pending.iter().map(|update| update.size).sum())
    );
    if !manager.init().await {
        return Err(AppError::ConfigurationUnavailable);
    }
    Ok(())
}

pub async fn show(manager: &ConfigurationManager, file: &str) -> Result<(), AppError> {
    let value = manager
        .get_config(file)
        .await
        .map_err(|error| AppError::operation_failed("Reading configuration file", error))?;
    let content = serde_json::to_string_pretty(&value)
        .map_err(|error| AppError::operation_failed("Formatting configuration file", error))?;
    println!("{content}");
    Ok(())
}

pub async fn reset(manager: &ConfigurationManager) -> Result<(), AppError> {
    manager
        .delete_configuration()
        .await
        .map_err(|error| AppError::operation_failed("Resetting configuration", error))?;
    println!("Configuration deleted.");
    Ok(())
}

fn progress_callbacks() -> UpdateCallbacks {
    UpdateCallbacks::new()
        .on_update_start(|total_size, total_files| {
            info!(
                "Downloading {total_files} file(s), {}",
                format_size(total_size)
            );
        })
        .on_download_start(|begin| {
            debug!(
                "[{}] {} started ({})",
                begin.job_id,
                begin.filename,
                format_size(begin.content_length)
            );
        })
        .on_download_progress(|progress| {
            if progress.content_length > 0 {
                debug!(
                    "[{}] {}%",
                    progress.job_id,
                    progress.bytes_written * 100 / progress.content_length
                );
            }
        })
        .on_download_complete(|complete| {
            info!(
                "Downloaded {} ({})",
                complete.filename,
                format_size(complete.bytes_written)
            );
        })
}

fn format_update(update: &FileUpdate) -> String {
    format!(
        "  {}: v{} -> v{} ({})",
        update.name,
        update.old_version,
        update.new_version,
        format_size(update.size)
    )
}

fn format_semester(index: usize, semester: &Semester, selected: bool) -> String {
    let marker = if selected { '*' } else { ' ' };
    let label = match (semester.name(), semester.code()) {
        (Some(name), Some(code)) => format!("{name} ({code})"),
        (Some(label), None) | (None, Some(label)) => label.to_string(),
        (None, None) => "(unnamed)".to_string(),
    };
    if semester.is_current() {
        format!("{marker} [{index}] {label} [current term]")
    } else {
        format!("{marker} [{index}] {label}")
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
