//! Repository management commands

use console::style;
use indicatif::ProgressBar;
use packdex_repo::{RepoAuth, RepoManager, RepoError, RepositoryEntry, SyncOutcome};
use serde::Serialize;
use std::time::Duration;

use super::{OutputFormat, print_structured, print_table};
use crate::error::{CliError, Result};

/// Build credentials from `repo add` flags
pub fn auth_from_flags(
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
) -> Result<Option<RepoAuth>> {
    match (username, password, token) {
        (None, None, None) => Ok(None),
        (None, None, Some(token)) => Ok(Some(RepoAuth::bearer(token))),
        (Some(user), Some(pass), None) => Ok(Some(RepoAuth::basic(user, pass))),
        _ => Err(CliError::input(
            "Please provide both username and password, or a token",
        )),
    }
}

/// Add a new repository
pub fn add(
    manager: &RepoManager,
    name: &str,
    url: &str,
    auth: Option<RepoAuth>,
    insecure_skip_tls_verify: bool,
) -> Result<()> {
    let mut entry = RepositoryEntry::new(name, url)?;
    entry.auth = auth;
    entry.insecure_skip_tls_verify = insecure_skip_tls_verify;

    manager.add_repository(entry)?;

    println!("\"{}\" has been added to your repositories", name);
    println!();
    println!("Run 'packdex repo update' to fetch the index");
    Ok(())
}

#[derive(Serialize)]
struct RepoListing<'a> {
    name: &'a str,
    url: &'a str,
}

/// List configured repositories
pub fn list(manager: &RepoManager, output: OutputFormat) -> Result<()> {
    let repositories = manager.list_repositories()?;
    let listing: Vec<_> = repositories
        .iter()
        .map(|r| RepoListing {
            name: &r.name,
            url: &r.url,
        })
        .collect();

    if print_structured(&listing, output)? {
        return Ok(());
    }

    if listing.is_empty() {
        println!("No repositories configured.");
        println!();
        println!("Add one with: packdex repo add <name> <url>");
        return Ok(());
    }

    let rows: Vec<_> = listing
        .iter()
        .map(|r| vec![r.name.to_string(), r.url.to_string()])
        .collect();
    print_table(&["NAME", "URL"], &rows);
    Ok(())
}

/// Remove repositories, stopping at the first unknown name
pub fn remove(manager: &RepoManager, names: &[String]) -> Result<()> {
    for entry in manager.remove_repositories(names)? {
        println!("\"{}\" has been removed from your repositories", entry.name);
    }
    Ok(())
}

/// Refresh every repository index
pub async fn update(manager: &RepoManager) -> Result<()> {
    println!("Hang tight while we grab the latest from your chart repositories...");

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("fetching repository indexes");

    let reports = manager.sync_repositories().await;
    spinner.finish_and_clear();

    let reports = match reports {
        Err(RepoError::NoRepositories) => {
            return Err(CliError::input_with_help(
                "no repositories found. You must add one before updating",
                "Add one with 'packdex repo add <name> <url>'",
            ));
        }
        other => other?,
    };

    let mut failed = 0;
    for report in &reports {
        match &report.outcome {
            SyncOutcome::Success { packages } => println!(
                "...Successfully got an update from the {} chart repository ({} charts)",
                style(format!("\"{}\"", report.repository_name)).cyan(),
                packages
            ),
            SyncOutcome::Failure(reason) => {
                failed += 1;
                println!(
                    "...{} to get an update from the {} chart repository:\n\t{}",
                    style("Unable").yellow(),
                    style(format!("\"{}\"", report.repository_name)).cyan(),
                    reason
                );
            }
        }
    }

    if failed == 0 {
        println!("Update Complete.");
    } else {
        println!(
            "Update Complete. {} of {} repositories could not be updated.",
            failed,
            reports.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_auth_from_flags() {
        assert_eq!(auth_from_flags(None, None, None).unwrap(), None);
        assert_eq!(
            auth_from_flags(None, None, some("t0ken")).unwrap(),
            Some(RepoAuth::bearer("t0ken"))
        );
        assert_eq!(
            auth_from_flags(some("admin"), some("hunter2"), None).unwrap(),
            Some(RepoAuth::basic("admin", "hunter2"))
        );
        assert!(auth_from_flags(some("admin"), None, None).is_err());
        assert!(auth_from_flags(some("admin"), some("hunter2"), some("t0ken")).is_err());
    }
}
