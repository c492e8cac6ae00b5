use super::{connect, finish, load, success, table, truncate};
use crate::cli::ProjectCommands;
use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use std::path::Path;
use yt_console::api::projects::{self, ProjectInput, AUTHORIZE_POLL_INTERVAL, AUTHORIZE_POLL_TIMEOUT};

pub async fn execute(config_path: &Path, action: ProjectCommands) -> Result<()> {
    let cfg = load(config_path)?;
    let client = connect(&cfg, "/Channel/list")?;

    match action {
        ProjectCommands::List => {
            let projects = finish(projects::list_projects(&client).await)?;
            if projects.is_empty() {
                println!("{}", "No projects".dimmed());
                return Ok(());
            }

            let mut out = table(&["ID", "NAME", "DESCRIPTION", "CHANNEL", "AUTHORIZED", "CREATED"]);
            for project in &projects {
                let authorized = if project.is_authorized() {
                    Cell::new("yes").fg(Color::Green)
                } else {
                    Cell::new("no").fg(Color::Red)
                };
                out.add_row(vec![
                    Cell::new(project.id),
                    Cell::new(&project.name),
                    Cell::new(truncate(project.description.as_deref().unwrap_or(""), 40)),
                    Cell::new(
                        project
                            .channel_title
                            .as_deref()
                            .or(project.channel_id.as_deref())
                            .unwrap_or("-"),
                    ),
                    authorized,
                    Cell::new(project.created_at.as_deref().unwrap_or("-")),
                ]);
            }
            println!("{}", out);
        }
        ProjectCommands::Create { name, description } => {
            let input = ProjectInput::new(name, description)?;
            finish(projects::create_project(&client, &input).await)?;
            success("Project created");
        }
        ProjectCommands::Update {
            id,
            name,
            description,
        } => {
            let input = ProjectInput::new(name, description)?;
            finish(projects::update_project(&client, id, &input).await)?;
            success("Project updated");
        }
        ProjectCommands::Delete { id } => {
            finish(projects::delete_project(&client, id).await)?;
            success("Project deleted");
        }
        ProjectCommands::Authorize { id, no_wait } => {
            let url = finish(projects::authorization_url(&client, id).await)?;
            println!("  Please open this URL in your browser:");
            println!();
            println!("  {}", url.green().underline());
            println!();

            if no_wait {
                return Ok(());
            }

            println!("{}", "Waiting for authorization...".yellow());
            let outcome = finish(
                projects::wait_for_authorization(
                    &client,
                    id,
                    AUTHORIZE_POLL_INTERVAL,
                    AUTHORIZE_POLL_TIMEOUT,
                )
                .await,
            )?;
            match outcome {
                Some(project) => success(&format!("Project '{}' authorized", project.name)),
                None => anyhow::bail!(
                    "Authorization not completed within {} seconds",
                    AUTHORIZE_POLL_TIMEOUT.as_secs()
                ),
            }
        }
        ProjectCommands::Sync { id } => {
            println!("{}", "Syncing...".yellow());
            finish(projects::sync_project(&client, id).await)?;
            success("Sync completed");
        }
    }

    Ok(())
}
