use super::{connect, finish, load, success, table, truncate};
use crate::cli::MonitorCommands;
use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use std::path::Path;
use yt_console::api::monitor::{self, NewMonitorChannel};

pub async fn execute(config_path: &Path, action: MonitorCommands) -> Result<()> {
    let cfg = load(config_path)?;
    let client = connect(&cfg, "/Channel/monitor")?;

    match action {
        MonitorCommands::List => {
            let channels = finish(monitor::list_channels(&client).await)?;
            if channels.is_empty() {
                println!("{}", "No monitored channels".dimmed());
                return Ok(());
            }

            let mut out = table(&["ID", "CHANNEL ID", "NAME", "REMARK", "CREATED"]);
            for channel in &channels {
                out.add_row(vec![
                    Cell::new(channel.id),
                    Cell::new(&channel.channel_id),
                    Cell::new(&channel.channel_name),
                    Cell::new(truncate(channel.remark.as_deref().unwrap_or(""), 40)),
                    Cell::new(channel.created_at.as_deref().unwrap_or("-")),
                ]);
            }
            println!("{}", out);
        }
        MonitorCommands::Add {
            channel_id,
            name,
            remark,
        } => {
            let channel = NewMonitorChannel {
                channel_name: name,
                channel_id,
                remark,
            };
            finish(monitor::add_channel(&client, &channel).await)?;
            success("Channel added to monitoring");
        }
        MonitorCommands::Rename { id, name } => {
            finish(monitor::rename_channel(&client, id, &name).await)?;
            success("Channel renamed");
        }
        MonitorCommands::Remove { id } => {
            finish(monitor::remove_channel(&client, id).await)?;
            success("Channel removed from monitoring");
        }
        MonitorCommands::Trending {
            title,
            min_delta_views,
        } => {
            let title = Some(title.as_str()).filter(|t| !t.is_empty());
            let videos = finish(monitor::trending_videos(&client, title, min_delta_views).await)?;
            if videos.is_empty() {
                println!("{}", "No trending videos".dimmed());
                return Ok(());
            }

            let mut out = table(&["VIDEO ID", "TITLE", "VIEWS", "GROWTH", "URL"]);
            for video in &videos {
                out.add_row(vec![
                    Cell::new(&video.video_id),
                    Cell::new(truncate(&video.video_title, 50)),
                    Cell::new(video.view_count),
                    Cell::new(format!("+{}", video.delta_view_count)).fg(Color::Green),
                    Cell::new(video.video_url.as_deref().unwrap_or("-")),
                ]);
            }
            println!("{}", out);
        }
        MonitorCommands::Ignore { video_id } => {
            finish(monitor::ignore_video(&client, &video_id).await)?;
            success("Video ignored");
        }
    }

    Ok(())
}
