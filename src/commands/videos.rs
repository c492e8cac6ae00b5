use super::{connect, finish, load, success, table, truncate};
use crate::cli::VideoCommands;
use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::Cell;
use std::path::Path;
use yt_console::api::videos::{
    self, analytics_date, format_duration, localizations, AnalyticsSummary, DailyAnalytics, VideoQuery,
};

pub async fn execute(config_path: &Path, action: VideoCommands) -> Result<()> {
    let cfg = load(config_path)?;
    let client = connect(&cfg, "/Channel/list")?;

    match action {
        VideoCommands::List {
            channel,
            page,
            page_size,
            video_id,
            title,
        } => {
            let query = VideoQuery {
                page,
                page_size,
                video_id,
                title,
            };
            let result = finish(videos::list_videos(&client, &channel, &query).await)?;

            let mut out = table(&["VIDEO ID", "TITLE", "PUBLISHED", "DURATION", "COUNTRY"]);
            for video in &result.data {
                out.add_row(vec![
                    Cell::new(&video.video_id),
                    Cell::new(truncate(&video.title, 50)),
                    Cell::new(video.publish_time.as_deref().unwrap_or("-")),
                    Cell::new(format_duration(&video.duration)),
                    Cell::new(video.country.as_deref().unwrap_or("-")),
                ]);
            }
            println!("{}", out);
            println!(
                "{}",
                format!(
                    "Page {}/{} ({} videos, {} per page)",
                    result.page, result.page_count, result.data_count, result.page_size
                )
                .dimmed()
            );
        }
        VideoCommands::Languages => {
            let languages = finish(videos::list_languages(&client).await)?;
            let mut out = table(&["CODE", "NAME"]);
            for lang in &languages {
                out.add_row(vec![Cell::new(&lang.code), Cell::new(&lang.name)]);
            }
            println!("{}", out);
        }
        VideoCommands::AddLang {
            video_id,
            langs,
            title,
            description,
        } => {
            let entries = localizations(&langs, &title, &description)?;
            finish(videos::add_languages(&client, &video_id, &entries).await)?;
            success(&format!("Added {} language(s)", entries.len()));
        }
        VideoCommands::Analytics { video_id, from, to } => {
            let from = from.as_deref().map(parse_date).transpose()?;
            let to = to.as_deref().map(parse_date).transpose()?;

            let rows: Vec<DailyAnalytics> = finish(videos::daily_analytics(&client, &video_id).await)?
                .into_iter()
                .filter(|row| in_range(row, from, to))
                .collect();

            let summary = AnalyticsSummary::from_rows(&rows);
            println!("{}", "Summary:".bold());
            println!("  {}: {}", "Total views".cyan(), summary.total_views);
            println!("  {}: ${:.2}", "Estimated revenue".cyan(), summary.total_revenue);
            println!(
                "  {}: {:.1}s",
                "Average view duration".cyan(),
                summary.average_view_duration
            );
            println!();

            let mut out = table(&["DATE", "VIEWS", "REVENUE", "REVENUE TW", "REVENUE US", "AVG DURATION"]);
            for row in &rows {
                out.add_row(vec![
                    Cell::new(&row.date),
                    Cell::new(row.views),
                    Cell::new(format!("${:.4}", row.estimated_revenue)),
                    Cell::new(format!("${:.4}", row.estimated_revenue_tw)),
                    Cell::new(format!("${:.4}", row.estimated_revenue_us)),
                    Cell::new(format!("{:.2}", row.average_view_duration)),
                ]);
            }
            println!("{}", out);
        }
    }

    Ok(())
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn in_range(row: &DailyAnalytics, from: Option<chrono::NaiveDate>, to: Option<chrono::NaiveDate>) -> bool {
    let Some(date) = analytics_date(&row.date) else {
        return from.is_none() && to.is_none();
    };
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}
