//! Channel videos, localizations and per-video analytics.

use super::envelope::{string_or_number, Envelope};
use crate::client::{ApiClient, RequestOptions};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Video {
    #[serde(default)]
    pub id: Option<i64>,
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publish_time: Option<String>,
    /// Seconds, sent either as a number or a string
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// One page of a channel's videos
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    #[serde(default)]
    pub data: Vec<Video>,
    #[serde(default)]
    pub data_count: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Filters for [`list_videos`]; empty filters are not sent
#[derive(Debug, Clone)]
pub struct VideoQuery {
    pub page: u32,
    pub page_size: u32,
    pub video_id: Option<String>,
    pub title: Option<String>,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            video_id: None,
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Localization {
    pub lang: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
struct AddLanguagesRequest<'a> {
    langs: &'a [Localization],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyAnalytics {
    pub date: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub estimated_revenue: f64,
    #[serde(default)]
    pub estimated_revenue_tw: f64,
    #[serde(default)]
    pub estimated_revenue_us: f64,
    #[serde(default)]
    pub average_view_duration: f64,
}

/// Totals over a set of daily analytics rows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalyticsSummary {
    pub total_views: u64,
    pub total_revenue: f64,
    pub average_view_duration: f64,
}

impl AnalyticsSummary {
    pub fn from_rows(rows: &[DailyAnalytics]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let total_duration: f64 = rows.iter().map(|r| r.average_view_duration).sum();
        Self {
            total_views: rows.iter().map(|r| r.views).sum(),
            total_revenue: rows.iter().map(|r| r.estimated_revenue).sum(),
            average_view_duration: total_duration / rows.len() as f64,
        }
    }
}

pub async fn list_videos(
    client: &ApiClient,
    channel_id: &str,
    query: &VideoQuery,
) -> Result<VideoPage, AppError> {
    let options = RequestOptions::new()
        .param("page", query.page)
        .param("page_size", query.page_size)
        .param_opt("video_id", query.video_id.as_deref())
        .param_opt("title", query.title.as_deref());

    let envelope: Envelope<VideoPage> = client.get(&format!("/video/{}", channel_id), options).await?;
    let mut page = envelope.into_response_or_default()?;

    // Fill in what the server omitted
    if page.page == 0 {
        page.page = query.page;
    }
    if page.page_size == 0 {
        page.page_size = query.page_size;
    }
    page.page_count = page.page_count.max(1);
    Ok(page)
}

pub async fn list_languages(client: &ApiClient) -> Result<Vec<Language>, AppError> {
    let envelope: Envelope<Vec<Language>> = client.get("/lang", RequestOptions::new()).await?;
    envelope.into_response_or_default()
}

/// Build one localization per language sharing the same title and description
pub fn localizations(
    languages: &[String],
    title: &str,
    description: &str,
) -> Result<Vec<Localization>, AppError> {
    if languages.is_empty() {
        return Err(AppError::InvalidRequest(
            "Select at least one language".to_string(),
        ));
    }
    if title.trim().is_empty() {
        return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
    }

    Ok(languages
        .iter()
        .map(|lang| Localization {
            lang: lang.clone(),
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect())
}

pub async fn add_languages(
    client: &ApiClient,
    video_id: &str,
    langs: &[Localization],
) -> Result<(), AppError> {
    if langs.is_empty() {
        return Err(AppError::InvalidRequest(
            "Select at least one language".to_string(),
        ));
    }

    let envelope: Envelope<Value> = client
        .post(
            &format!("/video/add-lang/{}", video_id),
            &AddLanguagesRequest { langs },
            RequestOptions::new(),
        )
        .await?;
    envelope.check()
}

/// Daily analytics for a video, newest first
pub async fn daily_analytics(client: &ApiClient, video_id: &str) -> Result<Vec<DailyAnalytics>, AppError> {
    let envelope: Envelope<Vec<DailyAnalytics>> = client
        .get(&format!("/data/analytics-daily/{}", video_id), RequestOptions::new())
        .await?;
    let mut rows = envelope.into_response_or_default()?;
    sort_by_date_desc(&mut rows);
    Ok(rows)
}

fn sort_by_date_desc(rows: &mut [DailyAnalytics]) {
    rows.sort_by(|a, b| analytics_date(&b.date).cmp(&analytics_date(&a.date)));
}

/// Calendar day of an analytics row; only the leading `YYYY-MM-DD` is read
pub fn analytics_date(value: &str) -> Option<chrono::NaiveDate> {
    let day = value.get(..10).unwrap_or(value);
    chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Render a duration in seconds as `mm:ss`; non-numeric input is returned as is
pub fn format_duration(seconds: &str) -> String {
    match seconds.trim().parse::<f64>() {
        Ok(sec) if sec.is_finite() && sec >= 0.0 => {
            let total = sec.floor() as u64;
            format!("{:02}:{:02}", total / 60, total % 60)
        }
        _ => seconds.to_string(),
    }
}
