use super::envelope::Envelope;
use crate::client::{ApiClient, RequestOptions};
use crate::error::AppError;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_CHANNEL_NAME_CHARS: usize = 50;
pub const MAX_CHANNEL_ID_CHARS: usize = 100;
pub const MAX_REMARK_CHARS: usize = 200;

/// Title filter the trending view starts with
pub const DEFAULT_TRENDING_TITLE: &str = "reelshort,dramabox";

/// Third-party channel being watched for trending videos
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorChannel {
    pub id: i64,
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMonitorChannel {
    pub channel_name: String,
    pub channel_id: String,
    pub remark: String,
}

impl NewMonitorChannel {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_channel_name(&self.channel_name)?;

        if self.channel_id.trim().is_empty() {
            return Err(AppError::InvalidRequest("Channel id must not be empty".to_string()));
        }
        if self.channel_id.chars().count() > MAX_CHANNEL_ID_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "Channel id must be at most {} characters",
                MAX_CHANNEL_ID_CHARS
            )));
        }
        if self.remark.chars().count() > MAX_REMARK_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "Remark must be at most {} characters",
                MAX_REMARK_CHARS
            )));
        }
        Ok(())
    }
}

fn validate_channel_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Channel name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_CHANNEL_NAME_CHARS {
        return Err(AppError::InvalidRequest(format!(
            "Channel name must be at most {} characters",
            MAX_CHANNEL_NAME_CHARS
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendingVideo {
    pub video_id: String,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub delta_view_count: i64,
}

/// Trending endpoint payload: a bare list, or the list wrapped in `data`.
/// Any other shape is read as no videos.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrendingPayload {
    List(Vec<TrendingVideo>),
    Wrapped {
        #[serde(default)]
        data: Vec<TrendingVideo>,
    },
    Other(IgnoredAny),
}

impl From<TrendingPayload> for Vec<TrendingVideo> {
    fn from(payload: TrendingPayload) -> Self {
        match payload {
            TrendingPayload::List(videos) | TrendingPayload::Wrapped { data: videos } => videos,
            TrendingPayload::Other(_) => Vec::new(),
        }
    }
}

pub async fn list_channels(client: &ApiClient) -> Result<Vec<MonitorChannel>, AppError> {
    let envelope: Envelope<Vec<MonitorChannel>> =
        client.get("/monitorChannel", RequestOptions::new()).await?;
    envelope.into_response_or_default()
}

pub async fn add_channel(client: &ApiClient, channel: &NewMonitorChannel) -> Result<(), AppError> {
    channel.validate()?;
    let envelope: Envelope<Value> = client
        .post("/monitorChannel", channel, RequestOptions::new())
        .await?;
    envelope.check()
}

pub async fn rename_channel(client: &ApiClient, id: i64, channel_name: &str) -> Result<(), AppError> {
    validate_channel_name(channel_name)?;
    let envelope: Envelope<Value> = client
        .put(
            &format!("/monitorChannel/{}", id),
            &serde_json::json!({ "channel_name": channel_name }),
            RequestOptions::new(),
        )
        .await?;
    envelope.check()
}

pub async fn remove_channel(client: &ApiClient, id: i64) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client
        .delete(&format!("/monitorChannel/{}", id), RequestOptions::new())
        .await?;
    envelope.check()
}

/// Videos whose view count grew by at least `min_delta_views`
pub async fn trending_videos(
    client: &ApiClient,
    title: Option<&str>,
    min_delta_views: Option<u64>,
) -> Result<Vec<TrendingVideo>, AppError> {
    let options = RequestOptions::new()
        .param_opt("title", title)
        .param("min_delta_views", min_delta_views.unwrap_or(0));

    let envelope: Envelope<TrendingPayload> =
        client.get("/monitor/trending-videos", options).await?;
    envelope.check()?;
    Ok(envelope.response.map(Vec::from).unwrap_or_default())
}

/// Hide a video from future trending results
pub async fn ignore_video(client: &ApiClient, video_id: &str) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client
        .post(
            &format!("/monitorChannel/ignore-video/{}", video_id),
            &serde_json::json!({}),
            RequestOptions::new(),
        )
        .await?;
    envelope.check()
}
