use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::errors::SourceError;
use crate::external::candidate_source::CandidateSource;
use crate::models::RawCandidate;

const DEFAULT_KEYWORDS: [&str; 12] = [
    "software engineer", "mobile developer", "android", "ios", "flutter", "react native",
    "backend developer", "backend engineer", "django", "flask", "node.js", "express",
];

/// Configuration for the Telegram channel source
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub base_url: String,
    pub channel: String,
    pub keywords: Vec<String>,
    pub max_pages: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://t.me".to_string(),
            channel: "afriworkamharic".to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            max_pages: 5,
        }
    }
}

impl TelegramConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let keywords: Vec<String> = std::env::var("TELEGRAM_KEYWORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            base_url: std::env::var("TELEGRAM_BASE_URL").unwrap_or(defaults.base_url),
            channel: std::env::var("TELEGRAM_CHANNEL").unwrap_or(defaults.channel),
            keywords: if keywords.is_empty() { defaults.keywords } else { keywords },
            max_pages: std::env::var("TELEGRAM_MAX_PAGES")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_pages),
        }
    }
}

/// One message as it appears in the channel's public web preview.
#[derive(Debug, Clone, PartialEq)]
struct PreviewMessage {
    id: u64,
    text: String,
    posted_at: Option<DateTime<Utc>>,
    deep_link: Option<String>,
}

impl PreviewMessage {
    fn into_candidate(self) -> RawCandidate {
        RawCandidate {
            text: self.text,
            deep_link: self.deep_link,
            posted_at: self.posted_at,
        }
    }
}

struct PreviewSelectors {
    message: Selector,
    text: Selector,
    time: Selector,
    button: Selector,
}

impl PreviewSelectors {
    fn new() -> Result<Self, SourceError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector {}: {:?}", css, e)))
        };

        Ok(Self {
            message: parse("div.tgme_widget_message[data-post]")?,
            text: parse(".tgme_widget_message_text")?,
            time: parse(".tgme_widget_message_date time[datetime]")?,
            button: parse("a.tgme_widget_message_inline_button[href]")?,
        })
    }
}

/// Reads job postings from a public Telegram channel through its `t.me/s/` web preview.
pub struct TelegramChannelSource {
    config: TelegramConfig,
    client: Client,
    selectors: PreviewSelectors,
}

impl TelegramChannelSource {
    pub fn new(config: TelegramConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            selectors: PreviewSelectors::new()?,
        })
    }

    /// Fetches messages posted within `[start, end]` that mention a configured keyword.
    pub async fn fetch_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawCandidate>, SourceError> {
        let messages = self
            .collect_pages(&self.config.channel, |collected| {
                collected
                    .iter()
                    .filter_map(|m| m.posted_at)
                    .any(|posted_at| posted_at < start)
            })
            .await?;

        let candidates = messages
            .into_iter()
            .filter(|m| matches!(m.posted_at, Some(posted_at) if posted_at >= start && posted_at <= end))
            .filter(|m| self.matches_keywords(&m.text))
            .map(PreviewMessage::into_candidate)
            .collect::<Vec<_>>();

        info!("Found {} matching posts in @{} between {} and {}", candidates.len(), self.config.channel, start, end);
        Ok(candidates)
    }

    /// Latest `limit` messages of any public channel, newest first, without keyword filtering.
    pub async fn recent_posts(&self, channel: &str, limit: usize) -> Result<Vec<RawCandidate>, SourceError> {
        let mut messages = self
            .collect_pages(channel, |collected| collected.len() >= limit)
            .await?;

        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit);

        Ok(messages.into_iter().map(PreviewMessage::into_candidate).collect())
    }

    /// Walks the preview backwards with `?before=` until `done` is satisfied, the channel runs
    /// out of history, or `max_pages` is reached.
    async fn collect_pages<F>(&self, channel: &str, done: F) -> Result<Vec<PreviewMessage>, SourceError>
    where
        F: Fn(&[PreviewMessage]) -> bool,
    {
        let mut messages = Vec::new();
        let mut before: Option<u64> = None;

        for page in 0..self.config.max_pages {
            let body = self.fetch_page(channel, before).await?;
            let batch = parse_preview(&body, &self.selectors);

            let Some(oldest_id) = batch.iter().map(|m| m.id).min() else {
                break;
            };

            info!("📨 Page {} of @{}: {} messages", page + 1, channel, batch.len());
            messages.extend(batch);

            if done(&messages) || oldest_id <= 1 {
                break;
            }
            before = Some(oldest_id);
        }

        Ok(messages)
    }

    async fn fetch_page(&self, channel: &str, before: Option<u64>) -> Result<String, SourceError> {
        let url = format!("{}/s/{}", self.config.base_url.trim_end_matches('/'), channel);
        let mut request = self.client.get(&url);
        if let Some(before) = before {
            request = request.query(&[("before", before)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BadResponse(format!("HTTP {} from {}", status, url)));
        }

        response.text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }

    fn matches_keywords(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.config.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    }
}

#[async_trait]
impl CandidateSource for TelegramChannelSource {
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SourceError> {
        let (start, end) = previous_utc_day(Utc::now());
        self.fetch_window(start, end).await
    }
}

/// 00:00:00 to 23:59:59 of the UTC day before `now`.
pub fn previous_utc_day(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let yesterday = now.date_naive() - Days::new(1);
    let start = yesterday.and_time(NaiveTime::MIN).and_utc();
    let end = yesterday
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .unwrap_or(start);
    (start, end)
}

fn parse_preview(html: &str, selectors: &PreviewSelectors) -> Vec<PreviewMessage> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.message)
        .filter_map(|element| match parse_message(element, selectors) {
            Some(message) => Some(message),
            None => {
                warn!("Skipping unreadable preview message: {:?}", element.value().attr("data-post"));
                None
            }
        })
        .filter(|message| !message.text.is_empty())
        .collect()
}

fn parse_message(element: ElementRef<'_>, selectors: &PreviewSelectors) -> Option<PreviewMessage> {
    let id = element
        .value()
        .attr("data-post")?
        .rsplit('/')
        .next()?
        .parse::<u64>()
        .ok()?;

    let text = element
        .select(&selectors.text)
        .next()
        .map(|node| {
            node.text()
                .map(str::trim)
                .filter(|chunk| !chunk.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let posted_at = element
        .select(&selectors.time)
        .next()
        .and_then(|time| time.value().attr("datetime"))
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let deep_link = element
        .select(&selectors.button)
        .next()
        .and_then(|button| button.value().attr("href"))
        .map(str::to_string);

    Some(PreviewMessage { id, text, posted_at, deep_link })
}
