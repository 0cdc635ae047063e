use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use ne_core::{Error, EventRepository, MonitoringSink, MonitoringStore, RawArticle, Result, Settings};
use ne_feeds::{load_feeds, FeedConfig, IngestionService, RssFetcher};
use ne_inference::Pipeline;
use ne_publish::{
    build_seo_metadata, DigestService, EmailDigestService, EventFilter, LocalizationService, Location,
    LogEmailSender, PublishingService,
};
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const HEALTH_CHECK_SLACK_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Accepts `<number><unit>` groups (`s`, `m`, `h`, `d`) such as `1h15m30s`.
    /// A trailing number without a unit counts as seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err("Duration must not be empty".to_string());
        }

        let mut seconds = 0u64;
        let mut rest = compact.as_str();
        while !rest.is_empty() {
            let split = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if split == 0 {
                return Err(format!("Expected a number in duration: {}", s));
            }
            let (digits, tail) = rest.split_at(split);
            let value: u64 = digits
                .parse()
                .map_err(|_| format!("Number too large in duration: {}", s))?;

            let mut units = tail.chars();
            let scale = match units.next() {
                None => 1,
                Some('s') => 1,
                Some('m') => 60,
                Some('h') => 3_600,
                Some('d') => 86_400,
                Some(other) => return Err(format!("Invalid duration unit: {}", other)),
            };
            rest = units.as_str();

            seconds = value
                .checked_mul(scale)
                .and_then(|part| seconds.checked_add(part))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
        }

        if seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Cluster RSS news into events", long_about = None)]
struct Cli {
    #[arg(long, default_value = "memory")]
    storage: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch feeds, cluster articles into events and store them
    Ingest {
        /// JSON file holding a list of feed configs
        #[arg(long)]
        feeds: PathBuf,
        /// Cosine similarity needed to join an existing cluster
        #[arg(long)]
        threshold: Option<f32>,
        /// Embedding vector length
        #[arg(long)]
        dimensions: Option<usize>,
        /// Run periodically with this interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
        /// Send a digest to this address after every pass
        #[arg(long)]
        digest_to: Option<String>,
    },
    /// Ingest once, then print the daily digest
    Digest {
        #[arg(long)]
        feeds: PathBuf,
        #[arg(long)]
        max_events: Option<usize>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Ingest once, then print one event with its page metadata
    Show {
        #[arg(long)]
        feeds: PathBuf,
        /// Event id or slug
        id: String,
        /// Reader country, for the local impact note
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },
    /// Run a canary article through the pipeline and storage, then print
    /// this process's monitoring counters
    Health,
}

struct App {
    settings: Settings,
    repository: Arc<dyn EventRepository>,
    monitoring: Arc<MonitoringStore>,
}

impl App {
    fn new(settings: Settings, storage: &str) -> Result<Self> {
        let repository = ne_storage::create_storage(storage)?;
        info!("💾 Storage initialized (using {})", storage);
        let monitoring = Arc::new(MonitoringStore::from_settings(&settings));
        Ok(Self {
            settings,
            repository,
            monitoring,
        })
    }

    fn ingestion(&self) -> Result<IngestionService> {
        let pipeline = Pipeline::from_settings(&self.settings, self.monitoring.clone())?;
        info!(
            "🧠 Pipeline ready ({} dimensions, threshold {}, summarizer {})",
            self.settings.embedding_dimensions, self.settings.similarity_threshold, self.settings.summarizer_model
        );
        let fetcher = RssFetcher::new(Duration::from_secs(self.settings.feed_timeout_secs));
        Ok(IngestionService::new(
            self.repository.clone(),
            Arc::new(fetcher),
            pipeline,
            self.monitoring.clone(),
        ))
    }

    fn publishing(&self) -> Arc<PublishingService> {
        Arc::new(PublishingService::new(self.repository.clone(), self.monitoring.clone()))
    }
}

/// Push one canary article through clustering, summarizing and storage, then
/// remove the event it produced.
async fn check_pipeline(app: &App) -> Result<()> {
    let now = Utc::now();
    let canary = RawArticle {
        source_name: "ne-health".to_string(),
        title: "Health check".to_string(),
        link: format!("https://health.invalid/{}", now.timestamp_millis()),
        description: "canary article".to_string(),
        published_at: now,
        country: "global".to_string(),
        city: "global".to_string(),
        category: "health".to_string(),
    };

    let report = app.ingestion()?.ingest_articles(vec![canary]).await?;
    let event = report.events.first().ok_or_else(|| {
        Error::Inference(
            report
                .failure_summary()
                .unwrap_or_else(|| "canary article produced no event".to_string()),
        )
    })?;

    if app.repository.get_by_identity(&event.event_id).await?.is_none() {
        return Err(Error::Storage(format!("canary event {} was not stored", event.event_id)));
    }
    if !app.repository.delete(&event.event_id).await? {
        warn!("⚠️ Failed to clean up canary event {}", event.event_id);
    }

    info!("✨ Pipeline and storage healthy (canary {})", event.event_id);
    Ok(())
}

async fn ingest_once(
    app: &App,
    service: &IngestionService,
    feeds: &[FeedConfig],
    digest_to: Option<&str>,
) -> Result<()> {
    let report = service.ingest(feeds).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(recipient) = digest_to {
        let sender = Arc::new(LogEmailSender::new(app.settings.digest_sender_email.clone()));
        let mailer = EmailDigestService::new(app.publishing(), sender, app.monitoring.clone());
        mailer
            .send_daily_digest(
                recipient,
                Utc::now().date_naive(),
                app.settings.digest_max_events,
                &EventFilter::default(),
            )
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Ingest {
            feeds,
            threshold,
            dimensions,
            interval,
            digest_to,
        } => {
            if let Some(threshold) = threshold {
                settings.similarity_threshold = threshold;
            }
            if let Some(dimensions) = dimensions {
                settings.embedding_dimensions = dimensions;
            }
            let app = App::new(settings, &cli.storage)?;
            let feeds = load_feeds(&feeds)?;
            info!("📰 Loaded {} feeds", feeds.len());
            let service = app.ingestion()?;

            if let Some(interval) = interval {
                info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                loop {
                    info!("Starting ingestion cycle");
                    if let Err(e) = ingest_once(&app, &service, &feeds, digest_to.as_deref()).await {
                        error!("Error during ingestion: {}", e);
                    }
                    info!("Waiting {}s before next ingestion", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                ingest_once(&app, &service, &feeds, digest_to.as_deref()).await?;
            }
        }
        Commands::Digest {
            feeds,
            max_events,
            category,
        } => {
            let app = App::new(settings, &cli.storage)?;
            let feeds = load_feeds(&feeds)?;
            app.ingestion()?.ingest(&feeds).await?;

            let filter = EventFilter {
                category,
                ..EventFilter::default()
            };
            let events = app.publishing().list_events(&filter).await?;
            let digest = DigestService::new().generate_daily_digest(
                events,
                Utc::now().date_naive(),
                max_events.unwrap_or(app.settings.digest_max_events),
            );
            println!("{}\n\n{}", digest.subject, digest.text_body);
        }
        Commands::Show {
            feeds,
            id,
            country,
            city,
        } => {
            let app = App::new(settings, &cli.storage)?;
            let feeds = load_feeds(&feeds)?;
            app.ingestion()?.ingest(&feeds).await?;

            let event = app
                .publishing()
                .get_event(&id)
                .await?
                .ok_or_else(|| Error::Validation(format!("no event with id or slug {}", id)))?;
            let seo = build_seo_metadata(&event, city.as_deref(), &app.settings.base_url);
            let local_impact = country.map(|country| {
                let location = match &city {
                    Some(city) => Location::new(country).with_city(city.clone()),
                    None => Location::new(country),
                };
                LocalizationService::new().local_impact(&event, &location)
            });

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "event": event,
                    "seo": seo,
                    "local_impact": local_impact,
                }))?
            );
        }
        Commands::Health => {
            let app = App::new(settings, &cli.storage)?;
            let limit = Duration::from_secs(app.settings.summarizer_timeout_secs + HEALTH_CHECK_SLACK_SECS);
            tokio::time::timeout(limit, check_pipeline(&app))
                .await
                .map_err(|_| Error::Storage(format!("health check timed out after {:?}", limit)))??;
            println!("{}", serde_json::to_string_pretty(&app.monitoring.snapshot())?);
        }
    }

    Ok(())
}
