use crate::analytics::AnalyticsClient;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::feed::FeedClient;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analytics: AnalyticsClient,
    pub feed: FeedClient,
    pub dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            analytics: AnalyticsClient::new(http.clone(), &config.database_url, &config.database_name),
            feed: FeedClient::new(http, &config.feed_server_url),
            config: Arc::new(config),
            dashboard: Arc::new(Mutex::new(Dashboard::default())),
        })
    }
}
