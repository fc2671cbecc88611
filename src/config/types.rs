use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Shoal
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Seed URL the crawl starts from (depth 0)
    pub root_url: String,

    /// Domain whose hosts count as internal ("example.com" also covers
    /// "www.example.com" and any other subdomain). Derived from the root URL
    /// when absent.
    #[serde(default)]
    pub site_domain: Option<String>,

    /// Maximum number of URLs claimed for fetching over the whole crawl
    pub max_pages: usize,

    /// Maximum link depth from the root URL
    pub max_depth: u32,

    /// Delay each worker waits after every claimed URL (milliseconds)
    #[serde(default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Number of concurrent workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Timeout for a single fetch, body included (milliseconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// How long an idle worker waits on the frontier per round (milliseconds)
    #[serde(default = "default_claim_timeout")]
    pub claim_timeout: u64,

    /// Save a checkpoint every this many completed URLs
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Non-HTML content types that still produce a visit record
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn claim_timeout(&self) -> Duration {
        Duration::from_millis(self.claim_timeout)
    }
}

fn default_politeness_delay() -> u64 {
    1000
}

fn default_worker_count() -> usize {
    8
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_claim_timeout() -> u64 {
    1000
}

fn default_checkpoint_interval() -> u64 {
    100
}

/// Binary types kept alongside HTML when no list is configured
pub fn default_allowed_types() -> Vec<String> {
    [
        "application/pdf",
        "application/msword",
        "image/jpeg",
        "image/png",
        "image/gif",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the three CSV tables are written to
    pub directory: String,

    /// Short site label used in table file names (`fetch_<site-name>.csv`)
    pub site_name: String,

    /// Path to the SQLite checkpoint database
    pub checkpoint_path: String,

    /// Path to the markdown crawl report
    pub report_path: String,
}

impl OutputConfig {
    pub fn fetch_table_path(&self) -> PathBuf {
        self.table_path("fetch")
    }

    pub fn visit_table_path(&self) -> PathBuf {
        self.table_path("visit")
    }

    pub fn links_table_path(&self) -> PathBuf {
        self.table_path("urls")
    }

    fn table_path(&self, table: &str) -> PathBuf {
        PathBuf::from(&self.directory).join(format!("{}_{}.csv", table, self.site_name))
    }
}
