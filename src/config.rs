use anyhow::{Context, Result};
use std::collections::HashSet;

use ::config::{Config, Environment, File, Source};
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://rainverse.wiki/w/api.php";
const DEFAULT_WIKI_BASE: &str = "https://rainverse.wiki";
const DEFAULT_STORIES: [&str; 2] = ["Rain", "My Impossible Soulmate"];
const DEFAULT_CATEGORY_TEMPLATE: &str = "Category:{} characters";

/// Runtime settings. Sources, lowest priority first: built-in defaults,
/// `rainverse.toml`, `RAINVERSE_*` environment variables, CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_endpoint: String,
    pub wiki_base: String,
    /// Stories in display order; each maps to one character category.
    pub stories: Vec<String>,
    pub category_template: String,
    pub user_agent: String,
    pub skin: String,
    pub page_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            wiki_base: DEFAULT_WIKI_BASE.to_string(),
            stories: DEFAULT_STORIES.iter().map(|s| s.to_string()).collect(),
            category_template: DEFAULT_CATEGORY_TEMPLATE.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            skin: "vector".to_string(),
            page_title: "Rainverse character birthdays".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(File::with_name("rainverse").required(false), environment())
    }

    fn load_from<F>(file: F, env: Environment) -> Result<Self>
    where
        F: Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let settings: Settings = Config::builder()
            .set_default("api_endpoint", defaults.api_endpoint)?
            .set_default("wiki_base", defaults.wiki_base)?
            .set_default("stories", defaults.stories)?
            .set_default("category_template", defaults.category_template)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("skin", defaults.skin)?
            .set_default("page_title", defaults.page_title)?
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings.dedup_stories())
    }

    /// Apply CLI flags on top of the loaded settings.
    pub fn with_overrides(mut self, endpoint: Option<String>, stories: Vec<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.api_endpoint = endpoint;
        }
        if !stories.is_empty() {
            self.stories = stories;
        }
        self.dedup_stories()
    }

    /// Each story is queried once, at its first position.
    fn dedup_stories(mut self) -> Self {
        let mut seen = HashSet::new();
        self.stories.retain(|story| seen.insert(story.clone()));
        self
    }

    /// Category title listing the characters of `story`.
    pub fn category_for(&self, story: &str) -> String {
        self.category_template.replace("{}", story)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("RAINVERSE")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("stories")
}
