mod login;
mod output;
mod scrape;
mod targets;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::{EngagementJob, Job, ProfileJob, SearchJob};

#[derive(Debug, Parser)]
#[command(name = "tweetharvest")]
#[command(about = "Collect X/Twitter posts, replies and quotes into CSV tables")]
struct Cli {
    /// Account label for the saved login session
    #[arg(long, global = true)]
    account: Option<String>,

    /// Run the browser without a visible window
    #[arg(long, global = true)]
    headless: bool,

    /// Fail instead of browsing anonymously when no login is available
    #[arg(long, global = true)]
    no_anonymous: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in manually and save the session for later runs
    Login,
    /// Collect an account's own timeline posts
    Profile {
        handle: String,

        #[arg(long, default_value_t = scrape::PROFILE_MAX_TWEETS)]
        max_tweets: usize,

        #[arg(long, default_value_t = scrape::PROFILE_MAX_SCROLLS)]
        max_scrolls: usize,
    },
    /// Collect search results for a query
    Search {
        query: String,

        /// Use the "Top" tab instead of "Latest"
        #[arg(long)]
        top: bool,

        #[arg(long, default_value_t = scrape::PROFILE_MAX_TWEETS)]
        max_tweets: usize,

        #[arg(long, default_value_t = scrape::PROFILE_MAX_SCROLLS)]
        max_scrolls: usize,
    },
    /// Collect an account's posts plus the replies and quotes of each
    Engagement {
        handle: String,

        #[arg(long, default_value_t = scrape::ENGAGEMENT_MAX_TWEETS)]
        max_tweets: usize,

        #[arg(long, default_value_t = scrape::REPLIES_PER_TWEET)]
        replies_per_tweet: usize,

        #[arg(long, default_value_t = scrape::QUOTES_PER_TWEET)]
        quotes_per_tweet: usize,

        #[arg(long, default_value_t = scrape::ENGAGEMENT_MAX_SCROLLS)]
        max_scrolls: usize,

        /// Scroll budget on each reply or quote page
        #[arg(long, default_value_t = scrape::SUB_SCROLLS)]
        sub_scrolls: usize,
    },
    /// Run the jobs listed in the targets file
    Targets {
        /// Run only the target with this name
        #[arg(long)]
        name: Option<String>,

        /// Print the selected targets without opening a browser
        #[arg(long)]
        dry_run: bool,
    },
}

impl Commands {
    /// The scrape job a single-shot command describes, if any.
    fn job(&self) -> Option<Job> {
        match self {
            Commands::Profile {
                handle,
                max_tweets,
                max_scrolls,
            } => Some(Job::Profile(ProfileJob {
                handle: handle.trim_start_matches('@').to_string(),
                max_tweets: *max_tweets,
                max_scrolls: *max_scrolls,
            })),
            Commands::Search {
                query,
                top,
                max_tweets,
                max_scrolls,
            } => Some(Job::Search(SearchJob {
                query: query.clone(),
                tab: if *top {
                    tweetharvest_core::SearchTab::Top
                } else {
                    tweetharvest_core::SearchTab::Latest
                },
                max_tweets: *max_tweets,
                max_scrolls: *max_scrolls,
            })),
            Commands::Engagement {
                handle,
                max_tweets,
                replies_per_tweet,
                quotes_per_tweet,
                max_scrolls,
                sub_scrolls,
            } => Some(Job::Engagement(EngagementJob {
                handle: handle.trim_start_matches('@').to_string(),
                max_tweets: *max_tweets,
                max_scrolls: *max_scrolls,
                replies_per_tweet: *replies_per_tweet,
                quotes_per_tweet: *quotes_per_tweet,
                sub_scrolls: *sub_scrolls,
            })),
            Commands::Login | Commands::Targets { .. } => None,
        }
    }
}

/// Global flags win over the environment.
fn apply_overrides(config: &mut tweetharvest_core::AppConfig, cli: &Cli) {
    if let Some(account) = &cli.account {
        config.account.clone_from(account);
    }
    if cli.headless {
        config.headless = true;
    }
    if cli.no_anonymous {
        config.allow_anonymous = false;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        tweetharvest_core::load_app_config().context("failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(command) = cli.command else {
        println!("tweetharvest: no command given; see --help");
        return Ok(());
    };

    match command {
        Commands::Login => login::run_login(&config).await,
        Commands::Targets { name, dry_run } => {
            targets::run_targets(&config, name.as_deref(), dry_run).await
        }
        scrape_command => match scrape_command.job() {
            Some(job) => scrape::run_single(&config, &job).await,
            None => Ok(()),
        },
    }
}
