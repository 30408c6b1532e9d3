use std::error::Error;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures::stream::{StreamExt, iter};
use log::{info, warn};
use serde::Serialize;
use songbrowser::browser::{Browser, BrowserState, Outcome, ResponseOrdering, View};
use songbrowser::clients::{SearchClient, Song, errors::Result as ClientResult};
use songbrowser::config::{Config, ConfigBuilder};
use tokio::io::{AsyncBufReadExt, BufReader};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

const PROMPT: &str = "Type an artist name to search for songs.";

#[derive(Parser)]
#[command(name = "songbrowser")]
#[command(version, about = "Search the iTunes catalog for songs by artist", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Settings {
    /// Search endpoint [env: SONGBROWSER_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Maximum number of songs per search [env: SONGBROWSER_LIMIT]
    #[arg(long, global = true)]
    limit: Option<u32>,

    /// Request timeout in seconds [env: SONGBROWSER_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show whichever response arrives last, even for an older query
    #[arg(long, global = true)]
    last_arrival: bool,
}

impl Settings {
    fn config(&self, concurrency: Option<usize>) -> ClientResult<Config> {
        let mut builder = ConfigBuilder::new();
        if let Some(api_url) = &self.api_url {
            builder = builder.api_url(api_url.clone());
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if self.last_arrival {
            builder = builder.ordering(ResponseOrdering::LastArrival);
        }
        if let Some(concurrency) = concurrency {
            builder = builder.concurrency(concurrency);
        }
        builder.build()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search once for every term and print the songs
    Search {
        #[arg(required = true)]
        terms: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// How many searches may run at the same time
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Read queries from stdin, one per line, and show results as they arrive
    Browse,
}

#[derive(Serialize)]
struct TermResults<'a> {
    term: &'a str,
    songs: &'a [Song],
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Search {
            terms,
            json,
            concurrency,
        } => search_terms(&cli.settings.config(concurrency)?, terms, json).await,
        Commands::Browse => browse(&cli.settings.config(None)?).await,
    }
}

async fn search_terms(config: &Config, terms: Vec<String>, json: bool) -> Result<()> {
    let client = SearchClient::new(config)?;
    let client = &client;
    let total = terms.len();

    info!("Running {total} searches, {} at a time", config.concurrency);
    let results = iter(terms)
        .map(|term| async move {
            let result = client.search(&term).await;
            (term, result)
        })
        .buffered(config.concurrency)
        .collect::<Vec<_>>()
        .await;

    let mut found = Vec::new();
    let mut failures = 0;
    for (term, result) in &results {
        match result {
            Ok(songs) => found.push(TermResults { term, songs }),
            Err(e) => {
                warn!("Search for {term:?} failed: {e}");
                eprintln!("{term}: {e}");
                failures += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        for entry in &found {
            println!("== {} ({} songs)", entry.term, entry.songs.len());
            print_songs(entry.songs);
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {total} searches failed").into());
    }
    Ok(())
}

async fn browse(config: &Config) -> Result<()> {
    let client = SearchClient::new(config)?;
    let mut browser = Browser::new(client, config.ordering);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    render(browser.state());
    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(text) => {
                    // Searches show up when they complete, anything else redraws now
                    if !browser.edit(text) {
                        render(browser.state());
                    }
                }
                None => {
                    info!("Input closed, waiting for {} searches", browser.in_flight());
                    input_open = false;
                }
            },
            Some(outcome) = browser.next_completion(), if browser.in_flight() > 0 => {
                if outcome != Outcome::Discarded {
                    render(browser.state());
                }
            },
            else => break,
        }
    }
    Ok(())
}

fn render(state: &BrowserState) {
    println!("--- {:?}", state.query());
    match state.view() {
        View::Prompt => println!("{PROMPT}"),
        View::Results(songs) if songs.is_empty() => println!("No songs found."),
        View::Results(songs) => print_songs(songs),
    }
    if let Some(error) = state.last_error() {
        println!("! {error}");
    }
}

fn print_songs(songs: &[Song]) {
    for song in songs {
        println!("{}", song.title());
        println!("    {}", song.caption());
    }
}
