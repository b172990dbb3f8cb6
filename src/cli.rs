use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Harvests course enrollment data from the public course search.
#[derive(Parser, Debug)]
#[command(name = "enrollment-scraper", version, about)]
pub struct Cli {
    /// TOML configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape enrollment numbers for a term or for a list of course ids
    Scrape {
        /// Code for year/term, a 5 digit number like 20155 (spring of 2015)
        #[arg(long)]
        year_term: Option<String>,

        /// CSV with an "ID #" column of course ids and a "year_term" column
        #[arg(long)]
        cid_list: Option<PathBuf>,
    },
    /// Find which course ids exist in a term by probing each one
    Discover {
        /// Code for year/term, a 5 digit number like 20155 (spring of 2015)
        #[arg(long)]
        year_term: String,

        /// The largest course id number to look for
        #[arg(long, default_value_t = 4000)]
        max_cid: u32,
    },
}
