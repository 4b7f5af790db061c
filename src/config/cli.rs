use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "vsac-cli")]
#[command(about = "Fetch NLM VSAC value sets and convert them to CSV, XML, or FHIR")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format [csv, xml, fhir+json, fhir+xml]
    #[arg(short = 'f', long, global = true, default_value = "csv")]
    pub format: String,

    /// File to create (convert with a single value set only)
    #[arg(short = 'o', long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for converted files
    #[arg(short = 'd', long = "output-dir", global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// CSV load list with an Oid column; its ids are appended to the arguments
    #[arg(short = 'i', long, global = true, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Credential file
    #[arg(
        short = 't',
        long = "token-file",
        global = true,
        value_name = "FILE",
        default_value = ".vsac-tokens"
    )]
    pub token_file: PathBuf,

    /// Suppress progress output
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch value sets and print them to stdout
    Fetch {
        /// Value set OIDs
        #[arg(value_name = "VALUE_SET_ID")]
        ids: Vec<String>,
    },
    /// Fetch value sets and write one converted file per id
    Convert {
        /// Value set OIDs
        #[arg(value_name = "VALUE_SET_ID")]
        ids: Vec<String>,
    },
    /// Write an empty credential record
    Init,
    /// Clear the cached granting ticket, keeping the API key
    Reset,
}
