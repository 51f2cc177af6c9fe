use clap::{Parser, Subcommand};

/// Seat apportionment between regions, and malapportionment indicators.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the run. The flags passed on the
    /// command line take precedence over the content of this file.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Runs the proportional allocation and one degressive allocation per exponent.
    Allocate {
        /// (file path) The cleaned population file, with the columns state and population.
        #[clap(long, value_parser)]
        infile: Option<String>,
        /// (directory) Where the allocation files are written.
        #[clap(long, value_parser)]
        out: Option<String>,
        /// The total number of seats (543 or 888).
        #[clap(long, value_parser)]
        seats: Option<u32>,
        /// (list of numbers, default 0.4 0.5 0.6 0.8 0.9) The exponents of the degressive allocations.
        #[clap(long, value_parser, multiple_values = true)]
        alpha: Vec<f64>,
    },
    /// Computes the fairness indicators of all the allocations of a directory.
    Indicators {
        /// (file path) The cleaned population file.
        #[clap(long, value_parser)]
        pop: Option<String>,
        /// (directory, default data/outputs) The directory with the allocation files.
        #[clap(long, value_parser)]
        alloc_dir: Option<String>,
        /// (directory, default annexures) Where the annexure tables are written.
        #[clap(long, value_parser)]
        out: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, the command checks
        /// that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Checks a population or allocation file.
    Validate {
        /// (file path) The CSV file to check.
        #[clap(long, value_parser)]
        file: String,
        /// (file path, default docs/states_canonical.csv) The canonical list of states.
        #[clap(long, value_parser)]
        canon: Option<String>,
    },
    /// Normalizes raw population tables into state,population files.
    Clean {
        /// (file path) A single raw file. If omitted, all the CSV files of --indir are cleaned.
        #[clap(long, value_parser)]
        infile: Option<String>,
        /// (directory, default data/raw) The directory with the raw files.
        #[clap(long, value_parser)]
        indir: Option<String>,
        /// (directory, default data/processed) Where the cleaned files are written.
        #[clap(long, value_parser)]
        out: Option<String>,
        /// (file path, default docs/states_canonical.csv) The mapping to canonical state names.
        #[clap(long, value_parser)]
        canon: Option<String>,
        /// (default 1e7) Multiplier of the populations (crores to persons). Use 1 to keep them.
        #[clap(long, value_parser)]
        scale: Option<f64>,
        /// Applies the scale even if the populations already look like persons.
        #[clap(long, takes_value = false)]
        force_scale: bool,
    },
}
