use log::{debug, error, info, warn};

use apportionment::builder::Builder;
use apportionment::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::apportion::config_reader::*;
use crate::args::{Args, Command};

pub mod io_clean;
pub mod io_common;
pub mod io_csv;
pub mod io_validate;

#[derive(Debug, Snafu)]
pub enum ApportionError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Missing column {column} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display(
        "Could not understand {content:?} for region {region} (line {lineno} of {path})"
    ))]
    ParsingNumber {
        content: String,
        region: String,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Negative population {population} for region {region} in {path}"))]
    NegativePopulation {
        region: String,
        population: f64,
        path: String,
    },
    #[snafu(display("Invalid setting {name}"))]
    InvalidSetting {
        source: AllocationErrors,
        name: String,
    },
    #[snafu(display("Invalid population data in {path}"))]
    InvalidDataset {
        source: AllocationErrors,
        path: String,
    },
    #[snafu(display("Error creating directory {path}"))]
    CreatingDirectory { source: std::io::Error, path: String },
    #[snafu(display("Error listing directory {path}"))]
    ListingDirectory { source: std::io::Error, path: String },
    #[snafu(display("No allocation CSVs found in {path}"))]
    NoAllocationFiles { path: String },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing JSON file {path}"))]
    WritingJson { source: std::io::Error, path: String },
    #[snafu(display(
        "Missing setting {name}: pass it on the command line or in the configuration file"
    ))]
    MissingSetting { name: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ApportionResult<T> = Result<T, ApportionError>;

pub mod config_reader {
    use crate::apportion::*;

    /// The content of the JSON configuration file. All the fields are optional.
    #[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct RunConfig {
        pub seats: Option<u32>,
        pub alphas: Option<Vec<f64>>,
        #[serde(rename = "populationFile")]
        pub population_file: Option<String>,
        #[serde(rename = "outputDirectory")]
        pub output_directory: Option<String>,
        #[serde(rename = "allocationDirectory")]
        pub allocation_directory: Option<String>,
        #[serde(rename = "annexureDirectory")]
        pub annexure_directory: Option<String>,
        #[serde(rename = "rawDirectory")]
        pub raw_directory: Option<String>,
        #[serde(rename = "processedDirectory")]
        pub processed_directory: Option<String>,
        #[serde(rename = "canonicalFile")]
        pub canonical_file: Option<String>,
        pub scale: Option<f64>,
    }

    pub fn read_run_config(path: &str) -> ApportionResult<RunConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        debug!("read_run_config: content: {:?}", contents);
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
    }

    pub fn read_summary(path: &str) -> ApportionResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
    }

    /// The command line flag if present, then the configuration file, then the default.
    pub fn setting<T: Clone>(
        name: &str,
        flag: &Option<T>,
        from_config: &Option<T>,
        default: Option<T>,
    ) -> ApportionResult<T> {
        flag.clone()
            .or_else(|| from_config.clone())
            .or(default)
            .context(MissingSettingSnafu { name })
    }

    #[derive(PartialEq, Debug, Clone)]
    pub struct AllocateSettings {
        pub infile: String,
        pub out_dir: String,
        pub config: ApportionmentConfig,
    }

    #[derive(PartialEq, Debug, Clone)]
    pub struct IndicatorSettings {
        pub pop_file: String,
        pub alloc_dir: String,
        pub out_dir: String,
        pub reference: Option<String>,
    }

    #[derive(PartialEq, Debug, Clone)]
    pub struct CleanSettings {
        pub infile: Option<String>,
        pub indir: String,
        pub out_dir: String,
        pub canon: String,
        pub scale: f64,
        pub force_scale: bool,
    }

    pub const DEFAULT_CANONICAL_FILE: &str = "docs/states_canonical.csv";
}

/// Runs the allocations and writes one file per rule.
///
/// A failing rule is reported but does not prevent the other files from
/// being written.
pub fn run_allocate(settings: &AllocateSettings) -> ApportionResult<()> {
    let regions = io_csv::read_populations(&settings.infile)?;
    let builder = Builder::new(settings.config.seats_total)
        .context(InvalidSettingSnafu { name: "seats" })?
        .regions(&regions)
        .context(InvalidDatasetSnafu {
            path: settings.infile.clone(),
        })?;

    io_common::create_dir(&settings.out_dir)?;

    let mut failures: Vec<String> = Vec::new();
    let results = run_apportionment(builder.regions_list(), &settings.config);
    for (rule, res) in settings.config.rules.iter().zip(results) {
        match res {
            Ok(allocation) => {
                let p: PathBuf = [
                    settings.out_dir.clone(),
                    io_csv::allocation_file_name(&allocation),
                ]
                .iter()
                .collect();
                let p_s = p.display().to_string();
                io_csv::write_allocation(io_csv::create_file(&p)?, &p_s, &allocation)?;
                info!("Wrote allocation {}", p.display());
            }
            Err(e) => {
                error!("Allocation {} failed: {}", rule.label(), e);
                failures.push(format!("{}: {}", rule.label(), e));
            }
        }
    }
    if !failures.is_empty() {
        whatever!("{} allocation(s) failed: {:?}", failures.len(), failures)
    }
    info!("Allocations completed.");
    Ok(())
}

/// The outcome of the analysis of an allocation directory.
#[derive(PartialEq, Debug, Clone)]
pub struct Annexures {
    pub tables: Vec<IndicatorTable>,
    pub elasticity: Vec<ElasticitySummary>,
    pub comparisons: Vec<ComparativeRecord>,
}

/// Computes the indicators of the allocation tables, named by their file names.
///
/// The baseline is the first table whose name contains "proportional".
pub fn analyze_tables(regions: &[Region], allocations: &[(String, Vec<(String, u32)>)]) -> Annexures {
    let tables: Vec<IndicatorTable> = allocations
        .iter()
        .map(|(name, seats)| {
            let joined = join_allocation(regions, seats);
            if !joined.unmatched.is_empty() {
                warn!(
                    "{} has unmatched states; filling seats=0 for missing states.",
                    name
                );
            }
            compute_indicators(name, &joined.rows)
        })
        .collect();
    let elasticity: Vec<ElasticitySummary> = tables.iter().map(elasticity_summary).collect();
    let baseline = tables
        .iter()
        .find(|t| t.allocation.to_lowercase().contains("proportional"));
    let comparisons: Vec<ComparativeRecord> = match baseline {
        Some(base) => tables
            .iter()
            .filter_map(|t| compare_to_baseline(t, base))
            .collect(),
        None => {
            warn!("No proportional allocation found: skipping the comparisons");
            Vec::new()
        }
    };
    Annexures {
        tables,
        elasticity,
        comparisons,
    }
}

fn build_summary_js(annexures: &Annexures) -> JSValue {
    let allocations: Vec<JSValue> = annexures
        .tables
        .iter()
        .zip(annexures.elasticity.iter())
        .map(|(t, es)| {
            json!({
                "file": t.allocation,
                "totalSeats": t.summary.total_seats,
                "totalPopulation": t.summary.total_population,
                "malapportionmentIndex": t.summary.malapportionment_index,
                "gini": t.summary.gini,
                "meanElasticity": es.mean,
                "medianElasticity": es.median,
                "p10Elasticity": es.p10,
                "p90Elasticity": es.p90,
                "meanSeatsPerMillion": t.summary.mean_seats_per_million,
            })
        })
        .collect();
    let comparisons: Vec<JSValue> = annexures
        .comparisons
        .iter()
        .map(|c| json!({"file": c.allocation, "mrc": c.mrc}))
        .collect();
    json!({"allocations": allocations, "comparisons": comparisons})
}

pub fn run_indicators(settings: &IndicatorSettings) -> ApportionResult<()> {
    let regions = io_csv::read_populations(&settings.pop_file)?;
    let files = io_common::list_csv_files(&settings.alloc_dir)?;
    if files.is_empty() {
        return NoAllocationFilesSnafu {
            path: settings.alloc_dir.clone(),
        }
        .fail();
    }

    let mut allocations: Vec<(String, Vec<(String, u32)>)> = Vec::new();
    for f in files.iter() {
        let path = f.display().to_string();
        info!("Attempting to read allocation file {:?}", path);
        let seats = io_csv::read_allocation(&path)?;
        allocations.push((io_common::simplify_file_name(&path), seats));
    }

    let annexures = analyze_tables(&regions, &allocations);
    for t in annexures.tables.iter() {
        info!(
            "{}: MI: {:?} Gini: {:?} mean elasticity: {:?}",
            t.allocation,
            t.summary.malapportionment_index,
            t.summary.gini,
            t.summary.mean_elasticity
        );
    }

    io_common::create_dir(&settings.out_dir)?;
    let out = Path::new(&settings.out_dir);
    let p = out.join("Annexure_C_MI_Table.csv");
    io_csv::write_mi_table(
        io_csv::create_file(&p)?,
        &p.display().to_string(),
        &annexures.tables,
    )?;
    let p = out.join("Annexure_D_Elasticity_Summary.csv");
    io_csv::write_elasticity_summary(
        io_csv::create_file(&p)?,
        &p.display().to_string(),
        &annexures.elasticity,
    )?;
    let p = out.join("Annexure_E_MRC_Summary.csv");
    io_csv::write_mrc_summary(
        io_csv::create_file(&p)?,
        &p.display().to_string(),
        &annexures.comparisons,
    )?;
    let p = out.join("fairness_indicators.csv");
    io_csv::write_fairness_indicators(
        io_csv::create_file(&p)?,
        &p.display().to_string(),
        &annexures.tables,
    )?;

    let summary_js = build_summary_js(&annexures);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    let js_path = out.join("fairness_indicators.json").display().to_string();
    fs::write(&js_path, &pretty_js_stats).context(WritingJsonSnafu { path: js_path })?;
    info!("Wrote annexures to: {}", settings.out_dir);

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }
    Ok(())
}

pub fn run_validate(file: &str, canon: &str) -> ApportionResult<()> {
    if !Path::new(file).exists() {
        whatever!("File {} not found.", file)
    }
    let canonical = io_validate::load_canonical(canon)?;
    let table = io_common::open_table(file)?;
    info!(
        "=== VALIDATION REPORT for {} ===",
        io_common::simplify_file_name(file)
    );
    let report = io_validate::validate_table(&table, canonical.as_deref());
    report.log();
    info!("=== VALIDATION COMPLETE ===");
    if !report.errors.is_empty() {
        whatever!("{} validation error(s) in {}", report.errors.len(), file)
    }
    Ok(())
}

pub fn run_clean(settings: &CleanSettings) -> ApportionResult<()> {
    io_common::create_dir(&settings.out_dir)?;
    let cmap = io_clean::load_canonical_map(&settings.canon)?;

    if let Some(infile) = &settings.infile {
        if !Path::new(infile).exists() {
            whatever!("infile {} not found", infile)
        }
        io_clean::process_file(infile, settings, &cmap)?;
        return Ok(());
    }

    if !Path::new(&settings.indir).exists() {
        whatever!("indir {} not found", settings.indir)
    }
    let files = io_common::list_csv_files(&settings.indir)?;
    if files.is_empty() {
        whatever!("No CSVs found in {}", settings.indir)
    }
    for f in files.iter() {
        let p = f.display().to_string();
        if let Err(e) = io_clean::process_file(&p, settings, &cmap) {
            warn!("Skipped {} due to error: {}", p, e);
        }
    }
    Ok(())
}

/// Resolves the settings of the command and runs it.
pub fn run(args: &Args) -> ApportionResult<()> {
    let config: RunConfig = match &args.config {
        Some(p) => read_run_config(p)?,
        None => RunConfig::default(),
    };
    debug!("run: config: {:?}", config);

    match &args.command {
        Command::Allocate {
            infile,
            out,
            seats,
            alpha,
        } => {
            let alphas: Vec<f64> = if alpha.is_empty() {
                config
                    .alphas
                    .clone()
                    .unwrap_or_else(|| ApportionmentConfig::DEFAULT_ALPHAS.to_vec())
            } else {
                alpha.clone()
            };
            let seats_total = setting("seats", seats, &config.seats, None)?;
            let settings = AllocateSettings {
                infile: setting("infile", infile, &config.population_file, None)?,
                out_dir: setting("out", out, &config.output_directory, None)?,
                config: ApportionmentConfig::new(seats_total, &alphas),
            };
            info!("run: allocate: {:?}", settings);
            run_allocate(&settings)
        }
        Command::Indicators {
            pop,
            alloc_dir,
            out,
            reference,
        } => {
            let settings = IndicatorSettings {
                pop_file: setting("pop", pop, &config.population_file, None)?,
                alloc_dir: setting(
                    "alloc_dir",
                    alloc_dir,
                    &config.allocation_directory,
                    Some("data/outputs".to_string()),
                )?,
                out_dir: setting(
                    "out",
                    out,
                    &config.annexure_directory,
                    Some("annexures".to_string()),
                )?,
                reference: reference.clone(),
            };
            info!("run: indicators: {:?}", settings);
            run_indicators(&settings)
        }
        Command::Validate { file, canon } => {
            let canon = setting(
                "canon",
                canon,
                &config.canonical_file,
                Some(DEFAULT_CANONICAL_FILE.to_string()),
            )?;
            run_validate(file, &canon)
        }
        Command::Clean {
            infile,
            indir,
            out,
            canon,
            scale,
            force_scale,
        } => {
            let settings = CleanSettings {
                infile: infile.clone(),
                indir: setting(
                    "indir",
                    indir,
                    &config.raw_directory,
                    Some("data/raw".to_string()),
                )?,
                out_dir: setting(
                    "out",
                    out,
                    &config.processed_directory,
                    Some("data/processed".to_string()),
                )?,
                canon: setting(
                    "canon",
                    canon,
                    &config.canonical_file,
                    Some(DEFAULT_CANONICAL_FILE.to_string()),
                )?,
                scale: setting("scale", scale, &config.scale, Some(1e7))?,
                force_scale: *force_scale,
            };
            info!("run: clean: {:?}", settings);
            run_clean(&settings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pops() -> Vec<Region> {
        vec![
            Region::new("A", 1_000_000.0),
            Region::new("B", 3_000_000.0),
            Region::new("C", 6_000_000.0),
        ]
    }

    #[test]
    fn analyze_uses_proportional_baseline() {
        let allocations = vec![
            (
                "alloc_dp_alpha_0.5_10.csv".to_string(),
                vec![
                    ("A".to_string(), 2),
                    ("B".to_string(), 3),
                    ("C".to_string(), 5),
                ],
            ),
            (
                "alloc_proportional_10.csv".to_string(),
                vec![
                    ("A".to_string(), 1),
                    ("B".to_string(), 3),
                    ("C".to_string(), 6),
                ],
            ),
        ];
        let a = analyze_tables(&pops(), &allocations);
        assert_eq!(a.tables.len(), 2);
        assert_eq!(a.elasticity.len(), 2);
        assert_eq!(a.comparisons.len(), 1);
        let c = &a.comparisons[0];
        assert_eq!(c.allocation, "alloc_dp_alpha_0.5_10.csv");
        // A: 2 vs 1 (+100%), B: unchanged, C: 5 vs 6
        let expected = (1.0 + 0.0 + 1.0 / 6.0) / 3.0;
        assert!((c.mrc.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn analyze_fills_missing_regions() {
        let allocations = vec![(
            "partial.csv".to_string(),
            vec![("A".to_string(), 4), ("C".to_string(), 6)],
        )];
        let a = analyze_tables(&pops(), &allocations);
        assert_eq!(a.tables[0].records[1].seats, 0);
        assert_eq!(a.tables[0].records[1].elasticity, Some(0.0));
        assert!(a.comparisons.is_empty());
    }

    #[test]
    fn summary_js_has_nulls() {
        let allocations = vec![(
            "alloc_proportional_1.csv".to_string(),
            vec![("A".to_string(), 1)],
        )];
        let regions = vec![Region::new("A", 10.0), Region::new("Z", 0.0)];
        let a = analyze_tables(&regions, &allocations);
        let js = build_summary_js(&a);
        assert_eq!(js["allocations"][0]["file"], "alloc_proportional_1.csv");
        assert_eq!(js["allocations"][0]["totalSeats"], 1);
        assert!(js["comparisons"].as_array().unwrap().is_empty());
    }

    fn write(path: &Path, content: &str) -> String {
        fs::write(path, content).unwrap();
        path.display().to_string()
    }

    #[test]
    fn indicators_against_reference() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let alloc_dir = root.join("outputs");
        fs::create_dir(&alloc_dir).unwrap();
        write(
            &alloc_dir.join("alloc_proportional_4.csv"),
            "state,population,seats\nA,1000000,1\nB,3000000,3\n",
        );
        write(
            &alloc_dir.join("alloc_dp_alpha_0.5_4.csv"),
            "state,population,alpha,seats\nA,1000000,0.5,2\nB,3000000,0.5,2\n",
        );
        let out = root.join("annexures");
        let mut settings = IndicatorSettings {
            pop_file: write(
                &root.join("pop.csv"),
                "state,population\nA,1000000\nB,3000000\n",
            ),
            alloc_dir: alloc_dir.display().to_string(),
            out_dir: out.display().to_string(),
            reference: None,
        };
        run_indicators(&settings).unwrap();
        for name in [
            "Annexure_C_MI_Table.csv",
            "Annexure_D_Elasticity_Summary.csv",
            "Annexure_E_MRC_Summary.csv",
            "fairness_indicators.csv",
            "fairness_indicators.json",
        ] {
            assert!(out.join(name).exists(), "{}", name);
        }
        let mrc = fs::read_to_string(out.join("Annexure_E_MRC_Summary.csv")).unwrap();
        assert!(mrc.starts_with("file,mrc_mean_abs_rel_change\nalloc_dp_alpha_0.5_4.csv,"));

        // The summary of the same run is a matching reference.
        let same = root.join("same.json");
        fs::copy(out.join("fairness_indicators.json"), &same).unwrap();
        settings.reference = Some(same.display().to_string());
        run_indicators(&settings).unwrap();

        settings.reference = Some(write(
            &root.join("other.json"),
            r#"{"allocations": [], "comparisons": []}"#,
        ));
        assert!(matches!(
            run_indicators(&settings),
            Err(ApportionError::Whatever { .. })
        ));
    }

    #[test]
    fn allocate_rejects_zero_seats() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AllocateSettings {
            infile: write(
                &dir.path().join("pop.csv"),
                "state,population\nA,10\nB,20\n",
            ),
            out_dir: dir.path().join("out").display().to_string(),
            config: ApportionmentConfig::new(0, &[0.5]),
        };
        match run_allocate(&settings) {
            Err(ApportionError::InvalidSetting { name, source }) => {
                assert_eq!(name, "seats");
                assert_eq!(source, AllocationErrors::InvalidSeatTotal);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn allocate_writes_one_file_per_rule() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let settings = AllocateSettings {
            infile: write(
                &dir.path().join("pop.csv"),
                "state,population\nA,64\nB,16\n",
            ),
            out_dir: out.display().to_string(),
            config: ApportionmentConfig::new(10, &[0.5]),
        };
        run_allocate(&settings).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("alloc_dp_alpha_0.5_10.csv")).unwrap(),
            "state,population,alpha,seats\nA,64.0,0.5,7\nB,16.0,0.5,3\n"
        );
        assert!(out.join("alloc_proportional_10.csv").exists());
    }

    #[test]
    fn clean_directories_from_config() {
        use clap::Parser;

        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        fs::create_dir(&raw).unwrap();
        write(&raw.join("census.csv"), "state,population\nGoa,1458545\n");
        let cfg = write(
            &dir.path().join("run.json"),
            &json!({
                "rawDirectory": raw.display().to_string(),
                "processedDirectory": processed.display().to_string(),
                "canonicalFile": dir.path().join("none.csv").display().to_string(),
            })
            .to_string(),
        );
        let args = Args::parse_from(["apportion", "--config", cfg.as_str(), "clean"]);
        run(&args).unwrap();
        assert_eq!(
            fs::read_to_string(processed.join("census_clean.csv")).unwrap(),
            "state,population\nGoa,1458545.0\n"
        );
    }

    #[test]
    fn settings_precedence() {
        let flag = Some(3u32);
        let cfg = Some(5u32);
        assert_eq!(setting("x", &flag, &cfg, None).unwrap(), 3);
        assert_eq!(setting("x", &None, &cfg, Some(7)).unwrap(), 5);
        assert_eq!(setting("x", &None, &None, Some(7)).unwrap(), 7);
        assert!(matches!(
            setting::<u32>("x", &None, &None, None),
            Err(ApportionError::MissingSetting { .. })
        ));
    }

    #[test]
    fn run_config_from_json() {
        let c: RunConfig =
            serde_json::from_str(r#"{"seats": 888, "alphas": [0.5], "annexureDirectory": "out"}"#)
                .unwrap();
        assert_eq!(c.seats, Some(888));
        assert_eq!(c.alphas, Some(vec![0.5]));
        assert_eq!(c.annexure_directory, Some("out".to_string()));
        assert_eq!(c.population_file, None);

        let c: RunConfig =
            serde_json::from_str(r#"{"rawDirectory": "in", "processedDirectory": "clean"}"#)
                .unwrap();
        assert_eq!(c.raw_directory, Some("in".to_string()));
        assert_eq!(c.processed_directory, Some("clean".to_string()));
    }
}
