// Readers and writers of the population, allocation and annexure tables.

use std::io::Write;

use crate::apportion::{
    io_common::{open_table, parse_number, require_column, RawTable},
    *,
};

pub const STATE_COLUMNS: [&str; 3] = ["state", "state_name", "region"];
pub const SEATS_COLUMNS: [&str; 4] = ["seats", "seat", "allocated", "allocation"];

/// Reads a cleaned population file (columns state and population).
pub fn read_populations(path: &str) -> ApportionResult<Vec<Region>> {
    info!("Attempting to read population file {:?}", path);
    parse_populations(&open_table(path)?)
}

pub fn parse_populations(table: &RawTable) -> ApportionResult<Vec<Region>> {
    let state_idx = require_column(table, &["state"])?;
    let pop_idx = require_column(table, &["population"])?;
    let mut res: Vec<Region> = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let lineno = RawTable::lineno(idx);
        let path = table.path.clone();
        let name = row
            .get(state_idx)
            .context(CsvLineTooShortSnafu {
                path: path.clone(),
                lineno,
            })?
            .clone();
        let content = row.get(pop_idx).cloned().unwrap_or_default();
        let population = parse_number(&content)
            .filter(|p| p.is_finite())
            .context(ParsingNumberSnafu {
                content: content.clone(),
                region: name.clone(),
                path: path.clone(),
                lineno,
            })?;
        if population < 0.0 {
            return NegativePopulationSnafu {
                region: name,
                population,
                path,
            }
            .fail();
        }
        if population == 0.0 {
            warn!("{}: region {} has a population of 0", table.path, name);
        }
        res.push(Region { name, population });
    }
    debug!("parse_populations: {:?}", res);
    Ok(res)
}

/// Reads the seats of an allocation file. The state and seats columns are
/// found by name. Rows without seats are skipped.
pub fn read_allocation(path: &str) -> ApportionResult<Vec<(String, u32)>> {
    parse_allocation(&open_table(path)?)
}

pub fn parse_allocation(table: &RawTable) -> ApportionResult<Vec<(String, u32)>> {
    let state_idx = require_column(table, &STATE_COLUMNS)?;
    let seats_idx = require_column(table, &SEATS_COLUMNS)?;
    let mut res: Vec<(String, u32)> = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let lineno = RawTable::lineno(idx);
        let name = row.get(state_idx).cloned().unwrap_or_default();
        let content = row.get(seats_idx).cloned().unwrap_or_default();
        if content.is_empty() {
            debug!("parse_allocation: line {}: no seats for {:?}", lineno, name);
            continue;
        }
        // Seats may have been written as floats by other tools.
        let seats = match parse_number(&content) {
            Some(x) if x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as f64 => x as u32,
            _ => {
                return ParsingNumberSnafu {
                    content,
                    region: name,
                    path: table.path.clone(),
                    lineno,
                }
                .fail();
            }
        };
        res.push((name, seats));
    }
    Ok(res)
}

pub fn allocation_file_name(allocation: &Allocation) -> String {
    match allocation.rule {
        AllocationRule::Proportional => {
            format!("alloc_proportional_{}.csv", allocation.seats_total)
        }
        AllocationRule::Degressive { alpha } => {
            format!("alloc_dp_alpha_{}_{}.csv", alpha, allocation.seats_total)
        }
    }
}

#[derive(Serialize)]
struct ProportionalRow<'a> {
    state: &'a str,
    population: f64,
    seats: u32,
}

#[derive(Serialize)]
struct DegressiveRow<'a> {
    state: &'a str,
    population: f64,
    alpha: f64,
    seats: u32,
}

#[derive(Serialize)]
struct MiTableRow<'a> {
    state: &'a str,
    population: f64,
    seats: u32,
    seats_per_million: Option<f64>,
    rep_ratio: Option<f64>,
    elasticity: Option<f64>,
    allocation_file: &'a str,
}

#[derive(Serialize)]
struct ElasticityRow<'a> {
    file: &'a str,
    mean_elasticity: Option<f64>,
    median_elasticity: Option<f64>,
    p90_elasticity: Option<f64>,
    p10_elasticity: Option<f64>,
}

#[derive(Serialize)]
struct MrcRow<'a> {
    file: &'a str,
    mrc_mean_abs_rel_change: Option<f64>,
}

#[derive(Serialize)]
struct FairnessRow<'a> {
    file: &'a str,
    total_seats: u64,
    total_population: f64,
    #[serde(rename = "MI_seats_per_million")]
    mi_seats_per_million: Option<f64>,
    #[serde(rename = "Gini_seats_per_million")]
    gini_seats_per_million: Option<f64>,
    mean_elasticity: Option<f64>,
    median_elasticity: Option<f64>,
    mean_seats_per_million: Option<f64>,
}

/// Writes the header, then the rows. The header is present even if there is
/// no row.
pub fn write_rows<W: Write, S: Serialize>(
    w: W,
    path: &str,
    headers: &[&str],
    rows: &[S],
) -> ApportionResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(headers)
        .context(WritingCsvSnafu { path })?;
    for row in rows.iter() {
        wtr.serialize(row).context(WritingCsvSnafu { path })?;
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu { path })?;
    debug!("write_rows: {}: {} rows", path, rows.len());
    Ok(())
}

/// Creates (or truncates) an output file.
pub fn create_file(path: &Path) -> ApportionResult<fs::File> {
    fs::File::create(path)
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu {
            path: path.display().to_string(),
        })
}

pub fn write_allocation<W: Write>(w: W, path: &str, allocation: &Allocation) -> ApportionResult<()> {
    match allocation.rule {
        AllocationRule::Proportional => {
            let rows: Vec<ProportionalRow> = allocation
                .records
                .iter()
                .map(|r| ProportionalRow {
                    state: &r.region,
                    population: r.population,
                    seats: r.seats,
                })
                .collect();
            write_rows(w, path, &["state", "population", "seats"], &rows)
        }
        AllocationRule::Degressive { alpha } => {
            let rows: Vec<DegressiveRow> = allocation
                .records
                .iter()
                .map(|r| DegressiveRow {
                    state: &r.region,
                    population: r.population,
                    alpha,
                    seats: r.seats,
                })
                .collect();
            write_rows(w, path, &["state", "population", "alpha", "seats"], &rows)
        }
    }
}

/// Annexure C: one row per region and allocation.
pub fn write_mi_table<W: Write>(w: W, path: &str, tables: &[IndicatorTable]) -> ApportionResult<()> {
    let rows: Vec<MiTableRow> = tables
        .iter()
        .flat_map(|t| {
            t.records.iter().map(move |r| MiTableRow {
                state: &r.region,
                population: r.population,
                seats: r.seats,
                seats_per_million: r.seats_per_million,
                rep_ratio: r.seats_per_million,
                elasticity: r.elasticity,
                allocation_file: &t.allocation,
            })
        })
        .collect();
    write_rows(
        w,
        path,
        &[
            "state",
            "population",
            "seats",
            "seats_per_million",
            "rep_ratio",
            "elasticity",
            "allocation_file",
        ],
        &rows,
    )
}

/// Annexure D.
pub fn write_elasticity_summary<W: Write>(
    w: W,
    path: &str,
    summaries: &[ElasticitySummary],
) -> ApportionResult<()> {
    let rows: Vec<ElasticityRow> = summaries
        .iter()
        .map(|es| ElasticityRow {
            file: &es.allocation,
            mean_elasticity: es.mean,
            median_elasticity: es.median,
            p90_elasticity: es.p90,
            p10_elasticity: es.p10,
        })
        .collect();
    write_rows(
        w,
        path,
        &[
            "file",
            "mean_elasticity",
            "median_elasticity",
            "p90_elasticity",
            "p10_elasticity",
        ],
        &rows,
    )
}

/// Annexure E.
pub fn write_mrc_summary<W: Write>(
    w: W,
    path: &str,
    comparisons: &[ComparativeRecord],
) -> ApportionResult<()> {
    let rows: Vec<MrcRow> = comparisons
        .iter()
        .map(|c| MrcRow {
            file: &c.allocation,
            mrc_mean_abs_rel_change: c.mrc,
        })
        .collect();
    write_rows(w, path, &["file", "mrc_mean_abs_rel_change"], &rows)
}

pub fn write_fairness_indicators<W: Write>(
    w: W,
    path: &str,
    tables: &[IndicatorTable],
) -> ApportionResult<()> {
    let rows: Vec<FairnessRow> = tables
        .iter()
        .map(|t| FairnessRow {
            file: &t.allocation,
            total_seats: t.summary.total_seats,
            total_population: t.summary.total_population,
            mi_seats_per_million: t.summary.malapportionment_index,
            gini_seats_per_million: t.summary.gini,
            mean_elasticity: t.summary.mean_elasticity,
            median_elasticity: t.summary.median_elasticity,
            mean_seats_per_million: t.summary.mean_seats_per_million,
        })
        .collect();
    write_rows(
        w,
        path,
        &[
            "file",
            "total_seats",
            "total_population",
            "MI_seats_per_million",
            "Gini_seats_per_million",
            "mean_elasticity",
            "median_elasticity",
            "mean_seats_per_million",
        ],
        &rows,
    )
}
