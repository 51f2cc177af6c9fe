// Normalization of the raw population tables.

use std::collections::HashMap;

use crate::apportion::{
    io_common::{find_column, open_table, parse_number, simplify_file_name, RawTable},
    io_csv::{create_file, write_rows},
    *,
};

pub const POPULATION_COLUMNS: [&str; 5] = [
    "population",
    "pop",
    "population_total",
    "total_population",
    "persons",
];
pub const RAW_STATE_COLUMNS: [&str; 4] = ["state", "state_name", "region", "unit"];

/// Populations below this mean are assumed to be expressed in crores.
const PERSONS_THRESHOLD: f64 = 1e6;

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct CleanRow {
    pub state: String,
    pub population: Option<f64>,
}

/// The mapping from raw names to canonical names.
///
/// The columns `raw,canonical` or `state,canonical_state` are used if present,
/// otherwise the first two columns. A missing file gives an empty mapping.
pub fn load_canonical_map(path: &str) -> ApportionResult<HashMap<String, String>> {
    if !Path::new(path).exists() {
        warn!(
            "Canonical mapping not found at {}. Proceeding without mapping.",
            path
        );
        return Ok(HashMap::new());
    }
    Ok(canonical_map(&open_table(path)?))
}

pub fn canonical_map(table: &RawTable) -> HashMap<String, String> {
    let pairs = [("raw", "canonical"), ("state", "canonical_state")];
    let cols = pairs
        .iter()
        .find_map(|(from, to)| {
            match (
                find_column(&table.headers, &[*from]),
                find_column(&table.headers, &[*to]),
            ) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            }
        })
        .or(if table.headers.len() >= 2 {
            Some((0, 1))
        } else {
            None
        });
    match cols {
        Some((a, b)) => table
            .column(a)
            .zip(table.column(b))
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
        None => HashMap::new(),
    }
}

fn is_numeric_column(table: &RawTable, idx: usize) -> bool {
    let mut count = 0;
    for cell in table.column(idx) {
        if cell.is_empty() {
            continue;
        }
        if parse_number(cell).is_none() {
            return false;
        }
        count += 1;
    }
    count > 0
}

fn population_column(table: &RawTable) -> ApportionResult<usize> {
    if let Some(idx) = find_column(&table.headers, &POPULATION_COLUMNS) {
        return Ok(idx);
    }
    // The numeric column with the largest sum.
    let best = (0..table.headers.len())
        .filter(|idx| is_numeric_column(table, *idx))
        .map(|idx| {
            let sum: f64 = table.column(idx).filter_map(parse_number).sum();
            (idx, sum)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match best {
        Some((idx, _)) => {
            debug!(
                "population_column: {}: guessed column {:?}",
                table.path, table.headers[idx]
            );
            Ok(idx)
        }
        None => whatever!("No population or numeric columns found in {}", table.path),
    }
}

fn state_column(table: &RawTable) -> ApportionResult<usize> {
    if let Some(idx) = find_column(&table.headers, &RAW_STATE_COLUMNS) {
        return Ok(idx);
    }
    match (0..table.headers.len()).find(|idx| !is_numeric_column(table, *idx)) {
        Some(idx) => Ok(idx),
        None => whatever!("No state/name-like column found in {}", table.path),
    }
}

/// Extracts the state names and the populations of a raw table.
pub fn clean_table(
    table: &RawTable,
    cmap: &HashMap<String, String>,
    scale: f64,
    force_scale: bool,
) -> ApportionResult<Vec<CleanRow>> {
    let pop_idx = population_column(table)?;
    let state_idx = state_column(table)?;

    let raw: Vec<Option<f64>> = table.column(pop_idx).map(parse_number).collect();
    if raw.iter().any(|p| p.is_none()) {
        warn!(
            "Missing or invalid populations after conversion in {}",
            table.path
        );
    }
    let mean = apportionment::stats::mean(&raw);
    let need_scale = force_scale || mean.map(|m| m < PERSONS_THRESHOLD).unwrap_or(false);
    let factor = if need_scale && scale != 1.0 {
        info!("Scaling the populations of {} by {}", table.path, scale);
        scale
    } else {
        1.0
    };

    let mut res: Vec<CleanRow> = Vec::new();
    for (name, pop) in table.column(state_idx).zip(raw.iter()) {
        let state = cmap.get(name).cloned().unwrap_or_else(|| name.to_string());
        let population = pop.map(|p| p * factor);
        if let Some(p) = population {
            if p < 0.0 {
                return NegativePopulationSnafu {
                    region: state,
                    population: p,
                    path: table.path.clone(),
                }
                .fail();
            }
        }
        res.push(CleanRow { state, population });
    }
    Ok(res)
}

/// Cleans one raw file and writes `<stem>_clean.csv` in the output directory.
pub fn process_file(
    path: &str,
    settings: &CleanSettings,
    cmap: &HashMap<String, String>,
) -> ApportionResult<PathBuf> {
    let table = open_table(path)?;
    let rows = clean_table(&table, cmap, settings.scale, settings.force_scale)?;

    let file_name = simplify_file_name(path);
    let stem = Path::new(&file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(file_name);
    let p_out: PathBuf = [settings.out_dir.clone(), format!("{}_clean.csv", stem)]
        .iter()
        .collect();
    let p_out_s = p_out.display().to_string();
    write_rows(create_file(&p_out)?, &p_out_s, &["state", "population"], &rows)?;
    info!("Wrote cleaned file: {}", p_out_s);
    Ok(p_out)
}
