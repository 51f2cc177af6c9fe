use std::collections::HashSet;

use crate::apportion::{
    io_common::{find_column, open_table, parse_number, RawTable},
    *,
};

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ValidationReport {
    pub passed: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn log(&self) {
        for m in self.passed.iter() {
            info!("[OK] {}", m);
        }
        for m in self.warnings.iter() {
            warn!("[WARN] {}", m);
        }
        for m in self.errors.iter() {
            error!("[ERROR] {}", m);
        }
    }
}

/// The canonical state names: the second column of the canonical file.
///
/// The check is skipped (with a warning) when the file is absent.
pub fn load_canonical(path: &str) -> ApportionResult<Option<Vec<String>>> {
    if !Path::new(path).exists() {
        warn!("Canonical mapping {} not found: skipping canonical check", path);
        return Ok(None);
    }
    let table = open_table(path)?;
    if table.headers.len() < 2 {
        warn!("Canonical file has less than 2 columns: skipping canonical check");
        return Ok(None);
    }
    Ok(Some(
        table
            .column(1)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect(),
    ))
}

fn validate_population(table: &RawTable, report: &mut ValidationReport) {
    let pop_idx = match find_column(&table.headers, &["population"]) {
        Some(idx) => idx,
        None => {
            report
                .passed
                .push("No population column: skipping population checks.".to_string());
            return;
        }
    };
    let pops: Vec<Option<f64>> = table.column(pop_idx).map(parse_number).collect();
    if pops.iter().any(|p| p.is_none()) {
        report
            .errors
            .push("population contains values that are not numbers.".to_string());
    }
    if pops.iter().any(|p| matches!(p, Some(x) if *x < 0.0)) {
        report
            .errors
            .push("population contains negative values.".to_string());
    }
    if pops.iter().any(|p| *p == Some(0.0)) {
        report
            .warnings
            .push("Some states have population == 0.".to_string());
    }
    report.passed.push("population check done.".to_string());
}

fn validate_states(table: &RawTable, canonical: Option<&[String]>, report: &mut ValidationReport) {
    let state_idx = match find_column(&table.headers, &["state"]) {
        Some(idx) => idx,
        None => {
            report
                .warnings
                .push("No state column: cannot validate names.".to_string());
            return;
        }
    };
    let mut seen: HashSet<&str> = HashSet::new();
    let mut dups: Vec<&str> = Vec::new();
    for s in table.column(state_idx) {
        if !seen.insert(s) && !dups.contains(&s) {
            dups.push(s);
        }
    }
    if dups.is_empty() {
        report.passed.push("No duplicate states.".to_string());
    } else {
        report
            .errors
            .push(format!("Duplicate states found: {:?}", dups));
    }

    if let Some(canon) = canonical {
        let missing: Vec<&str> = table
            .column(state_idx)
            .filter(|s| !canon.iter().any(|c| c == s))
            .collect();
        if missing.is_empty() {
            report
                .passed
                .push("All states match canonical list.".to_string());
        } else {
            report
                .warnings
                .push(format!("States not in canonical list: {:?}", missing));
        }
    }
}

fn validate_seats(table: &RawTable, report: &mut ValidationReport) {
    let seats_idx = match find_column(&table.headers, &["seats"]) {
        Some(idx) => idx,
        None => {
            report
                .passed
                .push("No seats column: skipping seat-sum check.".to_string());
            return;
        }
    };
    let seats: Vec<Option<f64>> = table.column(seats_idx).map(parse_number).collect();
    if seats.iter().any(|s| s.is_none()) {
        report
            .errors
            .push("seats contains values that are not numbers.".to_string());
        return;
    }
    let total: f64 = seats.iter().flatten().sum();
    let valid = ApportionmentConfig::LEGISLATURE_SIZES
        .iter()
        .any(|s| *s as f64 == total);
    if valid {
        report.passed.push(format!("Seat sum = {}", total));
    } else {
        report.errors.push(format!(
            "Seat sum invalid: {} (expected one of {:?})",
            total,
            ApportionmentConfig::LEGISLATURE_SIZES
        ));
    }
}

/// Checks a population or an allocation table.
pub fn validate_table(table: &RawTable, canonical: Option<&[String]>) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_population(table, &mut report);
    validate_states(table, canonical, &mut report);
    validate_seats(table, &mut report);
    debug!("validate_table: {}: {:?}", table.path, report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apportion::io_common::read_table;

    fn table(data: &str) -> RawTable {
        read_table(data.as_bytes(), "v.csv").unwrap()
    }

    #[test]
    fn clean_population_file() {
        let r = validate_table(&table("state,population\nA,10\nB,20\n"), None);
        assert!(r.errors.is_empty());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn population_problems() {
        let r = validate_table(&table("state,population\nA,-10\nB,0\nA,x\n"), None);
        assert_eq!(r.errors.len(), 3);
        assert!(r.errors[2].contains("\"A\""));
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn seat_sums() {
        let ok = format!("state,seats\nA,500\nB,{}\n", 43);
        assert!(validate_table(&table(&ok), None).errors.is_empty());
        let r = validate_table(&table("state,seats\nA,500\nB,44\n"), None);
        assert_eq!(r.errors.len(), 1);
        assert!(r.errors[0].contains("544"));
    }

    #[test]
    fn canonical_names() {
        let canon = vec!["Goa".to_string(), "Kerala".to_string()];
        let r = validate_table(&table("state,population\nGoa,1\nKeralam,2\n"), Some(&canon));
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("Keralam"));
    }
}
