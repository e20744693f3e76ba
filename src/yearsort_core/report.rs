use crate::yearsort_core::photo::CaptureYear;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Emitted once per asset after it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Assets completed so far, including duplicates and failures.
    pub processed: usize,
    pub total: usize,
    pub current: String,
    pub origin: String,
}

/// Final outcome of an organization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResult {
    pub success: bool,
    pub message: String,
    pub total_assets: usize,
    pub organized_by_year: BTreeMap<CaptureYear, usize>,
    pub duplicates: usize,
    pub problematic: usize,
    /// Assets actually copied into the destination.
    pub processed: usize,
    pub destination_root: String,
    pub duplicate_names: Vec<String>,
    pub problematic_names: Vec<String>,
    pub cancelled: bool,
    pub dry_run: bool,
}

impl OrganizationResult {
    /// A failed run: zero counts and the reason as the message.
    pub fn failed(message: impl Into<String>) -> Self {
        OrganizationResult {
            success: false,
            message: message.into(),
            total_assets: 0,
            organized_by_year: BTreeMap::new(),
            duplicates: 0,
            problematic: 0,
            processed: 0,
            destination_root: String::new(),
            duplicate_names: Vec::new(),
            problematic_names: Vec::new(),
            cancelled: false,
            dry_run: false,
        }
    }
}

impl fmt::Display for OrganizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        if self.total_assets == 0 {
            return Ok(());
        }
        writeln!(f, "  {} photos found", self.total_assets)?;
        for (year, count) in &self.organized_by_year {
            writeln!(f, "  {}: {} photos", year, count)?;
        }
        if self.duplicates > 0 {
            writeln!(f, "  {} duplicates", self.duplicates)?;
        }
        if self.problematic > 0 {
            writeln!(f, "  {} could not be organized:", self.problematic)?;
            for name in &self.problematic_names {
                writeln!(f, "    - {}", name)?;
            }
        }
        if !self.destination_root.is_empty() {
            write!(f, "  destination: {}", self.destination_root)?;
        }
        Ok(())
    }
}

/// Accumulates per-asset outcomes during a run.
#[derive(Debug, Default)]
pub struct Tally {
    organized_by_year: BTreeMap<CaptureYear, usize>,
    duplicate_names: Vec<String>,
    problematic_names: Vec<String>,
    completed: usize,
}

impl Tally {
    pub fn placed(&mut self, year: CaptureYear) {
        *self.organized_by_year.entry(year).or_insert(0) += 1;
        self.completed += 1;
    }

    pub fn duplicate(&mut self, name: &str) {
        self.duplicate_names.push(name.to_string());
        self.completed += 1;
    }

    /// A duplicate that was still copied under another name.
    pub fn renamed(&mut self, year: CaptureYear, name: &str) {
        self.duplicate_names.push(name.to_string());
        *self.organized_by_year.entry(year).or_insert(0) += 1;
        self.completed += 1;
    }

    pub fn problem(&mut self, name: &str) {
        self.problematic_names.push(name.to_string());
        self.completed += 1;
    }

    /// Assets that reached a terminal state.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn processed(&self) -> usize {
        self.organized_by_year.values().sum()
    }

    pub fn finish(
        self,
        success: bool,
        message: String,
        total_assets: usize,
        destination_root: String,
    ) -> OrganizationResult {
        let processed = self.processed();
        OrganizationResult {
            success,
            message,
            total_assets,
            organized_by_year: self.organized_by_year,
            duplicates: self.duplicate_names.len(),
            problematic: self.problematic_names.len(),
            processed,
            destination_root,
            duplicate_names: self.duplicate_names,
            problematic_names: self.problematic_names,
            cancelled: false,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: i32) -> CaptureYear {
        CaptureYear::new(y).unwrap()
    }

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::default();
        tally.placed(year(2020));
        tally.placed(year(2020));
        tally.renamed(year(2019), "x.jpg");
        tally.duplicate("y.jpg");
        tally.problem("z.jpg");
        assert_eq!(tally.completed(), 5);

        let result = tally.finish(true, "done".to_string(), 6, "/dest".to_string());
        assert_eq!(result.processed, 3);
        assert_eq!(result.duplicates, 2);
        assert_eq!(result.problematic, 1);
        assert_eq!(result.organized_by_year[&year(2020)], 2);
        assert_eq!(result.duplicate_names, vec!["x.jpg", "y.jpg"]);
    }

    #[test]
    fn test_result_json_shape() {
        let mut tally = Tally::default();
        tally.placed(year(2020));
        let result = tally.finish(true, "ok".to_string(), 1, "/dest".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalAssets"], 1);
        assert_eq!(json["organizedByYear"]["2020"], 1);
        assert_eq!(json["destinationRoot"], "/dest");
        assert_eq!(json["dryRun"], false);
    }

    #[test]
    fn test_failed_has_zero_counts() {
        let result = OrganizationResult::failed("boom");
        assert!(!result.success);
        assert_eq!(result.total_assets, 0);
        assert!(result.organized_by_year.is_empty());
        assert_eq!(result.to_string().trim(), "boom");
    }
}
