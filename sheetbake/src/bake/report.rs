use crate::error::ReferenceError;
use chrono::{DateTime, Utc};

/// A source row that did not make it into its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// Position in the source sheet.
    pub position: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SheetReport {
    pub name: String,
    pub file_name: String,
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub issues: Vec<RowIssue>,
    pub references: Vec<ReferenceError>,
}

impl SheetReport {
    pub fn new(name: &str, file_name: &str) -> Self {
        SheetReport { name: name.to_string(), file_name: file_name.to_string(), ..Default::default() }
    }
}

#[derive(Debug, Clone)]
pub struct BakeReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sheets: Vec<SheetReport>,
    /// Declared sheets left out, pseudo sheets when they are not allowed.
    pub skipped: Vec<String>,
}

impl BakeReport {
    pub fn start() -> Self {
        BakeReport { started_at: Utc::now(), finished_at: None, sheets: Vec::new(), skipped: Vec::new() }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub(crate) fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetReport> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    pub fn reference_errors(&self) -> impl Iterator<Item = &ReferenceError> {
        self.sheets.iter().flat_map(|sheet| sheet.references.iter())
    }

    pub fn row_issues(&self) -> impl Iterator<Item = (&str, &RowIssue)> {
        self.sheets.iter().flat_map(|sheet| sheet.issues.iter().map(move |issue| (sheet.name.as_str(), issue)))
    }

    pub fn rows(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.rows).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.sheets.iter().all(|sheet| sheet.issues.is_empty() && sheet.references.is_empty())
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_sheets() {
        let mut report = BakeReport::start();
        let mut heroes = SheetReport::new("Heroes", "Heroes");
        heroes.rows = 2;
        heroes.issues.push(RowIssue { position: 1, id: None, reason: "blank row id".into() });
        let mut items = SheetReport::new("Items", "Items");
        items.rows = 3;
        report.sheets.extend([heroes, items]);
        report.finish();

        assert_eq!(report.rows(), 5);
        assert!(!report.is_clean());
        assert_eq!(report.row_issues().map(|(sheet, _)| sheet).collect::<Vec<_>>(), vec!["Heroes"]);
        assert!(report.elapsed().is_some_and(|d| d >= chrono::Duration::zero()));
    }
}
