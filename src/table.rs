use crate::error::{Result, StorageError};
use crate::model::CourseRecord;
use std::path::Path;

/// Column-named rows of text, written to and read from CSV.
///
/// Columns are whatever the source page offered; stacking tables with
/// different columns takes the union, filling gaps with empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from records, taking the union of their field names in
    /// first-seen order.
    pub fn from_records(records: &[CourseRecord]) -> Self {
        let mut table = Table::default();
        for record in records {
            table.push_fields(record.fields());
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StorageError::RaggedRow {
                expected: self.columns.len(),
                found: row.len(),
            }
            .into());
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a named row; unseen names become new columns.
    pub fn push_fields(&mut self, fields: Vec<(String, String)>) {
        let mut row = vec![String::new(); self.columns.len()];
        for (name, value) in fields {
            match self.column_index(&name) {
                Some(idx) => row[idx] = value,
                None => {
                    self.add_empty_column(name);
                    row.push(value);
                }
            }
        }
        self.rows.push(row);
    }

    fn add_empty_column(&mut self, name: String) {
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Stacks `other` under `self`, joining on column name.
    pub fn vstack(&mut self, other: &Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.add_empty_column(name.clone());
                    self.columns.len() - 1
                }
            })
            .collect();

        for source in &other.rows {
            let mut row = vec![String::new(); self.columns.len()];
            for (value, &idx) in source.iter().zip(&mapping) {
                row[idx] = value.clone();
            }
            self.rows.push(row);
        }
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.columns.is_empty() {
            std::fs::write(path, "")?;
            return Ok(());
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(String::from).collect())?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|v| v.to_string()).collect()).unwrap();
        }
        t
    }

    #[test]
    fn vstack_unions_drifting_columns() {
        let mut all = table(&["ID #", "Title", "Instructor"], &[&["000001", "Optics", "Lee"]]);
        let later = table(&["ID #", "Delivery", "Title"], &[&["000002", "Online", "Waves"]]);

        all.vstack(&later);

        assert_eq!(all.columns(), &["ID #", "Title", "Instructor", "Delivery"]);
        assert_eq!(all.rows()[0], vec!["000001", "Optics", "Lee", ""]);
        assert_eq!(all.rows()[1], vec!["000002", "Waves", "", "Online"]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut t = table(&["a", "b"], &[]);
        assert!(t.push_row(vec!["1".into()]).is_err());
    }

    #[test]
    fn csv_round_trip_keeps_rows_and_embedded_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let t = table(
            &["ID #", "Location"],
            &[&["000001", "MA 101\nMA 102"], &["000002", "Hagen, 3rd floor"]],
        );

        t.write_csv(&path).unwrap();
        let back = Table::read_csv(&path).unwrap();

        assert_eq!(back, t);
    }

    #[test]
    fn empty_table_round_trips_to_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        Table::default().write_csv(&path).unwrap();
        assert_eq!(Table::read_csv(&path).unwrap().len(), 0);
    }
}
