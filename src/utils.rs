use crate::error::Result;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub fn ensure_directory(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub fn save_json(data: &impl serde::Serialize, path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let json_string = serde_json::to_string_pretty(data)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// ISO-8601 local time with colons swapped for dashes so it can name a
/// directory on any filesystem.
pub fn path_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn timestamps_have_no_colons() {
        let at = Utc.with_ymd_and_hms(2015, 9, 1, 13, 5, 9).unwrap();
        assert_eq!(path_timestamp(&at), "2015-09-01T13-05-09");
    }

    #[test]
    fn save_json_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        save_json(&vec!["PHYS-20155"], &path).unwrap();
        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["PHYS-20155"]);
    }
}
