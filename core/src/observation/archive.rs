//! JSON observation archives as written by the backend dump scripts.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::prelude::{ensure_aligned, StageError, StageResult};

/// Dual-polarization GBT dump with noise-diode temperatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtArchive {
    pub freqs: Vec<f64>,
    #[serde(rename = "XX_Out")]
    pub xx: PolarizationRows,
    #[serde(rename = "YY_Out")]
    pub yy: PolarizationRows,
    #[serde(rename = "XX_TCal")]
    pub xx_tcal: f64,
    #[serde(rename = "YY_TCal")]
    pub yy_tcal: f64,
}

impl GbtArchive {
    pub fn validate(&self) -> StageResult<()> {
        self.xx.validate("XX", self.freqs.len())?;
        self.yy.validate("YY", self.freqs.len())
    }
}

/// The six per-channel rows recorded for one polarization.
///
/// Stored on disk as a six-row array in this field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Vec<f64>; 6]", into = "[Vec<f64>; 6]")]
pub struct PolarizationRows {
    pub sig_accepted: Vec<f64>,
    pub sig_on: Vec<f64>,
    pub sig_off: Vec<f64>,
    pub ref_accepted: Vec<f64>,
    pub ref_on: Vec<f64>,
    pub ref_off: Vec<f64>,
}

impl From<[Vec<f64>; 6]> for PolarizationRows {
    fn from(rows: [Vec<f64>; 6]) -> Self {
        let [sig_accepted, sig_on, sig_off, ref_accepted, ref_on, ref_off] = rows;
        Self {
            sig_accepted,
            sig_on,
            sig_off,
            ref_accepted,
            ref_on,
            ref_off,
        }
    }
}

impl From<PolarizationRows> for [Vec<f64>; 6] {
    fn from(rows: PolarizationRows) -> Self {
        [
            rows.sig_accepted,
            rows.sig_on,
            rows.sig_off,
            rows.ref_accepted,
            rows.ref_on,
            rows.ref_off,
        ]
    }
}

impl PolarizationRows {
    pub(crate) fn rows(&self) -> [(&'static str, &[f64]); 6] {
        [
            ("sig_accepted", self.sig_accepted.as_slice()),
            ("sig_on", self.sig_on.as_slice()),
            ("sig_off", self.sig_off.as_slice()),
            ("ref_accepted", self.ref_accepted.as_slice()),
            ("ref_on", self.ref_on.as_slice()),
            ("ref_off", self.ref_off.as_slice()),
        ]
    }

    pub fn validate(&self, pol: &str, channels: usize) -> StageResult<()> {
        for (name, row) in self.rows() {
            ensure_aligned(&format!("{} {}", pol, name), channels, row.len())?;
        }
        Ok(())
    }
}

/// Effelsberg dump: frequency plus signal and reference counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffelsbergArchive {
    pub freqs: Vec<f64>,
    pub sig: Vec<f64>,
    #[serde(rename = "ref")]
    pub reference: Vec<f64>,
}

impl EffelsbergArchive {
    pub fn validate(&self) -> StageResult<()> {
        ensure_aligned("sig", self.freqs.len(), self.sig.len())?;
        ensure_aligned("ref", self.freqs.len(), self.reference.len())
    }
}

pub fn read_archive<T: DeserializeOwned>(path: &Path) -> StageResult<T> {
    let file = File::open(path)?;
    let archive = serde_json::from_reader(BufReader::new(file))?;
    Ok(archive)
}

pub fn write_archive<T: Serialize>(path: &Path, archive: &T) -> StageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), archive)?;
    Ok(())
}

/// Files in `dir` whose name contains `tag`, in name order.
pub fn matching_files(dir: &Path, tag: &str) -> StageResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(tag) {
            paths.push(entry.path());
        }
    }
    if paths.is_empty() {
        return Err(StageError::NotFound(format!(
            "no archives tagged '{}' in {}",
            tag,
            dir.display()
        )));
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn gbt_rows_decode_positionally() {
        let json = r#"{
            "freqs": [1.3, 1.4],
            "XX_Out": [[1,1],[2,2],[3,3],[4,4],[5,5],[6,6]],
            "YY_Out": [[1,1],[2,2],[3,3],[4,4],[5,5],[6,6]],
            "XX_TCal": 1.5,
            "YY_TCal": 1.7
        }"#;
        let archive: GbtArchive = serde_json::from_str(json).unwrap();
        assert_eq!(archive.xx.sig_on, vec![2.0, 2.0]);
        assert_eq!(archive.yy.ref_off, vec![6.0, 6.0]);
        assert_eq!(archive.yy_tcal, 1.7);
        archive.validate().unwrap();
    }

    #[test]
    fn short_polarization_row_fails_validation() {
        let archive = GbtArchive {
            freqs: vec![1.0, 2.0],
            xx: PolarizationRows::from([
                vec![1.0, 1.0],
                vec![1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
            ]),
            yy: PolarizationRows::from([
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
            ]),
            xx_tcal: 1.0,
            yy_tcal: 1.0,
        };
        let err = archive.validate().unwrap_err();
        assert!(err.to_string().contains("XX sig_on"));
    }

    #[test]
    fn archives_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("3C286_scan1.json");
        let archive = EffelsbergArchive {
            freqs: vec![1.2, 1.3],
            sig: vec![10.0, 11.0],
            reference: vec![9.0, 9.5],
        };
        write_archive(&path, &archive).unwrap();
        let loaded: EffelsbergArchive = read_archive(&path).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn matching_files_filters_by_tag() {
        let dir = tempdir().unwrap();
        for name in ["b_target.json", "a_target.json", "calib.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let files = matching_files(dir.path(), "target").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_target.json", "b_target.json"]);

        assert!(matches!(
            matching_files(dir.path(), "nothing"),
            Err(StageError::NotFound(_))
        ));
    }
}
