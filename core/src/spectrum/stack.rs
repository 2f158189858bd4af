use serde::{Deserialize, Serialize};

use crate::prelude::{ensure_aligned, FrequencyBand, StageError, StageResult};
use crate::processing::band::band_indices;
use crate::processing::downbin::downbin;

/// A named measurement array co-indexed with the stack's frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Frequency channels (GHz) plus any number of index-aligned series.
///
/// Every series always has the same length as the frequency array; the
/// reshaping operations (sort, shift, downbin, restrict) touch every series
/// at once so alignment survives them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralStack {
    freqs: Vec<f64>,
    series: Vec<Series>,
}

impl SpectralStack {
    pub fn new(freqs: Vec<f64>) -> Self {
        Self {
            freqs,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> StageResult<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// Adds or replaces a series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> StageResult<()> {
        let name = name.into();
        ensure_aligned(&format!("series '{}'", name), self.freqs.len(), values.len())?;
        match self.series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.values = values,
            None => self.series.push(Series { name, values }),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn require(&self, name: &str) -> StageResult<&[f64]> {
        self.series(name)
            .ok_or_else(|| StageError::NotFound(format!("series '{}' not in stack", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    /// Drops `shift` leading channels, then block-averages every array by `factor`.
    pub fn downbin(&self, factor: usize, shift: usize) -> StageResult<Self> {
        let start = shift.min(self.freqs.len());
        let freqs = downbin(&self.freqs[start..], factor)?;
        let series = self
            .series
            .iter()
            .map(|s| {
                Ok(Series {
                    name: s.name.clone(),
                    values: downbin(&s.values[start..], factor)?,
                })
            })
            .collect::<StageResult<Vec<_>>>()?;
        Ok(Self { freqs, series })
    }

    /// Keeps the channels inside `band`. An empty result is not an error.
    pub fn restrict(&self, band: &FrequencyBand) -> StageResult<Self> {
        let indices = band_indices(&self.freqs, band)?;
        Ok(self.select(&indices))
    }

    /// Builds a new stack from the given channel indices, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |values: &[f64]| indices.iter().map(|&i| values[i]).collect::<Vec<_>>();
        Self {
            freqs: pick(&self.freqs),
            series: self
                .series
                .iter()
                .map(|s| Series {
                    name: s.name.clone(),
                    values: pick(&s.values),
                })
                .collect(),
        }
    }

    /// Stable reorder of every array into ascending frequency.
    pub fn sort_by_frequency(&self) -> Self {
        let mut order: Vec<usize> = (0..self.freqs.len()).collect();
        order.sort_by(|&a, &b| self.freqs[a].total_cmp(&self.freqs[b]));
        self.select(&order)
    }

    /// Appends the channels of `other`; both stacks must carry the same series.
    pub fn concat(&mut self, other: &SpectralStack) -> StageResult<()> {
        if self.freqs.is_empty() && self.series.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        let extras = self
            .series
            .iter()
            .map(|s| other.require(&s.name))
            .collect::<StageResult<Vec<_>>>()?;
        if other.series.len() != self.series.len() {
            return Err(StageError::InvalidInput(
                "stacks carry different series".into(),
            ));
        }
        for (series, extra) in self.series.iter_mut().zip(extras) {
            series.values.extend_from_slice(extra);
        }
        self.freqs.extend_from_slice(&other.freqs);
        Ok(())
    }
}
