//! Tabular row/column model and the polars boundary
//!
//! The resampling core operates on [`Dataset`], a column-oriented table with
//! three attribute groups: categorical feature columns, numeric feature
//! columns, and one real-valued label column. Polars `DataFrame`s are
//! converted at the boundary: column roles are classified from dtypes on
//! ingest, and numeric columns are cast back to their original dtypes on
//! egress so the output schema matches the input exactly.

use crate::error::{Result, SmognError};
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashMap;

/// A single synthesized or original row: categorical values, numeric values,
/// and the label. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Categorical feature values by column name
    pub cat: HashMap<String, String>,
    /// Numeric feature values by column name
    pub num: HashMap<String, f64>,
    /// Label value
    pub label: f64,
}

/// Column-oriented tabular dataset with classified column roles.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Original column order, label included, for schema-faithful reassembly
    column_order: Vec<String>,
    /// Original dtypes, aligned with `column_order`
    dtypes: Vec<DataType>,
    cat_cols: Vec<String>,
    num_cols: Vec<String>,
    label_col: String,
    /// Categorical columns, aligned with `cat_cols`
    cat_data: Vec<Vec<String>>,
    /// Numeric columns, aligned with `num_cols`
    num_data: Vec<Vec<f64>>,
    labels: Vec<f64>,
}

impl Dataset {
    /// Ingest a DataFrame, classifying every non-label column as categorical
    /// or numeric from its dtype. Null values and unsupported dtypes are
    /// rejected.
    pub fn from_dataframe(df: &DataFrame, label_col: &str) -> Result<Self> {
        if df.column(label_col).is_err() {
            return Err(SmognError::ColumnNotFound(label_col.to_string()));
        }

        let mut column_order = Vec::new();
        let mut dtypes = Vec::new();
        let mut cat_cols = Vec::new();
        let mut num_cols = Vec::new();
        let mut cat_data = Vec::new();
        let mut num_data = Vec::new();
        let mut labels = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            if col.null_count() > 0 {
                return Err(SmognError::Data(format!(
                    "column '{name}' contains null values"
                )));
            }
            column_order.push(name.clone());
            dtypes.push(col.dtype().clone());

            let series = col.as_materialized_series();
            if name == label_col {
                labels = Self::extract_numeric(series, &name)?;
                continue;
            }

            match col.dtype() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64 => {
                    num_data.push(Self::extract_numeric(series, &name)?);
                    num_cols.push(name);
                }
                DataType::String => {
                    let ca = series
                        .str()
                        .map_err(|e| SmognError::Data(e.to_string()))?;
                    let values: Vec<String> =
                        ca.into_no_null_iter().map(|v| v.to_string()).collect();
                    cat_data.push(values);
                    cat_cols.push(name);
                }
                other => {
                    return Err(SmognError::Data(format!(
                        "column '{name}' has unsupported dtype {other:?}"
                    )));
                }
            }
        }

        Ok(Self {
            column_order,
            dtypes,
            cat_cols,
            num_cols,
            label_col: label_col.to_string(),
            cat_data,
            num_data,
            labels,
        })
    }

    fn extract_numeric(series: &Series, name: &str) -> Result<Vec<f64>> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|_| SmognError::Data(format!("column '{name}' is not numeric")))?;
        // A lenient cast turns uncastable values into nulls instead of failing
        if casted.null_count() != series.null_count() {
            return Err(SmognError::Data(format!("column '{name}' is not numeric")));
        }
        let ca = casted.f64().map_err(|e| SmognError::Data(e.to_string()))?;
        Ok(ca.into_no_null_iter().collect())
    }

    /// Reassemble a DataFrame in the original column order, casting numeric
    /// columns back to their ingested dtypes.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .column_order
            .iter()
            .zip(self.dtypes.iter())
            .map(|(name, dtype)| {
                let series = if name == &self.label_col {
                    Series::new(name.as_str().into(), self.labels.as_slice())
                } else if let Some(idx) = self.num_cols.iter().position(|c| c == name) {
                    Series::new(name.as_str().into(), self.num_data[idx].as_slice())
                } else {
                    let idx = self
                        .cat_cols
                        .iter()
                        .position(|c| c == name)
                        .ok_or_else(|| SmognError::ColumnNotFound(name.clone()))?;
                    let values: Vec<&str> =
                        self.cat_data[idx].iter().map(|s| s.as_str()).collect();
                    Series::new(name.as_str().into(), values)
                };
                let series = if series.dtype() != dtype {
                    series.cast(dtype)?
                } else {
                    series
                };
                Ok(series.into())
            })
            .collect::<Result<Vec<Column>>>()?;

        DataFrame::new(columns).map_err(Into::into)
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn cat_cols(&self) -> &[String] {
        &self.cat_cols
    }

    pub fn num_cols(&self) -> &[String] {
        &self.num_cols
    }

    pub fn label_col(&self) -> &str {
        &self.label_col
    }

    pub fn label(&self, row: usize) -> f64 {
        self.labels[row]
    }

    pub fn numeric_value(&self, col: usize, row: usize) -> f64 {
        self.num_data[col][row]
    }

    pub fn cat_value(&self, col: usize, row: usize) -> &str {
        &self.cat_data[col][row]
    }

    /// Rows `[start, end]` inclusive as a new dataset with the same schema.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let idx: Vec<usize> = (start..=end).collect();
        self.take(&idx)
    }

    /// The given rows, in the given order, as a new dataset.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            column_order: self.column_order.clone(),
            dtypes: self.dtypes.clone(),
            cat_cols: self.cat_cols.clone(),
            num_cols: self.num_cols.clone(),
            label_col: self.label_col.clone(),
            cat_data: self
                .cat_data
                .iter()
                .map(|col| rows.iter().map(|&r| col[r].clone()).collect())
                .collect(),
            num_data: self
                .num_data
                .iter()
                .map(|col| rows.iter().map(|&r| col[r]).collect())
                .collect(),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
        }
    }

    /// Empty dataset sharing this one's schema
    pub fn empty_like(&self) -> Self {
        Self {
            column_order: self.column_order.clone(),
            dtypes: self.dtypes.clone(),
            cat_cols: self.cat_cols.clone(),
            num_cols: self.num_cols.clone(),
            label_col: self.label_col.clone(),
            cat_data: vec![Vec::new(); self.cat_cols.len()],
            num_data: vec![Vec::new(); self.num_cols.len()],
            labels: Vec::new(),
        }
    }

    /// Numeric feature matrix (rows × numeric columns), built column-major to
    /// row-major.
    pub fn numeric_matrix(&self) -> Array2<f64> {
        let n_rows = self.n_rows();
        let n_cols = self.num_cols.len();
        Array2::from_shape_fn((n_rows, n_cols), |(r, c)| self.num_data[c][r])
    }

    /// One row as an owned [`Sample`]
    pub fn sample(&self, row: usize) -> Sample {
        let cat = self
            .cat_cols
            .iter()
            .zip(self.cat_data.iter())
            .map(|(name, col)| (name.clone(), col[row].clone()))
            .collect();
        let num = self
            .num_cols
            .iter()
            .zip(self.num_data.iter())
            .map(|(name, col)| (name.clone(), col[row]))
            .collect();
        Sample {
            cat,
            num,
            label: self.labels[row],
        }
    }

    /// Append one sample. The sample must carry a value for every feature
    /// column of this dataset's schema.
    pub fn push_sample(&mut self, sample: &Sample) -> Result<()> {
        for (name, col) in self.cat_cols.iter().zip(self.cat_data.iter_mut()) {
            let value = sample
                .cat
                .get(name)
                .ok_or_else(|| SmognError::ColumnNotFound(name.clone()))?;
            col.push(value.clone());
        }
        for (name, col) in self.num_cols.iter().zip(self.num_data.iter_mut()) {
            let value = sample
                .num
                .get(name)
                .ok_or_else(|| SmognError::ColumnNotFound(name.clone()))?;
            col.push(*value);
        }
        self.labels.push(sample.label);
        Ok(())
    }

    /// Append all rows of another dataset with the same schema.
    pub fn append(&mut self, other: &Dataset) {
        for (dst, src) in self.cat_data.iter_mut().zip(other.cat_data.iter()) {
            dst.extend(src.iter().cloned());
        }
        for (dst, src) in self.num_data.iter_mut().zip(other.num_data.iter()) {
            dst.extend(src.iter().copied());
        }
        self.labels.extend(other.labels.iter().copied());
    }
}
