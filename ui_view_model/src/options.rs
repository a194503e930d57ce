//! View options.
//!
//! `ViewOptions` carries every tunable used while projecting a diff. All fields
//! have defaults, so a partial JSON object (or none at all) is valid input.

use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, ViewModelError};

/// Ops hidden from every view (sheets, artifacts, counts and analysis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NoiseFilters {
    #[serde(default)]
    pub hide_m_formatting_only: bool,
    #[serde(default)]
    pub hide_dax_formatting_only: bool,
    #[serde(default)]
    pub hide_formula_formatting_only: bool,
    /// Keep only the first op for each move id.
    #[serde(default)]
    pub collapse_moves: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewOptions {
    pub context_rows: u32,
    pub context_cols: u32,
    /// Cell budget per clustered region; `0` disables the cap.
    pub max_cells_per_region: u32,
    /// Cell budget per render bound or hunk; `0` disables the cap.
    pub max_visual_cells: u32,
    /// Column-overlap tolerance when growing a region into the next row.
    pub merge_gap: u32,
    pub ignore_blank_to_blank: bool,
    /// Row extent of column-shaped interest rectangles.
    pub preview_rows: u32,
    /// Column extent of row-shaped interest rectangles.
    pub preview_cols: u32,
    pub noise_filters: NoiseFilters,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            context_rows: 1,
            context_cols: 1,
            max_cells_per_region: 200,
            max_visual_cells: 5000,
            merge_gap: 1,
            ignore_blank_to_blank: true,
            preview_rows: 200,
            preview_cols: 80,
            noise_filters: NoiseFilters::default(),
        }
    }
}

impl ViewOptions {
    pub fn builder() -> ViewOptionsBuilder {
        ViewOptionsBuilder {
            inner: ViewOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        ensure_non_zero(self.preview_rows, "previewRows")?;
        ensure_non_zero(self.preview_cols, "previewCols")?;
        Ok(())
    }

    /// Parse and validate options. Empty input yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ViewModelError> {
        let json = json.trim();
        let options = if json.is_empty() {
            ViewOptions::default()
        } else {
            serde_json::from_str::<ViewOptions>(json).map_err(ViewModelError::OptionsJson)?
        };
        options.validate()?;
        Ok(options)
    }
}

fn ensure_non_zero(value: u32, field: &'static str) -> Result<(), OptionsError> {
    if value == 0 {
        return Err(OptionsError::NonPositiveLimit {
            field,
            value: u64::from(value),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ViewOptionsBuilder {
    inner: ViewOptions,
}

impl Default for ViewOptionsBuilder {
    fn default() -> Self {
        ViewOptions::builder()
    }
}

impl ViewOptionsBuilder {
    pub fn context(mut self, rows: u32, cols: u32) -> Self {
        self.inner.context_rows = rows;
        self.inner.context_cols = cols;
        self
    }

    pub fn max_cells_per_region(mut self, value: u32) -> Self {
        self.inner.max_cells_per_region = value;
        self
    }

    pub fn max_visual_cells(mut self, value: u32) -> Self {
        self.inner.max_visual_cells = value;
        self
    }

    pub fn merge_gap(mut self, value: u32) -> Self {
        self.inner.merge_gap = value;
        self
    }

    pub fn ignore_blank_to_blank(mut self, value: bool) -> Self {
        self.inner.ignore_blank_to_blank = value;
        self
    }

    pub fn preview(mut self, rows: u32, cols: u32) -> Self {
        self.inner.preview_rows = rows;
        self.inner.preview_cols = cols;
        self
    }

    pub fn noise_filters(mut self, filters: NoiseFilters) -> Self {
        self.inner.noise_filters = filters;
        self
    }

    pub fn build(self) -> Result<ViewOptions, OptionsError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = ViewOptions::from_json_str(r#"{ "maxCellsPerRegion": 50 }"#).expect("parse");
        assert_eq!(opts.max_cells_per_region, 50);
        assert_eq!(opts.context_rows, 1);
        assert!(opts.ignore_blank_to_blank);
        assert_eq!(opts.preview_cols, 80);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(ViewOptions::from_json_str("  ").expect("parse"), ViewOptions::default());
    }

    #[test]
    fn noise_filters_parse_camel_case() {
        let opts = ViewOptions::from_json_str(
            r#"{ "noiseFilters": { "hideMFormattingOnly": true, "collapseMoves": true } }"#,
        )
        .expect("parse");
        assert!(opts.noise_filters.hide_m_formatting_only);
        assert!(opts.noise_filters.collapse_moves);
        assert!(!opts.noise_filters.hide_dax_formatting_only);
    }

    #[test]
    fn builder_rejects_zero_preview() {
        let err = ViewOptions::builder()
            .preview(0, 10)
            .build()
            .expect_err("zero preview rows should be rejected");
        assert_eq!(
            err,
            OptionsError::NonPositiveLimit {
                field: "previewRows",
                value: 0
            }
        );
    }

    #[test]
    fn builder_sets_fields() {
        let opts = ViewOptions::builder()
            .context(2, 3)
            .max_cells_per_region(10)
            .merge_gap(0)
            .ignore_blank_to_blank(false)
            .build()
            .expect("valid options");
        assert_eq!((opts.context_rows, opts.context_cols), (2, 3));
        assert_eq!(opts.max_cells_per_region, 10);
        assert_eq!(opts.merge_gap, 0);
        assert!(!opts.ignore_blank_to_blank);
    }
}
