//! Output filename patterns.
//!
//! Patterns use `{field}` or `{field:spec}` markers, e.g.
//! `{product_name}_T{tile_number:03d}_{begin_time:%Y%m%d_%H%M}.nc`.
//! Integer fields accept a zero-padded width (`03d`), `begin_time` accepts a
//! strftime format. `{{` and `}}` produce literal braces.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::error::{Result, ScmiError};

/// Values available to filename patterns.
#[derive(Debug, Clone)]
pub struct FilenameFields<'a> {
    pub source_name: &'a str,
    pub satellite: &'a str,
    pub instrument: &'a str,
    pub product_name: &'a str,
    pub sector_id: &'a str,
    pub tile_number: usize,
    pub begin_time: DateTime<Utc>,
    pub grid_name: &'a str,
    pub rows: usize,
    pub columns: usize,
    pub data_type: &'a str,
}

enum Field<'a> {
    Text(&'a str),
    Int(usize),
    Time(DateTime<Utc>),
}

impl<'a> FilenameFields<'a> {
    fn get(&self, name: &str) -> Option<Field<'a>> {
        Some(match name {
            "source_name" => Field::Text(self.source_name),
            "satellite" => Field::Text(self.satellite),
            "instrument" => Field::Text(self.instrument),
            "product_name" => Field::Text(self.product_name),
            "sector_id" => Field::Text(self.sector_id),
            "grid_name" => Field::Text(self.grid_name),
            "data_type" => Field::Text(self.data_type),
            "tile_number" => Field::Int(self.tile_number),
            "rows" => Field::Int(self.rows),
            "columns" => Field::Int(self.columns),
            "begin_time" => Field::Time(self.begin_time),
            _ => return None,
        })
    }
}

/// True when the pattern contains field markers.
pub fn is_template(pattern: &str) -> bool {
    pattern.contains('{')
}

/// Resolve a pattern to a filename. Patterns without markers are returned as-is.
pub fn resolve_filename(pattern: &str, fields: &FilenameFields<'_>) -> Result<String> {
    if is_template(pattern) {
        format_filename(pattern, fields)
    } else {
        Ok(pattern.to_string())
    }
}

/// Substitute every marker in a pattern.
pub fn format_filename(pattern: &str, fields: &FilenameFields<'_>) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() + 32);
    let mut rest = pattern;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(bad_pattern(pattern, "unmatched '}'"));
        }

        let end = tail
            .find('}')
            .ok_or_else(|| bad_pattern(pattern, "unterminated field"))?;
        let marker = &tail[1..end];
        let (name, spec) = marker.split_once(':').unwrap_or((marker, ""));
        let field = fields
            .get(name)
            .ok_or_else(|| bad_pattern(pattern, &format!("unknown field '{}'", name)))?;
        format_field(&mut out, field, spec).map_err(|msg| bad_pattern(pattern, &msg))?;
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn format_field(out: &mut String, field: Field<'_>, spec: &str) -> std::result::Result<(), String> {
    match field {
        Field::Text(s) => {
            if !(spec.is_empty() || spec == "s") {
                return Err(format!("unsupported text format '{}'", spec));
            }
            out.push_str(s);
        }
        Field::Int(n) => {
            let digits = spec.strip_suffix('d').unwrap_or(spec);
            if digits.is_empty() {
                let _ = write!(out, "{}", n);
            } else {
                let width: usize = digits
                    .parse()
                    .map_err(|_| format!("unsupported integer format '{}'", spec))?;
                if digits.starts_with('0') {
                    let _ = write!(out, "{:0width$}", n, width = width);
                } else {
                    let _ = write!(out, "{:width$}", n, width = width);
                }
            }
        }
        Field::Time(t) => {
            let fmt = if spec.is_empty() { "%Y-%m-%d %H:%M:%S" } else { spec };
            write!(out, "{}", t.format(fmt)).map_err(|_| format!("invalid time format '{}'", spec))?;
        }
    }
    Ok(())
}

fn bad_pattern(pattern: &str, message: &str) -> ScmiError {
    ScmiError::config(format!("output pattern '{}': {}", pattern, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OUTPUT_PATTERN;
    use chrono::TimeZone;

    fn fields() -> FilenameFields<'static> {
        FilenameFields {
            source_name: "SSEC",
            satellite: "goes16",
            instrument: "abi",
            product_name: "ch13",
            sector_id: "LCC",
            tile_number: 7,
            begin_time: Utc.with_ymd_and_hms(2024, 5, 1, 18, 5, 0).unwrap(),
            grid_name: "lcc_conus",
            rows: 1500,
            columns: 2500,
            data_type: "uint2",
        }
    }

    #[test]
    fn test_default_pattern() {
        let name = format_filename(DEFAULT_OUTPUT_PATTERN, &fields()).unwrap();
        assert_eq!(name, "SSEC_AWIPS_goes16_abi_ch13_LCC_T007_20240501_1805.nc");
    }

    #[test]
    fn test_literal_pattern() {
        assert_eq!(resolve_filename("fixed.nc", &fields()).unwrap(), "fixed.nc");
    }

    #[test]
    fn test_other_fields_and_escapes() {
        let name = format_filename(
            "{grid_name}_{rows}x{columns}_{data_type}_{{raw}}_{tile_number:4d}.nc",
            &fields(),
        )
        .unwrap();
        assert_eq!(name, "lcc_conus_1500x2500_uint2_{raw}_   7.nc");
    }

    #[test]
    fn test_bad_patterns() {
        for pattern in ["{nope}.nc", "{product_name", "a}b", "{tile_number:x}", "{satellite:>10}"] {
            let err = format_filename(pattern, &fields()).unwrap_err();
            assert!(matches!(err, ScmiError::Configuration(_)), "pattern {}", pattern);
        }
    }
}
