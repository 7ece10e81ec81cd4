//! Display extraction for individual result cells

use std::fmt;

use arrow::array::{
    Array, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeStringArray, StringArray, StringViewArray,
    UInt16Array, UInt32Array, UInt8Array,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;

/// A single cell, tagged by the accessor that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int64(i64),
    Int32(i32),
    Double(f64),
    Float(f32),
    Bool(bool),
    Date(String),
    /// Non-null value of a type no typed accessor covers
    Formatted(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Date(s) | CellValue::Formatted(s) => f.write_str(s),
            CellValue::Int64(v) => write!(f, "{}", v),
            CellValue::Int32(v) => write!(f, "{}", v),
            CellValue::Double(v) => f.write_str(&format_double(*v)),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(v) => f.write_str(if *v { "true" } else { "false" }),
            CellValue::Null => f.write_str("NULL"),
        }
    }
}

type Extractor = fn(&dyn Array, usize) -> Option<CellValue>;

/// Accessors in trial order; the first one that answers wins
const EXTRACTORS: [Extractor; 7] = [
    extract_text,
    extract_int64,
    extract_int32,
    extract_double,
    extract_float,
    extract_bool,
    extract_date,
];

/// Extract one cell
pub fn extract_cell(array: &dyn Array, row: usize) -> CellValue {
    if array.data_type() == &DataType::Null || array.is_null(row) {
        return CellValue::Null;
    }

    EXTRACTORS
        .iter()
        .find_map(|extract| extract(array, row))
        .or_else(|| array_value_to_string(array, row).ok().map(CellValue::Formatted))
        .unwrap_or(CellValue::Null)
}

/// Integral doubles print without a fractional part
fn format_double(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

fn extract_text(array: &dyn Array, row: usize) -> Option<CellValue> {
    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<StringArray>() {
        return Some(CellValue::Text(a.value(row).to_string()));
    }
    if let Some(a) = any.downcast_ref::<LargeStringArray>() {
        return Some(CellValue::Text(a.value(row).to_string()));
    }
    any.downcast_ref::<StringViewArray>()
        .map(|a| CellValue::Text(a.value(row).to_string()))
}

fn extract_int64(array: &dyn Array, row: usize) -> Option<CellValue> {
    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Int64Array>() {
        return Some(CellValue::Int64(a.value(row)));
    }
    any.downcast_ref::<UInt32Array>()
        .map(|a| CellValue::Int64(i64::from(a.value(row))))
}

fn extract_int32(array: &dyn Array, row: usize) -> Option<CellValue> {
    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Int32Array>() {
        return Some(CellValue::Int32(a.value(row)));
    }
    if let Some(a) = any.downcast_ref::<Int16Array>() {
        return Some(CellValue::Int32(i32::from(a.value(row))));
    }
    if let Some(a) = any.downcast_ref::<Int8Array>() {
        return Some(CellValue::Int32(i32::from(a.value(row))));
    }
    if let Some(a) = any.downcast_ref::<UInt16Array>() {
        return Some(CellValue::Int32(i32::from(a.value(row))));
    }
    any.downcast_ref::<UInt8Array>()
        .map(|a| CellValue::Int32(i32::from(a.value(row))))
}

fn extract_double(array: &dyn Array, row: usize) -> Option<CellValue> {
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .map(|a| CellValue::Double(a.value(row)))
}

fn extract_float(array: &dyn Array, row: usize) -> Option<CellValue> {
    array
        .as_any()
        .downcast_ref::<Float32Array>()
        .map(|a| CellValue::Float(a.value(row)))
}

fn extract_bool(array: &dyn Array, row: usize) -> Option<CellValue> {
    array
        .as_any()
        .downcast_ref::<BooleanArray>()
        .map(|a| CellValue::Bool(a.value(row)))
}

fn extract_date(array: &dyn Array, row: usize) -> Option<CellValue> {
    match array.data_type() {
        DataType::Date32 => array
            .as_any()
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| CellValue::Date(d.to_string())),
        DataType::Date64 => array
            .as_any()
            .downcast_ref::<Date64Array>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| CellValue::Date(d.to_string())),
        DataType::Timestamp(_, _) => array_value_to_string(array, row).ok().map(CellValue::Date),
        _ => None,
    }
}
