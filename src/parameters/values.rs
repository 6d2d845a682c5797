//! Typed parameter values
//!
//! A parameter's full-horizon series is resolved to one of the [`Series`]
//! variants when it is loaded, so expansion and reform code never inspects
//! element types at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Real,
    Boolean,
    Integer,
    String,
}

impl ValueType {
    /// Whether values of this type can be compared against numeric bounds
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Real | ValueType::Integer)
    }

    /// Whether a supplied scalar conforms to this type.
    ///
    /// Booleans are never accepted for numeric types.
    pub fn accepts(&self, value: &Scalar) -> bool {
        match self {
            ValueType::Real => matches!(value, Scalar::Real(_) | Scalar::Integer(_)),
            ValueType::Boolean => matches!(value, Scalar::Boolean(_)),
            ValueType::Integer => matches!(value, Scalar::Integer(_)),
            ValueType::String => matches!(value, Scalar::Text(_)),
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            ValueType::Real => "a number",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::String => "a string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A single literal value, keeping the JSON kind it was written with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view used for bound checks
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Real(x) => Some(*x),
            Scalar::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One year's entry: a scalar, or a fixed-width row for vector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    Vector(Vec<Scalar>),
    Scalar(Scalar),
}

impl YearValue {
    /// Iterate the scalars of this entry (one for scalars, a row for vectors)
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        match self {
            YearValue::Scalar(s) => std::slice::from_ref(s).iter(),
            YearValue::Vector(row) => row.iter(),
        }
    }
}

impl fmt::Display for YearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearValue::Scalar(s) => write!(f, "{}", s),
            YearValue::Vector(row) => {
                let parts: Vec<String> = row.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<f64> for YearValue {
    fn from(x: f64) -> Self {
        YearValue::Scalar(Scalar::Real(x))
    }
}

impl From<bool> for YearValue {
    fn from(b: bool) -> Self {
        YearValue::Scalar(Scalar::Boolean(b))
    }
}

impl From<i64> for YearValue {
    fn from(i: i64) -> Self {
        YearValue::Scalar(Scalar::Integer(i))
    }
}

impl From<&str> for YearValue {
    fn from(s: &str) -> Self {
        YearValue::Scalar(Scalar::Text(s.to_string()))
    }
}

/// Element types a series can hold
pub trait Element: Clone + PartialEq + fmt::Debug {
    const TYPE: ValueType;

    fn from_scalar(value: &Scalar) -> Option<Self>;

    fn to_scalar(&self) -> Scalar;
}

impl Element for f64 {
    const TYPE: ValueType = ValueType::Real;

    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_f64()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Real(*self)
    }
}

impl Element for bool {
    const TYPE: ValueType = ValueType::Boolean;

    fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Boolean(*self)
    }
}

impl Element for i64 {
    const TYPE: ValueType = ValueType::Integer;

    fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Integer(*self)
    }
}

impl Element for String {
    const TYPE: ValueType = ValueType::String;

    fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Text(self.clone())
    }
}

fn convert<T: Element>(value: &Scalar) -> Result<T, String> {
    T::from_scalar(value).ok_or_else(|| format!("value {} is not {}", value, T::TYPE))
}

/// Year-indexed values of one element type, scalar or vector per year
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Grid<T> {
    Scalar(Vec<T>),
    Vector(Vec<Vec<T>>),
}

impl<T: Element> Grid<T> {
    /// Number of years held
    pub fn len(&self) -> usize {
        match self {
            Grid::Scalar(v) => v.len(),
            Grid::Vector(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inner width of a vector grid
    pub fn width(&self) -> Option<usize> {
        match self {
            Grid::Scalar(_) => None,
            Grid::Vector(rows) => rows.first().map(|r| r.len()),
        }
    }

    /// Build a grid from raw year entries.
    ///
    /// With `width` set (the target is a vector parameter), a flat list of
    /// exactly `width` scalars is read as a single row.
    pub fn from_values(values: &[YearValue], width: Option<usize>) -> Result<Self, String> {
        let all_scalar = values.iter().all(|v| matches!(v, YearValue::Scalar(_)));
        let all_vector = values.iter().all(|v| matches!(v, YearValue::Vector(_)));

        if all_scalar {
            let flat = values
                .iter()
                .flat_map(|v| v.scalars())
                .map(convert::<T>)
                .collect::<Result<Vec<T>, String>>()?;
            return match width {
                None => Ok(Grid::Scalar(flat)),
                Some(w) if flat.len() == w => Ok(Grid::Vector(vec![flat])),
                Some(w) => Err(format!(
                    "expected rows of {} values for a vector parameter, got {} scalars",
                    w,
                    flat.len()
                )),
            };
        }

        if !all_vector {
            return Err("cannot mix scalar and vector entries".to_string());
        }
        let mut rows = Vec::with_capacity(values.len());
        for value in values {
            let row = value.scalars().map(convert::<T>).collect::<Result<Vec<T>, String>>()?;
            rows.push(row);
        }
        let expected = width.or_else(|| rows.first().map(|r| r.len()));
        if let Some(w) = expected {
            if w == 0 {
                return Err("vector rows must not be empty".to_string());
            }
            if let Some(bad) = rows.iter().find(|r| r.len() != w) {
                return Err(format!("row of {} values does not match width {}", bad.len(), w));
            }
        }
        Ok(Grid::Vector(rows))
    }

    /// Entry at a zero-based year offset
    pub fn at(&self, idx: usize) -> Option<YearValue> {
        match self {
            Grid::Scalar(v) => v.get(idx).map(|x| YearValue::Scalar(x.to_scalar())),
            Grid::Vector(rows) => rows
                .get(idx)
                .map(|r| YearValue::Vector(r.iter().map(Element::to_scalar).collect())),
        }
    }

    /// Copy of `count` entries starting at `offset`
    pub fn slice(&self, offset: usize, count: usize) -> Self {
        match self {
            Grid::Scalar(v) => Grid::Scalar(v.iter().skip(offset).take(count).cloned().collect()),
            Grid::Vector(rows) => {
                Grid::Vector(rows.iter().skip(offset).take(count).cloned().collect())
            }
        }
    }

    /// Replace everything from `offset` onward with `window`
    pub fn splice(&mut self, offset: usize, window: Grid<T>) -> Result<(), String> {
        match (self, window) {
            (Grid::Scalar(dst), Grid::Scalar(src)) => {
                dst.truncate(offset);
                dst.extend(src);
                Ok(())
            }
            (Grid::Vector(dst), Grid::Vector(src)) => {
                dst.truncate(offset);
                dst.extend(src);
                Ok(())
            }
            _ => Err("cannot splice values of a different dimension".to_string()),
        }
    }

    /// Every element as a (year offset, column, value) triple
    fn elements(&self) -> Vec<(usize, usize, &T)> {
        match self {
            Grid::Scalar(v) => v.iter().enumerate().map(|(i, x)| (i, 0, x)).collect(),
            Grid::Vector(rows) => rows
                .iter()
                .enumerate()
                .flat_map(|(i, r)| r.iter().enumerate().map(move |(j, x)| (i, j, x)))
                .collect(),
        }
    }
}

/// Full-horizon values of one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    Real(Grid<f64>),
    Boolean(Grid<bool>),
    Integer(Grid<i64>),
    Text(Vec<String>),
}

impl Series {
    /// Resolve raw entries into the variant for `value_type`
    pub fn from_values(
        value_type: ValueType,
        values: &[YearValue],
        width: Option<usize>,
    ) -> Result<Self, String> {
        Ok(match value_type {
            ValueType::Real => Series::Real(Grid::from_values(values, width)?),
            ValueType::Boolean => Series::Boolean(Grid::from_values(values, width)?),
            ValueType::Integer => Series::Integer(Grid::from_values(values, width)?),
            ValueType::String => {
                if values.iter().any(|v| matches!(v, YearValue::Vector(_))) || width.is_some() {
                    return Err("string parameters must be scalar (not vector)".to_string());
                }
                let text = values
                    .iter()
                    .flat_map(|v| v.scalars())
                    .map(convert::<String>)
                    .collect::<Result<Vec<String>, String>>()?;
                Series::Text(text)
            }
        })
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Series::Real(_) => ValueType::Real,
            Series::Boolean(_) => ValueType::Boolean,
            Series::Integer(_) => ValueType::Integer,
            Series::Text(_) => ValueType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Series::Real(g) => g.len(),
            Series::Boolean(g) => g.len(),
            Series::Integer(g) => g.len(),
            Series::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inner width for vector-valued parameters, `None` for scalars
    pub fn width(&self) -> Option<usize> {
        match self {
            Series::Real(g) => g.width(),
            Series::Boolean(g) => g.width(),
            Series::Integer(g) => g.width(),
            Series::Text(_) => None,
        }
    }

    pub fn at(&self, idx: usize) -> Option<YearValue> {
        match self {
            Series::Real(g) => g.at(idx),
            Series::Boolean(g) => g.at(idx),
            Series::Integer(g) => g.at(idx),
            Series::Text(v) => v.get(idx).map(|s| YearValue::Scalar(Scalar::Text(s.clone()))),
        }
    }

    pub fn slice(&self, offset: usize, count: usize) -> Series {
        match self {
            Series::Real(g) => Series::Real(g.slice(offset, count)),
            Series::Boolean(g) => Series::Boolean(g.slice(offset, count)),
            Series::Integer(g) => Series::Integer(g.slice(offset, count)),
            Series::Text(v) => Series::Text(v.iter().skip(offset).take(count).cloned().collect()),
        }
    }

    /// Overwrite this series from `offset` to its end with `window`
    pub fn splice(&mut self, offset: usize, window: Series) -> Result<(), String> {
        match (self, window) {
            (Series::Real(dst), Series::Real(src)) => dst.splice(offset, src),
            (Series::Boolean(dst), Series::Boolean(src)) => dst.splice(offset, src),
            (Series::Integer(dst), Series::Integer(src)) => dst.splice(offset, src),
            (Series::Text(dst), Series::Text(src)) => {
                dst.truncate(offset);
                dst.extend(src);
                Ok(())
            }
            (dst, src) => Err(format!(
                "cannot splice {} values into {} series",
                src.value_type(),
                dst.value_type()
            )),
        }
    }

    /// Numeric elements as (year offset, column, value), empty for
    /// boolean and string series
    pub fn numeric_elements(&self) -> Vec<(usize, usize, f64)> {
        match self {
            Series::Real(g) => g.elements().into_iter().map(|(i, j, x)| (i, j, *x)).collect(),
            Series::Integer(g) => g
                .elements()
                .into_iter()
                .map(|(i, j, x)| (i, j, *x as f64))
                .collect(),
            Series::Boolean(_) | Series::Text(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_keeps_json_kind() {
        let parsed: Vec<Scalar> = serde_json::from_str(r#"[true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Scalar::Boolean(true),
                Scalar::Integer(3),
                Scalar::Real(2.5),
                Scalar::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_real_accepts_integers_but_not_booleans() {
        assert!(ValueType::Real.accepts(&Scalar::Integer(4)));
        assert!(ValueType::Real.accepts(&Scalar::Real(4.5)));
        assert!(!ValueType::Real.accepts(&Scalar::Boolean(true)));
        assert!(!ValueType::Integer.accepts(&Scalar::Real(4.0)));
        assert!(!ValueType::Boolean.accepts(&Scalar::Integer(1)));
    }

    #[test]
    fn test_series_from_vector_defaults() {
        let values: Vec<YearValue> = serde_json::from_str("[[1, 2, 3], [4, 5, 6]]").unwrap();
        let series = Series::from_values(ValueType::Real, &values, None).unwrap();
        assert_eq!(series.width(), Some(3));
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.at(1),
            Some(YearValue::Vector(vec![
                Scalar::Real(4.0),
                Scalar::Real(5.0),
                Scalar::Real(6.0)
            ]))
        );
    }

    #[test]
    fn test_flat_row_for_vector_parameter() {
        let values: Vec<YearValue> = serde_json::from_str("[8000, 8500, 9000, 9500]").unwrap();
        let series = Series::from_values(ValueType::Real, &values, Some(4)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.width(), Some(4));

        assert!(Series::from_values(ValueType::Real, &values, Some(3)).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let values: Vec<YearValue> = serde_json::from_str("[[1, 2], [3]]").unwrap();
        assert!(Series::from_values(ValueType::Real, &values, None).is_err());
    }

    #[test]
    fn test_string_vector_rejected() {
        let values: Vec<YearValue> = serde_json::from_str(r#"[["a", "b"]]"#).unwrap();
        let err = Series::from_values(ValueType::String, &values, None).unwrap_err();
        assert!(err.contains("must be scalar"));
    }

    #[test]
    fn test_boolean_series_rejects_numbers() {
        let values = vec![YearValue::from(1_i64)];
        let err = Series::from_values(ValueType::Boolean, &values, None).unwrap_err();
        assert_eq!(err, "value 1 is not boolean");
    }

    #[test]
    fn test_splice_replaces_tail() {
        let mut series = Series::Real(Grid::Scalar(vec![1.0, 2.0, 3.0, 4.0]));
        series
            .splice(2, Series::Real(Grid::Scalar(vec![9.0, 9.5])))
            .unwrap();
        assert_eq!(series, Series::Real(Grid::Scalar(vec![1.0, 2.0, 9.0, 9.5])));

        let err = series.splice(2, Series::Integer(Grid::Scalar(vec![1, 2])));
        assert!(err.is_err());
    }
}
