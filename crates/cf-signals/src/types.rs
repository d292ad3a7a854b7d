/// Expected shape of an extracted signal, derived by the caller from the
/// declared cardinality of the attribute the value will be written into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShapeHint {
    #[default]
    OneD,
    TwoD,
}

/// One signal to extract, with its shape hint.
#[derive(Clone, Debug)]
pub struct SignalRequest {
    pub name: String,
    pub hint: ShapeHint,
}

impl SignalRequest {
    pub fn one_d(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hint: ShapeHint::OneD,
        }
    }

    pub fn two_d(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hint: ShapeHint::TwoD,
        }
    }
}

/// Extracted signal values.
#[derive(Clone, Debug, PartialEq)]
pub enum SignalData {
    OneD(Vec<f64>),
    TwoD(Vec<Vec<f64>>),
}

impl SignalData {
    /// Shape a raw column according to the request hint. A 2-D hint wraps
    /// the column as a single row, matching a singleton-wrapped attribute.
    pub fn from_column(column: Vec<f64>, hint: ShapeHint) -> Self {
        match hint {
            ShapeHint::OneD => SignalData::OneD(column),
            ShapeHint::TwoD => SignalData::TwoD(vec![column]),
        }
    }

    /// Flat view of the values regardless of shape.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            SignalData::OneD(v) => v,
            SignalData::TwoD(rows) => rows.first().map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SignalData::OneD(v) => serde_json::json!(v),
            SignalData::TwoD(rows) => serde_json::json!(rows),
        }
    }
}
