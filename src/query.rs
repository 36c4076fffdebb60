//! Predicate filters over assessed devices
//!
//! Used by the host shell to narrow the device table, e.g.
//! `filter level >= high smoke > 6`. Filters combine with AND logic.

use core::fmt;

use crate::domain::{DeviceAssessment, RiskLevel};

/// Maximum number of filters in a query
pub const MAX_QUERY_FILTERS: usize = 4;

/// Comparison operator for filter predicates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

impl FilterOp {
    fn compare<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            FilterOp::Eq => lhs == rhs,
            FilterOp::Ne => lhs != rhs,
            FilterOp::Lt => lhs < rhs,
            FilterOp::Le => lhs <= rhs,
            FilterOp::Gt => lhs > rhs,
            FilterOp::Ge => lhs >= rhs,
        }
    }
}

/// Fields available for filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Temperature,
    AirHumidity,
    SoilHumidity,
    HeatIndex,
    Smoke,
    RiskPercent,
    RiskPoints,
    RiskLevel,
}

/// Type-safe filter values
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Level(RiskLevel),
}

/// Parse errors for filter expressions
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown field '{0}'. Valid fields: temp, air, soil, heat, smoke, percent, points, level")]
    UnknownField(String),

    #[error("unknown operator '{0}'. Valid operators: =, !=, <, <=, >, >=")]
    UnknownOp(String),

    #[error("invalid value '{value}' for {field:?}")]
    InvalidValue { field: FilterField, value: String },

    #[error("incomplete filter at position {0}. Expected: <field> <op> <value>")]
    Incomplete(usize),

    #[error("invalid limit '{0}'")]
    InvalidLimit(String),

    #[error("{0} requires a value")]
    MissingOptionValue(&'static str),

    #[error("at least one filter is required")]
    Empty,

    #[error("maximum 4 filters allowed")]
    TooManyFilters,
}

/// A single filter condition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceFilter {
    pub field: FilterField,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl DeviceFilter {
    pub fn new(field: FilterField, op: FilterOp, value: FilterValue) -> Self {
        Self { field, op, value }
    }

    pub fn matches(&self, entry: &DeviceAssessment) -> bool {
        let reading = &entry.device.reading;
        let assessment = &entry.assessment;

        match (self.field, self.value) {
            (FilterField::RiskLevel, FilterValue::Level(level)) => {
                self.op.compare(assessment.risk_level, level)
            }
            (field, FilterValue::Number(rhs)) => {
                let lhs = match field {
                    FilterField::Temperature => reading.temperature,
                    FilterField::AirHumidity => reading.air_humidity,
                    FilterField::SoilHumidity => reading.soil_humidity,
                    FilterField::HeatIndex => reading.heat_index,
                    FilterField::Smoke => reading.smoke(),
                    FilterField::RiskPercent => assessment.risk_percent as f64,
                    FilterField::RiskPoints => assessment.risk_points as f64,
                    FilterField::RiskLevel => return false,
                };
                self.op.compare(lhs, rhs)
            }
            (_, FilterValue::Level(_)) => false,
        }
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        };
        match self.value {
            FilterValue::Number(v) => write!(f, "{:?} {op} {v}", self.field),
            FilterValue::Level(l) => write!(f, "{:?} {op} {l}", self.field),
        }
    }
}

/// A parsed `filter` command
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub filters: Vec<DeviceFilter>,
    pub limit: Option<usize>,
}

impl Query {
    /// Entries matching every filter, in input order, up to `limit`
    pub fn apply<'a>(&self, entries: &'a [DeviceAssessment]) -> Vec<&'a DeviceAssessment> {
        entries
            .iter()
            .filter(|e| self.filters.iter().all(|f| f.matches(e)))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Parse `<field> <op> <value> [<field> <op> <value>...] [--limit N]`
pub fn parse_query(args: &[&str]) -> Result<Query, QueryError> {
    let mut filters = Vec::new();
    let mut limit = None;

    let mut i = 0;
    while i < args.len() {
        if args[i] == "--limit" || args[i] == "-l" {
            let raw = args.get(i + 1).ok_or(QueryError::MissingOptionValue("--limit"))?;
            limit = Some(
                raw.parse()
                    .map_err(|_| QueryError::InvalidLimit(raw.to_string()))?,
            );
            i += 2;
            continue;
        }

        if i + 2 >= args.len() {
            return Err(QueryError::Incomplete(i));
        }

        let field = parse_filter_field(args[i])?;
        let op = parse_filter_op(args[i + 1])?;
        let value = parse_filter_value(field, args[i + 2])?;

        filters.push(DeviceFilter::new(field, op, value));
        i += 3;
    }

    if filters.is_empty() {
        return Err(QueryError::Empty);
    }
    if filters.len() > MAX_QUERY_FILTERS {
        return Err(QueryError::TooManyFilters);
    }

    Ok(Query { filters, limit })
}

pub fn parse_filter_field(s: &str) -> Result<FilterField, QueryError> {
    match s.to_lowercase().as_str() {
        "temp" | "temperature" | "t" => Ok(FilterField::Temperature),
        "air" | "air_humidity" | "humidity" => Ok(FilterField::AirHumidity),
        "soil" | "soil_humidity" => Ok(FilterField::SoilHumidity),
        "heat" | "heat_index" | "hi" => Ok(FilterField::HeatIndex),
        "smoke" => Ok(FilterField::Smoke),
        "percent" | "risk" | "pct" => Ok(FilterField::RiskPercent),
        "points" | "pts" => Ok(FilterField::RiskPoints),
        "level" | "lvl" => Ok(FilterField::RiskLevel),
        _ => Err(QueryError::UnknownField(s.to_string())),
    }
}

pub fn parse_filter_op(s: &str) -> Result<FilterOp, QueryError> {
    match s {
        "=" | "==" | "eq" => Ok(FilterOp::Eq),
        "!=" | "<>" | "ne" => Ok(FilterOp::Ne),
        "<" | "lt" => Ok(FilterOp::Lt),
        "<=" | "le" => Ok(FilterOp::Le),
        ">" | "gt" => Ok(FilterOp::Gt),
        ">=" | "ge" => Ok(FilterOp::Ge),
        _ => Err(QueryError::UnknownOp(s.to_string())),
    }
}

pub fn parse_filter_value(field: FilterField, s: &str) -> Result<FilterValue, QueryError> {
    let invalid = || QueryError::InvalidValue {
        field,
        value: s.to_string(),
    };

    match field {
        FilterField::RiskLevel => s.parse().map(FilterValue::Level).map_err(|_| invalid()),
        _ => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FilterValue::Number)
            .ok_or_else(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{assess_devices, Device, DeviceId, GeoPoint, SensorReading};

    fn fleet() -> Vec<DeviceAssessment> {
        let devices = vec![
            Device::new(
                DeviceId(1),
                "calm",
                GeoPoint::default(),
                0,
                SensorReading::new(24.0, 65.0, 40.0, 25.0, 2.5),
            ),
            Device::new(
                DeviceId(2),
                "burning",
                GeoPoint::default(),
                0,
                SensorReading::new(38.0, 10.0, 5.0, 42.0, 12.9),
            ),
            Device::new(
                DeviceId(3),
                "warm",
                GeoPoint::default(),
                0,
                // 1 + 1 + 1 + 1 + 1 = 5 points -> 33 % moderate
                SensorReading::new(30.0, 40.0, 25.0, 32.0, 5.0),
            ),
        ];
        assess_devices(&devices)
    }

    fn ids(hits: &[&DeviceAssessment]) -> Vec<u16> {
        hits.iter().map(|e| e.device.id.value()).collect()
    }

    #[test]
    fn test_level_filter_uses_ordinal_order() {
        let entries = fleet();
        let q = parse_query(&["level", ">=", "moderate"]).unwrap();
        assert_eq!(ids(&q.apply(&entries)), vec![2, 3]);

        let q = parse_query(&["level", "=", "critical"]).unwrap();
        assert_eq!(ids(&q.apply(&entries)), vec![2]);
    }

    #[test]
    fn test_numeric_filters_combine_with_and() {
        let entries = fleet();
        let q = parse_query(&["temp", ">=", "30", "smoke", "<", "10"]).unwrap();
        assert_eq!(ids(&q.apply(&entries)), vec![3]);
    }

    #[test]
    fn test_percent_filter_and_limit() {
        let entries = fleet();
        let q = parse_query(&["percent", ">", "0", "--limit", "1"]).unwrap();
        assert_eq!(q.limit, Some(1));
        assert_eq!(ids(&q.apply(&entries)), vec![2]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_query(&[]), Err(QueryError::Empty));
        assert_eq!(parse_query(&["temp", ">"]), Err(QueryError::Incomplete(0)));
        assert_eq!(
            parse_query(&["wind", ">", "3"]),
            Err(QueryError::UnknownField("wind".into()))
        );
        assert_eq!(
            parse_query(&["temp", "~", "3"]),
            Err(QueryError::UnknownOp("~".into()))
        );
        assert!(matches!(
            parse_query(&["level", "=", "extreme"]),
            Err(QueryError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_query(&["temp", "=", "NaN"]),
            Err(QueryError::InvalidValue { .. })
        ));
        assert_eq!(
            parse_query(&["temp", ">", "1", "--limit"]),
            Err(QueryError::MissingOptionValue("--limit"))
        );
        let five: Vec<&str> = ["temp", ">", "1"].repeat(5);
        assert_eq!(parse_query(&five), Err(QueryError::TooManyFilters));
    }
}
