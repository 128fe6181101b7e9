//! Monthly schedule list feed.
//!
//! The list service answers `{ rows: [...] }` or `{ data: { rows: [...] } }`, where
//! each row is `{ row: [{ Text, Class }, ...], ...other fields }`. Cell text is
//! markup. Rows are narrowed here once; anything that isn't an object is dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::normalize::fields::collapse_ws;

static BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
/// `09.12(`, `9/12(`: the start of a day label.
static DAY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[./]\d{1,2}\(").expect("valid regex"));

/// Markup → plain text; `<br>` reads as a space.
pub fn strip_tags(s: &str) -> String {
    let s = BR.replace_all(s, " ");
    collapse_ws(&TAG.replace_all(&s, " "))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleCell {
    /// Raw markup from `Text`.
    pub text: String,
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleRow {
    pub cells: Vec<ScheduleCell>,
    /// Every other string/number field on the row object, in key order.
    pub extra: Vec<String>,
}

impl ScheduleCell {
    fn from_value(v: &Value) -> Self {
        Self {
            text: v.get("Text").and_then(Value::as_str).unwrap_or_default().to_string(),
            class: v.get("Class").and_then(Value::as_str).map(str::to_string),
        }
    }

    pub fn plain(&self) -> String {
        strip_tags(&self.text)
    }

    fn has_class(&self, class: &str) -> bool {
        self.class.as_deref() == Some(class)
    }
}

impl ScheduleRow {
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj: &Map<String, Value> = v.as_object()?;
        let cells = obj
            .get("row")
            .and_then(Value::as_array)
            .map(|cells| cells.iter().map(ScheduleCell::from_value).collect())
            .unwrap_or_default();
        let extra = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "row")
            .filter_map(|(_, v)| match v {
                Value::String(s) => Some(strip_tags(s)),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
        Some(Self { cells, extra })
    }

    /// All visible text of the row: cell texts first, then the extra fields.
    pub fn values(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(ScheduleCell::plain)
            .filter(|s| !s.is_empty())
            .chain(self.extra.iter().cloned())
            .collect()
    }

    pub fn text(&self) -> String {
        self.values().join(" ")
    }

    pub fn cell_by_class(&self, class: &str) -> Option<&ScheduleCell> {
        self.cells.iter().find(|c| c.has_class(class))
    }

    /// Plain text of the day marker cell, if this row carries one.
    pub fn day_label(&self) -> Option<String> {
        self.cells
            .iter()
            .find(|c| c.has_class("day") || DAY_LABEL.is_match(&c.text))
            .map(ScheduleCell::plain)
            .filter(|s| !s.is_empty())
    }
}

/// Rows from either response shape, in upstream order.
pub fn rows_from_response(json: &Value) -> Vec<ScheduleRow> {
    json.get("rows")
        .and_then(Value::as_array)
        .or_else(|| json.get("data").and_then(|d| d.get("rows")).and_then(Value::as_array))
        .map(|rows| rows.iter().filter_map(ScheduleRow::from_value).collect())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_markup() {
        assert_eq!(strip_tags("<b>LG</b><br/>vs<BR>KT"), "LG vs KT");
        assert_eq!(strip_tags("  "), "");
    }

    #[test]
    fn both_response_shapes() {
        assert_eq!(rows_from_response(&september()).len(), 5);
        let nested = json!({ "data": { "rows": september()["rows"].clone() } });
        assert_eq!(rows_from_response(&nested).len(), 5);
        assert!(rows_from_response(&json!({ "d": "nothing" })).is_empty());
    }

    #[test]
    fn non_object_rows_are_dropped() {
        let rows = rows_from_response(&json!({ "rows": [1, "x", { "row": [] }] }));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn values_flatten_cells_then_fields() {
        let row = ScheduleRow::from_value(&json!({
            "row": [ { "Text": "<span>18:30</span>", "Class": "time" }, { "Text": "", "Class": "x" } ],
            "gameId": "20250912LGKT0",
            "seq": 3,
            "flag": true
        }))
        .unwrap();
        assert_eq!(row.values(), vec!["18:30", "20250912LGKT0", "3"]);
        assert_eq!(row.cell_by_class("time").map(ScheduleCell::plain).as_deref(), Some("18:30"));
    }

    #[test]
    fn day_label_by_class_or_shape() {
        let rows = rows_from_response(&september());
        assert_eq!(rows[0].day_label().as_deref(), Some("09.12(금)"));
        assert_eq!(rows[1].day_label(), None);

        let unclassed = ScheduleRow::from_value(&json!({ "row": [ { "Text": "9.14(일)" } ] })).unwrap();
        assert_eq!(unclassed.day_label().as_deref(), Some("9.14(일)"));
    }
}
