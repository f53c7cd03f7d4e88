//! Cascading selections over the asset table.
//!
//! Fields depend on each other in a fixed order: baseline scenario, target
//! scenario, technology, year, shock year. The options offered for a field are
//! the distinct values among rows matching every field before it.

use std::collections::BTreeSet;

use crate::dataset::{AssetRecord, AssetTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionField {
    BaselineScenario,
    TargetScenario,
    Technology,
    Year,
    ShockYear,
}

impl SelectionField {
    pub const ORDER: [SelectionField; 5] = [
        SelectionField::BaselineScenario,
        SelectionField::TargetScenario,
        SelectionField::Technology,
        SelectionField::Year,
        SelectionField::ShockYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SelectionField::BaselineScenario => "Baseline Scenario",
            SelectionField::TargetScenario => "Target Scenario",
            SelectionField::Technology => "Technology",
            SelectionField::Year => "Year",
            SelectionField::ShockYear => "Shock Year",
        }
    }

    fn upstream(self) -> &'static [SelectionField] {
        let pos = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        &Self::ORDER[..pos]
    }
}

/// A single selectable value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Text(String),
    Year(i64),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Year(y) => write!(f, "{y}"),
        }
    }
}

/// Borrowed form of a row's value, so option scans only allocate per distinct value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FieldKey<'a> {
    Text(&'a str),
    Year(i64),
}

impl FieldKey<'_> {
    fn to_value(self) -> FieldValue {
        match self {
            FieldKey::Text(s) => FieldValue::Text(s.to_string()),
            FieldKey::Year(y) => FieldValue::Year(y),
        }
    }
}

fn field_key(record: &AssetRecord, field: SelectionField) -> FieldKey<'_> {
    match field {
        SelectionField::BaselineScenario => FieldKey::Text(&record.baseline_scenario),
        SelectionField::TargetScenario => FieldKey::Text(&record.target_scenario),
        SelectionField::Technology => FieldKey::Text(&record.technology),
        SelectionField::Year => FieldKey::Year(record.year),
        SelectionField::ShockYear => FieldKey::Year(record.shock_year),
    }
}

/// Outcome of [`Selection::reconcile_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Option sets of the reconciled selection.
    pub options: CascadeOptions,
    pub changed: Vec<SelectionField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub baseline_scenario: Option<String>,
    pub target_scenario: Option<String>,
    pub technology: Option<String>,
    pub year: Option<i64>,
    pub shock_year: Option<i64>,
}

impl Selection {
    pub fn get(&self, field: SelectionField) -> Option<FieldValue> {
        match field {
            SelectionField::BaselineScenario => {
                self.baseline_scenario.clone().map(FieldValue::Text)
            }
            SelectionField::TargetScenario => self.target_scenario.clone().map(FieldValue::Text),
            SelectionField::Technology => self.technology.clone().map(FieldValue::Text),
            SelectionField::Year => self.year.map(FieldValue::Year),
            SelectionField::ShockYear => self.shock_year.map(FieldValue::Year),
        }
    }

    /// Sets `field`; a value of the wrong kind clears it.
    pub fn set(&mut self, field: SelectionField, value: Option<FieldValue>) {
        let text = |v: Option<FieldValue>| match v {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        };
        let year = |v: Option<FieldValue>| match v {
            Some(FieldValue::Year(y)) => Some(y),
            _ => None,
        };
        match field {
            SelectionField::BaselineScenario => self.baseline_scenario = text(value),
            SelectionField::TargetScenario => self.target_scenario = text(value),
            SelectionField::Technology => self.technology = text(value),
            SelectionField::Year => self.year = year(value),
            SelectionField::ShockYear => self.shock_year = year(value),
        }
    }

    /// True when `record` agrees with every set field.
    pub fn matches(&self, record: &AssetRecord) -> bool {
        self.matches_fields(record, &SelectionField::ORDER)
    }

    fn matches_fields(&self, record: &AssetRecord, fields: &[SelectionField]) -> bool {
        fields.iter().all(|field| match field {
            SelectionField::BaselineScenario => self
                .baseline_scenario
                .as_ref()
                .is_none_or(|v| *v == record.baseline_scenario),
            SelectionField::TargetScenario => self
                .target_scenario
                .as_ref()
                .is_none_or(|v| *v == record.target_scenario),
            SelectionField::Technology => {
                self.technology.as_ref().is_none_or(|v| *v == record.technology)
            }
            SelectionField::Year => self.year.is_none_or(|v| v == record.year),
            SelectionField::ShockYear => self.shock_year.is_none_or(|v| v == record.shock_year),
        })
    }

    /// Brings every field back in line with its option set, upstream first.
    ///
    /// A value no longer offered is replaced by the first option, or cleared
    /// when there are none. Returns the fields that changed.
    pub fn reconcile(&mut self, table: &AssetTable) -> Vec<SelectionField> {
        self.reconcile_options(table).changed
    }

    /// Like [`Selection::reconcile`], also returning every field's options.
    ///
    /// Each set is computed once its upstream fields are final, so it equals
    /// [`cascading_options`] of the reconciled selection.
    pub fn reconcile_options(&mut self, table: &AssetTable) -> Reconciled {
        let mut reconciled = Reconciled::default();
        for field in SelectionField::ORDER {
            let options = field_options(table, self, field);
            let current = self.get(field);
            if !current.as_ref().is_some_and(|v| options.contains(v)) {
                let replacement = options.first().cloned();
                if replacement != current {
                    reconciled.changed.push(field);
                }
                self.set(field, replacement);
            }
            *reconciled.options.get_mut(field) = options;
        }
        reconciled
    }

    /// Selects `value` for `field` and reconciles everything downstream.
    pub fn choose(
        &mut self,
        table: &AssetTable,
        field: SelectionField,
        value: FieldValue,
    ) -> Vec<SelectionField> {
        self.set(field, Some(value));
        self.reconcile(table)
    }
}

/// Sorted distinct values of `field` among rows matching the fields upstream of it.
pub fn field_options(
    table: &AssetTable,
    selection: &Selection,
    field: SelectionField,
) -> Vec<FieldValue> {
    let upstream = field.upstream();
    table
        .rows()
        .iter()
        .filter(|r| selection.matches_fields(r, upstream))
        .map(|r| field_key(r, field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(FieldKey::to_value)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOptions {
    pub baseline_scenario: Vec<FieldValue>,
    pub target_scenario: Vec<FieldValue>,
    pub technology: Vec<FieldValue>,
    pub year: Vec<FieldValue>,
    pub shock_year: Vec<FieldValue>,
}

impl CascadeOptions {
    pub fn get(&self, field: SelectionField) -> &[FieldValue] {
        match field {
            SelectionField::BaselineScenario => &self.baseline_scenario,
            SelectionField::TargetScenario => &self.target_scenario,
            SelectionField::Technology => &self.technology,
            SelectionField::Year => &self.year,
            SelectionField::ShockYear => &self.shock_year,
        }
    }

    fn get_mut(&mut self, field: SelectionField) -> &mut Vec<FieldValue> {
        match field {
            SelectionField::BaselineScenario => &mut self.baseline_scenario,
            SelectionField::TargetScenario => &mut self.target_scenario,
            SelectionField::Technology => &mut self.technology,
            SelectionField::Year => &mut self.year,
            SelectionField::ShockYear => &mut self.shock_year,
        }
    }
}

/// Option sets of every field given the fixed upstream selections.
pub fn cascading_options(table: &AssetTable, selection: &Selection) -> CascadeOptions {
    let options = |field| field_options(table, selection, field);
    CascadeOptions {
        baseline_scenario: options(SelectionField::BaselineScenario),
        target_scenario: options(SelectionField::TargetScenario),
        technology: options(SelectionField::Technology),
        year: options(SelectionField::Year),
        shock_year: options(SelectionField::ShockYear),
    }
}

/// Rows equal to the selection on every set field, in table order.
pub fn apply_filters<'a>(table: &'a AssetTable, selection: &Selection) -> Vec<&'a AssetRecord> {
    table.rows().iter().filter(|r| selection.matches(r)).collect()
}
