//! Storage shapes for report rows and the conversions between them and
//! [`ReportForm`].
//!
//! Report tables have gone through three layouts over their migration
//! history. Newest first:
//!
//! 1. `data`: the whole form as one JSON blob.
//! 2. `report_data`: the same blob under an older column name.
//! 3. split columns: `report_info`, `visual_inspection`,
//!    `insulation_resistance`, `contact_resistance`, `test_equipment`,
//!    `comments`.
//!
//! The set is closed: a row is read in whichever shape it has, and a save
//! tries the newest shape first and falls back only when the database
//! rejects a column.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::form::{
    ContactResistanceRow, InsulationResistance, JobInfo, Nameplate, ReportForm, ReportStatus,
    TestEquipment, TurnsRatio, VisualInspectionItem,
};
use super::ReportKind;
use crate::calc::Temperature;

pub const COL_DATA: &str = "data";
pub const COL_REPORT_DATA: &str = "report_data";
pub const COL_REPORT_INFO: &str = "report_info";
pub const COL_VISUAL_INSPECTION: &str = "visual_inspection";
pub const COL_INSULATION_RESISTANCE: &str = "insulation_resistance";
pub const COL_CONTACT_RESISTANCE: &str = "contact_resistance";
pub const COL_TEST_EQUIPMENT: &str = "test_equipment";
pub const COL_COMMENTS: &str = "comments";

/// Columns that make up the split layout.
pub const SPLIT_COLUMNS: [&str; 6] = [
    COL_REPORT_INFO,
    COL_VISUAL_INSPECTION,
    COL_INSULATION_RESISTANCE,
    COL_CONTACT_RESISTANCE,
    COL_TEST_EQUIPMENT,
    COL_COMMENTS,
];

// ---

/// Shape-bearing columns of one stored row, as read from the database.
///
/// A column missing from the table (older schema) and a NULL value are both
/// `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRow {
    // ---
    pub data: Option<Value>,
    pub report_data: Option<Value>,
    pub split: SplitColumns,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitColumns {
    pub report_info: Option<Value>,
    pub visual_inspection: Option<Value>,
    pub insulation_resistance: Option<Value>,
    pub contact_resistance: Option<Value>,
    pub test_equipment: Option<Value>,
    pub comments: Option<Value>,
}

impl SplitColumns {
    fn is_empty(&self) -> bool {
        self.report_info.is_none()
            && self.visual_inspection.is_none()
            && self.insulation_resistance.is_none()
            && self.contact_resistance.is_none()
            && self.test_equipment.is_none()
            && self.comments.is_none()
    }
}

/// A stored row, classified by layout.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredShape {
    Blob(Value),
    ReportData(Value),
    SplitColumns(SplitColumns),
}

/// Layouts a save can be attempted in, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveShape {
    Blob,
    ReportData,
    SplitColumns,
}

impl SaveShape {
    pub const FALLBACK_ORDER: [SaveShape; 3] =
        [SaveShape::Blob, SaveShape::ReportData, SaveShape::SplitColumns];

    /// Columns written by this shape, in payload order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            SaveShape::Blob => &[COL_DATA],
            SaveShape::ReportData => &[COL_REPORT_DATA],
            SaveShape::SplitColumns => &SPLIT_COLUMNS,
        }
    }
}

impl std::fmt::Display for SaveShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveShape::Blob => f.write_str("blob"),
            SaveShape::ReportData => f.write_str("report_data"),
            SaveShape::SplitColumns => f.write_str("split_columns"),
        }
    }
}

// ---

/// Contents of the `report_info` split column.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ReportInfo {
    job_info: Option<Value>,
    nameplate: Option<Value>,
    temperature: Option<Value>,
    turns_ratio: Option<Value>,
    status: Option<Value>,
}

impl StoredShape {
    /// Classify a row. The blob column wins over `report_data`, which wins
    /// over split columns. `None` means the row carries no report data.
    pub fn detect(row: StoredRow) -> Option<StoredShape> {
        // ---
        if let Some(v) = row.data.filter(|v| !v.is_null()) {
            return Some(StoredShape::Blob(v));
        }
        if let Some(v) = row.report_data.filter(|v| !v.is_null()) {
            return Some(StoredShape::ReportData(v));
        }
        if !row.split.is_empty() {
            return Some(StoredShape::SplitColumns(row.split));
        }
        None
    }
}

/// Turn any stored shape into a fully populated form.
///
/// Anything absent or malformed keeps its value from
/// [`ReportForm::initial`], so the result is always completely structured.
/// Derived fields are recomputed rather than trusted.
pub fn normalize_loaded(kind: ReportKind, shape: StoredShape) -> ReportForm {
    // ---
    let mut form = ReportForm::initial(kind);

    match shape {
        StoredShape::Blob(value) | StoredShape::ReportData(value) => {
            overlay_blob(&mut form, &value);
        }
        StoredShape::SplitColumns(split) => {
            if let Some(info) = split.report_info {
                let info: ReportInfo = piece("report_info", info, ReportInfo::default());
                overlay::<JobInfo>(&mut form.job_info, "job_info", info.job_info);
                overlay::<Nameplate>(&mut form.nameplate, "nameplate", info.nameplate);
                overlay::<Temperature>(&mut form.temperature, "temperature", info.temperature);
                overlay::<TurnsRatio>(&mut form.turns_ratio, "turns_ratio", info.turns_ratio);
                overlay::<ReportStatus>(&mut form.status, "status", info.status);
            }
            overlay::<Vec<VisualInspectionItem>>(
                &mut form.visual_inspection,
                COL_VISUAL_INSPECTION,
                split.visual_inspection,
            );
            overlay::<InsulationResistance>(
                &mut form.insulation_resistance,
                COL_INSULATION_RESISTANCE,
                split.insulation_resistance,
            );
            overlay::<Vec<ContactResistanceRow>>(
                &mut form.contact_resistance,
                COL_CONTACT_RESISTANCE,
                split.contact_resistance,
            );
            overlay::<TestEquipment>(
                &mut form.test_equipment,
                COL_TEST_EQUIPMENT,
                split.test_equipment,
            );
            overlay::<String>(&mut form.comments, COL_COMMENTS, split.comments);
        }
    }

    form.recompute();
    form
}

/// Build the column payload for saving `form` in the given shape.
pub fn serialize_for_save(form: &ReportForm, shape: SaveShape) -> Vec<(&'static str, Value)> {
    // ---
    match shape {
        SaveShape::Blob => vec![(COL_DATA, to_value(form))],
        SaveShape::ReportData => vec![(COL_REPORT_DATA, to_value(form))],
        SaveShape::SplitColumns => vec![
            (
                COL_REPORT_INFO,
                json!({
                    "job_info": to_value(&form.job_info),
                    "nameplate": to_value(&form.nameplate),
                    "temperature": to_value(&form.temperature),
                    "turns_ratio": to_value(&form.turns_ratio),
                    "status": to_value(&form.status),
                }),
            ),
            (COL_VISUAL_INSPECTION, to_value(&form.visual_inspection)),
            (COL_INSULATION_RESISTANCE, to_value(&form.insulation_resistance)),
            (COL_CONTACT_RESISTANCE, to_value(&form.contact_resistance)),
            (COL_TEST_EQUIPMENT, to_value(&form.test_equipment)),
            (COL_COMMENTS, Value::String(form.comments.clone())),
        ],
    }
}

fn overlay_blob(form: &mut ReportForm, value: &Value) {
    // ---
    let Some(obj) = value.as_object() else {
        tracing::warn!("report blob is not a JSON object, using defaults");
        return;
    };
    let take = |m: &Map<String, Value>, key: &str| m.get(key).cloned();

    overlay::<JobInfo>(&mut form.job_info, "job_info", take(obj, "job_info"));
    overlay::<Nameplate>(&mut form.nameplate, "nameplate", take(obj, "nameplate"));
    overlay::<Temperature>(&mut form.temperature, "temperature", take(obj, "temperature"));
    overlay::<Vec<VisualInspectionItem>>(
        &mut form.visual_inspection,
        "visual_inspection",
        take(obj, "visual_inspection"),
    );
    overlay::<InsulationResistance>(
        &mut form.insulation_resistance,
        "insulation_resistance",
        take(obj, "insulation_resistance"),
    );
    overlay::<TurnsRatio>(&mut form.turns_ratio, "turns_ratio", take(obj, "turns_ratio"));
    overlay::<Vec<ContactResistanceRow>>(
        &mut form.contact_resistance,
        "contact_resistance",
        take(obj, "contact_resistance"),
    );
    overlay::<TestEquipment>(&mut form.test_equipment, "test_equipment", take(obj, "test_equipment"));
    overlay::<String>(&mut form.comments, "comments", take(obj, "comments"));
    overlay::<ReportStatus>(&mut form.status, "status", take(obj, "status"));
}

/// Replace `target` with the decoded value when one is present and valid.
fn overlay<T: DeserializeOwned>(target: &mut T, name: &str, value: Option<Value>) {
    if let Some(value) = value.filter(|v| !v.is_null()) {
        if let Ok(decoded) = serde_json::from_value::<T>(value) {
            *target = decoded;
        } else {
            tracing::warn!(section = name, "malformed report section, keeping defaults");
        }
    }
}

fn piece<T: DeserializeOwned>(name: &str, value: Value, fallback: T) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(section = name, error = %e, "malformed report section, keeping defaults");
        fallback
    })
}

fn to_value<T: Serialize>(v: &T) -> Value {
    // Form types are plain data with string keys, so this cannot fail.
    serde_json::to_value(v).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::report::form::{FieldUpdate, PhasePair, ReadingWindow};

    fn sample_form() -> ReportForm {
        // ---
        let mut form = ReportForm::initial(ReportKind::DryTypeTransformer);
        let edits = [
            FieldUpdate::Fahrenheit { value: 77.0 },
            FieldUpdate::InsulationReading {
                row: 0,
                window: ReadingWindow::HalfMinute,
                value: "1200".into(),
            },
            FieldUpdate::InsulationReading {
                row: 0,
                window: ReadingWindow::OneMinute,
                value: "1800".into(),
            },
            FieldUpdate::TapVoltage { tap: 3, value: "480".into() },
            FieldUpdate::SecondaryWindingVoltage { value: "120".into() },
            FieldUpdate::TurnsRatioMeasured {
                row: 0,
                pair: PhasePair::H3H1,
                value: "3.99".into(),
            },
            FieldUpdate::Comments { value: "Fan 2 noisy".into() },
        ];
        for edit in edits {
            form.apply(edit).unwrap();
        }
        form
    }

    fn row_from(shape: SaveShape, form: &ReportForm) -> StoredRow {
        // ---
        let mut row = StoredRow::default();
        for (col, value) in serialize_for_save(form, shape) {
            match col {
                COL_DATA => row.data = Some(value),
                COL_REPORT_DATA => row.report_data = Some(value),
                COL_REPORT_INFO => row.split.report_info = Some(value),
                COL_VISUAL_INSPECTION => row.split.visual_inspection = Some(value),
                COL_INSULATION_RESISTANCE => row.split.insulation_resistance = Some(value),
                COL_CONTACT_RESISTANCE => row.split.contact_resistance = Some(value),
                COL_TEST_EQUIPMENT => row.split.test_equipment = Some(value),
                COL_COMMENTS => row.split.comments = Some(value),
                other => panic!("unexpected column {other}"),
            }
        }
        row
    }

    #[test]
    fn test_detection_precedence() {
        // ---
        let row = StoredRow {
            data: Some(json!({"comments": "blob"})),
            report_data: Some(json!({"comments": "report_data"})),
            split: SplitColumns {
                comments: Some(json!("split")),
                ..Default::default()
            },
        };
        assert!(matches!(StoredShape::detect(row.clone()), Some(StoredShape::Blob(_))));

        let row = StoredRow { data: Some(Value::Null), ..row };
        assert!(matches!(StoredShape::detect(row.clone()), Some(StoredShape::ReportData(_))));

        let row = StoredRow { report_data: None, ..row };
        assert!(matches!(StoredShape::detect(row), Some(StoredShape::SplitColumns(_))));

        assert_eq!(StoredShape::detect(StoredRow::default()), None);
    }

    #[test]
    fn test_every_shape_round_trips() {
        // ---
        let form = sample_form();
        for shape in SaveShape::FALLBACK_ORDER {
            let row = row_from(shape, &form);
            let detected = StoredShape::detect(row).expect("shape present");
            let loaded = normalize_loaded(ReportKind::DryTypeTransformer, detected);
            assert_eq!(loaded, form, "round trip through {shape}");
        }
    }

    #[test]
    fn test_split_and_blob_normalize_identically() {
        // ---
        let form = sample_form();
        let from_blob = normalize_loaded(
            ReportKind::DryTypeTransformer,
            StoredShape::detect(row_from(SaveShape::Blob, &form)).unwrap(),
        );
        let from_split = normalize_loaded(
            ReportKind::DryTypeTransformer,
            StoredShape::detect(row_from(SaveShape::SplitColumns, &form)).unwrap(),
        );
        assert_eq!(from_blob, from_split);
    }

    #[test]
    fn test_missing_pieces_fall_back_to_initial_state() {
        // ---
        let shape = StoredShape::Blob(json!({
            "job_info": {"customer": "Acme"},
            "insulation_resistance": "not an object",
        }));
        let form = normalize_loaded(ReportKind::DryTypeTransformer, shape);
        let initial = ReportForm::initial(ReportKind::DryTypeTransformer);

        assert_eq!(form.job_info.customer, "Acme");
        assert_eq!(form.job_info.address, "");
        assert_eq!(form.insulation_resistance, initial.insulation_resistance);
        assert_eq!(form.visual_inspection, initial.visual_inspection);
        assert_eq!(form.nameplate.tap_voltages.len(), 5);
    }

    #[test]
    fn test_stale_derived_values_are_recomputed() {
        // ---
        let shape = StoredShape::ReportData(json!({
            "temperature": {"fahrenheit": 86.0, "celsius": 30.0, "correction_factor": 9.9},
            "insulation_resistance": {
                "tests": [{
                    "winding": "Primary to Ground",
                    "readings": {"half_minute": "10", "one_minute": "", "ten_minute": ""},
                    "corrected": {"half_minute": "999", "one_minute": "", "ten_minute": ""}
                }]
            }
        }));
        let form = normalize_loaded(ReportKind::DryTypeTransformer, shape);
        assert_eq!(form.temperature.correction_factor, 1.58);
        assert_eq!(form.insulation_resistance.tests[0].corrected.half_minute, "15.80");
        assert_eq!(form.insulation_resistance.minimum_ratio, 1.0);
    }

    #[test]
    fn test_single_scale_temperature_loads_consistently() {
        // ---
        let shape = StoredShape::Blob(json!({
            "temperature": {"fahrenheit": 86.0},
            "insulation_resistance": {
                "tests": [{"readings": {"half_minute": "10", "one_minute": "", "ten_minute": ""}}]
            }
        }));
        let form = normalize_loaded(ReportKind::DryTypeTransformer, shape);
        assert_eq!(form.temperature.celsius, 30.0);
        assert_eq!(form.temperature.correction_factor, 1.58);
        assert_eq!(form.insulation_resistance.tests[0].corrected.half_minute, "15.80");

        let split = SplitColumns {
            report_info: Some(json!({"temperature": {"celsius": 15.0}})),
            ..Default::default()
        };
        let form = normalize_loaded(ReportKind::LiquidFilledTransformer, StoredShape::SplitColumns(split));
        assert_eq!(form.temperature.fahrenheit, 59.0);
        assert_eq!(form.temperature.correction_factor, 0.81);
    }

    #[test]
    fn test_non_object_blob_yields_initial_form() {
        let form = normalize_loaded(ReportKind::AutomaticTransferSwitch, StoredShape::Blob(json!([1, 2])));
        assert_eq!(form, ReportForm::initial(ReportKind::AutomaticTransferSwitch));
    }

    #[test]
    fn test_save_shape_columns() {
        assert_eq!(SaveShape::Blob.columns(), &["data"]);
        assert_eq!(SaveShape::ReportData.columns(), &["report_data"]);
        assert_eq!(SaveShape::SplitColumns.columns().len(), 6);
        let payload = serialize_for_save(&ReportForm::default(), SaveShape::SplitColumns);
        let cols: Vec<_> = payload.iter().map(|(c, _)| *c).collect();
        assert_eq!(cols, SaveShape::SplitColumns.columns());
    }
}
