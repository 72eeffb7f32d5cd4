//! Report editing end to end through the public library API, with storage
//! simulated by serializing to column payloads and reading them back.

use fieldops_reports::calc::{correction_factor, corrected_reading, ratio};
use fieldops_reports::report::form::{JobInfoField, PhasePair, ReadingWindow};
use fieldops_reports::report::shape::{
    COL_COMMENTS, COL_CONTACT_RESISTANCE, COL_DATA, COL_INSULATION_RESISTANCE, COL_REPORT_DATA,
    COL_REPORT_INFO, COL_TEST_EQUIPMENT, COL_VISUAL_INSPECTION,
};
use fieldops_reports::report::{
    normalize_loaded, serialize_for_save, FieldUpdate, LoadDisposition, LoadOutcome, Mode,
    ReportForm, ReportKind, ReportSession, SaveShape, StoredRow, StoredShape,
};
use serde_json::json;
use uuid::Uuid;

// ---

/// Stand-in for a table row written with one storage layout.
fn store(form: &ReportForm, shape: SaveShape) -> StoredRow {
    // ---
    let mut row = StoredRow::default();
    for (column, value) in serialize_for_save(form, shape) {
        let slot = match column {
            COL_DATA => &mut row.data,
            COL_REPORT_DATA => &mut row.report_data,
            COL_REPORT_INFO => &mut row.split.report_info,
            COL_VISUAL_INSPECTION => &mut row.split.visual_inspection,
            COL_INSULATION_RESISTANCE => &mut row.split.insulation_resistance,
            COL_CONTACT_RESISTANCE => &mut row.split.contact_resistance,
            COL_TEST_EQUIPMENT => &mut row.split.test_equipment,
            COL_COMMENTS => &mut row.split.comments,
            other => panic!("unexpected column {other}"),
        };
        *slot = Some(value);
    }
    row
}

fn load(kind: ReportKind, row: StoredRow) -> LoadOutcome {
    match StoredShape::detect(row) {
        Some(shape) => LoadOutcome::Found(normalize_loaded(kind, shape)),
        None => LoadOutcome::NotFound,
    }
}

fn fill_transformer(session: &mut ReportSession) {
    // ---
    let edits = vec![
        FieldUpdate::JobInfo {
            field: JobInfoField::Identifier,
            value: "TX-2".into(),
        },
        FieldUpdate::Fahrenheit { value: 59.0 },
        FieldUpdate::InsulationReading {
            row: 0,
            window: ReadingWindow::HalfMinute,
            value: "10".into(),
        },
        FieldUpdate::InsulationReading {
            row: 0,
            window: ReadingWindow::OneMinute,
            value: "21".into(),
        },
        FieldUpdate::InsulationReading {
            row: 0,
            window: ReadingWindow::TenMinute,
            value: "50".into(),
        },
        FieldUpdate::TapVoltage { tap: 3, value: "480".into() },
        FieldUpdate::SecondaryWindingVoltage { value: "120".into() },
        FieldUpdate::TurnsRatioMeasured {
            row: 0,
            pair: PhasePair::H1H2,
            value: "4.02".into(),
        },
    ];
    for edit in edits {
        session.apply(edit).expect("edit accepted");
    }
}

#[test]
fn new_report_save_and_reload_round_trips() {
    // ---
    let kind = ReportKind::DryTypeTransformer;
    let job_id = Uuid::new_v4();

    let mut session = ReportSession::new(kind, job_id);
    fill_transformer(&mut session);

    // 59°F → 15°C → tcf 0.81
    assert_eq!(session.form().temperature.celsius, 15.0);
    assert_eq!(session.form().temperature.correction_factor, 0.81);
    let test = &session.form().insulation_resistance.tests[0];
    assert_eq!(test.corrected.half_minute, corrected_reading("10", 0.81));
    assert_eq!(
        test.polarization_index,
        ratio(&test.corrected.ten_minute, &test.corrected.one_minute)
    );

    let saved = session.begin_save().expect("editable");
    let row = store(&saved, SaveShape::Blob);
    let id = Uuid::new_v4();
    session.finish_save(Ok(id));
    assert_eq!(session.mode(), Mode::Viewing);

    let mut reopened = ReportSession::open(kind, job_id, id);
    let ticket = reopened.begin_load();
    assert_eq!(reopened.finish_load(ticket, load(kind, row)), LoadDisposition::Applied);
    assert_eq!(reopened.form(), &saved);
    assert_eq!(reopened.mode(), Mode::Viewing);
}

#[test]
fn legacy_split_rows_load_like_blob_rows() {
    // ---
    let kind = ReportKind::LargeDryTypeTransformer;
    let mut session = ReportSession::new(kind, Uuid::new_v4());
    fill_transformer(&mut session);
    let form = session.form().clone();

    let outcomes: Vec<_> = SaveShape::FALLBACK_ORDER
        .iter()
        .map(|shape| load(kind, store(&form, *shape)))
        .collect();

    for outcome in &outcomes {
        assert_eq!(outcome, &LoadOutcome::Found(form.clone()));
    }
}

#[test]
fn missing_row_opens_in_create_mode() {
    // ---
    let kind = ReportKind::AutomaticTransferSwitch;
    let mut session = ReportSession::open(kind, Uuid::new_v4(), Uuid::new_v4());
    let ticket = session.begin_load();
    session.finish_load(ticket, load(kind, StoredRow::default()));

    assert_eq!(session.mode(), Mode::Editing);
    assert!(session.alert().is_none());
    assert_eq!(session.form(), &ReportForm::initial(kind));
}

#[test]
fn slow_initial_load_cannot_clobber_new_edits() {
    // ---
    let kind = ReportKind::DryTypeTransformer;
    let stale = ReportForm::initial(kind);

    let mut session = ReportSession::new(kind, Uuid::new_v4());
    let ticket = session.begin_load();
    fill_transformer(&mut session);
    let edited = session.form().clone();

    let disposition = session.finish_load(ticket, LoadOutcome::Found(stale));
    assert_eq!(disposition, LoadDisposition::EditsInProgress);
    assert_eq!(session.form(), &edited);
}

#[test]
fn correction_factor_out_of_range_is_unity() {
    for c in [-25.0, -100.0, 111.0, 500.0] {
        assert_eq!(correction_factor(c), 1.0);
    }
}

#[test]
fn changing_selected_tap_changes_calculated_ratio() {
    // ---
    let kind = ReportKind::LiquidFilledTransformer;
    let mut session = ReportSession::new(kind, Uuid::new_v4());
    fill_transformer(&mut session);
    session
        .apply(FieldUpdate::TapVoltage { tap: 1, value: "504".into() })
        .expect("edit accepted");
    assert_eq!(session.form().turns_ratio.rows[0].calculated_ratio, "4.000");

    session.apply(FieldUpdate::TapPosition { tap: 1 }).expect("edit accepted");
    let row = &session.form().turns_ratio.rows[0];
    assert_eq!(row.calculated_ratio, "4.200");
    assert_eq!(row.deviation.h1_h2, "-4.286");
    assert_eq!(row.pass_fail.h1_h2, "FAIL");

    // The selection survives a save and reload.
    let saved = session.begin_save().expect("editable");
    let reloaded = load(kind, store(&saved, SaveShape::SplitColumns));
    assert_eq!(reloaded, LoadOutcome::Found(saved));
}

#[test]
fn fahrenheit_only_rows_load_with_matching_celsius() {
    // ---
    let kind = ReportKind::DryTypeTransformer;
    let row = StoredRow {
        data: Some(json!({
            "temperature": {"fahrenheit": 86.0},
            "insulation_resistance": {
                "tests": [{"readings": {"half_minute": "10", "one_minute": "21", "ten_minute": "50"}}]
            }
        })),
        ..Default::default()
    };

    let LoadOutcome::Found(form) = load(kind, row) else {
        panic!("row should load");
    };
    assert_eq!(form.temperature.celsius, 30.0);
    assert_eq!(form.temperature.correction_factor, 1.58);
    assert_eq!(form.insulation_resistance.tests[0].corrected.half_minute, "15.80");
}
