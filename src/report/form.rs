//! In-memory shape of a test report and the typed reducer that edits it.
//!
//! Every edit goes through [`ReportForm::apply`], which re-runs all
//! derivations afterwards. Derived fields (corrected readings, ratios,
//! deviations, verdicts) are therefore never edited directly and cannot
//! drift from the inputs they are computed from.

use serde::{Deserialize, Serialize};

use crate::calc::{
    self, insulation::DEFAULT_MINIMUM_RATIO, resolve_nameplate_voltage,
    temperature::is_valid_degrees, Temperature,
};

use super::ReportKind;

// ---

/// Errors raised by the form reducer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("no {section} row at index {index}")]
    NoSuchRow { section: &'static str, index: usize },

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("report is read-only until editing is re-enabled")]
    ReadOnly,
}

/// Highest tap number a nameplate tap table can hold.
pub const MAX_TAPS: usize = 32;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportStatus {
    #[default]
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobInfo {
    // ---
    pub customer: String,
    pub address: String,
    pub job_number: String,
    pub technicians: String,
    pub date: String,
    pub identifier: String,
    pub user: String,
    pub substation: String,
    pub equipment_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nameplate {
    // ---
    pub manufacturer: String,
    pub catalog_number: String,
    pub serial_number: String,
    pub kva: String,
    pub primary_voltage: String,
    pub secondary_voltage: String,
    pub impedance: String,
    /// Primary voltage at each tap, index 0 is tap 1.
    pub tap_voltages: Vec<String>,
    /// Selected tap, 1-based.
    pub tap_position: usize,
}

impl Default for Nameplate {
    fn default() -> Self {
        Nameplate {
            manufacturer: String::new(),
            catalog_number: String::new(),
            serial_number: String::new(),
            kva: String::new(),
            primary_voltage: String::new(),
            secondary_voltage: String::new(),
            impedance: String::new(),
            tap_voltages: vec![String::new(); 5],
            tap_position: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualInspectionItem {
    /// NETA section identifier, e.g. `7.2.1.1.A.1`.
    pub neta_section: String,
    pub description: String,
    pub result: String,
}

/// Readings at the three standard time windows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Readings {
    pub half_minute: String,
    pub one_minute: String,
    pub ten_minute: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingWindow {
    HalfMinute,
    OneMinute,
    TenMinute,
}

impl Readings {
    fn get_mut(&mut self, window: ReadingWindow) -> &mut String {
        match window {
            ReadingWindow::HalfMinute => &mut self.half_minute,
            ReadingWindow::OneMinute => &mut self.one_minute,
            ReadingWindow::TenMinute => &mut self.ten_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsulationResistanceTest {
    // ---
    pub winding: String,
    pub test_voltage: String,
    pub unit: String,
    pub readings: Readings,
    /// Derived: readings × correction factor.
    pub corrected: Readings,
    /// Derived: corrected 1 min / corrected 0.5 min.
    pub dielectric_absorption: String,
    /// Derived: corrected 10 min / corrected 1 min.
    pub polarization_index: String,
}

impl Default for InsulationResistanceTest {
    fn default() -> Self {
        InsulationResistanceTest {
            winding: String::new(),
            test_voltage: "1000V".to_string(),
            unit: "GΩ".to_string(),
            readings: Readings::default(),
            corrected: Readings::default(),
            dielectric_absorption: String::new(),
            polarization_index: String::new(),
        }
    }
}

impl InsulationResistanceTest {
    fn for_winding(winding: &str) -> Self {
        InsulationResistanceTest {
            winding: winding.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsulationResistance {
    pub tests: Vec<InsulationResistanceTest>,
    pub minimum_ratio: f64,
    /// Derived: `"Yes"` or `"No"`.
    pub acceptable: String,
}

impl Default for InsulationResistance {
    fn default() -> Self {
        InsulationResistance {
            tests: Vec::new(),
            minimum_ratio: DEFAULT_MINIMUM_RATIO,
            acceptable: calc::insulation::ACCEPTABLE_NO.to_string(),
        }
    }
}

/// One value per transformer phase pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseReadings {
    pub h1_h2: String,
    pub h2_h3: String,
    pub h3_h1: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePair {
    H1H2,
    H2H3,
    H3H1,
}

impl PhaseReadings {
    const PAIRS: [PhasePair; 3] = [PhasePair::H1H2, PhasePair::H2H3, PhasePair::H3H1];

    fn get(&self, pair: PhasePair) -> &str {
        match pair {
            PhasePair::H1H2 => &self.h1_h2,
            PhasePair::H2H3 => &self.h2_h3,
            PhasePair::H3H1 => &self.h3_h1,
        }
    }

    fn get_mut(&mut self, pair: PhasePair) -> &mut String {
        match pair {
            PhasePair::H1H2 => &mut self.h1_h2,
            PhasePair::H2H3 => &mut self.h2_h3,
            PhasePair::H3H1 => &mut self.h3_h1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnsRatioRow {
    // ---
    /// 1-based tap.
    pub tap: usize,
    /// Explicit override; when blank the nameplate tap table is used.
    pub nameplate_voltage: String,
    /// Derived.
    pub calculated_ratio: String,
    pub measured: PhaseReadings,
    /// Derived, percent.
    pub deviation: PhaseReadings,
    /// Derived, `PASS`/`FAIL`.
    pub pass_fail: PhaseReadings,
}

impl Default for TurnsRatioRow {
    fn default() -> Self {
        TurnsRatioRow::for_tap(1)
    }
}

impl TurnsRatioRow {
    fn for_tap(tap: usize) -> Self {
        TurnsRatioRow {
            tap,
            nameplate_voltage: String::new(),
            calculated_ratio: String::new(),
            measured: PhaseReadings::default(),
            deviation: PhaseReadings::default(),
            pass_fail: PhaseReadings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnsRatio {
    pub secondary_winding_voltage: String,
    pub rows: Vec<TurnsRatioRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    A,
    B,
    C,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactResistanceRow {
    pub description: String,
    pub phase_a: String,
    pub phase_b: String,
    pub phase_c: String,
    pub units: String,
}

impl Default for ContactResistanceRow {
    fn default() -> Self {
        ContactResistanceRow {
            description: String::new(),
            phase_a: String::new(),
            phase_b: String::new(),
            phase_c: String::new(),
            units: "µΩ".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentItem {
    pub name: String,
    pub serial_number: String,
    pub amp_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Megohmmeter,
    TtrTestSet,
    LowResistanceOhmmeter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentField {
    Name,
    SerialNumber,
    AmpId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEquipment {
    pub megohmmeter: EquipmentItem,
    pub ttr_test_set: EquipmentItem,
    pub low_resistance_ohmmeter: EquipmentItem,
}

impl TestEquipment {
    fn get_mut(&mut self, instrument: Instrument) -> &mut EquipmentItem {
        match instrument {
            Instrument::Megohmmeter => &mut self.megohmmeter,
            Instrument::TtrTestSet => &mut self.ttr_test_set,
            Instrument::LowResistanceOhmmeter => &mut self.low_resistance_ohmmeter,
        }
    }
}

// ---

/// The full editable report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    // ---
    pub job_info: JobInfo,
    pub nameplate: Nameplate,
    pub temperature: Temperature,
    pub visual_inspection: Vec<VisualInspectionItem>,
    pub insulation_resistance: InsulationResistance,
    pub turns_ratio: TurnsRatio,
    pub contact_resistance: Vec<ContactResistanceRow>,
    pub test_equipment: TestEquipment,
    pub comments: String,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobInfoField {
    Customer,
    Address,
    JobNumber,
    Technicians,
    Date,
    Identifier,
    User,
    Substation,
    EquipmentLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameplateField {
    Manufacturer,
    CatalogNumber,
    SerialNumber,
    Kva,
    PrimaryVoltage,
    SecondaryVoltage,
    Impedance,
}

/// A single edit to a report, addressed by typed field rather than by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldUpdate {
    JobInfo { field: JobInfoField, value: String },
    Nameplate { field: NameplateField, value: String },
    TapVoltage { tap: usize, value: String },
    TapPosition { tap: usize },
    Fahrenheit { value: f64 },
    Celsius { value: f64 },
    Humidity { value: Option<f64> },
    VisualInspection { index: usize, result: String },
    InsulationTestVoltage { row: usize, value: String },
    InsulationUnit { row: usize, value: String },
    InsulationReading { row: usize, window: ReadingWindow, value: String },
    MinimumRatio { value: f64 },
    SecondaryWindingVoltage { value: String },
    AddTurnsRatioRow { tap: usize },
    TurnsRatioTap { row: usize, tap: usize },
    TurnsRatioNameplate { row: usize, value: String },
    TurnsRatioMeasured { row: usize, pair: PhasePair, value: String },
    ContactResistance { row: usize, phase: Phase, value: String },
    TestEquipment { instrument: Instrument, field: EquipmentField, value: String },
    Comments { value: String },
    Status { value: ReportStatus },
}

impl ReportForm {
    // ---

    /// Fresh form for a new report of the given kind.
    pub fn initial(kind: ReportKind) -> Self {
        // ---
        let mut form = ReportForm {
            visual_inspection: checklist(kind),
            ..Default::default()
        };

        let windings: &[&str] = if kind.has_turns_ratio() {
            &["Primary to Ground", "Secondary to Ground", "Primary to Secondary"]
        } else {
            &["Pole to Pole", "Pole to Frame", "Line to Load"]
        };
        form.insulation_resistance.tests = windings
            .iter()
            .map(|w| InsulationResistanceTest::for_winding(w))
            .collect();

        if kind.has_turns_ratio() {
            form.turns_ratio.rows = vec![TurnsRatioRow::for_tap(form.nameplate.tap_position)];
        } else {
            form.contact_resistance = ["Normal", "Emergency"]
                .iter()
                .map(|d| ContactResistanceRow {
                    description: d.to_string(),
                    ..Default::default()
                })
                .collect();
        }

        form.recompute();
        form
    }

    /// Apply one edit and re-run every derivation.
    pub fn apply(&mut self, update: FieldUpdate) -> Result<(), FormError> {
        // ---
        match update {
            FieldUpdate::JobInfo { field, value } => *self.job_info_mut(field) = value,
            FieldUpdate::Nameplate { field, value } => *self.nameplate_mut(field) = value,
            FieldUpdate::TapVoltage { tap, value } => {
                let idx = tap_index(tap)?;
                if idx >= self.nameplate.tap_voltages.len() {
                    self.nameplate.tap_voltages.resize(idx + 1, String::new());
                }
                self.nameplate.tap_voltages[idx] = value;
            }
            FieldUpdate::TapPosition { tap } => {
                tap_index(tap)?;
                // Rows measured at the selected tap move with it.
                let previous = self.nameplate.tap_position;
                for row in self.turns_ratio.rows.iter_mut().filter(|r| r.tap == previous) {
                    row.tap = tap;
                }
                self.nameplate.tap_position = tap;
            }
            FieldUpdate::Fahrenheit { value } => {
                self.temperature.set_fahrenheit(degrees("fahrenheit", value)?)
            }
            FieldUpdate::Celsius { value } => {
                self.temperature.set_celsius(degrees("celsius", value)?)
            }
            FieldUpdate::Humidity { value } => self.temperature.humidity = value,
            FieldUpdate::VisualInspection { index, result } => {
                row_mut(&mut self.visual_inspection, "visual inspection", index)?.result = result
            }
            FieldUpdate::InsulationTestVoltage { row, value } => {
                self.insulation_test_mut(row)?.test_voltage = value
            }
            FieldUpdate::InsulationUnit { row, value } => self.insulation_test_mut(row)?.unit = value,
            FieldUpdate::InsulationReading { row, window, value } => {
                *self.insulation_test_mut(row)?.readings.get_mut(window) = value
            }
            FieldUpdate::MinimumRatio { value } => self.insulation_resistance.minimum_ratio = value,
            FieldUpdate::SecondaryWindingVoltage { value } => {
                self.turns_ratio.secondary_winding_voltage = value
            }
            FieldUpdate::AddTurnsRatioRow { tap } => {
                tap_index(tap)?;
                self.turns_ratio.rows.push(TurnsRatioRow::for_tap(tap))
            }
            FieldUpdate::TurnsRatioTap { row, tap } => {
                tap_index(tap)?;
                self.turns_ratio_row_mut(row)?.tap = tap
            }
            FieldUpdate::TurnsRatioNameplate { row, value } => {
                self.turns_ratio_row_mut(row)?.nameplate_voltage = value
            }
            FieldUpdate::TurnsRatioMeasured { row, pair, value } => {
                *self.turns_ratio_row_mut(row)?.measured.get_mut(pair) = value
            }
            FieldUpdate::ContactResistance { row, phase, value } => {
                let r = row_mut(&mut self.contact_resistance, "contact resistance", row)?;
                match phase {
                    Phase::A => r.phase_a = value,
                    Phase::B => r.phase_b = value,
                    Phase::C => r.phase_c = value,
                }
            }
            FieldUpdate::TestEquipment {
                instrument,
                field,
                value,
            } => {
                let item = self.test_equipment.get_mut(instrument);
                match field {
                    EquipmentField::Name => item.name = value,
                    EquipmentField::SerialNumber => item.serial_number = value,
                    EquipmentField::AmpId => item.amp_id = value,
                }
            }
            FieldUpdate::Comments { value } => self.comments = value,
            FieldUpdate::Status { value } => self.status = value,
        }

        self.recompute();
        Ok(())
    }

    /// Re-derive every computed field from the current inputs.
    pub fn recompute(&mut self) {
        // ---
        self.temperature.reconcile();
        let tcf = self.temperature.correction_factor;

        for test in &mut self.insulation_resistance.tests {
            test.corrected = Readings {
                half_minute: calc::corrected_reading(&test.readings.half_minute, tcf),
                one_minute: calc::corrected_reading(&test.readings.one_minute, tcf),
                ten_minute: calc::corrected_reading(&test.readings.ten_minute, tcf),
            };
            test.dielectric_absorption =
                calc::ratio(&test.corrected.one_minute, &test.corrected.half_minute);
            test.polarization_index =
                calc::ratio(&test.corrected.ten_minute, &test.corrected.one_minute);
        }

        let ratios = self
            .insulation_resistance
            .tests
            .iter()
            .flat_map(|t| [t.dielectric_absorption.as_str(), t.polarization_index.as_str()]);
        self.insulation_resistance.acceptable =
            calc::acceptable(ratios, self.insulation_resistance.minimum_ratio).to_string();

        let secondary = self.turns_ratio.secondary_winding_voltage.clone();
        let taps = &self.nameplate.tap_voltages;
        for row in &mut self.turns_ratio.rows {
            let nameplate = resolve_nameplate_voltage(row.tap, &row.nameplate_voltage, taps);
            row.calculated_ratio = calc::calculated_ratio(&nameplate, &secondary);
            for pair in PhaseReadings::PAIRS {
                let dev = calc::deviation(row.measured.get(pair), &row.calculated_ratio);
                *row.pass_fail.get_mut(pair) = calc::pass_fail(&dev);
                *row.deviation.get_mut(pair) = dev;
            }
        }
    }

    fn job_info_mut(&mut self, field: JobInfoField) -> &mut String {
        let j = &mut self.job_info;
        match field {
            JobInfoField::Customer => &mut j.customer,
            JobInfoField::Address => &mut j.address,
            JobInfoField::JobNumber => &mut j.job_number,
            JobInfoField::Technicians => &mut j.technicians,
            JobInfoField::Date => &mut j.date,
            JobInfoField::Identifier => &mut j.identifier,
            JobInfoField::User => &mut j.user,
            JobInfoField::Substation => &mut j.substation,
            JobInfoField::EquipmentLocation => &mut j.equipment_location,
        }
    }

    fn nameplate_mut(&mut self, field: NameplateField) -> &mut String {
        let n = &mut self.nameplate;
        match field {
            NameplateField::Manufacturer => &mut n.manufacturer,
            NameplateField::CatalogNumber => &mut n.catalog_number,
            NameplateField::SerialNumber => &mut n.serial_number,
            NameplateField::Kva => &mut n.kva,
            NameplateField::PrimaryVoltage => &mut n.primary_voltage,
            NameplateField::SecondaryVoltage => &mut n.secondary_voltage,
            NameplateField::Impedance => &mut n.impedance,
        }
    }

    fn insulation_test_mut(&mut self, row: usize) -> Result<&mut InsulationResistanceTest, FormError> {
        row_mut(&mut self.insulation_resistance.tests, "insulation resistance", row)
    }

    fn turns_ratio_row_mut(&mut self, row: usize) -> Result<&mut TurnsRatioRow, FormError> {
        row_mut(&mut self.turns_ratio.rows, "turns ratio", row)
    }
}

/// Zero-based index of a 1-based tap number, bounded by [`MAX_TAPS`].
fn tap_index(tap: usize) -> Result<usize, FormError> {
    match tap {
        1..=MAX_TAPS => Ok(tap - 1),
        _ => Err(FormError::NoSuchRow {
            section: "tap voltage",
            index: tap,
        }),
    }
}

fn degrees(field: &'static str, value: f64) -> Result<f64, FormError> {
    if is_valid_degrees(value) {
        Ok(value)
    } else {
        Err(FormError::OutOfRange { field, value })
    }
}

fn row_mut<'a, T>(rows: &'a mut [T], section: &'static str, index: usize) -> Result<&'a mut T, FormError> {
    rows.get_mut(index)
        .ok_or(FormError::NoSuchRow { section, index })
}

/// Visual and mechanical inspection items for a report kind.
fn checklist(kind: ReportKind) -> Vec<VisualInspectionItem> {
    // ---
    let items: &[(&str, &str)] = match kind {
        ReportKind::AutomaticTransferSwitch => &[
            ("7.22.3.A.1", "Compare equipment nameplate data with drawings and specifications."),
            ("7.22.3.A.2", "Inspect physical and mechanical condition."),
            ("7.22.3.A.3", "Inspect anchorage, alignment, grounding, and required clearances."),
            ("7.22.3.A.4", "Verify the unit is clean."),
            ("7.22.3.A.5", "Verify appropriate lubrication on moving current-carrying parts and on moving and sliding surfaces."),
            ("7.22.3.A.6", "Verify that manual transfer warnings are attached and visible."),
            ("7.22.3.A.7", "Verify tightness of all control connections."),
            ("7.22.3.A.8.1", "Use of low-resistance ohmmeter in accordance with Section 7.22.3.B.1."),
            ("7.22.3.A.9", "Perform manual transfer operation."),
            ("7.22.3.A.10", "Verify positive mechanical interlocking between normal and alternate sources."),
        ],
        ReportKind::LiquidFilledTransformer => &[
            ("7.2.2.A.1", "Compare equipment nameplate data with drawings and specifications."),
            ("7.2.2.A.2", "Inspect physical and mechanical condition."),
            ("7.2.2.A.3", "Inspect impact recorder prior to unloading."),
            ("7.2.2.A.4", "Test dew point of tank gases, if applicable."),
            ("7.2.2.A.5", "Inspect anchorage, alignment, and grounding."),
            ("7.2.2.A.6", "Verify the presence of PCB content labeling."),
            ("7.2.2.A.7", "Verify removal of any shipping bracing after placement."),
            ("7.2.2.A.8", "Verify the bushings are clean."),
            ("7.2.2.A.9", "Verify that alarm, control, and trip settings on temperature and level indicators are as specified."),
            ("7.2.2.A.10", "Verify that cooling fans and pumps operate correctly."),
            ("7.2.2.A.11", "Verify correct liquid level in tanks and bushings."),
            ("7.2.2.A.12", "Verify that positive pressure is maintained on gas-blanketed transformers."),
        ],
        ReportKind::DryTypeTransformer | ReportKind::LargeDryTypeTransformer => &[
            ("7.2.1.1.A.1", "Compare equipment nameplate data with drawings and specifications."),
            ("7.2.1.1.A.2", "Inspect physical and mechanical condition."),
            ("7.2.1.1.A.3", "Inspect anchorage, alignment, and grounding."),
            ("7.2.1.1.A.4", "Verify that resilient mounts are free and that any shipping brackets have been removed."),
            ("7.2.1.1.A.5", "Verify the unit is clean."),
            ("7.2.1.1.A.6", "Verify that control and alarm settings on temperature indicators are as specified."),
            ("7.2.1.1.A.7", "Verify that cooling fans operate correctly."),
            ("7.2.1.1.A.8.1", "Use of a low-resistance ohmmeter in accordance with Section 7.2.1.1.B.1."),
            ("7.2.1.1.A.9", "Perform specific inspections and mechanical tests as recommended by the manufacturer."),
            ("7.2.1.1.A.10", "Verify that as-left tap connections are as specified."),
            ("7.2.1.1.A.11", "Verify the presence of surge arresters, if applicable."),
        ],
    };

    items
        .iter()
        .map(|(section, description)| VisualInspectionItem {
            neta_section: section.to_string(),
            description: description.to_string(),
            result: String::new(),
        })
        .collect()
}
