//! The closed set of report types this service stores.

use serde::{Deserialize, Serialize};

/// A report type. Each kind owns exactly one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    // ---
    DryTypeTransformer,
    LargeDryTypeTransformer,
    LiquidFilledTransformer,
    AutomaticTransferSwitch,
}

impl ReportKind {
    // ---
    pub const ALL: [ReportKind; 4] = [
        ReportKind::DryTypeTransformer,
        ReportKind::LargeDryTypeTransformer,
        ReportKind::LiquidFilledTransformer,
        ReportKind::AutomaticTransferSwitch,
    ];

    /// URL slug, also used inside asset URIs.
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::DryTypeTransformer => "dry-type-transformer",
            ReportKind::LargeDryTypeTransformer => "large-dry-type-transformer",
            ReportKind::LiquidFilledTransformer => "liquid-filled-transformer",
            ReportKind::AutomaticTransferSwitch => "automatic-transfer-switch",
        }
    }

    /// Backing table name. Only ever interpolated from this closed set.
    pub fn table(self) -> &'static str {
        match self {
            ReportKind::DryTypeTransformer => "dry_type_transformer_reports",
            ReportKind::LargeDryTypeTransformer => "large_dry_type_transformer_reports",
            ReportKind::LiquidFilledTransformer => "liquid_filled_transformer_reports",
            ReportKind::AutomaticTransferSwitch => "automatic_transfer_switch_reports",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ReportKind::DryTypeTransformer => "Dry Type Transformer",
            ReportKind::LargeDryTypeTransformer => "Large Dry Type Transformer",
            ReportKind::LiquidFilledTransformer => "Liquid Filled Transformer",
            ReportKind::AutomaticTransferSwitch => "Automatic Transfer Switch",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Transformers carry a turns ratio section; switches do not.
    pub fn has_turns_ratio(self) -> bool {
        !matches!(self, ReportKind::AutomaticTransferSwitch)
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
