use std::fmt;

use base64::Engine;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wizard Value Objects
// ============================================================================

/// Upper bound of the zero-cost extra allowance counter.
pub const EXTRA_ALLOWANCE_MAX: u8 = 4;

/// Accepted birth-year window, inclusive.
pub const BIRTH_YEAR_MIN: i32 = 1900;
pub const BIRTH_YEAR_MAX: i32 = 2100;

/// The four wizard pages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    Products,
    Delivery,
    Insurance,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Products,
        WizardStep::Delivery,
        WizardStep::Insurance,
        WizardStep::Summary,
    ];

    pub fn index(self) -> u8 {
        match self {
            WizardStep::Products => 0,
            WizardStep::Delivery => 1,
            WizardStep::Insurance => 2,
            WizardStep::Summary => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStep::Summary
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WizardStep::Products => "products",
            WizardStep::Delivery => "delivery",
            WizardStep::Insurance => "insurance",
            WizardStep::Summary => "summary",
        };
        f.write_str(label)
    }
}

/// Statutory care level ("Pflegegrad").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CareLevel {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
}

impl CareLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CareLevel::One => "1",
            CareLevel::Two => "2",
            CareLevel::Three => "3",
            CareLevel::Four => "4",
            CareLevel::Five => "5",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(CareLevel::One),
            "2" => Some(CareLevel::Two),
            "3" => Some(CareLevel::Three),
            "4" => Some(CareLevel::Four),
            "5" => Some(CareLevel::Five),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlovesSize {
    S,
    M,
    L,
    XL,
}

impl GlovesSize {
    pub const ALL: [GlovesSize; 4] = [GlovesSize::S, GlovesSize::M, GlovesSize::L, GlovesSize::XL];

    pub fn as_str(self) -> &'static str {
        match self {
            GlovesSize::S => "S",
            GlovesSize::M => "M",
            GlovesSize::L => "L",
            GlovesSize::XL => "XL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Salutation {
    #[serde(rename = "Frau")]
    Ms,
    #[serde(rename = "Herr")]
    Mr,
    #[serde(rename = "Divers")]
    Diverse,
}

impl Salutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Salutation::Ms => "Frau",
            Salutation::Mr => "Herr",
            Salutation::Diverse => "Divers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InsuranceType {
    #[default]
    #[serde(rename = "gesetzlich")]
    Statutory,
    #[serde(rename = "privat")]
    Private,
}

impl InsuranceType {
    pub fn as_str(self) -> &'static str {
        match self {
            InsuranceType::Statutory => "gesetzlich",
            InsuranceType::Private => "privat",
        }
    }
}

/// Civil-servant subsidy share ("Beihilfe").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsidyPercent {
    #[serde(rename = "50")]
    Fifty,
    #[serde(rename = "70")]
    Seventy,
    #[serde(rename = "80")]
    Eighty,
}

impl SubsidyPercent {
    pub fn as_str(self) -> &'static str {
        match self {
            SubsidyPercent::Fifty => "50",
            SubsidyPercent::Seventy => "70",
            SubsidyPercent::Eighty => "80",
        }
    }
}

/// Encoded handwritten signature. Only its presence matters to the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    const PNG_DATA_URL_PREFIX: &'static str = "data:image/png;base64,";

    /// Wrap an already encoded payload, typically a PNG data URL.
    pub fn from_encoded(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Encode raw PNG bytes the way the signature pad delivers them.
    pub fn from_png(bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("{}{}", Self::PNG_DATA_URL_PREFIX, encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

/// Parse a `DD.MM.YYYY` birth date, rejecting days that do not exist.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[2] == b'.'
        && bytes[5] == b'.'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }

    let day: u32 = value[0..2].parse().ok()?;
    let month: u32 = value[3..5].parse().ok()?;
    let year: i32 = value[6..10].parse().ok()?;
    if !(BIRTH_YEAR_MIN..=BIRTH_YEAR_MAX).contains(&year) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render a date in the wire format `DD.MM.YYYY`.
pub fn format_birth_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

/// Normalise free keyboard input into the progressive `DD.MM.YYYY` mask.
pub fn format_birth_date_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(8).collect();

    let mut formatted = String::with_capacity(10);
    for (i, digit) in digits.chars().enumerate() {
        if i == 2 || i == 4 {
            formatted.push('.');
        }
        formatted.push(digit);
    }
    formatted
}

/// German postal codes are exactly five ASCII digits.
pub fn is_valid_postal_code(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}

/// One selected catalog line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Quantities per catalog id, kept in order of first selection.
///
/// A missing id and an id with quantity 0 mean the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    lines: Vec<SelectionLine>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(&self, product_id: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Copy of this selection with one quantity replaced.
    pub fn with_quantity(&self, product_id: &str, quantity: u32) -> Self {
        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => lines.push(SelectionLine {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
        Self { lines }
    }

    pub fn lines(&self) -> impl Iterator<Item = &SelectionLine> {
        self.lines.iter()
    }

    /// Lines with a positive quantity.
    pub fn selected(&self) -> impl Iterator<Item = &SelectionLine> {
        self.lines.iter().filter(|line| line.quantity > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.selected().next().is_none()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birth_date_rejects_impossible_days() {
        assert!(parse_birth_date("31.02.2020").is_none());
        assert!(parse_birth_date("29.02.2020").is_some());
        assert!(parse_birth_date("29.02.2019").is_none());
        assert!(parse_birth_date("31.04.1950").is_none());
        assert!(parse_birth_date("00.01.1950").is_none());
        assert!(parse_birth_date("01.13.1950").is_none());
    }

    #[test]
    fn test_birth_date_year_window() {
        assert!(parse_birth_date("01.01.1900").is_some());
        assert!(parse_birth_date("31.12.2100").is_some());
        assert!(parse_birth_date("31.12.1899").is_none());
        assert!(parse_birth_date("01.01.2101").is_none());
    }

    #[test]
    fn test_birth_date_requires_exact_shape() {
        assert!(parse_birth_date("1.1.1950").is_none());
        assert!(parse_birth_date("01-01-1950").is_none());
        assert!(parse_birth_date("01.01.1950 ").is_none());
        assert!(parse_birth_date("").is_none());
        assert!(parse_birth_date("ab.cd.efgh").is_none());
    }

    #[test]
    fn test_birth_date_round_trips_to_wire_format() {
        let date = parse_birth_date("05.03.1948").unwrap();
        assert_eq!(format_birth_date(date), "05.03.1948");
    }

    #[test]
    fn test_birth_date_input_mask() {
        assert_eq!(format_birth_date_input(""), "");
        assert_eq!(format_birth_date_input("1"), "1");
        assert_eq!(format_birth_date_input("120"), "12.0");
        assert_eq!(format_birth_date_input("12031"), "12.03.1");
        assert_eq!(format_birth_date_input("12/03/1948"), "12.03.1948");
        assert_eq!(format_birth_date_input("1203194899"), "12.03.1948");
    }

    #[test]
    fn test_postal_code_must_be_five_digits() {
        assert!(is_valid_postal_code("10115"));
        assert!(!is_valid_postal_code("1011"));
        assert!(!is_valid_postal_code("101155"));
        assert!(!is_valid_postal_code("1011a"));
        assert!(!is_valid_postal_code(" 0115"));
    }

    #[test]
    fn test_step_navigation_bounds() {
        assert_eq!(WizardStep::Products.previous(), None);
        assert_eq!(WizardStep::Products.next(), Some(WizardStep::Delivery));
        assert_eq!(WizardStep::Summary.next(), None);
        assert_eq!(WizardStep::from_index(2), Some(WizardStep::Insurance));
        assert_eq!(WizardStep::from_index(4), None);
        assert!(WizardStep::Summary.is_terminal());
    }

    #[test]
    fn test_selection_keeps_first_selection_order() {
        let selection = Selection::new()
            .with_quantity("ffp2", 1)
            .with_quantity("pads", 2)
            .with_quantity("ffp2", 3);

        let ids: Vec<_> = selection.lines().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["ffp2", "pads"]);
        assert_eq!(selection.quantity("ffp2"), 3);
        assert_eq!(selection.quantity("missing"), 0);
    }

    #[test]
    fn test_selection_zero_quantity_counts_as_unselected() {
        let selection = Selection::new().with_quantity("pads", 1).with_quantity("pads", 0);

        assert_eq!(selection.quantity("pads"), 0);
        assert!(selection.is_empty());
        assert_eq!(selection.selected().count(), 0);
    }

    #[test]
    fn test_signature_from_png_is_data_url() {
        let signature = Signature::from_png(&[0x89, b'P', b'N', b'G']);
        assert_eq!(signature.as_str(), "data:image/png;base64,iVBORw==");
        assert!(signature.is_present());
        assert!(!Signature::from_encoded("  ").is_present());
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(serde_json::to_string(&CareLevel::Three).unwrap(), "\"3\"");
        assert_eq!(serde_json::to_string(&Salutation::Ms).unwrap(), "\"Frau\"");
        assert_eq!(serde_json::to_string(&InsuranceType::Private).unwrap(), "\"privat\"");
        assert_eq!(serde_json::to_string(&SubsidyPercent::Seventy).unwrap(), "\"70\"");
        assert_eq!(CareLevel::parse(" 4 "), Some(CareLevel::Four));
        assert_eq!(CareLevel::parse("6"), None);
    }
}
