use std::fmt;

use serde::Serialize;

// ============================================================================
// Artifacts - generated documents for a placed order
// ============================================================================

/// Document kinds the backend can render for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArtifactKind {
    /// Every document bundled as one archive
    All,
    /// Application form ("Anlage 2")
    Main,
    OrderForm,
    SwitchDeclaration,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::All,
        ArtifactKind::Main,
        ArtifactKind::OrderForm,
        ArtifactKind::SwitchDeclaration,
    ];

    /// Value of the `pdf_type` query parameter.
    pub fn wire_name(self) -> &'static str {
        match self {
            ArtifactKind::All => "all",
            ArtifactKind::Main => "main",
            ArtifactKind::OrderForm => "bestellung",
            ArtifactKind::SwitchDeclaration => "wechsel",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::All => "application/zip",
            _ => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::All => "zip",
            _ => "pdf",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            ArtifactKind::All => "Marina_Pflegebox",
            ArtifactKind::Main => "Anlage2_Antrag",
            ArtifactKind::OrderForm => "Bestellformular",
            ArtifactKind::SwitchDeclaration => "Wechselerklaerung",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactKind::All => "all",
            ArtifactKind::Main => "main",
            ArtifactKind::OrderForm => "order-form",
            ArtifactKind::SwitchDeclaration => "switch-declaration",
        };
        f.write_str(label)
    }
}

/// First eight characters of the order id, upper-cased.
pub fn display_order_number(order_id: &str) -> String {
    order_id.chars().take(8).collect::<String>().to_uppercase()
}

/// Order ids are opaque, but only ever letters, digits, `-` and `_`.
pub fn is_plausible_order_id(order_id: &str) -> bool {
    !order_id.is_empty()
        && order_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

/// Deterministic file name: `{prefix}_{last name}_{first 8 of id}.{ext}`.
pub fn artifact_file_name(kind: ArtifactKind, order_id: &str, last_name: &str) -> String {
    let short_id: String = order_id
        .chars()
        .take(8)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "{}_{}_{}.{}",
        kind.file_prefix(),
        sanitize_name(last_name),
        short_id,
        kind.extension()
    )
}

// Path separators and whitespace would break the file name.
fn sanitize_name(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();

    if cleaned.is_empty() {
        "Kunde".to_string()
    } else {
        cleaned
    }
}

/// Per-kind download sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ArtifactState {
    #[default]
    Idle,
    Fetching,
    Ready {
        file_name: String,
        size: usize,
    },
    FetchFailed {
        fallback_url: String,
    },
}

// ============================================================================
// Unit Tests
// ============================================================================
