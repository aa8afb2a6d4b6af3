use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::domain::wizard::{
    CareLevel, CustomerPatch, GlovesSize, InsurancePatch, Signature, WizardCommand, WizardError, WizardSession,
};

// ============================================================================
// Order Draft - a filled-in wizard read from disk
// ============================================================================
//
// The draft is replayed as ordinary wizard commands, so every budget and
// gate rule applies exactly as it would to interactive input.
//
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderDraft {
    pub care_level: Option<CareLevel>,
    pub products: Vec<DraftLine>,
    pub gloves_size: Option<GlovesSize>,
    pub extra_allowance: u8,
    pub customer: CustomerPatch,
    pub insurance: InsurancePatch,
    pub signatures: DraftSignatures,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftLine {
    pub product_id: String,
    pub quantity: u32,
}

/// PNG files holding the captured signatures, relative to the draft file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftSignatures {
    pub insured: Option<PathBuf>,
    pub caregiver: Option<PathBuf>,
}

impl OrderDraft {
    /// Read a draft and encode the signature images it points to.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read draft {}", path.display()))?;
        let mut draft: OrderDraft =
            serde_json::from_str(&raw).with_context(|| format!("Invalid draft JSON in {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(file) = &draft.signatures.insured {
            let signature = read_signature(&base.join(file)).await?;
            draft.insurance.signature_insured = Some(Some(signature));
        }
        if let Some(file) = &draft.signatures.caregiver {
            let signature = read_signature(&base.join(file)).await?;
            draft.insurance.signature_caregiver = Some(Some(signature));
        }

        Ok(draft)
    }

    /// Product-step commands, in the order a person would issue them.
    pub fn product_commands(&self) -> Vec<WizardCommand> {
        let mut commands = Vec::new();

        if let Some(level) = self.care_level {
            commands.push(WizardCommand::SelectCareLevel(level));
        }
        commands.extend(self.products.iter().map(|line| WizardCommand::SetQuantity {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        }));
        if let Some(size) = self.gloves_size {
            commands.push(WizardCommand::SelectGlovesSize(size));
        }
        commands.extend((0..self.extra_allowance).map(|_| WizardCommand::IncreaseExtraAllowance));

        commands
    }

    /// Drive `session` from the first step to the summary. Stops at the first
    /// refused command and hands its error back.
    pub fn drive(&self, session: &mut WizardSession) -> Result<(), WizardError> {
        for command in self.product_commands() {
            session.handle(command)?;
        }
        session.handle(WizardCommand::Advance)?;

        session.handle(WizardCommand::UpdateCustomer(self.customer.clone()))?;
        session.handle(WizardCommand::Advance)?;

        session.handle(WizardCommand::UpdateInsurance(self.insurance.clone()))?;
        session.handle(WizardCommand::Advance)?;

        tracing::info!(
            step = %session.state().current_step,
            total = %session.budget_status().total,
            "Draft applied"
        );
        Ok(())
    }
}

async fn read_signature(path: &Path) -> anyhow::Result<Signature> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read signature image {}", path.display()))?;
    if bytes.is_empty() {
        anyhow::bail!("Signature image {} is empty", path.display());
    }
    Ok(Signature::from_png(&bytes))
}

// ============================================================================
// Unit Tests
// ============================================================================
