use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::OrderBackend;
use crate::catalog::Catalog;
use crate::domain::budget::{self, BudgetStatus, LineItem, DEFAULT_BUDGET_LIMIT};
use crate::domain::gate::{self, GateReport};
use crate::metrics::Metrics;
use crate::models::OrderPayload;
use crate::state_machine::Reducer;
use crate::submission::{SubmissionController, SubmitOutcome};

use super::actions::WizardAction;
use super::aggregate::WizardState;
use super::commands::WizardCommand;
use super::errors::WizardError;
use super::value_objects::{WizardStep, EXTRA_ALLOWANCE_MAX};

// ============================================================================
// Wizard Session
// ============================================================================
//
// Orchestrates: Command → Gate / Budget checks → Actions → Reducer
//
// The session is the only writer of its WizardState. A refused command
// returns an error and leaves the state exactly as it was.
//
// ============================================================================

/// Display state of one step in the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepProgress {
    Complete,
    Current,
    Upcoming,
}

pub struct WizardSession {
    catalog: Arc<Catalog>,
    budget_limit: Decimal,
    state: WizardState,
    metrics: Option<Arc<Metrics>>,
}

impl WizardSession {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            budget_limit: DEFAULT_BUDGET_LIMIT,
            state: WizardState::initial(),
            metrics: None,
        }
    }

    pub fn with_budget_limit(mut self, limit: Decimal) -> Self {
        self.budget_limit = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn budget_limit(&self) -> Decimal {
        self.budget_limit
    }

    // ========================================================================
    // Derived reads
    // ========================================================================

    pub fn budget_status(&self) -> BudgetStatus {
        budget::status(&self.state.selection, &self.catalog, self.budget_limit)
    }

    pub fn projection(&self) -> Vec<LineItem> {
        budget::projection(&self.state.selection, self.state.gloves_size, &self.catalog)
    }

    pub fn gate(&self, step: WizardStep) -> GateReport {
        gate::check_step(step, &self.state, &self.catalog, self.budget_limit)
    }

    /// Whether `Advance` would currently be admitted.
    pub fn can_advance(&self) -> bool {
        !self.state.is_complete()
            && self.state.current_step.next().is_some()
            && self.gate(self.state.current_step).passed()
    }

    pub fn can_retreat(&self) -> bool {
        gate::can_retreat(&self.state)
    }

    pub fn can_increase(&self, product_id: &str) -> bool {
        budget::can_increase(&self.state.selection, &self.catalog, self.budget_limit, product_id)
    }

    pub fn step_progress(&self) -> Vec<(WizardStep, StepProgress)> {
        let current = self.state.current_step;
        let complete = self.state.is_complete();

        WizardStep::ALL
            .iter()
            .map(|&step| {
                let progress = if complete || step < current {
                    StepProgress::Complete
                } else if step == current {
                    StepProgress::Current
                } else {
                    StepProgress::Upcoming
                };
                (step, progress)
            })
            .collect()
    }

    pub fn order_payload(&self) -> OrderPayload {
        OrderPayload::from_state(&self.state, &self.catalog)
    }

    // ========================================================================
    // Command handling
    // ========================================================================

    /// Decide which actions a command produces without touching the state.
    /// An empty list means the command is a no-op (e.g. decrement at zero).
    pub fn decide(&self, command: &WizardCommand) -> Result<Vec<WizardAction>, WizardError> {
        if let Some(order_id) = &self.state.order_id {
            if !matches!(command, WizardCommand::Reset) {
                return Err(WizardError::OrderLocked(order_id.clone()));
            }
        }

        let state = &self.state;

        match command {
            WizardCommand::Advance => {
                let step = state.current_step;
                let next = step.next().ok_or(WizardError::NoNextStep(step))?;

                let report = self.gate(step);
                if !report.passed() {
                    return Err(WizardError::StepIncomplete(report));
                }

                Ok(vec![WizardAction::SetStep(next)])
            }

            WizardCommand::Back => {
                let step = state.current_step;
                let previous = step.previous().ok_or(WizardError::NoPreviousStep(step))?;
                Ok(vec![WizardAction::SetStep(previous)])
            }

            WizardCommand::IncreaseQuantity { product_id } => {
                let price = self.known_price(product_id)?;
                if !self.can_increase(product_id) {
                    return Err(WizardError::BudgetExceeded {
                        product_id: product_id.clone(),
                        projected: budget::round_cents(budget::total(&state.selection, &self.catalog) + price),
                        limit: self.budget_limit,
                    });
                }

                let quantity = state
                    .selection
                    .quantity(product_id)
                    .checked_add(1)
                    .ok_or_else(|| WizardError::QuantityLimit {
                        product_id: product_id.clone(),
                    })?;

                Ok(vec![WizardAction::SetQuantity {
                    product_id: product_id.clone(),
                    quantity,
                }])
            }

            WizardCommand::DecreaseQuantity { product_id } => {
                self.known_price(product_id)?;
                let current = state.selection.quantity(product_id);
                if current == 0 {
                    return Ok(Vec::new());
                }

                Ok(vec![WizardAction::SetQuantity {
                    product_id: product_id.clone(),
                    quantity: current - 1,
                }])
            }

            WizardCommand::SetQuantity { product_id, quantity } => {
                self.known_price(product_id)?;
                let current = state.selection.quantity(product_id);
                if current == *quantity {
                    return Ok(Vec::new());
                }

                // lowering a quantity is always admitted, even when over budget
                if *quantity > current {
                    let projected = budget::total(&state.selection.with_quantity(product_id, *quantity), &self.catalog);
                    if projected > self.budget_limit {
                        return Err(WizardError::BudgetExceeded {
                            product_id: product_id.clone(),
                            projected,
                            limit: self.budget_limit,
                        });
                    }
                }

                Ok(vec![WizardAction::SetQuantity {
                    product_id: product_id.clone(),
                    quantity: *quantity,
                }])
            }

            WizardCommand::SelectGlovesSize(size) => {
                if state.gloves_quantity() == 0 {
                    return Err(WizardError::GlovesNotSelected);
                }
                Ok(vec![WizardAction::SetGlovesSize(Some(*size))])
            }

            WizardCommand::SelectCareLevel(level) => Ok(vec![WizardAction::SetCareLevel(*level)]),

            WizardCommand::IncreaseExtraAllowance => {
                if state.extra_allowance >= EXTRA_ALLOWANCE_MAX {
                    return Ok(Vec::new());
                }
                Ok(vec![WizardAction::SetExtraAllowance(state.extra_allowance + 1)])
            }

            WizardCommand::DecreaseExtraAllowance => {
                if state.extra_allowance == 0 {
                    return Ok(Vec::new());
                }
                Ok(vec![WizardAction::SetExtraAllowance(state.extra_allowance - 1)])
            }

            WizardCommand::UpdateCustomer(patch) => {
                if patch.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![WizardAction::MergeCustomer(patch.clone())])
            }

            WizardCommand::UpdateInsurance(patch) => {
                if patch.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![WizardAction::MergeInsurance(patch.clone())])
            }

            WizardCommand::Reset => Ok(vec![WizardAction::Reset]),
        }
    }

    /// Decide and apply a command. Returns the new state on success.
    pub fn handle(&mut self, command: WizardCommand) -> Result<&WizardState, WizardError> {
        let actions = match self.decide(&command) {
            Ok(actions) => actions,
            Err(err) => {
                self.record_refusal(&err);
                return Err(err);
            }
        };

        for action in &actions {
            self.apply(action);
        }

        Ok(&self.state)
    }

    /// Store the server-issued order id. Happens at most once per session.
    pub fn record_order_id(&mut self, order_id: impl Into<String>) -> Result<(), WizardError> {
        if let Some(existing) = &self.state.order_id {
            return Err(WizardError::OrderLocked(existing.clone()));
        }

        self.apply(&WizardAction::RecordOrderId(order_id.into()));
        Ok(())
    }

    /// Submit the order through `controller` and record the id it returns.
    /// Every earlier gate is re-checked first, since fields stay editable on
    /// the summary step.
    pub async fn submit<B: OrderBackend>(
        &mut self,
        controller: &SubmissionController<B>,
    ) -> Result<SubmitOutcome, WizardError> {
        if let Some(order_id) = &self.state.order_id {
            return Ok(SubmitOutcome::AlreadySubmitted {
                order_id: order_id.clone(),
            });
        }

        let step = self.state.current_step;
        if !step.is_terminal() {
            return Err(WizardError::NotOnSummary(step));
        }

        for earlier in WizardStep::ALL.iter().filter(|s| !s.is_terminal()) {
            let report = self.gate(*earlier);
            if !report.passed() {
                let err = WizardError::StepIncomplete(report);
                self.record_refusal(&err);
                return Err(err);
            }
        }

        let outcome = controller.submit(&self.order_payload()).await;

        match &outcome {
            SubmitOutcome::Created { order_id } => {
                info!(order_id = %order_id, "Order recorded in wizard");
                self.record_order_id(order_id.clone())?;
            }
            SubmitOutcome::AlreadySubmitted { order_id } => {
                // The wizard holds no order, so this id belongs to an earlier run
                let err = WizardError::StaleSubmission {
                    order_id: order_id.clone(),
                };
                warn!(order_id = %order_id, "Controller still holds an order the wizard has forgotten");
                return Err(err);
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Start over: clears the wizard and the controller's submission and
    /// artifact state together.
    pub async fn reset<B: OrderBackend>(&mut self, controller: &SubmissionController<B>) {
        self.apply(&WizardAction::Reset);
        controller.reset().await;
    }

    fn apply(&mut self, action: &WizardAction) {
        debug!(action = WizardState::action_kind(action), step = %self.state.current_step, "Applying wizard action");
        self.state = self.state.apply(action);

        if let Some(metrics) = &self.metrics {
            metrics.record_transition(WizardState::action_kind(action));
        }
    }

    fn known_price(&self, product_id: &str) -> Result<Decimal, WizardError> {
        self.catalog
            .price_of(product_id)
            .ok_or_else(|| WizardError::UnknownProduct(product_id.to_string()))
    }

    fn record_refusal(&self, err: &WizardError) {
        match err {
            WizardError::StepIncomplete(report) => {
                info!(step = %report.step, fields = ?report.fields(), "Step gate refused");
                if let Some(metrics) = &self.metrics {
                    metrics.record_gate_refusal(&report.step.to_string());
                }
            }
            WizardError::UnknownProduct(id) => {
                warn!(product_id = %id, "Command for unknown catalog id");
            }
            other => debug!(error = %other, "Wizard command refused"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
