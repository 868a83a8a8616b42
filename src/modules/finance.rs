//! Revenues and expenses.
//!
//! - Revenues above [`FinanceConfig::installment_threshold`] get an installment plan once
//!   they are stored. Installments fall due monthly, starting on the income date.
//! - Expenses booked through an ad platform carry a card fee and overseas tax derived
//!   from the configured rates.

use super::{is_filled, publish, set_field};
use crate::config::FinanceConfig;
use app_core::{
    ApplicationCore, BoxError, Cardinality, FieldSpec, Module, SchemaDefinition, SchemaHooks,
    WorkflowEngine,
};
use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub const REVENUE_STATUSES: &[&str] = &["pending", "partial", "completed"];
pub const INSTALLMENT_COUNT: u32 = 3;

/// Rounds to cents.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Installment {
    pub sequence: u32,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
}

/// Splits `amount` into `count` monthly installments. The last one absorbs rounding.
pub fn plan_installments(
    amount: f64,
    count: u32,
    first_due: Option<NaiveDate>,
) -> Vec<Installment> {
    if count == 0 {
        return Vec::new();
    }
    let share = round_cents(amount / f64::from(count));
    (0..count)
        .map(|i| Installment {
            sequence: i + 1,
            amount: if i + 1 == count {
                round_cents(amount - share * f64::from(count - 1))
            } else {
                share
            },
            due_date: first_due.and_then(|d| d.checked_add_months(Months::new(i))),
        })
        .collect()
}

/// The calendar date of a date-typed field, if it has one.
fn date_of(record: &Value, key: &str) -> Option<NaiveDate> {
    let text = record.get(key)?.as_str()?;
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok()
}

struct RevenueHooks {
    config: FinanceConfig,
}

impl RevenueHooks {
    /// The installments owed for `revenue`; empty at or below the threshold.
    fn plan_for(&self, revenue: &Value) -> Vec<Installment> {
        match revenue.get("amount").and_then(Value::as_f64) {
            Some(amount) if amount > self.config.installment_threshold => {
                plan_installments(amount, INSTALLMENT_COUNT, date_of(revenue, "income_date"))
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl SchemaHooks for RevenueHooks {
    async fn after_create(&self, record: &Value) -> Result<(), BoxError> {
        let plan = self.plan_for(record);
        if plan.is_empty() {
            return Ok(());
        }
        let revenue = record.get("id").unwrap_or(&Value::Null);
        for installment in &plan {
            debug!(
                %revenue,
                sequence = installment.sequence,
                amount = installment.amount,
                due = ?installment.due_date,
                "Installment scheduled"
            );
        }
        info!(%revenue, installments = plan.len(), "Installment plan created");
        Ok(())
    }
}

struct ExpenseHooks {
    workflow: Arc<WorkflowEngine>,
    config: FinanceConfig,
}

#[async_trait]
impl SchemaHooks for ExpenseHooks {
    async fn before_create(&self, mut record: Value) -> Result<Value, BoxError> {
        if is_filled(&record, "ad_platform") && is_filled(&record, "amount") {
            if let Some(amount) = record.get("amount").and_then(Value::as_f64) {
                let card_fee = round_cents(amount * self.config.card_fee_rate);
                let overseas_tax = round_cents(amount * self.config.overseas_tax_rate);
                set_field(&mut record, "card_fee", json!(card_fee));
                set_field(&mut record, "overseas_tax", json!(overseas_tax));
            }
        }
        Ok(record)
    }

    async fn after_create(&self, record: &Value) -> Result<(), BoxError> {
        publish(&self.workflow, "expense:created", record).await;
        Ok(())
    }
}

pub fn revenues_schema(config: FinanceConfig) -> SchemaDefinition {
    SchemaDefinition::new("revenues")
        .field(
            "project_id",
            FieldSpec::relation("projects", Cardinality::BelongsTo).required(),
        )
        .field(
            "customer_id",
            FieldSpec::relation("customers", Cardinality::BelongsTo),
        )
        .field("contract_number", FieldSpec::string())
        .field("service_type", FieldSpec::string().required())
        .field("amount", FieldSpec::number().required())
        .field("income_date", FieldSpec::date().required())
        .field("invoice_number", FieldSpec::string())
        .field(
            "status",
            FieldSpec::string()
                .default_value("pending")
                .one_of(REVENUE_STATUSES),
        )
        .field("notes", FieldSpec::string())
        .hooks(Arc::new(RevenueHooks { config }))
}

pub fn expenses_schema(workflow: Arc<WorkflowEngine>, config: FinanceConfig) -> SchemaDefinition {
    SchemaDefinition::new("expenses")
        .field(
            "project_id",
            FieldSpec::relation("projects", Cardinality::BelongsTo).required(),
        )
        .field("supplier_name", FieldSpec::string().required())
        .field("expense_type", FieldSpec::string().required())
        .field("amount", FieldSpec::number().required())
        .field("expense_date", FieldSpec::date().required())
        .field("invoice_number", FieldSpec::string())
        .field("file_url", FieldSpec::string())
        .field("notes", FieldSpec::string())
        .field("payment_request", FieldSpec::boolean().default_value(false))
        .field("ad_platform", FieldSpec::string())
        .field("card_fee", FieldSpec::number())
        .field("overseas_tax", FieldSpec::number())
        .field("business_tax", FieldSpec::number())
        .hooks(Arc::new(ExpenseHooks { workflow, config }))
}

pub struct FinanceModule {
    workflow: Arc<WorkflowEngine>,
    config: FinanceConfig,
}

impl FinanceModule {
    pub fn new(workflow: Arc<WorkflowEngine>, config: FinanceConfig) -> Self {
        Self { workflow, config }
    }
}

#[async_trait]
impl Module for FinanceModule {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        core.register_schema("revenues", revenues_schema(self.config.clone()));
        core.register_schema(
            "expenses",
            expenses_schema(self.workflow.clone(), self.config.clone()),
        );
        info!(module = "finance", "Finance module loaded");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        info!(module = "finance", "Finance module unloaded");
        Ok(())
    }
}
