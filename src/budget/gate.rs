//! Advisory-then-blocking cost gate.
//!
//! The token report is always printed first; the caller only asks for
//! confirmation (and only sends) after a `Proceed` decision.

use colored::Colorize;
use std::io::{self, Write};
use tracing::warn;

use crate::budget::pricing::{exceeds_maximum, PricingTable};
use crate::budget::tokens::{TokenAccount, TokenCounter};
use crate::budget::format_thousands;
use crate::domain::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Proceed(TokenAccount),
    Cancelled { cost: f64, ceiling: f64 },
}

/// Decide on an already evaluated account. Unpriced models always proceed.
pub fn decide(account: TokenAccount, ceiling: f64) -> GateDecision {
    match account.cost {
        Some(cost) if exceeds_maximum(cost, ceiling) => GateDecision::Cancelled { cost, ceiling },
        _ => GateDecision::Proceed(account),
    }
}

pub struct BudgetGate {
    model: String,
    counter: TokenCounter,
    pricing: PricingTable,
    ceiling: f64,
}

impl BudgetGate {
    pub fn new(model: &str, counter: TokenCounter, pricing: PricingTable, ceiling: f64) -> Self {
        Self {
            model: model.to_string(),
            counter,
            pricing,
            ceiling,
        }
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Recount the whole conversation and price it.
    pub fn evaluate(&self, messages: &[Message]) -> TokenAccount {
        let mut account = self.counter.evaluate(messages);
        account.cost = self
            .pricing
            .cost(&self.model, account.input_tokens, account.output_tokens);
        account
    }

    /// Print the report for `messages` to `out`, then decide.
    pub fn check<W: Write>(&self, messages: &[Message], out: &mut W) -> io::Result<GateDecision> {
        let account = self.evaluate(messages);
        write_token_report(out, &account)?;

        if account.cost.is_none() {
            warn!("No pricing known for {}, cost ceiling not applied", self.model);
        }

        let decision = decide(account, self.ceiling);
        if let GateDecision::Cancelled { cost, ceiling } = decision {
            writeln!(
                out,
                "⚠️  WARNING: Estimated cost (${:.2}) exceeds the maximum allowed cost (${:.2}).",
                cost, ceiling
            )?;
        }
        Ok(decision)
    }
}

pub fn write_token_report<W: Write>(out: &mut W, account: &TokenAccount) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", " 🧮 TOKENS".yellow())?;
    let rows = [
        ("Content:", account.content_tokens),
        ("Images:", account.image_tokens),
        ("In:", account.input_tokens),
        ("Out:", account.output_tokens),
        ("Total:", account.total_tokens),
    ];
    for (label, value) in rows {
        writeln!(out, "    {:>8} {}", label, format_thousands(value as u64))?;
    }
    if let Some(cost) = account.cost {
        writeln!(out)?;
        writeln!(out, "{}", " 💰 COST ESTIMATE".yellow())?;
        writeln!(out, "    Cost: ${:.2}", cost)?;
    }
    writeln!(out)
}
