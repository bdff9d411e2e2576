use colored::Colorize;
use std::io::{self, Write};

use crate::budget::PricingTable;

pub fn write_models<W: Write>(out: &mut W, table: &PricingTable, filter: Option<&str>) -> io::Result<()> {
    let models = table.matching(filter);
    if models.is_empty() {
        writeln!(out, "No models match '{}'.", filter.unwrap_or_default())?;
        return Ok(());
    }

    writeln!(out, "{}", "Available models:".yellow())?;
    for price in models {
        writeln!(
            out,
            "- {} (${:.2} in / ${:.2} out per 1M tokens)",
            price.model, price.input_per_million, price.output_per_million
        )?;
    }
    Ok(())
}

pub fn run_models(filter: Option<String>) -> anyhow::Result<()> {
    write_models(&mut io::stdout(), &PricingTable::default(), filter.as_deref())?;
    Ok(())
}
