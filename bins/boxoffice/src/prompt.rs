//! Interactive entry of simulation settings.

use anyhow::{Context, bail};
use boxoffice_config::{ConfigError, Configuration, validate_positive_int, validate_rate};
use std::io::{BufRead, Write};

type Validator = fn(&'static str, i64) -> Result<u32, ConfigError>;

/// Reads one trimmed line. `None` at end of input.
pub fn read_line(input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line).context("failed to read from stdin")?;
    Ok((n > 0).then(|| line.trim().to_string()))
}

/// Asks until the answer passes `validate`.
fn ask(
    input: &mut impl BufRead,
    out: &mut impl Write,
    question: &str,
    field: &'static str,
    validate: Validator,
) -> anyhow::Result<i64> {
    loop {
        writeln!(out, "{question}")?;
        out.flush()?;
        let Some(answer) = read_line(input)? else {
            bail!("input closed while entering {field}");
        };
        match answer.parse::<i64>() {
            Ok(n) => match validate(field, n) {
                Ok(_) => return Ok(n),
                Err(ConfigError::InvalidConfig { reason, .. }) => {
                    writeln!(out, "Value {reason}. Please try again.")?;
                }
                Err(e) => return Err(e.into()),
            },
            Err(_) => writeln!(out, "Please enter a valid number.")?,
        }
    }
}

pub fn prompt_configuration(
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<Configuration> {
    let vendors = ask(
        input,
        out,
        "Enter the total number of vendors:",
        "vendor_count",
        validate_positive_int,
    )?;
    let customers = ask(
        input,
        out,
        "Enter the total number of customers:",
        "customer_count",
        validate_positive_int,
    )?;
    let total = ask(
        input,
        out,
        "Enter the total number of tickets available:",
        "total_tickets",
        validate_positive_int,
    )?;
    let release = ask(
        input,
        out,
        "Enter the ticket release rate (seconds between releases, 1-10):",
        "ticket_release_rate_secs",
        validate_rate,
    )?;
    let retrieval = ask(
        input,
        out,
        "Enter the customer retrieval rate (seconds between purchases, 1-10):",
        "customer_retrieval_rate_secs",
        validate_rate,
    )?;
    let capacity = ask(
        input,
        out,
        "Enter the maximum ticket capacity:",
        "max_ticket_capacity",
        validate_positive_int,
    )?;

    Ok(Configuration::new(total, capacity, release, retrieval, vendors, customers)?)
}

/// Anything but an explicit "no" keeps the loaded settings.
pub fn confirm_keep(input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<bool> {
    writeln!(out, "Do you want to continue with the above settings? (yes/no):")?;
    out.flush()?;
    let answer = read_line(input)?.unwrap_or_default();
    Ok(!answer.eq_ignore_ascii_case("no"))
}

pub fn display_configuration(out: &mut impl Write, cfg: &Configuration) -> std::io::Result<()> {
    writeln!(out, "\nLoaded Configuration Details:")?;
    writeln!(out, "-----------------------------------")?;
    writeln!(out, "Total Tickets: {}", cfg.total_tickets())?;
    writeln!(out, "Ticket Release Rate (s): {}", cfg.ticket_release_rate_secs())?;
    writeln!(out, "Customer Retrieval Rate (s): {}", cfg.customer_retrieval_rate_secs())?;
    writeln!(out, "Max Ticket Capacity: {}", cfg.max_ticket_capacity())?;
    writeln!(out, "Number of Vendors: {}", cfg.vendor_count())?;
    writeln!(out, "Number of Customers: {}", cfg.customer_count())?;
    writeln!(out, "-----------------------------------")
}
