use super::ui;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyCode;
use crate::core::rates::StoredRate;
use crate::store::open_rate_store;
use anyhow::Result;
use comfy_table::Cell;
use std::collections::{BTreeSet, HashMap};

/// Renders stored rates as a matrix, rows are `from` and columns are `to`.
pub fn rate_matrix_table(
    currencies: &[CurrencyCode],
    rates: &[(CurrencyCode, CurrencyCode, StoredRate)],
) -> String {
    let lookup: HashMap<(&CurrencyCode, &CurrencyCode), f64> = rates
        .iter()
        .map(|(from, to, stored)| ((from, to), stored.rate))
        .collect();

    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("From \\ To")];
    header.extend(currencies.iter().map(|c| ui::header_cell(c.as_str())));
    table.set_header(header);

    for from in currencies {
        let mut row = vec![ui::header_cell(from.as_str())];
        for to in currencies {
            if from == to {
                row.push(ui::identity_cell());
            } else {
                let rate = lookup.get(&(from, to)).copied();
                row.push(ui::format_optional_cell(rate, |r| format!("{r:.6}")));
            }
        }
        table.add_row(row);
    }

    table.to_string()
}

fn stored_currencies(rates: &[(CurrencyCode, CurrencyCode, StoredRate)]) -> Vec<CurrencyCode> {
    rates
        .iter()
        .flat_map(|(from, to, _)| [from.clone(), to.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Prints every rate in the store.
pub async fn run(config: &AppConfig) -> Result<()> {
    let store = open_rate_store(config)?;
    let rates = store.all_rates().await?;
    if rates.is_empty() {
        println!(
            "{}",
            ui::style_text("No rates stored yet, run `xrate sync` first", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let currencies = stored_currencies(&rates);
    println!("{}\n", ui::style_text("Exchange rates", ui::StyleType::Title));
    println!("{}", rate_matrix_table(&currencies, &rates));

    if let Some(latest) = rates.iter().map(|(_, _, s)| s.updated_at).max() {
        let updated = format!("Last updated {}", latest.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("{}", ui::style_text(&updated, ui::StyleType::Subtle));
    }
    Ok(())
}
