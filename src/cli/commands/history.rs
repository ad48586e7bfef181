use console::style;

use crate::error::Result;
use crate::history::HistoryDb;

pub async fn execute(limit: usize) -> Result<()> {
    let db = HistoryDb::open()?;
    let records = db.list(limit)?;

    if records.is_empty() {
        println!("{}", style("No history yet.").dim());
        return Ok(());
    }

    println!("{}", style("History").bold().cyan());
    println!();
    for record in &records {
        println!(
            "  {}  {:<16} {}",
            style(record.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(&record.action).cyan(),
            style(record.details.to_string()).dim()
        );
    }

    Ok(())
}
