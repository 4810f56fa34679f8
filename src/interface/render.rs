use std::io::Write;

use serde::Serialize;

use crate::error::{PlanError, Result};
use crate::models::{Dish, ErrorResponse, Macro};
use crate::service::Exploration;

/// Print `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_error<W: Write>(out: &mut W, err: &PlanError) -> Result<()> {
    let body: ErrorResponse = err.to_response();
    write_json(out, &body)
}

/// Response of the `sections` command.
#[derive(Debug, Serialize)]
pub struct SectionsResponse<'a> {
    pub sections: &'a [String],
}

/// One CSV row per feasible plate, best first.
pub fn write_feasible_csv<W: Write>(out: W, exploration: &Exploration) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["rank".to_string(), "score".to_string(), "items".to_string()];
    header.extend(Macro::ALL.iter().map(|m| m.label().to_lowercase()));
    writer.write_record(&header)?;

    for (rank, scored) in exploration.enumeration.plates.iter().enumerate() {
        let items = scored
            .plate
            .items()
            .iter()
            .map(|item| describe(&exploration.candidates[item.dish], item.serving.multiplier()))
            .collect::<Vec<_>>()
            .join(" + ");

        let mut row = vec![(rank + 1).to_string(), format!("{:.2}", scored.score), items];
        row.extend(Macro::ALL.iter().map(|&m| format!("{}", scored.totals.get(m))));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn describe(dish: &Dish, servings: f64) -> String {
    format!("{} x{} ({})", dish.name, servings, dish.serving_size)
}
