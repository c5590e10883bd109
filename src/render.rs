//! Table rendering shared by carts, quotes and orders.

use std::{io, ops::Range};

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{cart::CartLineItem, pricing::TotalPriceError};

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error calculating line or cart totals.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Columns holding amounts in a line item table.
pub(crate) const LINE_ITEM_AMOUNTS: Range<usize> = 3..6;

pub(crate) fn push_line_item_header(builder: &mut Builder) {
    builder.push_record(["#", "Item", "Variant", "Unit price", "Qty", "Line total"]);
}

pub(crate) fn push_line_item_row(
    builder: &mut Builder,
    item: &CartLineItem,
) -> Result<(), RenderError> {
    let row = builder.count_records();

    builder.push_record([
        format!("#{row:<3}"),
        item.name().to_string(),
        item.variant().describe(),
        item.unit_price().to_string(),
        item.quantity().to_string(),
        item.line_total()?.to_string(),
    ]);

    Ok(())
}

pub(crate) fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    right_aligned: Range<usize>,
) -> Result<(), RenderError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')));

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(right_aligned), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| RenderError::IO)
}

/// Write right-aligned `label  value` lines under a table.
pub(crate) fn write_summary(
    out: &mut impl io::Write,
    lines: &[(&str, String)],
) -> Result<(), RenderError> {
    let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    for (label, value) in lines {
        writeln!(out, "{label:<label_width$} {value:>value_width$}").map_err(|_err| RenderError::IO)?;
    }

    writeln!(out).map_err(|_err| RenderError::IO)
}
