// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fra_app::{
    Caller, PanelCommand, PanelState, PriceBackend, PriceRecord, drive, format_date,
    format_optional_price,
};
use tracing::info;

/// Mounts a panel and runs its initial list request to completion.
pub fn load_snapshot<B: PriceBackend>(backend: &mut B, caller: Caller) -> Result<PanelState> {
    let mut state = PanelState::new(caller);
    drive(&mut state, backend, PanelCommand::Mount);
    if let Some(error) = state.error() {
        return Err(anyhow!("{error}"));
    }
    info!(records = state.records().len(), "snapshot loaded");
    Ok(state)
}

/// One authenticated list round trip; returns how many records are visible.
pub fn check<B: PriceBackend>(backend: &mut B, caller: Caller) -> Result<usize> {
    let state = load_snapshot(backend, caller)?;
    Ok(state.records().len())
}

pub fn render_listing(records: &[PriceRecord]) -> String {
    if records.is_empty() {
        return "no FRA base prices\n".to_owned();
    }

    let header = [
        "ID",
        "PROPERTY TYPE",
        "NON-INTRUSIVE",
        "INTRUSIVE",
        "CREATED",
        "UPDATED",
    ]
    .map(str::to_owned);
    let rows = records
        .iter()
        .map(|record| {
            [
                record.id.to_string(),
                record.property_type_label(),
                format_optional_price(record.non_intrusive_price.as_ref()),
                format_optional_price(record.intrusive_price.as_ref()),
                format_date(record.created_at),
                format_date(record.updated_at),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = header.clone().map(|cell| cell.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&rows) {
        let line = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(index, (cell, width))| {
                // Money columns read best right-aligned.
                if index == 2 || index == 3 {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
