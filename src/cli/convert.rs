use super::ui;
use crate::core::aggregator::{Conversion, ConversionSession};
use crate::core::comparison::{self, TargetComparison};
use crate::core::currency::format_currency;
use crate::core::request::{ConversionRequest, Source};
use crate::core::series::{AlignedRow, SeriesKey, build_aligned_rows, series_keys};
use crate::core::trend::latest_conversions;
use anyhow::Result;
use comfy_table::{Attribute, Cell};
use tracing::{debug, info};

/// Points shown in the sparkline column
const SPARKLINE_POINTS: usize = 30;

pub async fn run(
    session: &ConversionSession,
    request: &ConversionRequest,
    decimals: usize,
) -> Result<()> {
    let total = request.pairs().count() as u64;
    info!(pairs = total, "Converting...");

    let pb = ui::new_progress_bar(total);
    let result = session.submit(request, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let Some(conversion) = result? else {
        debug!("Conversion superseded by a newer request");
        return Ok(());
    };

    print!("{}", render(&conversion, decimals));
    Ok(())
}

/// Renders the whole conversion: latest rates, aligned history and, in
/// compare mode, the differences between the two sources.
pub fn render(conversion: &Conversion, decimals: usize) -> String {
    if conversion.is_empty() {
        return format!(
            "{}\n",
            ui::style_text(
                "No rate data available for the selected currencies.",
                ui::StyleType::Error
            )
        );
    }

    let sources = conversion.sources();
    let rows = build_aligned_rows(sources, &conversion.rates);
    let keys = series_keys(&conversion.rates);

    let mut out = String::new();
    out.push_str(&format!(
        "\n{}\n",
        ui::style_text(&title(sources), ui::StyleType::Title)
    ));
    out.push_str(&format!("{}\n", display_latest(conversion, decimals)));
    out.push_str(&format!(
        "\n{}\n",
        ui::style_text("History", ui::StyleType::Title)
    ));
    out.push_str(&format!("{}\n", display_history(&rows, &keys, sources, decimals)));

    if conversion.request.is_compare() {
        let summary = comparison::summarize(&rows, &conversion.request.targets);
        out.push_str(&format!(
            "\n{}\n",
            ui::style_text(
                &format!(
                    "Difference ({} - {})",
                    source_label(&sources[0]),
                    source_label(&sources[1])
                ),
                ui::StyleType::Title
            )
        ));
        out.push_str(&format!("{}\n", display_comparison(&summary, decimals)));
    }
    out
}

fn source_label(source: &Source) -> String {
    format!("{} {}", source.amount, source.currency)
}

fn title(sources: &[Source]) -> String {
    let labels: Vec<String> = sources.iter().map(source_label).collect();
    format!("{} Conversion Over Time", labels.join(" vs "))
}

fn display_latest(conversion: &Conversion, decimals: usize) -> String {
    let sources = conversion.sources();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Series"),
        ui::header_cell("Converted"),
        ui::header_cell("Rate"),
        ui::header_cell("Change"),
        ui::header_cell("Trend"),
    ]);

    for latest in latest_conversions(sources, &conversion.rates) {
        let history = conversion
            .series(latest.key.source_index, &latest.key.target)
            .map(|series| {
                let skip = series.points.len().saturating_sub(SPARKLINE_POINTS);
                let values: Vec<f64> = series.points[skip..].iter().map(|p| p.value).collect();
                ui::sparkline(&values)
            })
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(latest.key.label(sources)),
            Cell::new(format_currency(latest.converted, &latest.key.target, decimals))
                .add_attribute(Attribute::Bold),
            Cell::new(format!("{:.4}", latest.rate)),
            ui::trend_cell(latest.trend),
            Cell::new(history),
        ]);
    }
    table.to_string()
}

fn display_history(
    rows: &[AlignedRow],
    keys: &[SeriesKey],
    sources: &[Source],
    decimals: usize,
) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(keys.iter().map(|key| ui::header_cell(&key.label(sources))));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(&row.date)];
        cells.extend(keys.iter().map(|key| {
            ui::format_optional_cell(row.values.get(key).copied(), |v| {
                format_currency(v, &key.target, decimals)
            })
        }));
        table.add_row(cells);
    }
    table.to_string()
}

fn display_comparison(summary: &[TargetComparison], decimals: usize) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Target"),
        ui::header_cell("Comparable Dates"),
        ui::header_cell("Latest Difference"),
        ui::header_cell("Total Absolute Difference"),
    ]);

    for item in summary {
        let latest = match item.latest_difference {
            Some(diff) => ui::signed_cell(diff, format_currency(diff, &item.target, decimals)),
            None => ui::na_cell(),
        };
        table.add_row(vec![
            Cell::new(&item.target).add_attribute(Attribute::Bold),
            Cell::new(item.comparable_rows),
            latest,
            Cell::new(format_currency(
                item.total_absolute_difference,
                &item.target,
                decimals,
            )),
        ]);
    }
    table.to_string()
}
