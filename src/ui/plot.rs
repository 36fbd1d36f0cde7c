use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    self, Align2, Color32, FontId, Pos2, ScrollArea, Sense, Shape, Stroke, Ui, Vec2,
};
use egui_extras::{Column, TableBuilder};
use egui_plot::{
    Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, PlotUi, Points, Text,
};

use crate::color::ColorMap;
use crate::dashboard::{Chart, ChartData, ChartKind, Marker, View};
use crate::data::pipeline::{AggregateTable, GroupedHistogram, Histogram};
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render the current view in the central panel.
pub fn chart_grid(ui: &mut Ui, state: &AppState) {
    let charts = match &state.view {
        View::Charts(charts) => charts,
        View::Idle => {
            let hint = if state.dataset.is_none() {
                "Open a file to view statistics  (File → Open…)"
            } else {
                "Select a report type and year"
            };
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(hint);
            });
            return;
        }
        View::Failed(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(format!("Could not build charts: {msg}"));
            });
            return;
        }
    };

    let color_map = state.color_map.as_ref();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, chart) in charts.iter().enumerate() {
                ui.push_id(idx, |ui: &mut Ui| {
                    ui.group(|ui: &mut Ui| {
                        ui.strong(&chart.title);
                        render_chart(ui, idx, chart, color_map);
                        if let ChartData::Aggregate(table) = &chart.data {
                            data_table(ui, table);
                        }
                    });
                });
                ui.add_space(8.0);
            }
        });
}

fn render_chart(ui: &mut Ui, idx: usize, chart: &Chart, color_map: Option<&ColorMap>) {
    match (&chart.data, chart.kind) {
        (ChartData::Aggregate(table), ChartKind::Pie) => pie_chart(ui, table, color_map),
        (ChartData::Aggregate(table), ChartKind::Bar) => bar_chart(ui, idx, chart, table, color_map),
        (ChartData::Aggregate(table), _) => line_chart(ui, idx, chart, table),
        (ChartData::Histogram(h), _) => histogram_chart(ui, idx, chart, h),
        (ChartData::GroupedHistogram(gh), _) => stacked_histogram_chart(ui, idx, chart, gh, color_map),
        (ChartData::Points(points), _) => scatter_chart(ui, idx, chart, points),
        (ChartData::Markers(markers), _) => map_chart(ui, idx, chart, markers),
    }
}

/// Show a plot with the chart's axis labels; `equal_aspect` keeps x and y
/// units the same size (map coordinates).
fn show_plot(
    ui: &mut Ui,
    idx: usize,
    chart: &Chart,
    equal_aspect: bool,
    add: impl FnOnce(&mut PlotUi),
) {
    let mut plot = Plot::new(("chart", idx))
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(chart.x_label.clone())
        .y_axis_label(chart.y_label.clone())
        .allow_scroll(false);
    if equal_aspect {
        plot = plot.data_aspect(1.0);
    }
    plot.show(ui, add);
}

// ---------------------------------------------------------------------------
// Aggregate charts
// ---------------------------------------------------------------------------

/// x position for each aggregate row: the key itself when it is a single
/// number (years, months), otherwise the row's position.
fn x_positions(table: &AggregateTable) -> Vec<f64> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| match row.key.as_slice() {
            [single] => single.as_f64().unwrap_or(i as f64),
            _ => i as f64,
        })
        .collect()
}

fn line_chart(ui: &mut Ui, idx: usize, chart: &Chart, table: &AggregateTable) {
    let points: PlotPoints = x_positions(table)
        .into_iter()
        .zip(&table.rows)
        .filter_map(|(x, row)| row.value.map(|y| [x, y]))
        .collect();

    show_plot(ui, idx, chart, false, |plot_ui| {
        plot_ui.line(
            Line::new(points)
                .name(&table.value_field)
                .color(Color32::LIGHT_BLUE)
                .width(1.5),
        );
    });
}

fn bar_chart(
    ui: &mut Ui,
    idx: usize,
    chart: &Chart,
    table: &AggregateTable,
    color_map: Option<&ColorMap>,
) {
    let bars: Vec<Bar> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let color = color_map
                .map(|cm| cm.color_for_key(&table.key_fields, &row.key))
                .unwrap_or(Color32::LIGHT_BLUE);
            Bar::new(i as f64, row.value.unwrap_or(0.0))
                .name(AggregateTable::key_label(row))
                .width(0.7)
                .fill(color)
        })
        .collect();

    show_plot(ui, idx, chart, false, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).name(&table.value_field));
        for (i, row) in table.rows.iter().enumerate() {
            plot_ui.text(
                Text::new(PlotPoint::new(i as f64, 0.0), AggregateTable::key_label(row))
                    .anchor(Align2::CENTER_TOP),
            );
        }
    });
}

/// Pie slices for the positive values, drawn as triangle fans with a
/// percentage legend to the right.
fn pie_chart(ui: &mut Ui, table: &AggregateTable, color_map: Option<&ColorMap>) {
    let slices: Vec<(String, f64, Color32)> = table
        .rows
        .iter()
        .filter_map(|row| {
            let v = row.value.filter(|v| *v > 0.0)?;
            let color = color_map
                .map(|cm| cm.color_for_key(&table.key_fields, &row.key))
                .unwrap_or(Color32::LIGHT_BLUE);
            Some((AggregateTable::key_label(row), v, color))
        })
        .collect();
    let total: f64 = slices.iter().map(|(_, v, _)| v).sum();

    let size = Vec2::new(ui.available_width(), PLOT_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    if total <= 0.0 {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "No data",
            FontId::proportional(14.0),
            ui.visuals().weak_text_color(),
        );
        return;
    }

    let radius = rect.height() * 0.45;
    let center = Pos2::new(rect.left() + radius + 12.0, rect.center().y);
    let text_color = ui.visuals().text_color();
    let mut angle = -FRAC_PI_2;

    for (i, (label, value, color)) in slices.iter().enumerate() {
        let share = (*value / total) as f32;
        let sweep = share * TAU;
        let steps = ((sweep / 0.05).ceil() as usize).max(1);
        let arc = |a: f32| center + radius * Vec2::angled(a);
        for s in 0..steps {
            let a0 = angle + sweep * s as f32 / steps as f32;
            let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![center, arc(a0), arc(a1)],
                *color,
                Stroke::NONE,
            ));
        }
        angle += sweep;

        let y = rect.top() + 16.0 + i as f32 * 18.0;
        let swatch = Pos2::new(center.x + radius + 24.0, y);
        painter.circle_filled(swatch, 5.0, *color);
        painter.text(
            swatch + Vec2::new(10.0, 0.0),
            Align2::LEFT_CENTER,
            format!("{label}: {:.1}%", share * 100.0),
            FontId::proportional(13.0),
            text_color,
        );
    }
}

// ---------------------------------------------------------------------------
// Histogram / scatter / map
// ---------------------------------------------------------------------------

fn histogram_chart(ui: &mut Ui, idx: usize, chart: &Chart, h: &Histogram) {
    let bars: Vec<Bar> = h
        .bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(b.end - b.start)
                .name(format!("{:.1} – {:.1}", b.start, b.end))
        })
        .collect();

    show_plot(ui, idx, chart, false, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name("Count"));
    });
}

/// One bar series per group, each stacked on the ones before it.
fn stacked_histogram_chart(
    ui: &mut Ui,
    idx: usize,
    chart: &Chart,
    gh: &GroupedHistogram,
    color_map: Option<&ColorMap>,
) {
    let mut series: Vec<BarChart> = Vec::with_capacity(gh.groups.len());
    for group in &gh.groups {
        let color = color_map
            .map(|cm| cm.color_for(&group.key))
            .unwrap_or(Color32::LIGHT_BLUE);
        let bars: Vec<Bar> = group
            .histogram
            .bins
            .iter()
            .map(|b| Bar::new((b.start + b.end) / 2.0, b.count as f64).width(b.end - b.start))
            .collect();
        let stacked = {
            let below: Vec<&BarChart> = series.iter().collect();
            BarChart::new(bars)
                .color(color)
                .name(group.key.to_string())
                .stack_on(&below)
        };
        series.push(stacked);
    }

    show_plot(ui, idx, chart, false, |plot_ui| {
        for bars in series {
            plot_ui.bar_chart(bars);
        }
    });
}

fn scatter_chart(ui: &mut Ui, idx: usize, chart: &Chart, points: &[[f64; 2]]) {
    let pts: PlotPoints = points.iter().copied().collect();
    show_plot(ui, idx, chart, false, |plot_ui| {
        plot_ui.points(Points::new(pts).radius(2.0).color(Color32::LIGHT_BLUE));
    });
}

/// Region markers on a longitude / latitude plane, sized by their value.
fn map_chart(ui: &mut Ui, idx: usize, chart: &Chart, markers: &[Marker]) {
    let max = markers
        .iter()
        .filter_map(|m| m.value)
        .fold(0.0_f64, f64::max);

    show_plot(ui, idx, chart, true, |plot_ui| {
        for m in markers {
            let radius = match (m.value, max > 0.0) {
                (Some(v), true) => 4.0 + 14.0 * (v / max).sqrt() as f32,
                _ => 4.0,
            };
            plot_ui.points(
                Points::new(PlotPoints::from(vec![[m.lon, m.lat]]))
                    .radius(radius)
                    .color(Color32::from_rgba_unmultiplied(30, 90, 220, 150))
                    .name(&m.label),
            );
            let caption = match m.value {
                Some(v) => format!("{} ({v:.0})", m.label),
                None => m.label.clone(),
            };
            plot_ui.text(
                Text::new(PlotPoint::new(m.lon, m.lat), caption).anchor(Align2::LEFT_BOTTOM),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Aggregate rows as a table
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, table: &AggregateTable) {
    egui::CollapsingHeader::new(format!("Data ({} rows)", table.len()))
        .id_salt("data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(Column::auto().at_least(80.0), table.key_fields.len() + 1)
                .header(20.0, |mut header| {
                    for name in &table.key_fields {
                        header.col(|ui| {
                            ui.strong(name);
                        });
                    }
                    header.col(|ui| {
                        ui.strong(format!("{:?}({})", table.reduction, table.value_field));
                    });
                })
                .body(|mut body| {
                    for row in &table.rows {
                        body.row(18.0, |mut cells| {
                            for v in &row.key {
                                cells.col(|ui| {
                                    ui.label(v.to_string());
                                });
                            }
                            cells.col(|ui| {
                                ui.label(row.value.map(|v| format!("{v:.2}")).unwrap_or_default());
                            });
                        });
                    }
                });
        });
}
