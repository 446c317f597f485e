use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::FILTER_COLUMNS;
use crate::render::save_figure;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.batches.is_empty() {
        ui.label("No records loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let unique = state.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-attribute filter widgets (collapsible) ----
            for col in FILTER_COLUMNS {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let n_selected = state.filters.get(col).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut checked =
                                state.filters.get(col).is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }

            // ---- Display options ----
            ui.separator();
            ui.strong("Options");
            let mut options = state.options.clone();
            ui.checkbox(&mut options.absorption, "Absorption");
            ui.checkbox(&mut options.stack_plot, "Stack plot");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Downsample (s)");
                ui.add(
                    egui::DragValue::new(&mut options.downsample_seconds)
                        .range(0.0..=3600.0)
                        .speed(1.0),
                );
            });
            if options != state.options {
                state.set_options(options);
            }

            // ---- Warnings from the last composition ----
            if !state.warnings.is_empty() {
                ui.separator();
                ui.strong(format!("Warnings ({})", state.warnings.len()));
                for w in &state.warnings {
                    ui.label(RichText::new(w.to_string()).color(Color32::YELLOW).small());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.figure.is_some(), egui::Button::new("Save as…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.batches.is_empty() {
            ui.label(format!(
                "{} batches loaded, {} visible",
                state.batches.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open riometer records")
        .add_filter("Supported files", &["json", "csv"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(batches) => state.set_batches(batches),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(figure) = &state.figure else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Save figure")
        .add_filter("PNG", &["png"])
        .add_filter("JPEG", &["jpg", "jpeg"])
        .set_file_name("figure.png")
        .save_file();

    if let Some(path) = file {
        let mut warnings = Vec::new();
        match save_figure(figure, &path, None, &mut warnings) {
            Ok(()) => {
                log::info!("Saved figure to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to save figure: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
