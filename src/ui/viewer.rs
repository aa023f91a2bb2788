//! Viewer panel for the document of the selected mark

use eframe::egui;

use crate::app::MarkviewApp;
use crate::core::mark::Mark;
use crate::store::pdf_info::PdfKey;

/// Viewer panel
pub struct ViewerPanel;

impl ViewerPanel {
    /// Show the viewer panel
    pub fn show(ui: &mut egui::Ui, app: &mut MarkviewApp) {
        // Copy out of the focus state so no borrow is held while selecting
        let (focused, scroll) = {
            let mut focus = app.viewer_focus.borrow_mut();
            let scroll = focus.take_scroll();
            (focus.focused.clone(), scroll)
        };

        let Some(focused) = focused else {
            Self::show_empty(ui);
            return;
        };

        let document = focused.location.document.clone();
        let title = app
            .session
            .document(&document)
            .map_or(document.clone(), |doc| doc.display_name().to_string());

        let key = PdfKey::new(app.session.version(), document.clone());

        ui.vertical(|ui| {
            ui.heading(title);
            Self::show_file(ui, app, key);
            ui.separator();

            let mut clicked = None;
            egui::ScrollArea::vertical()
                .id_salt("viewer_scroll")
                .show(ui, |ui| {
                    let marks = app
                        .session
                        .marks
                        .marks()
                        .iter()
                        .filter(|mark| mark.location.document == document);
                    let focus = app.viewer_focus.borrow();
                    for mark in marks {
                        let is_focused = focus.is_focused(&mark.id);
                        let response = Self::show_mark(ui, mark, is_focused);
                        if is_focused && scroll {
                            response.scroll_to_me(Some(egui::Align::Center));
                        }
                        if response.clicked() {
                            clicked = Some(mark.clone());
                        }
                    }
                });

            if let Some(mark) = clicked {
                app.session.selection.select(Some(mark));
            }
        });
    }

    /// Show where the PDF can be opened from, or why it cannot
    fn show_file(ui: &mut egui::Ui, app: &mut MarkviewApp, key: PdfKey) {
        if let Some(file) = app.session.pdfs.get(&key) {
            let url = file.url.to_string();
            ui.horizontal(|ui| {
                ui.monospace(&url);
                if ui.button("Open").on_hover_text("Open in browser").clicked() {
                    if let Err(e) = open::that(&url) {
                        tracing::error!("Failed to open {}: {}", url, e);
                    }
                }
            });
            return;
        }

        if let Some(error) = app.session.file_error(&key) {
            let mut retry = false;
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(224, 108, 117), error.user_message());
                if error.is_retryable() {
                    retry = ui.button("Retry").clicked();
                }
            });
            ui.weak(error.to_string());
            if retry {
                app.session.retry_file(&key);
            }
            return;
        }

        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Locating v{}/{}.pdf...", key.version, key.filename));
        });
    }

    fn show_mark(ui: &mut egui::Ui, mark: &Mark, focused: bool) -> egui::Response {
        let frame = egui::Frame::group(ui.style()).fill(if focused {
            ui.visuals().selection.bg_fill
        } else {
            ui.visuals().faint_bg_color
        });

        frame
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(egui::RichText::new(format!("Page {}", mark.location.page)).small());
                ui.strong(mark.title());
                if let Some(note) = &mark.display.note {
                    ui.label(note);
                }
            })
            .response
            .interact(egui::Sense::click())
    }

    /// Show empty state
    fn show_empty(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label("No mark selected");
            ui.label("Pick a mark from the list to open its document");
        });
    }
}
