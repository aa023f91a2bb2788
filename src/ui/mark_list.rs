//! Mark list panel with version switching and paging

use eframe::egui;

use crate::app::MarkviewApp;
use crate::core::mark::Mark;

/// Action picked in the list during one frame
enum ListAction {
    Select(Mark),
    Edit(Mark),
    Delete(String),
}

/// Mark list panel
pub struct MarkListPanel;

impl MarkListPanel {
    /// Show the mark list panel
    pub fn show(ui: &mut egui::Ui, app: &mut MarkviewApp) {
        ui.vertical(|ui| {
            Self::show_header(ui, app);
            ui.separator();

            let mut action = None;
            egui::ScrollArea::vertical()
                .id_salt("mark_list_scroll")
                .show(ui, |ui| {
                    action = Self::show_marks(ui, app);
                    Self::show_footer(ui, app);
                });

            match action {
                Some(ListAction::Select(mark)) => {
                    app.session.selection.select(Some(mark));
                }
                Some(ListAction::Edit(mark)) => app.session.marks.open_dialog(Some(mark)),
                Some(ListAction::Delete(id)) => {
                    if app.session.selection.is_selected(&id) {
                        app.session.selection.select(None);
                    }
                    app.session.marks.remove_mark(&id);
                }
                None => {}
            }
        });
    }

    fn show_header(ui: &mut egui::Ui, app: &mut MarkviewApp) {
        ui.horizontal(|ui| {
            ui.heading("Marks");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("+").on_hover_text("New mark").clicked() {
                    app.session.marks.open_dialog(None);
                }
            });
        });

        ui.horizontal(|ui| {
            ui.label("Version");
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.version_input).desired_width(60.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Open").clicked() || submitted {
                let version = app.version_input.clone();
                app.switch_version(&version);
            }
        });

        if !app.config.viewer.recent_versions.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.weak("Recent:");
                let recent = app.config.viewer.recent_versions.clone();
                for version in recent {
                    let active = app.session.is_current(&version);
                    if ui.selectable_label(active, format!("v{version}")).clicked() {
                        app.version_input = version.clone();
                        app.switch_version(&version);
                    }
                }
            });
        }
    }

    fn show_marks(ui: &mut egui::Ui, app: &MarkviewApp) -> Option<ListAction> {
        let marks = app.session.marks.marks();
        if marks.is_empty() && !app.session.marks.loading() {
            ui.label(format!("No marks in v{}", app.session.version()));
            return None;
        }

        let scroll = app.list_focus.borrow_mut().take_scroll();
        let current = app.session.selection.current();
        let mut action = None;

        for mark in marks {
            let selected = current.as_ref().is_some_and(|c| c.id == mark.id);
            let text = format!(
                "{}  \u{00B7} {} p.{}",
                mark.title(),
                mark.location.document,
                mark.location.page
            );
            let response = ui.selectable_label(selected, text);

            if selected && scroll {
                response.scroll_to_me(Some(egui::Align::Center));
            }
            if response.clicked() {
                action = Some(ListAction::Select(mark.clone()));
            }
            response.context_menu(|ui| {
                if ui.button("Edit").clicked() {
                    action = Some(ListAction::Edit(mark.clone()));
                    ui.close();
                }
                if ui.button("Delete").clicked() {
                    action = Some(ListAction::Delete(mark.id.clone()));
                    ui.close();
                }
            });
        }

        action
    }

    fn show_footer(ui: &mut egui::Ui, app: &mut MarkviewApp) {
        ui.add_space(8.0);

        if app.session.marks.loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading marks...");
            });
            return;
        }

        if let Some(error) = app.session.marks.last_error() {
            let label = if error.is_retryable() { "Retry" } else { "Reload" };
            ui.colored_label(egui::Color32::from_rgb(224, 108, 117), error.to_string());
            if ui.button(label).clicked() {
                app.fetch_marks();
            }
            return;
        }

        if app.session.marks.has_more() && ui.button("Load more").clicked() {
            app.fetch_marks();
        }
    }
}
