//! Dialog for creating and editing marks

use eframe::egui;

use crate::core::dataset::DocumentEntry;
use crate::core::mark::Mark;
use crate::store::mark_list::MarkListStore;

/// Editable fields of a mark
#[derive(Debug, Clone, PartialEq)]
pub struct MarkForm {
    pub id: String,
    pub document: String,
    pub page: u32,
    pub label: String,
    pub note: String,
    /// Whether the form edits an existing mark rather than creating one
    pub existing: bool,
}

impl MarkForm {
    /// Blank form for a new mark on `document`
    pub fn blank(id: String, document: &str) -> Self {
        Self {
            id,
            document: document.to_string(),
            page: 1,
            label: String::new(),
            note: String::new(),
            existing: false,
        }
    }

    pub fn from_mark(mark: &Mark) -> Self {
        Self {
            id: mark.id.clone(),
            document: mark.location.document.clone(),
            page: mark.location.page,
            label: mark.display.label.clone(),
            note: mark.display.note.clone().unwrap_or_default(),
            existing: true,
        }
    }

    /// Build the mark, or explain what is missing
    pub fn to_mark(&self) -> Result<Mark, String> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err("Mark id is required".to_string());
        }
        if self.document.is_empty() {
            return Err("Choose a document".to_string());
        }
        if self.page == 0 {
            return Err("Pages start at 1".to_string());
        }

        let mut mark =
            Mark::new(id, self.document.as_str(), self.page).with_label(self.label.trim());
        let note = self.note.trim();
        if !note.is_empty() {
            mark = mark.with_note(note);
        }
        Ok(mark)
    }
}

/// First `mark-N` id not used by the store
pub fn next_mark_id(store: &MarkListStore) -> String {
    (store.marks().len() + 1..)
        .map(|n| format!("mark-{n}"))
        .find(|id| store.get(id).is_none())
        .unwrap_or_else(|| "mark".to_string())
}

/// Modal window shown while `MarkListStore::dialog_visible` is set
#[derive(Default)]
pub struct MarkDialog {
    form: Option<MarkForm>,
    error: Option<String>,
}

impl MarkDialog {
    /// Show the dialog. Returns the mark once it has been saved to `store`.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        store: &mut MarkListStore,
        documents: &[DocumentEntry],
    ) -> Option<Mark> {
        if !store.dialog_visible {
            self.form = None;
            self.error = None;
            return None;
        }

        let form = self.form.get_or_insert_with(|| match &store.editing {
            Some(mark) => MarkForm::from_mark(mark),
            None => MarkForm::blank(
                next_mark_id(store),
                documents.first().map_or("", |doc| doc.id.as_str()),
            ),
        });

        let mut saved = None;
        let mut cancelled = false;
        let title = if form.existing { "Edit Mark" } else { "New Mark" };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("mark_form").num_columns(2).show(ui, |ui| {
                    ui.label("Id:");
                    ui.add_enabled(!form.existing, egui::TextEdit::singleline(&mut form.id));
                    ui.end_row();

                    ui.label("Document:");
                    let selected = documents
                        .iter()
                        .find(|doc| doc.id == form.document)
                        .map_or(form.document.clone(), |doc| doc.display_name().to_string());
                    egui::ComboBox::from_id_salt("mark_document")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for doc in documents {
                                ui.selectable_value(
                                    &mut form.document,
                                    doc.id.clone(),
                                    doc.display_name(),
                                );
                            }
                        });
                    ui.end_row();

                    ui.label("Page:");
                    ui.add(egui::DragValue::new(&mut form.page).range(1..=u32::MAX));
                    ui.end_row();

                    ui.label("Label:");
                    ui.text_edit_singleline(&mut form.label);
                    ui.end_row();

                    ui.label("Note:");
                    ui.text_edit_multiline(&mut form.note);
                    ui.end_row();
                });

                if let Some(error) = &self.error {
                    ui.colored_label(egui::Color32::from_rgb(224, 108, 117), error);
                }

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                    if ui.button("Save").clicked() {
                        saved = Some(form.to_mark());
                    }
                });
            });

        if cancelled {
            store.close_dialog();
            return None;
        }

        let mark = match saved? {
            Ok(mark) => mark,
            Err(message) => {
                self.error = Some(message);
                return None;
            }
        };

        let existing = self.form.as_ref().is_some_and(|form| form.existing);
        let result = if existing {
            store.update_mark(mark.clone())
        } else {
            store.add_mark(mark.clone())
        };
        match result {
            Ok(()) => {
                tracing::info!("Saved mark {}", mark.id);
                store.close_dialog();
                self.form = None;
                self.error = None;
                Some(mark)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_roundtrips_existing_mark() {
        let mark = Mark::new("a", "2", 3).with_label("Scope").with_note("check");
        let form = MarkForm::from_mark(&mark);
        assert!(form.existing);
        assert_eq!(form.to_mark().unwrap(), mark);
    }

    #[test]
    fn test_form_validation() {
        let mut form = MarkForm::blank("  ".to_string(), "1");
        assert!(form.to_mark().is_err());

        form.id = "m".to_string();
        form.document.clear();
        assert!(form.to_mark().is_err());

        form.document = "1".to_string();
        form.page = 0;
        assert!(form.to_mark().is_err());

        form.page = 2;
        form.note = "   ".to_string();
        let mark = form.to_mark().unwrap();
        assert!(mark.display.note.is_none());
        assert_eq!(mark.location.page, 2);
    }

    #[test]
    fn test_next_mark_id_skips_taken_ids() {
        let mut store = MarkListStore::new(10);
        assert_eq!(next_mark_id(&store), "mark-1");

        store.add_mark(Mark::new("mark-2", "1", 1)).unwrap();
        assert_eq!(next_mark_id(&store), "mark-3");

        store.add_mark(Mark::new("x", "1", 1)).unwrap();
        store.add_mark(Mark::new("mark-3", "1", 1)).unwrap();
        assert_eq!(next_mark_id(&store), "mark-4");
    }
}
