//! Egui application drawing a formwork [`Form`].

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use eframe::egui;
use formwork::{
    ChangeSignal, ChoiceOption, Control, FieldPath, FileHandle, Form, FormError,
    InputType, PreviewEntry, RenderedField, Submission,
};
use thiserror::Error;

use crate::allocator::EguiPreviewAllocator;

/// Error type for the Egui backend.
#[derive(Debug, Error)]
pub enum EguiError {
    /// User cancelled the form (closed the window).
    #[error("Form cancelled by user")]
    Cancelled,

    /// An error occurred in the egui/eframe backend.
    #[error("Egui error: {0}")]
    EguiError(String),

    /// The form rejected an operation.
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Builder/configuration for the Egui backend.
#[derive(Debug, Clone)]
pub struct EguiForm {
    /// Window title.
    title: String,
    /// Window size [width, height].
    window_size: [f32; 2],
}

impl Default for EguiForm {
    fn default() -> Self {
        Self::new()
    }
}

impl EguiForm {
    /// Create a new Egui backend with default settings.
    pub fn new() -> Self {
        Self {
            title: "Form".to_string(),
            window_size: [520.0, 640.0],
        }
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window size.
    pub fn with_window_size(mut self, size: [f32; 2]) -> Self {
        self.window_size = size;
        self
    }

    /// Open a window for the form built by `make_form` and block until it
    /// is submitted or closed.
    ///
    /// The form is built inside the window so its previews can use the
    /// window's image cache.
    pub fn run<F>(&self, make_form: F) -> Result<Submission, EguiError>
    where
        F: FnOnce(EguiPreviewAllocator) -> Form<EguiPreviewAllocator>,
    {
        let outcome = Arc::new(Mutex::new(Outcome::default()));

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(self.title.clone())
                .with_inner_size(self.window_size)
                .with_drag_and_drop(true),
            ..Default::default()
        };

        let app_outcome = Arc::clone(&outcome);
        eframe::run_native(
            &self.title,
            options,
            Box::new(move |cc| {
                let form = make_form(EguiPreviewAllocator::new(cc.egui_ctx.clone()));
                Ok(Box::new(FormApp::new(form, app_outcome)) as Box<dyn eframe::App>)
            }),
        )
        .map_err(|e| EguiError::EguiError(e.to_string()))?;

        let mut outcome = outcome
            .lock()
            .map_err(|e| EguiError::EguiError(e.to_string()))?;
        outcome.submission.take().ok_or(EguiError::Cancelled)
    }
}

#[derive(Debug, Default)]
struct Outcome {
    submission: Option<Submission>,
}

/// Something the user did during one frame, applied after drawing.
#[derive(Debug, Clone)]
enum Action {
    Signal(FieldPath, ChangeSignal),
    RemoveFile(FieldPath, usize),
    AddEntry(FieldPath),
    RemoveEntry(FieldPath, usize),
}

/// The egui application that renders the form.
struct FormApp {
    form: Form<EguiPreviewAllocator>,
    outcome: Arc<Mutex<Outcome>>,
    /// Files dropped on the window, waiting to be attached to a file field.
    dropped: Vec<FileHandle>,
    /// File fields whose last selection was rejected.
    rejected: BTreeSet<FieldPath>,
    warnings: Rc<RefCell<Vec<String>>>,
}

impl FormApp {
    fn new(form: Form<EguiPreviewAllocator>, outcome: Arc<Mutex<Outcome>>) -> Self {
        Self {
            form,
            outcome,
            dropped: Vec::new(),
            rejected: BTreeSet::new(),
            warnings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Discard queued files when a picker newly reports a rejected selection.
    fn track_rejections(&mut self, fields: &[RenderedField]) {
        let mut rejected = BTreeSet::new();
        collect_rejected(fields, &mut rejected);
        if rejected.iter().any(|name| !self.rejected.contains(name)) {
            tracing::debug!(files = self.dropped.len(), "picker reset, dropping queued files");
            self.dropped.clear();
        }
        self.rejected = rejected;
    }

    fn apply(&mut self, action: Action) {
        let warnings = Rc::clone(&self.warnings);
        let notify = move |message: &str| warnings.borrow_mut().push(message.to_string());

        let result = match action {
            Action::Signal(name, signal) => {
                let attached = matches!(signal, ChangeSignal::Files(_));
                let result = self.form.handle(&name, signal);
                if attached && result.is_ok() {
                    self.dropped.clear();
                }
                result
            }
            Action::RemoveFile(name, index) => self.form.remove_file(&name, index).map(drop),
            Action::AddEntry(name) => self.form.add_entry(&name, &notify).map(drop),
            Action::RemoveEntry(name, index) => self.form.remove_entry(&name, index).map(drop),
        };
        if let Err(err) = result {
            tracing::error!(%err, "form action failed");
        }
    }

    fn collect_dropped(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            self.dropped = dropped.iter().map(file_from_drop).collect();
            tracing::debug!(files = self.dropped.len(), "files dropped");
        }
    }
}

/// Convert a dropped file into a handle, reading its contents from disk
/// when the platform only reports a path.
pub fn file_from_drop(file: &egui::DroppedFile) -> FileHandle {
    let name = file
        .path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.name.clone());
    let handle = FileHandle::new(name.as_str(), mime_for(&file.mime, &name));

    let bytes = file.bytes.clone().or_else(|| {
        let path = file.path.as_ref()?;
        match std::fs::read(path) {
            Ok(bytes) => Some(bytes.into()),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read dropped file");
                None
            }
        }
    });
    match bytes {
        Some(bytes) => handle.with_bytes(bytes),
        None => handle,
    }
}

fn mime_for(reported: &str, name: &str) -> String {
    if !reported.is_empty() {
        return reported.to_string();
    }
    let mime = match formwork::file_extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "",
    };
    mime.to_string()
}

fn collect_rejected(fields: &[RenderedField], out: &mut BTreeSet<FieldPath>) {
    for field in fields {
        match &field.control {
            Control::FilePicker {
                reset_picker: true, ..
            } => {
                out.insert(field.name.clone());
            }
            Control::Array { entries, .. } => {
                for entry in entries {
                    collect_rejected(entry, out);
                }
            }
            _ => {}
        }
    }
}

/// Format a label, marking required fields.
fn format_label(field: &RenderedField) -> String {
    let label = field.label.trim();
    if field.required {
        format!("{label} *")
    } else {
        label.to_string()
    }
}

fn option_label(option: &ChoiceOption) -> &str {
    option.display_label()
}

/// Draw one field and record what the user did with it.
fn draw_field(
    ui: &mut egui::Ui,
    field: &RenderedField,
    dropped: &[FileHandle],
    actions: &mut Vec<Action>,
) {
    let name = &field.name;
    let emit = |actions: &mut Vec<Action>, signal| {
        actions.push(Action::Signal(name.clone(), signal));
    };

    if !matches!(field.control, Control::Checkbox { .. }) {
        ui.label(format_label(field));
    }

    ui.add_enabled_ui(field.is_editable(), |ui| match &field.control {
        Control::TextInput { input_type, value } => {
            let mut text = value.clone();
            let mut edit = egui::TextEdit::singleline(&mut text)
                .desired_width(f32::INFINITY)
                .password(input_type.is_masked());
            if let Some(hint) = &field.placeholder {
                edit = edit.hint_text(hint.as_str());
            } else if *input_type == InputType::Date {
                edit = edit.hint_text("YYYY-MM-DD");
            }
            if ui.add(edit).changed() {
                emit(actions, ChangeSignal::Text(text));
            }
        }
        Control::TextArea { value } => {
            let mut text = value.clone();
            let edit = egui::TextEdit::multiline(&mut text)
                .desired_width(f32::INFINITY)
                .desired_rows(3);
            if ui.add(edit).changed() {
                emit(actions, ChangeSignal::Text(text));
            }
        }
        Control::Select { options, selected } => {
            let current = selected
                .and_then(|i| options.get(i))
                .map_or("", option_label);
            egui::ComboBox::from_id_salt(name.as_str())
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for (index, option) in options.iter().enumerate() {
                        let chosen = *selected == Some(index);
                        if ui.selectable_label(chosen, option_label(option)).clicked() && !chosen {
                            emit(actions, ChangeSignal::Selected(Some(index)));
                        }
                    }
                });
        }
        Control::MultiSelect { options, selected } => {
            let mut next = selected.clone();
            for (index, option) in options.iter().enumerate() {
                let mut checked = selected.contains(&index);
                if ui.checkbox(&mut checked, option_label(option)).changed() {
                    if checked {
                        next.push(index);
                    } else {
                        next.retain(|i| *i != index);
                    }
                }
            }
            if next != *selected {
                emit(actions, ChangeSignal::SelectedMany(next));
            }
        }
        Control::Checkbox { checked } => {
            let mut value = *checked;
            if ui.checkbox(&mut value, format_label(field)).changed() {
                emit(actions, ChangeSignal::Checked(value));
            }
        }
        Control::RadioGroup { options, selected } => {
            for (index, option) in options.iter().enumerate() {
                if ui.radio(*selected == Some(index), option_label(option)).clicked() {
                    emit(actions, ChangeSignal::Selected(Some(index)));
                }
            }
        }
        Control::FilePicker {
            accept,
            multiple,
            previews,
            ..
        } => {
            draw_previews(ui, name, previews, actions);
            if let Some(accept) = accept {
                ui.weak(format!("Accepted: {accept}"));
            }
            if dropped.is_empty() {
                ui.weak("Drop files on the window to attach them");
            } else {
                let files: Vec<FileHandle> = if *multiple {
                    dropped.to_vec()
                } else {
                    dropped.iter().take(1).cloned().collect()
                };
                if ui.button(format!("Attach {} dropped file(s)", files.len())).clicked() {
                    emit(actions, ChangeSignal::Files(files));
                }
            }
        }
        Control::Array { entries, can_add } => {
            ui.indent(name.as_str(), |ui| {
                for (index, entry) in entries.iter().enumerate() {
                    ui.group(|ui| {
                        for sub in entry {
                            draw_field(ui, sub, dropped, actions);
                        }
                        if ui.small_button("Remove").clicked() {
                            actions.push(Action::RemoveEntry(name.clone(), index));
                        }
                    });
                }
                let add = ui.button("Add");
                let add = if *can_add {
                    add
                } else {
                    add.on_hover_text("Fill in the required fields of the last entry first")
                };
                if add.clicked() {
                    actions.push(Action::AddEntry(name.clone()));
                }
            });
        }
    });

    // Show error if any
    if let Some(error) = &field.error {
        ui.colored_label(egui::Color32::RED, format!("⚠ {error}"));
    }

    ui.add_space(8.0);
}

fn draw_previews(
    ui: &mut egui::Ui,
    name: &FieldPath,
    previews: &[PreviewEntry],
    actions: &mut Vec<Action>,
) {
    for (index, preview) in previews.iter().enumerate() {
        ui.horizontal(|ui| {
            if preview.is_image {
                ui.add(
                    egui::Image::new(preview.url.as_str())
                        .max_height(48.0)
                        .max_width(48.0),
                );
            }
            if preview.is_existing {
                ui.hyperlink_to(preview.display_name.as_str(), preview.url.as_str());
            } else {
                ui.label(preview.display_name.as_str());
            }
            if ui.small_button("✖").on_hover_text("Remove").clicked() {
                actions.push(Action::RemoveFile(name.clone(), index));
            }
        });
    }
}

impl eframe::App for FormApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let fields = self.form.render();
        self.track_rejections(&fields);
        self.collect_dropped(ctx);
        let mut actions = Vec::new();
        let mut submit = false;
        let mut cancel = false;
        let mut reset = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let definition = self.form.definition();
            if let Some(title) = &definition.title {
                ui.heading(title.as_str());
            }
            if let Some(description) = &definition.description {
                ui.label(description.as_str());
            }
            if definition.title.is_some() || definition.description.is_some() {
                ui.separator();
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for field in &fields {
                    draw_field(ui, field, &self.dropped, &mut actions);
                }

                ui.separator();

                let warning = self.warnings.borrow().last().cloned();
                if let Some(warning) = warning {
                    ui.horizontal(|ui| {
                        ui.colored_label(egui::Color32::ORANGE, warning);
                        if ui.small_button("Dismiss").clicked() {
                            self.warnings.borrow_mut().clear();
                        }
                    });
                }

                ui.horizontal(|ui| {
                    submit = ui.button("Submit").clicked();
                    reset = ui.button("Reset").clicked();
                    cancel = ui.button("Cancel").clicked();

                    let errors = self.form.errors().len();
                    if errors > 0 {
                        ui.colored_label(
                            egui::Color32::RED,
                            format!("{errors} validation error(s)"),
                        );
                    }
                });
            });
        });

        for action in actions {
            self.apply(action);
        }

        if reset {
            self.form.reset();
            self.dropped.clear();
            self.warnings.borrow_mut().clear();
        }

        if submit {
            match self.form.submit() {
                Ok(submission) => {
                    if let Ok(mut outcome) = self.outcome.lock() {
                        outcome.submission = Some(submission);
                    }
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                Err(errors) => {
                    tracing::debug!(errors = errors.len(), "submit blocked");
                }
            }
        }

        if cancel {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}
