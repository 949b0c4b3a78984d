#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use eframe::egui;

use image_meta::config::Config;
use image_meta::metadata::normalize_keywords;
use image_meta::services::{DialogPicker, MemoryPreviews, PreviewId};
use image_meta::{Editor, MetadataField, SessionSnapshot, Status};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 640.0])
        .with_min_inner_size([640.0, 420.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "image-meta",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)?))),
    )
}

// ── Main application state ──────────────────────────────────────────

struct App {
    editor: Editor,
    previews: Arc<MemoryPreviews>,
    /// Preview currently held in the egui image cache.
    shown_preview: Option<PreviewId>,
    /// Keyword text as typed; re-derived when the session's keywords change underneath it.
    keywords_text: String,
    keywords_seen: Vec<String>,
    /// Tokio runtime for editor commands.
    rt: tokio::runtime::Runtime,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let config = Config::load(None).unwrap_or_default();
        let previews = Arc::new(MemoryPreviews::new());
        let editor = Editor::builder()
            .config(&config)
            .picker(Arc::new(DialogPicker))
            .previews(previews.clone())
            .build();

        let app = Self {
            editor,
            previews,
            shown_preview: None,
            keywords_text: String::new(),
            keywords_seen: Vec::new(),
            rt: tokio::runtime::Runtime::new()?,
        };

        let editor = app.editor.clone();
        let ctx = cc.egui_ctx.clone();
        app.rt.spawn(async move {
            editor.initialize().await;
            ctx.request_repaint();
        });

        Ok(app)
    }

    fn open_image(&self, ctx: &egui::Context) {
        let editor = self.editor.clone();
        let ctx = ctx.clone();
        self.rt.spawn(async move {
            editor.open_image().await;
            ctx.request_repaint();
        });
    }

    fn save_metadata(&self, ctx: &egui::Context) {
        let editor = self.editor.clone();
        let ctx = ctx.clone();
        self.rt.spawn(async move {
            editor.save_metadata().await;
            ctx.request_repaint();
        });
    }

    /// Drop the previous preview from the image cache once the session moved on.
    fn sync_preview(&mut self, ctx: &egui::Context, current: Option<PreviewId>) {
        if self.shown_preview == current {
            return;
        }
        if let Some(old) = self.shown_preview {
            ctx.forget_image(&old.uri());
        }
        self.shown_preview = current;
    }

    fn sync_keywords(&mut self, session: &SessionSnapshot) {
        if session.metadata.keywords != self.keywords_seen {
            self.keywords_text = session.keywords_text();
            self.keywords_seen = session.metadata.keywords.clone();
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let session = self.editor.snapshot();
        self.sync_preview(ctx, session.image_preview);
        self.sync_keywords(&session);

        // Request repaint while a command is in flight so we pick up its outcome
        if session.status.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ─────────────────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("image-meta");
                ui.separator();

                if ui
                    .add_enabled(session.status.can_open(), egui::Button::new("📂 Open Image"))
                    .clicked()
                {
                    self.open_image(ctx);
                }
                if ui
                    .add_enabled(session.status.can_save(), egui::Button::new("💾 Save Metadata"))
                    .clicked()
                {
                    self.save_metadata(ctx);
                }
            });
        });

        // ── Status bar ──────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if session.status.is_busy() {
                    ui.spinner();
                }
                let text = egui::RichText::new(session.status_message());
                let text = match session.status {
                    Status::Error => text.color(egui::Color32::RED),
                    Status::Success => text.color(egui::Color32::GREEN),
                    _ => text,
                };
                ui.label(text);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let info = &session.platform_info;
                    if !info.os.is_empty() {
                        ui.label(
                            egui::RichText::new(format!("{} {} ({})", info.os, info.arch, info.family))
                                .color(egui::Color32::GRAY),
                        );
                    }
                });
            });
            ui.add_space(4.0);
        });

        // ── Left panel: preview ─────────────────────────────────────
        egui::SidePanel::left("preview")
            .default_width(360.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                let bytes = session.image_preview.and_then(|id| self.previews.bytes(id).map(|b| (id, b)));
                match bytes {
                    Some((id, bytes)) => {
                        ui.add(
                            egui::Image::from_bytes(id.uri(), bytes)
                                .max_width(ui.available_width())
                                .max_height(400.0),
                        );
                    }
                    None => {
                        ui.centered_and_justified(|ui| {
                            ui.label(
                                egui::RichText::new("Open an image to edit its metadata")
                                    .size(16.0)
                                    .color(egui::Color32::GRAY),
                            );
                        });
                    }
                }
                if let Some(ref path) = session.image_path {
                    ui.add_space(8.0);
                    ui.label(format!("Path: {}", path.display()));
                }
            });

        // ── Central panel: metadata form ────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Metadata");
            ui.add_space(8.0);

            egui::Grid::new("metadata_form")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    for field in MetadataField::ALL {
                        ui.label(field_label(field));
                        let mut value = session.metadata.field(field).to_string();
                        let response = if field == MetadataField::Description {
                            ui.text_edit_multiline(&mut value)
                        } else {
                            ui.text_edit_singleline(&mut value)
                        };
                        if response.changed() {
                            self.editor.edit_field(field, value);
                        }
                        ui.end_row();
                    }

                    ui.label("Keywords");
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.keywords_text)
                            .hint_text("comma, separated, keywords"),
                    );
                    if response.changed() {
                        self.editor.edit_keywords(&self.keywords_text);
                        self.keywords_seen = normalize_keywords(&self.keywords_text);
                    }
                    ui.end_row();

                    ui.label("Date taken");
                    ui.label(
                        egui::RichText::new(session.metadata.date_taken.as_deref().unwrap_or("unknown"))
                            .color(egui::Color32::GRAY),
                    );
                    ui.end_row();
                });
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.editor.teardown();
    }
}

fn field_label(field: MetadataField) -> &'static str {
    match field {
        MetadataField::Title => "Title",
        MetadataField::Description => "Description",
        MetadataField::Author => "Author",
        MetadataField::Copyright => "Copyright",
    }
}
