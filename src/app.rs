//! Main application state and UI coordination
//!
//! Everything here runs on the UI thread. Network work is spawned on a tokio
//! runtime and reports back through a channel drained at the start of each
//! frame, so a result is always checked against the session as it is *now*
//! before it is applied.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};
use eframe::egui;

use crate::core::config::AppConfig;
use crate::core::dataset::{DatasetClient, DocumentEntry};
use crate::core::event_bus::SubscriptionId;
use crate::core::resolver::{FilePaths, FileResolver, ResolveError, ResolvedFile};
use crate::core::transport::{HttpClient, TransportError};
use crate::store::mark_list::{FetchTicket, MarkPage};
use crate::store::pdf_info::PdfKey;
use crate::store::Session;
use crate::ui::{focus::FocusState, mark_dialog::MarkDialog, mark_list::MarkListPanel, viewer::ViewerPanel};

/// Result of background work, delivered to the UI thread
pub enum TaskResult {
    MarksLoaded {
        version: String,
        ticket: FetchTicket,
        result: Result<(Vec<DocumentEntry>, MarkPage), TransportError>,
    },
    FileResolved {
        key: PdfKey,
        result: Result<ResolvedFile, ResolveError>,
    },
}

/// Main application state
pub struct MarkviewApp {
    /// Application configuration
    pub config: AppConfig,
    /// Bus and stores for the running session
    pub session: Session,
    /// Version text field in the list panel
    pub version_input: String,
    /// Selection as seen by the list panel
    pub list_focus: Rc<RefCell<FocusState>>,
    /// Selection as seen by the viewer panel
    pub viewer_focus: Rc<RefCell<FocusState>>,
    dialog: MarkDialog,
    subscriptions: Vec<SubscriptionId>,
    runtime: tokio::runtime::Runtime,
    datasets: DatasetClient,
    resolver: Arc<FileResolver<HttpClient>>,
    tasks_tx: Sender<TaskResult>,
    tasks_rx: Receiver<TaskResult>,
    egui_ctx: egui::Context,
}

impl MarkviewApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });

        cc.egui_ctx.set_theme(config.ui.theme_preference());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let http = HttpClient::new(&config.server).context("Failed to create HTTP client")?;
        let paths = FilePaths::new(&config.server.web_prefix);
        let resolver = Arc::new(FileResolver::new(
            http.clone(),
            http.origin().clone(),
            paths.clone(),
        ));
        let datasets = DatasetClient::new(http, paths);

        let version = config.startup_version().to_string();
        let session = Session::new(&version, config.viewer.page_size);
        let (list_focus, list_sub) = FocusState::follow(&session.bus, "list");
        let (viewer_focus, viewer_sub) = FocusState::follow(&session.bus, "viewer");
        let (tasks_tx, tasks_rx) = mpsc::channel();

        tracing::info!("Serving from {} (dataset v{})", config.server.origin, version);

        let mut app = Self {
            config,
            session,
            version_input: version,
            list_focus,
            viewer_focus,
            dialog: MarkDialog::default(),
            subscriptions: vec![list_sub, viewer_sub],
            runtime,
            datasets,
            resolver,
            tasks_tx,
            tasks_rx,
            egui_ctx: cc.egui_ctx.clone(),
        };
        app.fetch_marks();
        Ok(app)
    }

    /// Start loading the next page of marks for the active version
    pub fn fetch_marks(&mut self) {
        let ticket = match self.session.marks.begin_fetch() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!("Not fetching marks: {}", e);
                return;
            }
        };

        let version = self.session.version().to_string();
        let pagination = self.session.marks.pagination();
        let datasets = self.datasets.clone();
        let tx = self.tasks_tx.clone();
        let ctx = self.egui_ctx.clone();

        self.runtime.spawn(async move {
            let result = datasets.fetch(&version).await.map(|dataset| {
                let page = MarkPage {
                    marks: dataset.marks_page(pagination.page, pagination.page_size),
                    total: dataset.total_marks(),
                };
                (dataset.documents, page)
            });
            // Receiver only goes away when the app shuts down
            let _ = tx.send(TaskResult::MarksLoaded {
                version,
                ticket,
                result,
            });
            ctx.request_repaint();
        });
    }

    /// Resolve the PDF behind `key` unless it is cached or pending. A failure
    /// is only resolved again after a new selection or an explicit retry.
    pub fn request_file(&mut self, key: PdfKey, reselected: bool) {
        if !self.session.begin_file(&key, reselected) {
            return;
        }

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tasks_tx.clone();
        let ctx = self.egui_ctx.clone();

        self.runtime.spawn(async move {
            let result = resolver.resolve(&key.version, &key.filename).await;
            let _ = tx.send(TaskResult::FileResolved { key, result });
            ctx.request_repaint();
        });
    }

    /// Navigate to another dataset version
    pub fn switch_version(&mut self, version: &str) {
        let version = version.trim();
        if version.is_empty() || self.session.is_current(version) {
            return;
        }

        self.session.switch_version(version);
        self.config.add_recent_version(version);
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {:#}", e);
        }
        self.fetch_marks();
    }

    /// Apply finished background work
    fn drain_tasks(&mut self) {
        while let Ok(task) = self.tasks_rx.try_recv() {
            match task {
                TaskResult::MarksLoaded {
                    version,
                    ticket,
                    result,
                } => {
                    if let Err(e) = self.session.apply_marks(&version, ticket, result) {
                        tracing::warn!("Dropping mark page: {}", e);
                    }
                }
                TaskResult::FileResolved { key, result } => {
                    self.session.apply_file(key, result);
                }
            }
        }
    }

    /// Make sure the document under the viewer's focus gets resolved
    fn resolve_focused_document(&mut self) {
        let (document, reselected) = {
            let mut focus = self.viewer_focus.borrow_mut();
            let reselected = focus.take_fresh();
            (focus.document().map(str::to_string), reselected)
        };
        if let Some(document) = document {
            let key = PdfKey::new(self.session.version(), document);
            self.request_file(key, reselected);
        }
    }
}

impl eframe::App for MarkviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_tasks();
        self.resolve_focused_document();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.session.selection.select(None);
        }

        egui::SidePanel::left("mark_list")
            .resizable(true)
            .default_width(self.config.ui.sidebar_width)
            .min_width(200.0)
            .show(ctx, |ui| {
                MarkListPanel::show(ui, self);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ViewerPanel::show(ui, self);
        });

        let session = &mut self.session;
        if let Some(mark) = self.dialog.show(ctx, &mut session.marks, &session.documents) {
            session.selection.select(Some(mark));
        }
    }
}

impl Drop for MarkviewApp {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.session.bus.unsubscribe(id);
        }
    }
}
