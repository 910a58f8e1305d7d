//! File operations for grid snapshots and route files.
//!
//! Native builds use rfd dialogs on the tokio runtime; WASM builds go through
//! a temporary anchor (export) or file input (import) in the page.

use super::state::{FileOperationResult, GridApp, PendingFileOperation};
use crate::error::GridError;
use crate::planner::PlanningResponse;
use crate::types::GridSnapshot;
use eframe::egui;

const GRID_FILE_NAME: &str = "grid.json";

impl GridApp {
    /// Handles pending file operations for both native and WASM platforms.
    ///
    /// Completed operations are drained from the channel first, then a newly
    /// requested operation, if any, is started.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        let mut completed = Vec::new();
        if let Some(receiver) = &self.file.file_operation_receiver {
            while let Ok(result) = receiver.try_recv() {
                completed.push(result);
            }
        }
        for result in completed {
            self.apply_file_result(result);
        }

        let Some(operation) = self.file.pending_operation.take() else {
            return;
        };
        match operation {
            PendingFileOperation::ExportGrid => self.start_export(ctx),
            PendingFileOperation::ImportGrid | PendingFileOperation::LoadRoutes => {
                self.start_open(ctx, operation)
            }
        }
    }

    /// Applies the outcome of a finished file operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::ExportCompleted(path) => {
                log::info!("Grid exported to {}", path);
                self.status = Some(format!("Grid exported to {}", path));
            }
            FileOperationResult::GridLoaded(path, content) => {
                let result = GridSnapshot::from_json(&content)
                    .map_err(GridError::from)
                    .and_then(|snapshot| self.session.import_grid(&snapshot));
                if self.report(result).is_some() {
                    log::info!("Grid imported from {}", path);
                    self.interaction.tunnel_start = None;
                    self.interaction.edge_editor = None;
                    self.interaction.cell_editor = None;
                    self.interaction.pending_rows = self.session.grid().rows();
                    self.interaction.pending_cols = self.session.grid().cols();
                    self.reveal_grid();
                    self.status = Some(format!("Grid imported from {}", path));
                }
            }
            FileOperationResult::RoutesLoaded(path, content) => {
                let result = PlanningResponse::from_json(&content)
                    .and_then(|response| self.session.load_routes(response));
                if let Some(count) = self.report(result) {
                    self.status = Some(format!("Loaded {} routes from {}", count, path));
                }
            }
            FileOperationResult::OperationFailed(error) => {
                log::error!("File operation failed: {}", error);
                self.error = Some(error);
            }
        }
    }

    fn start_export(&mut self, ctx: &egui::Context) {
        let json = match self.session.export_grid().to_json() {
            Ok(json) => json,
            Err(err) => {
                self.error = Some(format!("Failed to serialize grid: {}", err));
                return;
            }
        };
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        #[cfg(target_arch = "wasm32")]
        {
            let result = match Self::trigger_download(GRID_FILE_NAME, &json) {
                Ok(()) => FileOperationResult::ExportCompleted(GRID_FILE_NAME.to_string()),
                Err(err) => FileOperationResult::OperationFailed(err),
            };
            if let Some(tx) = sender {
                let _ = tx.send(result);
            }
            ctx.request_repaint();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .set_file_name(GRID_FILE_NAME)
                    .save_file()
                    .await
                {
                    let path = handle.path();
                    let result = match std::fs::write(path, json) {
                        Ok(()) => FileOperationResult::ExportCompleted(path.display().to_string()),
                        Err(e) => {
                            FileOperationResult::OperationFailed(format!("Failed to save file: {}", e))
                        }
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(result);
                    }
                }
                ctx.request_repaint();
            });
        }
    }

    fn start_open(&mut self, ctx: &egui::Context, operation: PendingFileOperation) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        let loaded = move |path: String, content: String| match operation {
            PendingFileOperation::LoadRoutes => FileOperationResult::RoutesLoaded(path, content),
            PendingFileOperation::ImportGrid | PendingFileOperation::ExportGrid => {
                FileOperationResult::GridLoaded(path, content)
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                match Self::show_open_file_picker().await {
                    Some(file) => {
                        let filename = file.name();
                        let result = match Self::read_file(file).await {
                            Ok(content) => loaded(filename, content),
                            Err(err) => FileOperationResult::OperationFailed(err),
                        };
                        if let Some(tx) = sender {
                            let _ = tx.send(result);
                        }
                    }
                    None => log::debug!("Open dialog cancelled"),
                }
                ctx.request_repaint();
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                    .await
                {
                    let path = handle.path();
                    let result = match std::fs::read_to_string(path) {
                        Ok(json) => loaded(path.display().to_string(), json),
                        Err(e) => {
                            FileOperationResult::OperationFailed(format!("Failed to read file: {}", e))
                        }
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(result);
                    }
                }
                ctx.request_repaint();
            });
        }
    }

    /// Triggers a file download in the browser (WASM only).
    #[cfg(target_arch = "wasm32")]
    fn trigger_download(filename: &str, content: &str) -> Result<(), String> {
        use eframe::wasm_bindgen::{JsCast, JsValue};

        let window = web_sys::window().ok_or("No window found")?;
        let document = window.document().ok_or("No document found")?;

        let blob_parts = js_sys::Array::new();
        blob_parts.push(&JsValue::from_str(content));

        let blob_options = web_sys::BlobPropertyBag::new();
        blob_options.set_type("application/json");

        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "Failed to create blob")?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "Failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "Failed to cast to anchor element")?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        let body = document.body().ok_or("No body found")?;
        body.append_child(&anchor)
            .map_err(|_| "Failed to append anchor")?;
        anchor.click();
        body.remove_child(&anchor)
            .map_err(|_| "Failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;
        Ok(())
    }

    /// Opens a file picker in the browser and waits for a selection (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn show_open_file_picker() -> Option<web_sys::File> {
        use eframe::wasm_bindgen::closure::Closure;
        use eframe::wasm_bindgen::JsCast;

        let window = web_sys::window()?;
        let document = window.document()?;

        let input = document
            .create_element("input")
            .ok()?
            .dyn_into::<web_sys::HtmlInputElement>()
            .ok()?;
        input.set_type("file");
        input.set_accept(".json,application/json");
        input.style().set_property("display", "none").ok()?;

        let (sender, receiver) = futures::channel::oneshot::channel::<Option<web_sys::File>>();
        let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));

        let onchange = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let file = event
                .target()
                .and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(file);
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document.body()?.append_child(&input).ok()?;
        input.click();

        let file = receiver.await.ok()??;
        document.body()?.remove_child(&input).ok()?;
        Some(file)
    }

    /// Reads a browser file as text (WASM only).
    #[cfg(target_arch = "wasm32")]
    async fn read_file(file: web_sys::File) -> Result<String, String> {
        use eframe::wasm_bindgen::closure::Closure;
        use eframe::wasm_bindgen::{JsCast, JsValue};

        let file_reader =
            web_sys::FileReader::new().map_err(|_| "Failed to create FileReader".to_string())?;

        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            let reader = file_reader.clone();
            let onload = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                if let Ok(result) = reader.result() {
                    let _ = resolve.call1(&JsValue::NULL, &result);
                }
            }) as Box<dyn FnMut(_)>);
            file_reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();

            let onerror = Closure::wrap(Box::new(move |_event: web_sys::ProgressEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("Failed to read file"));
            }) as Box<dyn FnMut(_)>);
            file_reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onerror.forget();
        });

        file_reader
            .read_as_text(&file)
            .map_err(|_| "Failed to start reading file".to_string())?;

        let result = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(|e| format!("Failed to read file: {:?}", e))?;
        result
            .as_string()
            .ok_or_else(|| "File content is not a string".to_string())
    }

    /// Asks for a location and writes the current grid there.
    pub fn export_grid(&mut self) {
        self.file.pending_operation = Some(PendingFileOperation::ExportGrid);
    }

    /// Asks for a grid file and replaces the current grid with it.
    pub fn import_grid(&mut self) {
        self.file.pending_operation = Some(PendingFileOperation::ImportGrid);
    }

    /// Asks for a routes file and plays its routes on the current grid.
    pub fn load_routes(&mut self) {
        self.file.pending_operation = Some(PendingFileOperation::LoadRoutes);
    }
}
