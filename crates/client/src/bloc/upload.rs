use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use courier_core::http::GENERIC_ERROR_MESSAGE;
use courier_core::state::ViewState;
use courier_core::{ApiResponse, Progress};
use serde::Serialize;

use super::{Bloc, BlocHandler, Emitter};
use crate::api::{FileUploadApi, UploadedFile};
use crate::progress::{progress_channel, ProgressStream};

pub type UploadBloc = Bloc<UploadHandler>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    UploadAvatar(PathBuf),
    UploadDocument(PathBuf),
    UploadFiles(Vec<PathBuf>),
    Download { url: String, destination: PathBuf },
}

/// What a finished transfer produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transfer {
    Uploaded { files: Vec<UploadedFile> },
    Downloaded { path: String },
}

pub struct UploadHandler {
    files: FileUploadApi,
}

impl UploadHandler {
    pub fn new(files: FileUploadApi) -> Self {
        Self { files }
    }

    pub fn spawn(files: FileUploadApi) -> UploadBloc {
        Bloc::new(Self::new(files), ViewState::Initial)
    }
}

#[async_trait]
impl BlocHandler for UploadHandler {
    type Event = UploadEvent;
    type State = ViewState<Transfer>;

    async fn handle(&self, event: UploadEvent, emit: &Emitter<ViewState<Transfer>>) {
        emit.emit(ViewState::Loading);
        let (sink, ticks) = progress_channel();

        let (response, message) = match event {
            UploadEvent::UploadAvatar(path) => {
                let response = track(emit, ticks, self.files.upload_avatar(&path, Some(sink))).await;
                (uploaded_one(response), "Avatar uploaded")
            }
            UploadEvent::UploadDocument(path) => {
                let response =
                    track(emit, ticks, self.files.upload_document(&path, Some(sink))).await;
                (uploaded_one(response), "Document uploaded")
            }
            UploadEvent::UploadFiles(paths) => {
                let response = track(emit, ticks, self.files.upload_files(paths, Some(sink))).await;
                (
                    response.map(|files| Transfer::Uploaded { files }),
                    "Files uploaded",
                )
            }
            UploadEvent::Download { url, destination } => {
                let response = track(
                    emit,
                    ticks,
                    self.files.download_file(&url, &destination, Some(sink)),
                )
                .await;
                (
                    response.map(|path| Transfer::Downloaded { path }),
                    "Download complete",
                )
            }
        };

        if !response.is_success() {
            return emit.emit(ViewState::error(
                response.message_or(GENERIC_ERROR_MESSAGE),
            ));
        }
        let data = response
            .into_data()
            .unwrap_or(Transfer::Uploaded { files: Vec::new() });
        emit.emit(ViewState::Success {
            data,
            message: Some(message.to_string()),
        });
    }
}

fn uploaded_one(response: ApiResponse<UploadedFile>) -> ApiResponse<Transfer> {
    response.map(|file| Transfer::Uploaded { files: vec![file] })
}

/// Drive `operation` while forwarding its progress ticks as ratios.
///
/// Ticks still queued when the operation finishes are emitted before
/// returning, so progress always precedes the terminal state.
async fn track<F, T>(emit: &Emitter<ViewState<Transfer>>, mut ticks: ProgressStream, operation: F) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(operation);
    let result = loop {
        tokio::select! {
            result = &mut operation => break result,
            Some(tick) = ticks.recv() => forward(emit, tick),
        }
    };
    while let Some(tick) = ticks.try_recv() {
        forward(emit, tick);
    }
    result
}

fn forward(emit: &Emitter<ViewState<Transfer>>, tick: Progress) {
    if let Some(ratio) = tick.ratio() {
        emit.emit(ViewState::progress(ratio));
    }
}
