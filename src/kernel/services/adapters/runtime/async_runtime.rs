use crate::kernel::error::SessionError;
use crate::kernel::pipeline;
use crate::kernel::services::bus::KernelBusSender;
use crate::kernel::services::ports::{ContentStore, VcsProvider};
use crate::kernel::vcs::VcsSnapshot;
use crate::kernel::{Action, Effect, Locator};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Executes I/O effects on a tokio pool and reports each completion back over
/// the kernel bus as an [`Action`].
pub struct AsyncRuntime {
    runtime: tokio::runtime::Runtime,
    content: Arc<dyn ContentStore>,
    vcs: Arc<dyn VcsProvider>,
    bus: KernelBusSender,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter when a task finishes, however it finishes.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AsyncRuntime {
    pub fn new(
        content: Arc<dyn ContentStore>,
        vcs: Arc<dyn VcsProvider>,
        bus: KernelBusSender,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self {
            runtime,
            content,
            vcs,
            bus,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Tasks started and not yet finished. A finished task has already put its
    /// completion on the bus.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs `work` on the blocking pool and sends its action, if any.
    fn spawn_blocking<F>(&self, work: F)
    where
        F: FnOnce(&dyn ContentStore, &dyn VcsProvider) -> Option<Action> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(Arc::clone(&self.in_flight));
        let content = Arc::clone(&self.content);
        let vcs = Arc::clone(&self.vcs);
        let bus = self.bus.clone();
        self.runtime.spawn(async move {
            let _guard = guard;
            let result =
                tokio::task::spawn_blocking(move || work(content.as_ref(), vcs.as_ref())).await;
            match result {
                Ok(Some(action)) => {
                    let _ = bus.send_action(action);
                }
                Ok(None) => {}
                Err(e) => tracing::error!(target: "io", error = %e, "background task failed"),
            }
        });
    }

    pub fn execute(&self, effect: Effect) {
        match effect {
            Effect::ReadForOpen { request, locator } => self.spawn_blocking(move |content, _| {
                let outcome = pipeline::read_for_open(content, &locator);
                Some(Action::OpenRead {
                    request,
                    locator,
                    outcome,
                })
            }),
            Effect::ReadForPreview { locator } => self.spawn_blocking(move |content, _| {
                let result = pipeline::read_text(content, &locator);
                Some(Action::PreviewRead { locator, result })
            }),
            Effect::WriteContent {
                locator,
                versions,
                bytes,
            } => self.spawn_blocking(move |content, _| {
                let result = pipeline::write_back(content, &locator, &bytes);
                Some(Action::Saved {
                    locator,
                    versions,
                    result,
                })
            }),
            Effect::ReloadContent {
                tab,
                token,
                locator,
                encoding,
                external,
            } => self.spawn_blocking(move |content, _| {
                let result = if external {
                    pipeline::read_text(content, &locator)
                } else {
                    pipeline::read_with_encoding(content, &locator, encoding)
                };
                if token.is_cancelled() {
                    tracing::debug!(target: "io", %locator, "tab closed before reload finished");
                    return None;
                }
                Some(Action::Reloaded {
                    tab,
                    encoding,
                    external,
                    result,
                })
            }),
            Effect::FetchPrevious { locator } => self.fetch_previous(locator),
            Effect::ReadPair { original, modified } => self.read_pair(original, modified),
            Effect::RenamePath { from, to } => self.spawn_blocking(move |content, _| {
                let result = content
                    .rename(&from, &to)
                    .map_err(|e| SessionError::from_content(&from, &e));
                Some(Action::PathRenamed { from, to, result })
            }),
            Effect::DuplicatePath { from } => self.spawn_blocking(move |content, _| {
                let result = match pipeline::free_duplicate_target(content, &from) {
                    Some(to) => content
                        .copy(&from, &to)
                        .map(|()| to)
                        .map_err(|e| SessionError::from_content(&from, &e)),
                    None => Err(SessionError::ContentUnavailable {
                        locator: from.clone(),
                        message: format!("{} cannot be duplicated", from.display_name()),
                    }),
                };
                Some(Action::PathDuplicated { from, result })
            }),
            Effect::RemovePath { locator } => self.spawn_blocking(move |content, _| {
                let result = content
                    .remove(&locator)
                    .map_err(|e| SessionError::from_content(&locator, &e));
                Some(Action::PathDeleted { locator, result })
            }),
            Effect::CreateFolder { parent } => self.spawn_blocking(move |content, _| {
                let target = pipeline::free_folder_target(content, &parent);
                let result = content
                    .create_directory(&target, true)
                    .map(|()| target.clone())
                    .map_err(|e| SessionError::from_content(&target, &e));
                Some(Action::FolderCreated { parent, result })
            }),
            Effect::RequestDownload { locator } => self.spawn_blocking(move |content, _| {
                let result =
                    content
                        .request_download(&locator)
                        .map_err(|e| SessionError::DownloadFailed {
                            locator: locator.clone(),
                            message: e.to_string(),
                        });
                Some(Action::DownloadRequested { locator, result })
            }),
            Effect::LoadRepository { root } => self.spawn_blocking(move |_, vcs| {
                let result = vcs
                    .load_directory(&root)
                    .map_err(|e| SessionError::from_vcs(&e));
                Some(Action::WorkspaceLoaded { root, result })
            }),
            Effect::RefreshVcs { seq } => self.spawn_blocking(move |_, vcs| {
                let result = poll_vcs(vcs);
                Some(Action::VcsRefreshed { seq, result })
            }),
            Effect::CheckExistence { locators } => self.spawn_blocking(move |content, _| {
                let missing = locators
                    .into_iter()
                    .filter(|locator| !content.exists(locator))
                    .collect();
                Some(Action::ExistenceChecked { missing })
            }),
            Effect::WatchWorkspace { .. } | Effect::Model(_) | Effect::Notify(_) => {
                tracing::debug!(target: "session", "local effect reached the runtime");
            }
        }
    }

    fn fetch_previous(&self, locator: Locator) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(Arc::clone(&self.in_flight));
        let content = Arc::clone(&self.content);
        let vcs = Arc::clone(&self.vcs);
        let bus = self.bus.clone();
        self.runtime.spawn(async move {
            let _guard = guard;
            let previous_locator = locator.clone();
            let current_locator = locator.clone();
            let (previous, current) = tokio::join!(
                tokio::task::spawn_blocking(move || {
                    vcs.previous_content(&previous_locator)
                        .map_err(|e| SessionError::from_vcs(&e))
                }),
                tokio::task::spawn_blocking(move || {
                    pipeline::read_text(content.as_ref(), &current_locator)
                }),
            );
            let result = join_pair(previous, current);
            let _ = bus.send_action(Action::DiffRead {
                compare_target: locator.previous_version(),
                locator,
                result,
            });
        });
    }

    fn read_pair(&self, original: Locator, modified: Locator) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(Arc::clone(&self.in_flight));
        let left_store = Arc::clone(&self.content);
        let right_store = Arc::clone(&self.content);
        let bus = self.bus.clone();
        self.runtime.spawn(async move {
            let _guard = guard;
            let left = original.clone();
            let right = modified.clone();
            let (original_text, modified_text) = tokio::join!(
                tokio::task::spawn_blocking(move || pipeline::read_text(left_store.as_ref(), &left)),
                tokio::task::spawn_blocking(move || {
                    pipeline::read_text(right_store.as_ref(), &right)
                }),
            );
            let result = join_pair(original_text, modified_text);
            let _ = bus.send_action(Action::DiffRead {
                locator: modified,
                compare_target: original,
                result,
            });
        });
    }
}

fn join_pair(
    first: Result<Result<String, SessionError>, tokio::task::JoinError>,
    second: Result<Result<String, SessionError>, tokio::task::JoinError>,
) -> Result<(String, String), SessionError> {
    let flatten = |joined: Result<Result<String, SessionError>, tokio::task::JoinError>| {
        joined.unwrap_or_else(|e| {
            Err(SessionError::Vcs {
                message: e.to_string(),
            })
        })
    };
    Ok((flatten(first)?, flatten(second)?))
}

fn poll_vcs(vcs: &dyn VcsProvider) -> Result<VcsSnapshot, SessionError> {
    let status = vcs.status().map_err(|e| SessionError::from_vcs(&e))?;
    let has_remote = vcs.has_remote();
    let ahead_behind = if has_remote {
        vcs.ahead_behind().ok()
    } else {
        None
    };
    Ok(VcsSnapshot {
        status,
        ahead_behind,
        has_remote,
    })
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/async_runtime.rs"]
mod tests;
