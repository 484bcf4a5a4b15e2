//! Control-thread driver.
//!
//! [`EditorSession`] owns the store, the async runtime and the text model host.
//! UI intents go in through its methods; background completions come back over
//! the kernel bus and are applied when the caller pumps.

use crate::kernel::editor::{OpenKind, TabId};
use crate::kernel::services::adapters::{AsyncRuntime, WorkspaceWatcher};
use crate::kernel::services::ports::{ContentStore, SessionSettings, TextModelHost, VcsProvider};
use crate::kernel::services::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
use crate::kernel::{
    Action, Effect, Locator, Notification, NotificationLevel, SessionSnapshot, SessionState,
    Store, TextEncoding,
};
use std::io;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

const IDLE_POLL: Duration = Duration::from_millis(20);

pub trait SessionObserver {
    fn state_changed(&mut self, _state: &SessionState) {}

    fn notify(&mut self, _notification: &Notification) {}
}

pub struct EditorSession<H: TextModelHost> {
    store: Store,
    runtime: AsyncRuntime,
    bus_rx: KernelBusReceiver,
    // Keeps the bus open while no task holds a sender.
    _bus_tx: KernelBusSender,
    host: H,
    watcher: Option<WorkspaceWatcher>,
    observers: Vec<Box<dyn SessionObserver>>,
    notifications: Vec<Notification>,
}

impl<H: TextModelHost> EditorSession<H> {
    pub fn new(
        settings: SessionSettings,
        content: Arc<dyn ContentStore>,
        vcs: Arc<dyn VcsProvider>,
        host: H,
    ) -> io::Result<Self> {
        let (bus_tx, bus_rx) = kernel_bus();
        let runtime = AsyncRuntime::new(content, vcs, bus_tx.clone())?;
        Ok(Self {
            store: Store::new(settings),
            runtime,
            bus_rx,
            _bus_tx: bus_tx,
            host,
            watcher: None,
            observers: Vec::new(),
            notifications: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_settings(&mut self, settings: SessionSettings) {
        self.store.set_settings(settings);
    }

    /// Notifications surfaced since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn dispatch(&mut self, action: Action) {
        let result = self.store.dispatch(action);
        for effect in result.effects {
            self.apply_effect(effect);
        }
        if result.state_changed {
            let state = self.store.state();
            for observer in &mut self.observers {
                observer.state_changed(state);
            }
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Model(command) => command.apply(&mut self.host),
            Effect::Notify(notification) => {
                match notification.level {
                    NotificationLevel::Error => {
                        tracing::error!(target: "session", message = %notification.message, "notify")
                    }
                    NotificationLevel::Warning => {
                        tracing::warn!(target: "session", message = %notification.message, "notify")
                    }
                    NotificationLevel::Info => {
                        tracing::info!(target: "session", message = %notification.message, "notify")
                    }
                }
                for observer in &mut self.observers {
                    observer.notify(&notification);
                }
                self.notifications.push(notification);
            }
            Effect::WatchWorkspace { root } => self.watch(&root),
            other => self.runtime.execute(other),
        }
    }

    fn watch(&mut self, root: &Locator) {
        self.watcher = match WorkspaceWatcher::for_locator(root) {
            Some(Ok(watcher)) => Some(watcher),
            Some(Err(e)) => {
                tracing::warn!(target: "watch", %root, error = %e, "cannot watch workspace");
                None
            }
            None => None,
        };
    }

    fn handle_message(&mut self, msg: KernelMessage) {
        match msg {
            KernelMessage::Action(action) => self.dispatch(action),
        }
    }

    /// Applies everything already waiting, without blocking. Returns how many
    /// completions were applied.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        if let Some(action) = self.watcher.as_mut().and_then(WorkspaceWatcher::drain) {
            self.dispatch(action);
            handled += 1;
        }
        while let Ok(msg) = self.bus_rx.try_recv() {
            self.handle_message(msg);
            handled += 1;
        }
        handled
    }

    /// Pumps until no background work is left or `timeout` passes. Returns
    /// whether the session went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            // A finished task has already queued its completion, so one more
            // drain after the counter reaches zero sees everything.
            if self.runtime.in_flight() == 0 && self.pump() == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.bus_rx.recv_timeout((deadline - now).min(IDLE_POLL)) {
                Ok(msg) => self.handle_message(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    pub fn open(&mut self, locator: Locator) {
        self.open_with(locator, OpenKind::Any, false);
    }

    pub fn open_in_new_tab(&mut self, locator: Locator) {
        self.open_with(locator, OpenKind::Any, true);
    }

    pub fn open_with(&mut self, locator: Locator, kind: OpenKind, new_tab: bool) {
        self.dispatch(Action::Open {
            locator,
            kind,
            new_tab,
        });
    }

    pub fn open_preview(&mut self, locator: Locator) {
        self.dispatch(Action::OpenPreview { locator });
    }

    pub fn activate(&mut self, tab: TabId) {
        self.dispatch(Action::ActivateTab { tab });
    }

    pub fn close(&mut self, locator: Locator, kind: OpenKind) {
        self.dispatch(Action::Close { locator, kind });
    }

    pub fn close_all(&mut self) {
        self.dispatch(Action::CloseAll);
    }

    /// Called by the host whenever a buffer's text changes.
    pub fn content_changed(&mut self, locator: Locator, text: impl Into<String>) {
        self.dispatch(Action::ContentChanged {
            locator,
            text: text.into(),
        });
    }

    pub fn save(&mut self, tab: TabId) {
        self.dispatch(Action::Save { tab });
    }

    pub fn save_active(&mut self) {
        self.dispatch(Action::SaveActive);
    }

    pub fn reload_with_encoding(&mut self, encoding: TextEncoding) {
        self.dispatch(Action::ReloadWithEncoding { encoding });
    }

    pub fn compare_with_previous(&mut self, locator: Locator) {
        self.dispatch(Action::CompareWithPrevious { locator });
    }

    pub fn select_for_compare(&mut self, locator: Locator) {
        self.dispatch(Action::SelectForCompare { locator });
    }

    pub fn compare_with_selected(&mut self, locator: Locator) {
        self.dispatch(Action::CompareWithSelected { locator });
    }

    pub fn rename(&mut self, locator: Locator, new_name: impl Into<String>) {
        self.dispatch(Action::Rename {
            locator,
            new_name: new_name.into(),
        });
    }

    pub fn duplicate(&mut self, locator: Locator) {
        self.dispatch(Action::Duplicate { locator });
    }

    pub fn delete(&mut self, locator: Locator) {
        self.dispatch(Action::Delete { locator });
    }

    pub fn create_folder(&mut self, parent: Locator) {
        self.dispatch(Action::CreateFolder { parent });
    }

    pub fn load_workspace(&mut self, root: Locator) {
        self.dispatch(Action::LoadWorkspace { root });
    }

    pub fn refresh_vcs(&mut self) {
        self.dispatch(Action::RefreshVcs);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.state().snapshot()
    }

    /// Re-opens every tab in `snapshot`, each in its own tab, then re-activates
    /// the one that was active.
    pub fn restore(&mut self, snapshot: SessionSnapshot, timeout: Duration) -> bool {
        for locator in snapshot.opened {
            self.open_in_new_tab(locator);
        }
        let idle = self.run_until_idle(timeout);
        if let Some(active) = snapshot.active {
            self.open(active);
        }
        idle
    }
}
