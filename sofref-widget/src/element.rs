//! Host-facing side of the plugin: the embeddable element.
//!
//! The host drives it with attribute and connect/disconnect signals and receives
//! [`HostEvent`]s on a channel. Everything the element renders lives in a
//! [`RenderScope`], which exists exactly while the element is mounted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use sofref_core::types::Session;
use sofref_engine::store::{FetchHandle, SessionStore, Subscription};
use sofref_engine::traits::Services;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::form::SettingsForm;
use crate::view::{ViewModel, render};

pub const ELEMENT_NAME: &str = "sefaria-plugin";
pub const ATTR_SREF: &str = "sref";
pub const OBSERVED_ATTRIBUTES: [&str; 1] = [ATTR_SREF];
pub const EVENT_SCROLL_TO_REF: &str = "scrollToRef";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollToRefDetail {
    pub sref: String,
}

/// An event dispatched from the element to the host page.
///
/// `bubbles` and `composed` mirror DOM semantics: the event leaves the isolated
/// rendering scope and propagates up through the host tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostEvent {
    #[serde(rename = "type")]
    pub name: &'static str,
    pub detail: ScrollToRefDetail,
    pub bubbles: bool,
    pub composed: bool,
}

impl HostEvent {
    pub fn scroll_to_ref(sref: impl Into<String>) -> Self {
        Self {
            name: EVENT_SCROLL_TO_REF,
            detail: ScrollToRefDetail { sref: sref.into() },
            bubbles: true,
            composed: true,
        }
    }
}

#[derive(Debug)]
struct Frame {
    // Last snapshot delivered by the store; sref changes re-render from it.
    session: Session,
    sref: Option<String>,
    view: ViewModel,
    renders: u64,
}

fn lock(frame: &Mutex<Frame>) -> MutexGuard<'_, Frame> {
    frame.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The isolated subtree owned by a mounted element: a session store, the one
/// subscription that re-renders it, and the form's uncommitted edits.
pub struct RenderScope {
    store: SessionStore,
    subscription: Subscription,
    frame: Arc<Mutex<Frame>>,
    link_base_url: Arc<str>,
    form: SettingsForm,
    scroll_target: String,
}

impl RenderScope {
    fn mount(services: Services, link_base_url: Arc<str>, sref: Option<String>) -> Self {
        let store = SessionStore::new(services);
        let session = store.get_state();
        let frame = Arc::new(Mutex::new(Frame {
            view: render(&session, sref.as_deref(), &link_base_url),
            session: session.clone(),
            sref,
            renders: 1,
        }));

        let target = frame.clone();
        let base = link_base_url.clone();
        let subscription = store.subscribe(move |session| {
            let mut frame = lock(&target);
            frame.view = render(session, frame.sref.as_deref(), &base);
            frame.session = session.clone();
            frame.renders += 1;
        });

        Self {
            store,
            subscription,
            frame,
            link_base_url,
            form: SettingsForm::from_settings(&session.settings),
            scroll_target: String::new(),
        }
    }

    fn set_sref(&self, sref: Option<String>) {
        let mut frame = lock(&self.frame);
        frame.view = render(&frame.session, sref.as_deref(), &self.link_base_url);
        frame.sref = sref;
        frame.renders += 1;
    }

    fn teardown(self) -> bool {
        self.subscription.unsubscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn view(&self) -> ViewModel {
        lock(&self.frame).view.clone()
    }

    pub fn render_count(&self) -> u64 {
        lock(&self.frame).renders
    }
}

/// The embeddable element. One instance per host element; mounting creates a fresh
/// session, unmounting drops it.
pub struct PluginElement {
    id: InstanceId,
    services: Services,
    link_base_url: Arc<str>,
    sref: Option<String>,
    scope: Option<RenderScope>,
    mounts: u64,
    events: UnboundedSender<HostEvent>,
}

impl PluginElement {
    pub fn new(
        services: Services,
        link_base_url: impl Into<String>,
        events: UnboundedSender<HostEvent>,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            services,
            link_base_url: Arc::from(link_base_url.into()),
            sref: None,
            scope: None,
            mounts: 0,
            events,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_some()
    }

    /// Number of times a rendering scope was actually created.
    pub fn mount_count(&self) -> u64 {
        self.mounts
    }

    pub fn sref(&self) -> Option<&str> {
        self.sref.as_deref()
    }

    /// Host connected the element. Returns `false` if it was already mounted.
    pub fn connected(&mut self) -> bool {
        if self.scope.is_some() {
            log::debug!("{ELEMENT_NAME} {:?}: already mounted", self.id.0);
            return false;
        }
        self.scope = Some(RenderScope::mount(
            self.services.clone(),
            self.link_base_url.clone(),
            self.sref.clone(),
        ));
        self.mounts += 1;
        log::info!("{ELEMENT_NAME} {:?}: mounted", self.id.0);
        true
    }

    /// Host disconnected the element. Returns `false` if it was not mounted.
    ///
    /// Requests still in flight keep running against the dropped session; nothing
    /// observes their results.
    pub fn disconnected(&mut self) -> bool {
        let Some(scope) = self.scope.take() else {
            return false;
        };
        if !scope.teardown() {
            log::warn!("{ELEMENT_NAME} {:?}: subscription already gone", self.id.0);
        }
        log::info!("{ELEMENT_NAME} {:?}: unmounted", self.id.0);
        true
    }

    /// Attribute mutation from the host. Only `sref` is observed, and it is display-only.
    pub fn attribute_changed(&mut self, name: &str, old: Option<&str>, new: Option<&str>) {
        if name != ATTR_SREF || old == new {
            return;
        }
        self.sref = new.map(str::to_string);
        if let Some(scope) = &self.scope {
            scope.set_sref(self.sref.clone());
        }
    }

    /// Convenience for hosts that only know the new value.
    pub fn set_sref(&mut self, sref: Option<&str>) {
        let old = self.sref.clone();
        self.attribute_changed(ATTR_SREF, old.as_deref(), sref);
    }

    pub fn scope(&self) -> Option<&RenderScope> {
        self.scope.as_ref()
    }

    pub fn store(&self) -> Option<&SessionStore> {
        self.scope.as_ref().map(|s| &s.store)
    }

    pub fn view(&self) -> Option<ViewModel> {
        self.scope.as_ref().map(RenderScope::view)
    }

    pub fn form(&self) -> Option<&SettingsForm> {
        self.scope.as_ref().map(|s| &s.form)
    }

    pub fn form_mut(&mut self) -> Option<&mut SettingsForm> {
        self.scope.as_mut().map(|s| &mut s.form)
    }

    /// Settings form submission.
    pub fn submit_settings(&self) -> Option<FetchHandle> {
        let scope = self.scope.as_ref()?;
        scope.form.submit(&scope.store)
    }

    pub fn set_scroll_target(&mut self, value: impl Into<String>) {
        if let Some(scope) = self.scope.as_mut() {
            scope.scroll_target = value.into();
        }
    }

    /// The user pressed the scroll trigger. Emits `scrollToRef` only for a non-empty
    /// target while mounted.
    pub fn trigger_scroll(&self) -> bool {
        let Some(scope) = self.scope.as_ref() else {
            return false;
        };
        if scope.scroll_target.is_empty() {
            return false;
        }

        let event = HostEvent::scroll_to_ref(scope.scroll_target.clone());
        if self.events.send(event).is_err() {
            log::warn!("{ELEMENT_NAME} {:?}: host stopped listening for events", self.id.0);
            return false;
        }
        true
    }
}

impl Drop for PluginElement {
    fn drop(&mut self) {
        self.disconnected();
    }
}
