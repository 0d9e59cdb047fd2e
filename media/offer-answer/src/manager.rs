use crate::codec_index::{Capabilities, CapabilityOwner, CodecIndex};
use crate::derive::DeriveFormatParams;
use crate::document::{describe_formats, parse_capabilities, set_default_data};
use crate::session::Session;
use crate::{AppHandle, Error, OfferAnswerConfig, Result};
use parking_lot::lock_api::ArcReentrantMutexGuard;
use parking_lot::{Mutex, RawMutex, RawThreadId, ReentrantMutex, RwLock};
use sdp_types::SessionDescription;
use slotmap::SlotMap;
use std::cell::{RefCell, RefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

slotmap::new_key_type! {
    /// Handle of a session created by [`OfferAnswer::create_session`]
    pub struct SessionId;
}

type SessionCell = Arc<ReentrantMutex<RefCell<Session>>>;

/// State shared between the manager and all of its sessions
pub(crate) struct Shared {
    pub(crate) config: OfferAnswerConfig,
    pub(crate) codecs: CodecIndex,
    global: RwLock<Option<Capabilities>>,
    pub(crate) derive: Option<Box<dyn DeriveFormatParams>>,
    pub(crate) sessions: ResourceCounter,
    pub(crate) streams: ResourceCounter,
}

impl Shared {
    pub(crate) fn global_capabilities(&self) -> Option<SessionDescription> {
        self.global
            .read()
            .as_ref()
            .map(|caps| caps.description.clone())
    }

    pub(crate) fn has_global_capabilities(&self) -> bool {
        self.global.read().is_some()
    }
}

/// Counts the usage of a limited resource
pub(crate) struct ResourceCounter {
    name: &'static str,
    used: AtomicUsize,
    peak: AtomicUsize,
    max: usize,
}

impl ResourceCounter {
    fn new(name: &'static str, max: usize) -> Self {
        Self {
            name,
            used: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            max,
        }
    }

    pub(crate) fn acquire(&self) -> Result<()> {
        let previous = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.max).then_some(used + 1)
            })
            .map_err(|_| {
                log::warn!("all {} {} are in use", self.max, self.name);
                Error::OutOfResources(self.name)
            })?;

        self.peak.fetch_max(previous + 1, Ordering::AcqRel);

        Ok(())
    }

    pub(crate) fn release(&self, n: usize) {
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(n))
            });
    }

    fn resource(&self) -> Resource {
        Resource {
            used: self.used.load(Ordering::Acquire),
            peak: self.peak.load(Ordering::Acquire),
            max: self.max,
        }
    }
}

/// Usage of a limited resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub used: usize,
    /// Highest number of simultaneously used units
    pub peak: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resources {
    pub sessions: Resource,
    pub streams: Resource,
    /// Number of formats in the codec capability index
    pub capability_entries: usize,
}

/// Creates and owns offer/answer sessions.
///
/// Cheap to clone, all clones refer to the same sessions and capabilities.
#[derive(Clone)]
pub struct OfferAnswer {
    inner: Arc<Inner>,
}

struct Inner {
    shared: Arc<Shared>,
    sessions: Mutex<SlotMap<SessionId, SessionCell>>,
}

impl OfferAnswer {
    pub fn new(config: OfferAnswerConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a manager which calls `derive` for every format added to an answer
    pub fn with_format_derivation(
        config: OfferAnswerConfig,
        derive: impl DeriveFormatParams + 'static,
    ) -> Self {
        Self::build(config, Some(Box::new(derive)))
    }

    fn build(config: OfferAnswerConfig, derive: Option<Box<dyn DeriveFormatParams>>) -> Self {
        let shared = Shared {
            sessions: ResourceCounter::new("sessions", config.max_sessions),
            streams: ResourceCounter::new("streams", config.max_streams),
            config,
            codecs: CodecIndex::default(),
            global: RwLock::new(None),
            derive,
        };

        Self {
            inner: Arc::new(Inner {
                shared: Arc::new(shared),
                sessions: Mutex::new(SlotMap::with_key()),
            }),
        }
    }

    pub fn config(&self) -> &OfferAnswerConfig {
        &self.inner.shared.config
    }

    pub fn create_session(&self, app: Option<AppHandle>) -> Result<SessionId> {
        self.inner.shared.sessions.acquire()?;

        let shared = self.inner.shared.clone();

        let id = self.inner.sessions.lock().insert_with_key(|id| {
            Arc::new(ReentrantMutex::new(RefCell::new(Session::new(
                id, shared, app,
            ))))
        });

        log::info!("created session {id:?}");

        Ok(id)
    }

    /// Lock a session. The lock is reentrant, the same thread may lock a session more than once.
    ///
    /// Fails with [`Error::InvalidHandle`] if the session was terminated, even if the lock was
    /// waited on while the session got terminated.
    pub fn lock(&self, id: SessionId) -> Result<SessionGuard> {
        let session = self
            .inner
            .sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or(Error::InvalidHandle)?;

        let guard = session.lock_arc();

        if !self.inner.sessions.lock().contains_key(id) {
            return Err(Error::InvalidHandle);
        }

        Ok(SessionGuard { guard })
    }

    /// Terminate a session and release its handle
    pub fn terminate(&self, id: SessionId) -> Result<()> {
        let guard = self.lock(id)?;

        guard.session()?.terminate();

        if self.inner.sessions.lock().remove(id).is_some() {
            self.inner.shared.sessions.release(1);
            log::info!("released session {id:?}");
        }

        Ok(())
    }

    /// Set the global capabilities from SDP text, used by sessions without own capabilities
    pub fn set_capabilities(&self, text: &str) -> Result<()> {
        let capabilities = parse_capabilities(text, &self.inner.shared.config)?;
        self.set_capabilities_description(capabilities);
        Ok(())
    }

    pub fn set_capabilities_description(&self, mut capabilities: SessionDescription) {
        let shared = &self.inner.shared;

        set_default_data(&mut capabilities, &shared.config);

        log::debug!("global capabilities {}", describe_formats(&capabilities));

        let mut global = shared.global.write();

        if let Some(old) = global.take() {
            shared.codecs.remove(&old.keys);
        }

        *global = Some(shared.codecs.insert(CapabilityOwner::Global, capabilities));
    }

    pub fn capabilities(&self) -> Option<SessionDescription> {
        self.inner.shared.global_capabilities()
    }

    pub fn resources(&self) -> Resources {
        let shared = &self.inner.shared;

        Resources {
            sessions: shared.sessions.resource(),
            streams: shared.streams.resource(),
            capability_entries: shared.codecs.len(),
        }
    }
}

/// Exclusive access to a session, returned by [`OfferAnswer::lock`]
pub struct SessionGuard {
    guard: ArcReentrantMutexGuard<RawMutex, RawThreadId, RefCell<Session>>,
}

impl SessionGuard {
    /// Borrow the session.
    ///
    /// Fails with [`Error::SessionBusy`] if the session is already borrowed further up the stack
    /// of the current thread, e.g. from inside a [`DeriveFormatParams`] callback.
    pub fn session(&self) -> Result<RefMut<'_, Session>> {
        self.guard.try_borrow_mut().map_err(|_| Error::SessionBusy)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manager(max_sessions: usize) -> OfferAnswer {
        OfferAnswer::new(OfferAnswerConfig {
            max_sessions,
            ..OfferAnswerConfig::default()
        })
    }

    #[test]
    fn session_limit() {
        let manager = manager(2);

        let a = manager.create_session(None).unwrap();
        let _b = manager.create_session(None).unwrap();

        assert!(matches!(
            manager.create_session(None),
            Err(Error::OutOfResources("sessions"))
        ));

        manager.terminate(a).unwrap();
        manager.create_session(None).unwrap();

        let resources = manager.resources();
        assert_eq!(resources.sessions.used, 2);
        assert_eq!(resources.sessions.peak, 2);
        assert_eq!(resources.sessions.max, 2);
    }

    #[test]
    fn stale_handle() {
        let manager = manager(1);

        let id = manager.create_session(None).unwrap();
        manager.terminate(id).unwrap();

        // the slot is reused, but the old handle stays invalid
        let new_id = manager.create_session(None).unwrap();
        assert_ne!(id, new_id);

        assert!(matches!(manager.lock(id), Err(Error::InvalidHandle)));
        assert!(matches!(manager.terminate(id), Err(Error::InvalidHandle)));
        assert!(manager.lock(new_id).is_ok());
    }

    #[test]
    fn reentrant_lock() {
        let manager = manager(1);
        let id = manager.create_session(None).unwrap();

        let outer = manager.lock(id).unwrap();
        let inner = manager.lock(id).unwrap();

        let session = outer.session().unwrap();
        assert!(matches!(inner.session(), Err(Error::SessionBusy)));
        drop(session);

        assert!(inner.session().is_ok());
    }

    #[test]
    fn global_capabilities_replace_index_entries() {
        let manager = manager(1);

        manager
            .set_capabilities("m=audio 0 RTP/AVP 0 8 18\r\n")
            .unwrap();
        assert_eq!(manager.resources().capability_entries, 3);

        manager.set_capabilities("m=audio 0 RTP/AVP 0\r\n").unwrap();
        assert_eq!(manager.resources().capability_entries, 1);

        let capabilities = manager.capabilities().unwrap();
        assert_eq!(capabilities.media_descriptions[0].media.fmts, ["0"]);
        assert!(capabilities.connection.is_some());
    }

    #[test]
    fn capabilities_too_long() {
        let manager = OfferAnswer::new(OfferAnswerConfig {
            max_capabilities_len: 16,
            ..OfferAnswerConfig::default()
        });

        assert!(matches!(
            manager.set_capabilities("m=audio 0 RTP/AVP 0 8\r\n"),
            Err(Error::CapabilitiesTooLong { len: 23, max: 16 })
        ));
        assert!(manager.capabilities().is_none());
    }
}
