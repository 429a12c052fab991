//! Explicitly shared session state.
//!
//! The session is a plain object handed to whoever needs it, with an
//! explicit initialization call and registered subscribers. There is no
//! process-wide mutable global; front-ends observe the session either by
//! polling the accessors or by subscribing to [`SessionEvent`]s.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// Views a front-end can be routed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Route {
    /// Login / registration view.
    Login,
    /// Chat view.
    Chat,
}

/// Events emitted to session subscribers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// The startup validity check completed.
    Initialized {
        /// Whether the stored token was still valid.
        authenticated: bool,
    },
    /// The user signed in.
    SignedIn,
    /// The session ended, through logout or an authentication failure.
    SignedOut,
}

/// Callback invoked on every session event.
pub type SessionListener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct SessionState {
    authenticated: bool,
    loading: bool,
    route: Route,
}

/// Session object exposing authentication state and routing to the UI.
///
/// `loading` starts true and clears on [`Session::initialize`], so a
/// front-end can distinguish "not checked yet" from "checked, not
/// authenticated".
pub struct Session {
    state: RwLock<SessionState>,
    listeners: Mutex<Vec<SessionListener>>,
}

impl Session {
    /// Create an uninitialized session routed at the login view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                authenticated: false,
                loading: true,
                route: Route::Login,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Whether the user currently counts as authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated
    }

    /// Whether the startup validity check is still pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// The view the front-end should currently display.
    #[must_use]
    pub fn route(&self) -> Route {
        self.state.read().route
    }

    /// Register a listener for all subsequent session events.
    pub fn subscribe(&self, listener: SessionListener) {
        self.listeners.lock().push(listener);
    }

    /// Record the result of the startup validity check.
    pub fn initialize(&self, authenticated: bool) {
        {
            let mut state = self.state.write();
            state.authenticated = authenticated;
            state.loading = false;
            state.route = if authenticated { Route::Chat } else { Route::Login };
        }
        debug!("Session initialized, authenticated={authenticated}");
        self.emit(&SessionEvent::Initialized { authenticated });
    }

    /// Mark the session as signed in and route to the chat view.
    pub fn sign_in(&self) {
        {
            let mut state = self.state.write();
            state.authenticated = true;
            state.route = Route::Chat;
        }
        self.emit(&SessionEvent::SignedIn);
    }

    /// Mark the session as signed out and route to the login view.
    ///
    /// Used both for explicit logout and for the global 401 policy.
    pub fn sign_out(&self) {
        {
            let mut state = self.state.write();
            state.authenticated = false;
            state.route = Route::Login;
        }
        self.emit(&SessionEvent::SignedOut);
    }

    /// Notify all listeners. The state lock is released first, and the
    /// listener list is snapshotted before the calls, so a listener may
    /// read the session or subscribe re-entrantly without deadlocking.
    fn emit(&self, event: &SessionEvent) {
        let listeners: Vec<SessionListener> = self.listeners.lock().clone();
        for listener in &listeners {
            listener(event);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn recorded_events(session: &Session) -> Arc<Mutex<Vec<SessionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        session.subscribe(Arc::new(move |event| {
            sink.lock().push(event.clone());
        }));
        events
    }

    #[test]
    fn test_session_starts_loading_and_unauthenticated() {
        let session = Session::new();
        assert!(session.is_loading());
        assert!(!session.is_authenticated());
        assert_eq!(session.route(), Route::Login);
    }

    #[test]
    fn test_initialize_with_valid_token_routes_to_chat() {
        let session = Session::new();
        let events = recorded_events(&session);

        session.initialize(true);

        assert!(!session.is_loading());
        assert!(session.is_authenticated());
        assert_eq!(session.route(), Route::Chat);
        assert_eq!(
            events.lock().as_slice(),
            &[SessionEvent::Initialized {
                authenticated: true
            }]
        );
    }

    #[test]
    fn test_sign_in_then_sign_out() {
        let session = Session::new();
        let events = recorded_events(&session);

        session.initialize(false);
        session.sign_in();
        assert!(session.is_authenticated());
        assert_eq!(session.route(), Route::Chat);

        session.sign_out();
        assert!(!session.is_authenticated());
        assert_eq!(session.route(), Route::Login);

        assert_eq!(
            events.lock().as_slice(),
            &[
                SessionEvent::Initialized {
                    authenticated: false
                },
                SessionEvent::SignedIn,
                SessionEvent::SignedOut,
            ]
        );
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let session = Arc::new(Session::new());
        let late_events = Arc::new(Mutex::new(0_u32));

        let inner_session = Arc::clone(&session);
        let sink = Arc::clone(&late_events);
        session.subscribe(Arc::new(move |_event| {
            let counter = Arc::clone(&sink);
            inner_session.subscribe(Arc::new(move |_event| {
                *counter.lock() += 1;
            }));
        }));

        // Registers a listener from inside the callback; must not deadlock.
        session.sign_in();
        // The listener added above now observes subsequent events.
        session.sign_out();
        assert!(*late_events.lock() >= 1);
    }

    #[test]
    fn test_listener_may_read_session_state() {
        let session = Arc::new(Session::new());
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let inner = Arc::clone(&session);
        session.subscribe(Arc::new(move |_event| {
            *sink.lock() = Some(inner.route());
        }));

        session.sign_in();
        assert_eq!(*seen.lock(), Some(Route::Chat));
    }
}
