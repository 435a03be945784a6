use std::time::Duration;

use async_trait::async_trait;

use crate::config::TimingConfig;
use crate::error::{Context, ExportFailure, Result};
use crate::ui::{Section, StatusKind, Surface};

pub mod api;

pub use api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

impl SessionState {
    pub fn section(self) -> Section {
        match self {
            SessionState::Authenticated => Section::Export,
            SessionState::Unauthenticated => Section::Login,
        }
    }
}

/// Server-side authentication endpoints.
#[async_trait(?Send)]
pub trait AuthBackend {
    async fn auth_status(&self) -> Result<bool>;
    async fn login_url(&self) -> Result<String>;
    async fn logout(&self) -> Result<()>;
}

/// Sends the user somewhere else to finish signing in.
pub trait Navigator {
    fn navigate(&self, url: &str) -> Result<()>;
}

/// Opens login pages in the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn navigate(&self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("Failed to open a browser for {}", url))?;
        Ok(())
    }
}

/// Mirrors the server's view of the session and decides which section is usable.
pub struct SessionGate<B, N> {
    backend: B,
    navigator: N,
    state: SessionState,
    error_ttl: Duration,
    notice_ttl: Duration,
}

impl<B: AuthBackend, N: Navigator> SessionGate<B, N> {
    pub fn new(backend: B, navigator: N, timings: &TimingConfig) -> Self {
        Self {
            backend,
            navigator,
            state: SessionState::Unauthenticated,
            error_ttl: timings.result_status_ttl,
            notice_ttl: timings.notice_ttl,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask the server who we are. Any failure counts as signed out and is only logged.
    pub async fn refresh(&mut self, surface: &mut Surface) -> SessionState {
        self.state = match self.backend.auth_status().await {
            Ok(true) => SessionState::Authenticated,
            Ok(false) => SessionState::Unauthenticated,
            Err(err) => {
                log::warn!("{}", ExportFailure::AuthQuery(err.to_string()));
                SessionState::Unauthenticated
            }
        };
        surface.section = self.state.section();
        self.state
    }

    /// Fetch the login URL and hand it to the navigator. Completion is only
    /// observable through a later `refresh`.
    pub async fn login(&mut self, surface: &mut Surface) -> std::result::Result<String, ExportFailure> {
        let result = match self.backend.login_url().await {
            Ok(url) => self.navigator.navigate(&url).map(|_| url),
            Err(err) => Err(err),
        };

        match result {
            Ok(url) => {
                log::info!("Opened login page {}", url);
                Ok(url)
            }
            Err(err) => {
                let failure = ExportFailure::LoginRequest(err.to_string());
                surface
                    .status
                    .post(StatusKind::Error, failure.to_string(), self.error_ttl);
                Err(failure)
            }
        }
    }

    /// End the server session, then re-read the session state.
    pub async fn logout(&mut self, surface: &mut Surface) -> std::result::Result<(), ExportFailure> {
        if let Err(err) = self.backend.logout().await {
            let failure = ExportFailure::LogoutRequest(err.to_string());
            surface
                .status
                .post(StatusKind::Error, failure.to_string(), self.error_ttl);
            return Err(failure);
        }

        self.refresh(surface).await;
        surface
            .status
            .post(StatusKind::Success, "Signed out", self.notice_ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use crate::config::Config;
    use crate::error::AppError;

    #[derive(Default)]
    struct FakeBackend {
        authenticated: Cell<Option<bool>>,
        login_url: RefCell<Option<String>>,
        logout_ok: Cell<bool>,
        logout_calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl AuthBackend for FakeBackend {
        async fn auth_status(&self) -> Result<bool> {
            self.authenticated
                .get()
                .ok_or_else(|| AppError::message("status endpoint unreachable"))
        }

        async fn login_url(&self) -> Result<String> {
            self.login_url
                .borrow()
                .clone()
                .ok_or_else(|| AppError::message("login endpoint unreachable"))
        }

        async fn logout(&self) -> Result<()> {
            self.logout_calls.set(self.logout_calls.get() + 1);
            if self.logout_ok.get() {
                self.authenticated.set(Some(false));
                Ok(())
            } else {
                Err(AppError::message("logout endpoint unreachable"))
            }
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        visited: RefCell<Vec<String>>,
    }

    impl Navigator for &RecordingNavigator {
        fn navigate(&self, url: &str) -> Result<()> {
            self.visited.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn gate<'a>(
        backend: FakeBackend,
        navigator: &'a RecordingNavigator,
    ) -> SessionGate<FakeBackend, &'a RecordingNavigator> {
        SessionGate::new(backend, navigator, &Config::builtin().timings)
    }

    #[tokio::test]
    async fn refresh_mirrors_server_state() {
        let navigator = RecordingNavigator::default();
        let backend = FakeBackend::default();
        backend.authenticated.set(Some(true));
        let mut gate = gate(backend, &navigator);
        let mut surface = Surface::default();

        assert_eq!(gate.refresh(&mut surface).await, SessionState::Authenticated);
        assert_eq!(surface.section, Section::Export);

        gate.backend().authenticated.set(Some(false));
        assert_eq!(gate.refresh(&mut surface).await, SessionState::Unauthenticated);
        assert_eq!(surface.section, Section::Login);
    }

    #[tokio::test]
    async fn failed_status_query_degrades_silently() {
        let navigator = RecordingNavigator::default();
        let backend = FakeBackend::default();
        backend.authenticated.set(Some(true));
        let mut gate = gate(backend, &navigator);
        let mut surface = Surface::default();
        gate.refresh(&mut surface).await;

        gate.backend().authenticated.set(None);
        assert_eq!(gate.refresh(&mut surface).await, SessionState::Unauthenticated);
        assert_eq!(surface.section, Section::Login);
        assert!(surface.status.current().is_none());
    }

    #[tokio::test]
    async fn login_navigates_to_server_url() {
        let navigator = RecordingNavigator::default();
        let backend = FakeBackend::default();
        *backend.login_url.borrow_mut() = Some("https://accounts.example.com/authorize?state=x".to_string());
        let mut gate = gate(backend, &navigator);
        let mut surface = Surface::default();

        let url = gate.login(&mut surface).await.expect("login");
        assert_eq!(url, "https://accounts.example.com/authorize?state=x");
        assert_eq!(navigator.visited.borrow().as_slice(), &[url]);
        assert_eq!(gate.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn login_failure_posts_error_status() {
        let navigator = RecordingNavigator::default();
        let mut gate = gate(FakeBackend::default(), &navigator);
        let mut surface = Surface::default();

        let failure = gate.login(&mut surface).await.expect_err("login should fail");
        assert!(matches!(failure, ExportFailure::LoginRequest(_)));
        assert!(navigator.visited.borrow().is_empty());

        let status = surface.status.current().expect("status");
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.starts_with("Login failed"));
    }

    #[tokio::test]
    async fn logout_refreshes_and_confirms() {
        let navigator = RecordingNavigator::default();
        let backend = FakeBackend::default();
        backend.authenticated.set(Some(true));
        backend.logout_ok.set(true);
        let mut gate = gate(backend, &navigator);
        let mut surface = Surface::default();
        gate.refresh(&mut surface).await;

        gate.logout(&mut surface).await.expect("logout");

        assert_eq!(gate.state(), SessionState::Unauthenticated);
        assert_eq!(surface.section, Section::Login);
        assert_eq!(
            surface.status.current().map(|s| (s.kind, s.text.as_str())),
            Some((StatusKind::Success, "Signed out"))
        );
    }

    #[tokio::test]
    async fn logout_failure_keeps_prior_state() {
        let navigator = RecordingNavigator::default();
        let backend = FakeBackend::default();
        backend.authenticated.set(Some(true));
        let mut gate = gate(backend, &navigator);
        let mut surface = Surface::default();
        gate.refresh(&mut surface).await;

        let failure = gate.logout(&mut surface).await.expect_err("logout should fail");

        assert!(matches!(failure, ExportFailure::LogoutRequest(_)));
        assert_eq!(gate.backend().logout_calls.get(), 1);
        assert_eq!(gate.state(), SessionState::Authenticated);
        assert_eq!(surface.section, Section::Export);
        assert_eq!(
            surface.status.current().map(|s| s.kind),
            Some(StatusKind::Error)
        );
    }
}
