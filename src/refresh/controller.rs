//! Quota refresh state machine
//!
//! Decides when a fetch happens, keeps at most one fetch in flight and picks
//! what to show before, during and after each fetch. Cached numbers survive
//! failed fetches.

use chrono::Local;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::scheduler::RefreshScheduler;
use crate::quota_usage::api::{QuotaFetcher, FETCH_TIMEOUT};
use crate::quota_usage::credentials::{validate_token, CredentialProvider};
use crate::quota_usage::error::{CredentialError, QuotaError, SetTokenError};
use crate::quota_usage::types::{CachedState, QuotaSnapshot};
use crate::settings::SettingsSource;
use crate::status::render::{
    detail_tooltip, format_last_updated, render_error, render_loading, render_normal,
    render_refreshing_with_cache, render_setup_required,
};
use crate::status::types::{DisplayState, StatusSurface, StatusView};

/// Holds the single-flight flag for the lifetime of one fetch
///
/// Dropping it returns the controller to idle on every exit path, unwinding included.
struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FetchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct RefreshController {
    fetcher: Arc<dyn QuotaFetcher>,
    credentials: Arc<dyn CredentialProvider>,
    settings: Arc<dyn SettingsSource>,
    surface: Arc<dyn StatusSurface>,
    cache: Mutex<CachedState>,
    view: Mutex<StatusView>,
    fetching: AtomicBool,
    /// Bumped whenever the stored token changes; results fetched with an older token are discarded
    credential_generation: AtomicU64,
    scheduler: Mutex<RefreshScheduler>,
    fetch_timeout: Duration,
}

impl RefreshController {
    pub fn new(
        fetcher: Arc<dyn QuotaFetcher>,
        credentials: Arc<dyn CredentialProvider>,
        settings: Arc<dyn SettingsSource>,
        surface: Arc<dyn StatusSurface>,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            settings,
            surface,
            cache: Mutex::new(CachedState::default()),
            view: Mutex::new(render_loading()),
            fetching: AtomicBool::new(false),
            credential_generation: AtomicU64::new(0),
            scheduler: Mutex::new(RefreshScheduler::new()),
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// Arm the periodic timer and run the first refresh
    pub async fn start(self: &Arc<Self>) {
        log::info!("Starting quota refresh controller");
        self.arm_scheduler();
        self.refresh().await;
    }

    /// Stop the periodic timer. Safe to call more than once.
    pub fn dispose(&self) {
        self.scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
        log::debug!("Quota refresh controller disposed");
    }

    /// Run one refresh cycle
    ///
    /// Returns immediately, doing nothing, if a fetch is already in flight.
    pub async fn refresh(&self) {
        let Some(_guard) = FetchGuard::acquire(&self.fetching) else {
            log::debug!("Refresh already in progress, skipping");
            return;
        };

        let generation = self.credential_generation.load(Ordering::Acquire);
        let token = match self.credentials.get() {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => {
                log::debug!("No API token configured");
                self.show(render_setup_required());
                return;
            }
            Err(e) => {
                log::error!("Failed to read API token: {e}");
                self.show(render_setup_required());
                return;
            }
        };

        match self.cached_state().last_snapshot {
            Some(snapshot) => self.show(render_refreshing_with_cache(&snapshot)),
            None => self.show(render_loading()),
        }

        let result = self.fetch_snapshot(&token).await;
        if self.credential_generation.load(Ordering::Acquire) != generation {
            log::debug!("API token changed during fetch, discarding result");
            return;
        }

        match result {
            Ok(snapshot) => {
                log::info!(
                    "Quota updated: {}/{} ({}%)",
                    snapshot.used(),
                    snapshot.total(),
                    snapshot.percentage()
                );
                self.cache
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .store(snapshot, Local::now());
                self.show(render_normal(&snapshot));
            }
            Err(err) => {
                log::warn!("Quota refresh failed: {err}");
                let cache = self.cached_state();
                self.show(render_error(
                    &err,
                    cache.last_snapshot.as_ref(),
                    cache.last_updated_at.as_ref(),
                ));
            }
        }
    }

    async fn fetch_snapshot(&self, token: &str) -> Result<QuotaSnapshot, QuotaError> {
        let response = self.fetcher.fetch(token, self.fetch_timeout).await?;
        QuotaSnapshot::try_from(response)
    }

    /// Validate and store a new API token, then refresh once
    ///
    /// Invalid input is rejected before anything is stored or sent.
    pub async fn set_credential(&self, token: &str) -> Result<(), SetTokenError> {
        let token = validate_token(token)?;
        self.credentials.set(token)?;
        self.credential_generation.fetch_add(1, Ordering::AcqRel);
        log::info!("API token updated");
        self.refresh().await;
        Ok(())
    }

    /// Forget the stored API token
    pub fn remove_credential(&self) -> Result<(), CredentialError> {
        self.credentials.remove()?;
        self.credential_generation.fetch_add(1, Ordering::AcqRel);
        log::info!("API token removed");
        self.show(render_setup_required());
        Ok(())
    }

    /// Re-read the refresh interval, re-arm the timer and refresh now
    pub async fn on_configuration_changed(self: &Arc<Self>) {
        self.arm_scheduler();
        self.refresh().await;
    }

    fn arm_scheduler(self: &Arc<Self>) {
        let period = self.settings.refresh_interval();
        let controller = Arc::downgrade(self);
        self.scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .arm(period, move || {
                if let Some(controller) = controller.upgrade() {
                    tokio::spawn(async move { controller.refresh().await });
                }
            });
    }

    /// Human-readable details for the current display state
    pub fn show_details(&self) -> String {
        let view = self.current_view();
        match view.state {
            DisplayState::Normal | DisplayState::Refreshing => {
                let cache = self.cached_state();
                let Some(snapshot) = cache.last_snapshot else {
                    return view.tooltip;
                };
                let mut details = detail_tooltip(&snapshot);
                if let Some(at) = cache.last_updated_at {
                    details.push_str(&format!("\n\nLast updated: {}", format_last_updated(&at)));
                }
                if view.state == DisplayState::Refreshing {
                    details.push_str("\n\nRefreshing...");
                }
                details
            }
            DisplayState::Loading => "Quota usage is being fetched. Try again in a moment.".to_string(),
            DisplayState::SetupRequired | DisplayState::Error => view.tooltip,
        }
    }

    pub fn current_view(&self) -> StatusView {
        self.view.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn cached_state(&self) -> CachedState {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    fn show(&self, view: StatusView) {
        self.surface.update(&view);
        *self.view.lock().unwrap_or_else(|e| e.into_inner()) = view;
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.dispose();
    }
}
