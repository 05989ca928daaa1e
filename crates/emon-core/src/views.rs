//! Data loaders behind each view.
//!
//! A view is loading until all of its initial fetches resolve, and fails
//! as soon as any of them does. Fetches for one view run concurrently.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, try_join};
use tokio::sync::watch;
use tracing::debug;

use emon_types::{
    AdminHouse, Alert, AlertFilter, HistoryPoint, House, HouseStatistics, LiveReading, Sensor,
    UserSettings, UserSummary,
};

use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::poller::{LivePoller, PollerState, interval_for};

/// Load state of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    /// Inline error text; there is no automatic retry.
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => ViewState::Ready(value),
            Err(e) => ViewState::Failed(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

// ==========================================================================
// Joined loaders
// ==========================================================================

/// House detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseView {
    pub house: House,
    pub statistics: HouseStatistics,
}

/// Sensor detail page (the live reading is polled separately).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorView {
    pub sensor: Sensor,
    pub history: Vec<HistoryPoint>,
}

/// Admin landing page, computed from the admin listings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminOverview {
    pub houses: Vec<AdminHouse>,
    pub sensors: Vec<Sensor>,
    pub users: Vec<UserSummary>,
}

impl AdminOverview {
    pub fn online_sensors(&self) -> usize {
        self.sensors.iter().filter(|s| s.is_online).count()
    }

    pub fn offline_sensors(&self) -> usize {
        self.sensors.len() - self.online_sensors()
    }
}

pub async fn load_dashboard(api: &ApiGateway) -> ViewState<Vec<House>> {
    ViewState::from_result(api.houses().await)
}

pub async fn load_house_view(api: &ApiGateway, id: i64) -> ViewState<HouseView> {
    debug!(house = id, "loading house view");
    let joined = try_join!(api.house(id), api.house_statistics(id));
    ViewState::from_result(joined.map(|(house, statistics)| HouseView { house, statistics }))
}

pub async fn load_sensor_view(api: &ApiGateway, id: i64) -> ViewState<SensorView> {
    debug!(sensor = id, "loading sensor view");
    let joined = try_join!(api.sensor(id), api.sensor_history(id));
    ViewState::from_result(joined.map(|(sensor, history)| SensorView { sensor, history }))
}

pub async fn load_admin_overview(api: &ApiGateway) -> ViewState<AdminOverview> {
    let joined = try_join!(api.admin_houses(), api.admin_sensors(), api.admin_users());
    ViewState::from_result(joined.map(|(houses, sensors, users)| AdminOverview {
        houses,
        sensors,
        users,
    }))
}

/// Users a new house can be assigned to.
pub async fn assignable_users(api: &ApiGateway) -> Result<Vec<UserSummary>> {
    api.admin_users().await
}

// ==========================================================================
// Sensor monitor
// ==========================================================================

/// Live reading of one sensor, kept fresh by a [`LivePoller`].
///
/// Each tick replaces the latest reading; nothing is accumulated.
pub struct SensorMonitor {
    api: ApiGateway,
    sensor_id: i64,
    latest: Arc<watch::Sender<Option<LiveReading>>>,
    poller: LivePoller,
}

impl std::fmt::Debug for SensorMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorMonitor")
            .field("sensor_id", &self.sensor_id)
            .field("poller", &self.poller)
            .finish()
    }
}

fn fetch_live(
    api: ApiGateway,
    sensor_id: i64,
    latest: Arc<watch::Sender<Option<LiveReading>>>,
) -> impl Fn() -> BoxFuture<'static, Result<()>> + Send + Sync + 'static {
    move || {
        let api = api.clone();
        let latest = Arc::clone(&latest);
        async move {
            let reading = api.live_reading(sensor_id).await?;
            latest.send_replace(Some(reading));
            Ok(())
        }
        .boxed()
    }
}

impl SensorMonitor {
    /// Idle monitor; call [`apply_settings`](Self::apply_settings) to start it.
    pub fn new(api: ApiGateway, sensor_id: i64) -> Self {
        let (latest, _) = watch::channel(None);
        let latest = Arc::new(latest);
        let poller = LivePoller::new(fetch_live(api.clone(), sensor_id, Arc::clone(&latest)));
        Self {
            api,
            sensor_id,
            latest,
            poller,
        }
    }

    /// (Re)derive the polling interval from the user's settings.
    pub fn apply_settings(&mut self, settings: Option<&UserSettings>) {
        self.poller.set_interval(Some(interval_for(settings)));
    }

    /// Point the monitor at another sensor. The old reading is dropped.
    pub fn switch_sensor(&mut self, sensor_id: i64) {
        if sensor_id == self.sensor_id {
            return;
        }
        self.sensor_id = sensor_id;
        self.latest.send_replace(None);
        self.poller
            .set_callback(fetch_live(self.api.clone(), sensor_id, Arc::clone(&self.latest)));
    }

    pub fn stop(&mut self) {
        self.poller.stop();
    }

    pub fn sensor_id(&self) -> i64 {
        self.sensor_id
    }

    pub fn state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn latest(&self) -> Option<LiveReading> {
        self.latest.borrow().clone()
    }

    /// Receiver notified whenever the reading is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Option<LiveReading>> {
        self.latest.subscribe()
    }
}

// ==========================================================================
// Alert board
// ==========================================================================

/// Alert list with a server-side filter.
///
/// The list shown is always exactly what the server returned for the
/// current filter; nothing is filtered locally.
#[derive(Debug)]
pub struct AlertBoard {
    api: ApiGateway,
    filter: AlertFilter,
    alerts: ViewState<Vec<Alert>>,
}

impl AlertBoard {
    pub fn new(api: ApiGateway) -> Self {
        Self {
            api,
            filter: AlertFilter::all(),
            alerts: ViewState::Loading,
        }
    }

    pub fn filter(&self) -> AlertFilter {
        self.filter
    }

    pub fn alerts(&self) -> &ViewState<Vec<Alert>> {
        &self.alerts
    }

    pub fn unread_count(&self) -> usize {
        self.alerts
            .ready()
            .map_or(0, |alerts| alerts.iter().filter(|a| !a.is_read).count())
    }

    /// Re-fetch with the current filter.
    pub async fn refresh(&mut self) -> &ViewState<Vec<Alert>> {
        self.alerts = ViewState::Loading;
        self.alerts = ViewState::from_result(self.api.alerts(&self.filter).await);
        &self.alerts
    }

    /// Replace the filter and re-fetch, even if the filter did not change.
    pub async fn set_filter(&mut self, filter: AlertFilter) -> &ViewState<Vec<Alert>> {
        self.filter = filter;
        self.refresh().await
    }

    pub async fn mark_read(&mut self, id: i64) -> Result<()> {
        self.api.mark_alert_read(id).await?;
        self.patch(id, |alert| alert.is_read = true);
        Ok(())
    }

    pub async fn mark_resolved(&mut self, id: i64) -> Result<()> {
        self.api.mark_alert_resolved(id).await?;
        self.patch(id, |alert| alert.is_resolved = true);
        Ok(())
    }

    fn patch(&mut self, id: i64, update: impl FnOnce(&mut Alert)) {
        if let ViewState::Ready(alerts) = &mut self.alerts
            && let Some(alert) = alerts.iter_mut().find(|a| a.id == id)
        {
            update(alert);
        }
    }
}
