//! Shared application state for every HTTP route.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::adapters::websocket::Hub;
use crate::application::handlers::notification::{
    BroadcastAnnouncementHandler, ListUserNotificationsHandler, NotifyDonationProcessedHandler,
};
use crate::ports::{NotificationRepository, SessionValidator};

use super::middleware::AuthState;

/// Cloned per request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub session_validator: Arc<dyn SessionValidator>,
    pub notification_repository: Arc<dyn NotificationRepository>,
}

impl AppState {
    pub fn new(
        hub: Hub,
        session_validator: Arc<dyn SessionValidator>,
        notification_repository: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            hub,
            session_validator,
            notification_repository,
        }
    }

    pub fn list_notifications_handler(&self) -> ListUserNotificationsHandler {
        ListUserNotificationsHandler::new(self.notification_repository.clone())
    }

    pub fn broadcast_announcement_handler(&self) -> BroadcastAnnouncementHandler {
        BroadcastAnnouncementHandler::new(Arc::new(self.hub.clone()))
    }

    /// Entry point for an external donation service to report a processed
    /// donation. Nothing in this crate processes payments itself.
    pub fn donation_notifier(&self) -> Arc<NotifyDonationProcessedHandler> {
        Arc::new(NotifyDonationProcessedHandler::new(
            self.notification_repository.clone(),
            Arc::new(self.hub.clone()),
        ))
    }
}

impl FromRef<AppState> for Hub {
    fn from_ref(state: &AppState) -> Self {
        state.hub.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.session_validator.clone()
    }
}
