//! Notification command and query handlers.

mod broadcast_announcement;
mod list_user_notifications;
mod notify_donation_processed;

pub use broadcast_announcement::{BroadcastAnnouncementCommand, BroadcastAnnouncementHandler};
pub use list_user_notifications::{ListUserNotificationsHandler, ListUserNotificationsQuery};
pub use notify_donation_processed::{
    DonationNotificationOutcome, NotifyDonationProcessedCommand, NotifyDonationProcessedHandler,
    DONATION_NOTIFICATION_TITLE,
};
