use crate::config::{Permission, Settings};
use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;

pub const ENABLED_TITLE: &str = "Notifications enabled";
pub const ENABLED_BODY: &str = "You will receive gentle reminders here.";

/// Permission-gated notification delivery.
pub trait Notifier: Send + Sync {
    /// Current permission. Read fresh on every call.
    fn permission(&self) -> Permission;
    fn dispatch(&self, title: &str, body: &str) -> Result<()>;
}

/// Desktop notifications, with the permission stored in the user's settings file.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    settings_path: PathBuf,
}

impl DesktopNotifier {
    pub fn new(settings_path: PathBuf) -> Self {
        DesktopNotifier { settings_path }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        Settings::load(&self.settings_path).notifications
    }

    fn dispatch(&self, title: &str, body: &str) -> Result<()> {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname("bloom")
            .show()
            .map(|_| ())
            .context("showing desktop notification")
    }
}

/// Asks the user for notification permission and records the answer.
///
/// `ask` resolves once the user has answered. A grant is confirmed with a
/// notification straight away.
pub async fn request_permission<F>(
    notifier: &dyn Notifier,
    settings_path: &std::path::Path,
    ask: F,
) -> Result<Permission>
where
    F: Future<Output = Result<bool>>,
{
    let allowed = ask.await?;
    let permission = if allowed {
        Permission::Granted
    } else {
        Permission::Denied
    };
    let mut settings = Settings::load(settings_path);
    settings.notifications = permission;
    settings.save(settings_path)?;
    tracing::info!(permission = permission.label(), "notification permission updated");
    if permission == Permission::Granted {
        notifier
            .dispatch(ENABLED_TITLE, ENABLED_BODY)
            .context("Your system may not support notifications.")?;
    }
    Ok(permission)
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[tokio::test]
    async fn granting_saves_permission_and_confirms() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.yml");
        let notifier = RecordingNotifier::default();
        let permission = request_permission(&notifier, &path, async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(permission, Permission::Granted);
        assert_eq!(Settings::load(&path).notifications, Permission::Granted);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent()[0].0, ENABLED_TITLE);
    }

    #[tokio::test]
    async fn denying_sends_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.yml");
        let notifier = RecordingNotifier::default();
        let permission = request_permission(&notifier, &path, async { Ok(false) })
            .await
            .unwrap();
        assert_eq!(permission, Permission::Denied);
        assert_eq!(Settings::load(&path).notifications, Permission::Denied);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn desktop_permission_follows_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.yml");
        let notifier = DesktopNotifier::new(path.clone());
        assert_eq!(notifier.permission(), Permission::Default);
        let settings = Settings {
            notifications: Permission::Granted,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(notifier.permission(), Permission::Granted);
    }
}
