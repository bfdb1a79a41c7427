use crate::DomRect;

/// A user-facing message the host should surface (toast, banner, status line).
///
/// The host owns the localized strings, only the message key is provided here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A selection was refused by the validator. `reason` is the kebab-case failure code.
    SelectionRejected { reason: &'static str },
    /// A selection could not be turned into an anchor.
    SelectionFailed,
}

impl Notice {
    pub fn message_key(&self) -> String {
        match self {
            Notice::SelectionRejected { reason } => {
                format!("smartcomment-validation-error-{reason}")
            }
            Notice::SelectionFailed => "smartcomment-selection-error".to_string(),
        }
    }
}

pub trait NotificationProvider {
    fn notify(&self, notice: Notice) {
        let _ = notice;
    }
}

pub struct DummyNotificationProvider;
impl NotificationProvider for DummyNotificationProvider {}

/// Captures a picture of a region of the page, returned as a data URL.
pub trait ScreenshotProvider {
    fn capture(&self, rect: DomRect) -> Option<String> {
        let _ = rect;
        None
    }
}

pub struct DummyScreenshotProvider;
impl ScreenshotProvider for DummyScreenshotProvider {}

#[test]
fn notice_message_keys() {
    let notice = Notice::SelectionRejected {
        reason: "already-commented",
    };
    assert_eq!(
        notice.message_key(),
        "smartcomment-validation-error-already-commented"
    );
    assert_eq!(
        Notice::SelectionFailed.message_key(),
        "smartcomment-selection-error"
    );
}
