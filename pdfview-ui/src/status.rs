use std::time::Instant;

use pdfview_core::{FitMode, StatusSnapshot};

const READY: &str = "Ready";

/// Text model of the status bar; the window lays the labels out.
#[derive(Debug, Clone)]
pub struct StatusBar {
    snapshot: StatusSnapshot,
    message: String,
    /// When set, `expire` puts the message back to "Ready" after this instant.
    deadline: Option<Instant>,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            snapshot: StatusSnapshot::default(),
            message: READY.to_string(),
            deadline: None,
        }
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&mut self, snapshot: StatusSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.deadline = None;
    }

    /// Shows `message` until `until`, then falls back to "Ready".
    pub fn set_transient_message(&mut self, message: impl Into<String>, until: Instant) {
        self.message = message.into();
        self.deadline = Some(until);
    }

    pub fn message_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears a transient message whose deadline has passed; true when it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.clear_message();
                true
            }
            _ => false,
        }
    }

    fn clear_message(&mut self) {
        self.message = READY.to_string();
        self.deadline = None;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file_label(&self) -> String {
        match (&self.snapshot.file_name, &self.snapshot.file_size) {
            (Some(name), Some(size)) if !size.is_empty() => format!("File: {name} ({size})"),
            (Some(name), _) => format!("File: {name}"),
            (None, _) => "No document loaded".to_string(),
        }
    }

    pub fn page_label(&self) -> String {
        if self.snapshot.page_count == 0 {
            "Page: - / -".to_string()
        } else {
            format!("Page: {} / {}", self.snapshot.page, self.snapshot.page_count)
        }
    }

    pub fn zoom_label(&self) -> String {
        match self.snapshot.zoom {
            Some(zoom) => format!("Zoom: {:.0}%", zoom * 100.0),
            None => "Zoom: -".to_string(),
        }
    }

    pub fn mode_label(&self) -> String {
        let Some(zoom) = self.snapshot.zoom else {
            return "Mode: -".to_string();
        };
        let mode = match self.snapshot.fit_mode {
            FitMode::None if (zoom - 1.0).abs() < 1e-3 => "Actual Size",
            other => other.label(),
        };
        if self.snapshot.rotation.degrees() == 0 {
            format!("Mode: {mode}")
        } else {
            format!("Mode: {mode}, {}°", self.snapshot.rotation.degrees())
        }
    }

    /// All sections in display order.
    pub fn sections(&self) -> [String; 4] {
        [
            self.file_label(),
            self.page_label(),
            self.zoom_label(),
            self.mode_label(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pdfview_core::Rotation;

    use super::*;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            file_name: Some("report.pdf".into()),
            file_size: Some("1.50 MB".into()),
            page: 3,
            page_count: 12,
            zoom: Some(1.25),
            fit_mode: FitMode::None,
            rotation: Rotation::Deg0,
        }
    }

    #[test]
    fn empty_status_bar_shows_placeholders() {
        let bar = StatusBar::new();
        assert_eq!(
            bar.sections(),
            [
                "No document loaded".to_string(),
                "Page: - / -".to_string(),
                "Zoom: -".to_string(),
                "Mode: -".to_string(),
            ]
        );
        assert_eq!(bar.message(), "Ready");
    }

    #[test]
    fn snapshot_is_formatted_for_display() {
        let mut bar = StatusBar::new();
        bar.set_snapshot(snapshot());
        assert_eq!(bar.file_label(), "File: report.pdf (1.50 MB)");
        assert_eq!(bar.page_label(), "Page: 3 / 12");
        assert_eq!(bar.zoom_label(), "Zoom: 125%");
        assert_eq!(bar.mode_label(), "Mode: Manual");
    }

    #[test]
    fn mode_label_names_fit_modes_and_rotation() {
        let mut bar = StatusBar::new();
        bar.set_snapshot(StatusSnapshot {
            zoom: Some(1.0),
            ..snapshot()
        });
        assert_eq!(bar.mode_label(), "Mode: Actual Size");

        bar.set_snapshot(StatusSnapshot {
            fit_mode: FitMode::FitWidth,
            rotation: Rotation::Deg90,
            ..snapshot()
        });
        assert_eq!(bar.mode_label(), "Mode: Fit Width, 90°");
    }

    #[test]
    fn transient_message_falls_back_to_ready_after_deadline() {
        let start = Instant::now();
        let mut bar = StatusBar::new();
        bar.set_transient_message("Next page", start + Duration::from_secs(2));
        assert!(!bar.expire(start + Duration::from_secs(1)));
        assert_eq!(bar.message(), "Next page");
        assert!(bar.expire(start + Duration::from_secs(2)));
        assert_eq!(bar.message(), "Ready");
        assert_eq!(bar.message_deadline(), None);
    }

    #[test]
    fn regular_message_cancels_a_pending_reset() {
        let start = Instant::now();
        let mut bar = StatusBar::new();
        bar.set_transient_message("Previous page", start);
        bar.set_message("Document loaded successfully");
        assert!(!bar.expire(start + Duration::from_secs(5)));
        assert_eq!(bar.message(), "Document loaded successfully");
    }
}
