use serde::{Deserialize, Serialize};

use crate::sys::window::WindowId;

/// Point-in-time view of the manager, for diagnostics and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStateData {
    pub rows: usize,
    pub columns: usize,
    pub wrap_around: bool,
    pub current: usize,
    pub running: bool,
    /// The desktop provider failed at start; only window hotkeys work.
    pub degraded: bool,
    pub desktops: Vec<DesktopData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_relocation: Option<RelocationData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopData {
    pub index: usize,
    pub id: String,
    pub is_current: bool,
    pub is_occupied: bool,
    pub active_window: Option<WindowId>,
    pub browser_window: Option<WindowId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationData {
    pub trigger: WindowId,
    pub source: usize,
    pub age_ms: u64,
}

impl GridStateData {
    pub fn stopped(rows: usize, columns: usize, wrap_around: bool) -> GridStateData {
        GridStateData {
            rows,
            columns,
            wrap_around,
            current: 0,
            running: false,
            degraded: false,
            desktops: Vec::new(),
            pending_relocation: None,
        }
    }

    pub fn current_desktop(&self) -> Option<&DesktopData> {
        self.desktops.iter().find(|d| d.is_current)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_snapshot_shape() {
        let state = GridStateData {
            rows: 1,
            columns: 2,
            wrap_around: true,
            current: 1,
            running: true,
            degraded: false,
            desktops: vec![
                DesktopData {
                    index: 0,
                    id: "a".to_string(),
                    is_current: false,
                    is_occupied: true,
                    active_window: WindowId::new(5),
                    browser_window: None,
                },
                DesktopData {
                    index: 1,
                    id: "b".to_string(),
                    is_current: true,
                    is_occupied: false,
                    active_window: None,
                    browser_window: WindowId::new(9),
                },
            ],
            pending_relocation: None,
        };

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "rows": 1,
                "columns": 2,
                "wrap_around": true,
                "current": 1,
                "running": true,
                "degraded": false,
                "desktops": [
                    {"index": 0, "id": "a", "is_current": false, "is_occupied": true,
                     "active_window": 5, "browser_window": null},
                    {"index": 1, "id": "b", "is_current": true, "is_occupied": false,
                     "active_window": null, "browser_window": 9},
                ],
            })
        );
        assert_eq!(state.current_desktop().map(|d| d.index), Some(1));
    }

    #[test]
    fn pending_relocation_is_included_when_present() {
        let mut state = GridStateData::stopped(3, 3, false);
        state.pending_relocation = Some(RelocationData {
            trigger: WindowId::new(3).unwrap(),
            source: 4,
            age_ms: 120,
        });
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["pending_relocation"], json!({"trigger": 3, "source": 4, "age_ms": 120}));
        let back: GridStateData = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
