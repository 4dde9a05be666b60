//! Read-only tab queries and cross-context messaging

use serde::{Deserialize, Serialize};

use crate::types::{Mode, Tab, TabId, WindowId};

// =============================================================================
// Tab Query
// =============================================================================

/// Filter for `TabQuery::query`. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabFilter {
    pub active: Option<bool>,
    pub window_id: Option<WindowId>,
}

impl TabFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        self.active.map_or(true, |active| tab.active == active)
            && self.window_id.map_or(true, |id| tab.window_id == id)
    }
}

/// Tab listing capability.
pub trait TabQuery {
    fn query(&self, filter: &TabFilter) -> Vec<Tab>;
    fn tab(&self, id: TabId) -> Option<Tab>;
}

impl TabQuery for [Tab] {
    fn query(&self, filter: &TabFilter) -> Vec<Tab> {
        self.iter().filter(|tab| filter.matches(tab)).cloned().collect()
    }

    fn tab(&self, id: TabId) -> Option<Tab> {
        self.iter().find(|tab| tab.id == id).cloned()
    }
}

impl TabQuery for Vec<Tab> {
    fn query(&self, filter: &TabFilter) -> Vec<Tab> {
        self.as_slice().query(filter)
    }

    fn tab(&self, id: TabId) -> Option<Tab> {
        self.as_slice().tab(id)
    }
}

// =============================================================================
// Messaging
// =============================================================================

/// Same-extension broadcast. Serializes as `{"toggle":true}` or
/// `{"modeChange":"global"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Message {
    Toggle(bool),
    ModeChange(Mode),
}

impl Message {
    pub fn toggled() -> Self {
        Self::Toggle(true)
    }
}

/// Best-effort delivery to currently open views.
pub trait Broadcast {
    fn broadcast(&mut self, message: &Message);
}

impl Broadcast for Vec<Message> {
    fn broadcast(&mut self, message: &Message) {
        self.push(*message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tab(id: TabId, window_id: WindowId, active: bool) -> Tab {
        Tab { id, url: None, active, window_id }
    }

    #[test]
    fn test_query_filters() {
        let tabs = vec![tab(1, 1, true), tab(2, 1, false), tab(3, 2, true)];
        assert_eq!(tabs.query(&TabFilter::all()).len(), 3);

        let active = tabs.query(&TabFilter { active: Some(true), window_id: None });
        assert_eq!(active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

        let focused = tabs.query(&TabFilter { active: Some(true), window_id: Some(2) });
        assert_eq!(focused.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);

        assert_eq!(tabs.tab(2).map(|t| t.id), Some(2));
        assert_eq!(tabs.tab(9), None);
    }

    #[test]
    fn test_message_wire_shape() {
        assert_eq!(serde_json::to_value(Message::toggled()).unwrap(), json!({"toggle": true}));
        assert_eq!(
            serde_json::to_value(Message::ModeChange(Mode::Global)).unwrap(),
            json!({"modeChange": "global"})
        );
        let parsed: Message = serde_json::from_value(json!({"modeChange": "persite"})).unwrap();
        assert_eq!(parsed, Message::ModeChange(Mode::PerSite));
    }
}
