/// What an action does once it has been selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// POST a freshly generated order to `path` on the profile's host.
    PostOrder { path: String },
    /// Disabled placeholder. Takes part in selection but never touches the network.
    Noop,
}

/// One weighted, selectable unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    name: String,
    weight: u32,
    kind: ActionKind,
}

impl Action {
    pub fn new(name: &str, weight: u32, kind: ActionKind) -> Self {
        Self {
            name: name.to_string(),
            weight,
            kind,
        }
    }

    pub fn post(name: &str, weight: u32, path: &str) -> Self {
        Self::new(
            name,
            weight,
            ActionKind::PostOrder {
                path: path.to_string(),
            },
        )
    }

    pub fn noop(name: &str, weight: u32) -> Self {
        Self::new(name, weight, ActionKind::Noop)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Zero weight actions are never selected.
    pub fn is_enabled(&self) -> bool {
        self.weight > 0
    }
}
