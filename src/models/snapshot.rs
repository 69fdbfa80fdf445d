use serde::{Deserialize, Serialize};

use super::{Regimen, Window};

/// The complete durable state of a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub windows: Vec<Window>,
    pub regimens: Vec<Regimen>,
}
