//! Registry of open application instances and which generation controls them.

use std::collections::HashMap;

/// Open application instances keyed by client id.
///
/// An instance opened while no generation was active stays uncontrolled
/// (its requests pass through) until a claim.
#[derive(Debug, Default)]
pub struct Clients {
    controllers: HashMap<String, Option<String>>,
}

impl Clients {
    /// Register an instance; re-registering keeps its current controller.
    pub fn register(&mut self, id: &str, controller: Option<&str>) -> Option<String> {
        self.controllers
            .entry(id.to_string())
            .or_insert_with(|| controller.map(String::from))
            .clone()
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.controllers.remove(id).is_some()
    }

    /// `None` for unknown ids, `Some(None)` for known but uncontrolled ones.
    pub fn controller(&self, id: &str) -> Option<Option<&str>> {
        self.controllers.get(id).map(|c| c.as_deref())
    }

    /// Put every instance under `generation`. Returns how many changed controller.
    pub fn claim(&mut self, generation: &str) -> usize {
        let mut changed = 0;
        for controller in self.controllers.values_mut() {
            if controller.as_deref() != Some(generation) {
                *controller = Some(generation.to_string());
                changed += 1;
            }
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn uncontrolled(&self) -> usize {
        self.controllers.values().filter(|c| c.is_none()).count()
    }
}
