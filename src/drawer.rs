use tracing::{debug, trace};

use crate::columns::{ColumnDescriptor, ColumnRegistry};

/// "Column settings" drawer. Edits a private copy of a registry; nothing reaches the
/// registry until `apply`.
#[derive(Debug, Default)]
pub struct ColumnDrawer {
    local: Option<Vec<ColumnDescriptor>>,
    curser: usize,
}

impl ColumnDrawer {
    pub fn open(&mut self, registry: &ColumnRegistry) {
        self.local = Some(registry.columns().to_vec());
        self.curser = 0;
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.local.as_deref().unwrap_or(&[])
    }

    pub fn curser(&self) -> usize {
        self.curser
    }

    pub fn move_up(&mut self) {
        self.curser = self.curser.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.columns().len();
        if self.curser + 1 < len {
            self.curser += 1;
        }
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(column) = self
            .local
            .as_mut()
            .and_then(|cols| cols.iter_mut().find(|c| c.id == id))
        {
            column.visible = !column.visible;
            trace!("Drawer: {} visible={}", column.id, column.visible);
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.columns().get(self.curser).map(|c| c.id.clone()) {
            self.toggle(&id);
        }
    }

    /// Writes the edited copy into `registry` and closes. Returns false if the drawer was closed.
    pub fn apply(&mut self, registry: &mut ColumnRegistry) -> bool {
        match self.local.take() {
            Some(columns) => {
                debug!(
                    "Applying column settings: {} of {} visible",
                    columns.iter().filter(|c| c.visible).count(),
                    columns.len()
                );
                registry.replace(columns);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.local = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::RecordShape;

    #[test]
    fn apply_changes_exactly_the_toggled_column() {
        let mut registry = ColumnRegistry::for_shape(RecordShape::Normal).unwrap();
        let before = registry.clone();
        let mut drawer = ColumnDrawer::default();
        drawer.open(&registry);
        drawer.toggle("duration");
        assert!(drawer.apply(&mut registry));
        assert!(drawer.columns().is_empty());

        for (old, new) in before.columns().iter().zip(registry.columns()) {
            if old.id == "duration" {
                assert_eq!(new.visible, !old.visible);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn cancel_leaves_registry_untouched() {
        let mut registry = ColumnRegistry::for_shape(RecordShape::Reservation).unwrap();
        let before = registry.clone();
        let mut drawer = ColumnDrawer::default();
        drawer.open(&registry);
        drawer.toggle("micrositeId");
        drawer.toggle("lotName");
        drawer.cancel();
        assert!(!drawer.apply(&mut registry));
        assert_eq!(registry, before);
    }

    #[test]
    fn sticky_columns_can_be_hidden() {
        let mut registry = ColumnRegistry::for_shape(RecordShape::Normal).unwrap();
        let mut drawer = ColumnDrawer::default();
        drawer.open(&registry);
        drawer.toggle_selected();
        drawer.apply(&mut registry);
        let supplier = registry.get("supplier").unwrap();
        assert!(supplier.sticky);
        assert!(!supplier.visible);
    }

    #[test]
    fn curser_stays_inside_the_list() {
        let registry = ColumnRegistry::for_shape(RecordShape::Normal).unwrap();
        let mut drawer = ColumnDrawer::default();
        drawer.open(&registry);
        drawer.move_up();
        assert_eq!(drawer.curser(), 0);
        for _ in 0..100 {
            drawer.move_down();
        }
        assert_eq!(drawer.curser(), registry.len() - 1);
    }
}
