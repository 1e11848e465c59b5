//! Column picker - which of a page's columns the grid shows

/// One grid column: display name, row-field key, preferred width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    pub prop: &'static str,
    pub width: u16,
    pub sortable: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, prop: &'static str, width: u16) -> Self {
        Self {
            name,
            prop,
            width,
            sortable: true,
        }
    }

    /// A column that never participates in sorting (actions, toggles)
    pub const fn unsortable(name: &'static str, prop: &'static str, width: u16) -> Self {
        Self {
            name,
            prop,
            width,
            sortable: false,
        }
    }
}

/// All columns of a page plus the visible subset
#[derive(Debug, Clone)]
pub struct ColumnPicker {
    all: Vec<ColumnDef>,
    visible: Vec<bool>,
}

impl ColumnPicker {
    /// `initially` names the columns shown before the operator customizes
    pub fn new(all: Vec<ColumnDef>, initially: &[&str]) -> Self {
        let visible = all.iter().map(|c| initially.contains(&c.name)).collect();
        Self { all, visible }
    }

    /// Every column visible from the start
    pub fn all_visible(all: Vec<ColumnDef>) -> Self {
        let visible = vec![true; all.len()];
        Self { all, visible }
    }

    pub fn all(&self) -> &[ColumnDef] {
        &self.all
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(flag) = self.visible.get_mut(index) {
            *flag = !*flag;
        }
    }

    /// Visible columns in declaration order
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.all
            .iter()
            .zip(&self.visible)
            .filter(|(_, &v)| v)
            .map(|(c, _)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker() -> ColumnPicker {
        ColumnPicker::new(
            vec![
                ColumnDef::new("User Name", "userName", 20),
                ColumnDef::new("Email", "email", 25),
                ColumnDef::unsortable("Actions", "actions", 10),
            ],
            &["User Name", "Actions"],
        )
    }

    #[test]
    fn test_initial_visibility_by_name() {
        let p = picker();
        let visible: Vec<&str> = p.visible_columns().iter().map(|c| c.name).collect();
        assert_eq!(visible, vec!["User Name", "Actions"]);
    }

    #[test]
    fn test_toggle_flips_visibility() {
        let mut p = picker();
        p.toggle(1);
        assert!(p.is_visible(1));
        p.toggle(1);
        assert!(!p.is_visible(1));
        // Out-of-range toggles are ignored
        p.toggle(9);
    }
}
