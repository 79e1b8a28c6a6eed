//! Window creation hints.

/// A single window or framebuffer property requested at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowHint {
    Visible,
    Resizable,
    Decorated,
    Focused,
    Maximized,
    /// Keep the window above all others
    Floating,
    /// Request an alpha channel in the framebuffer
    Transparent,
    DoubleBuffer,
}

impl WindowHint {
    pub const ALL: [WindowHint; 8] = [
        WindowHint::Visible,
        WindowHint::Resizable,
        WindowHint::Decorated,
        WindowHint::Focused,
        WindowHint::Maximized,
        WindowHint::Floating,
        WindowHint::Transparent,
        WindowHint::DoubleBuffer,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of [`WindowHint`]s. Empty by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHints(u16);

impl WindowHints {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Visible, resizable, decorated, focused and double-buffered.
    pub fn default_hints() -> Self {
        Self::empty()
            .with(WindowHint::Visible)
            .with(WindowHint::Resizable)
            .with(WindowHint::Decorated)
            .with(WindowHint::Focused)
            .with(WindowHint::DoubleBuffer)
    }

    pub fn with(self, hint: WindowHint) -> Self {
        Self(self.0 | hint.bit())
    }

    pub fn without(self, hint: WindowHint) -> Self {
        Self(self.0 & !hint.bit())
    }

    pub fn set(&mut self, hint: WindowHint, enabled: bool) {
        *self = if enabled {
            self.with(hint)
        } else {
            self.without(hint)
        };
    }

    pub fn contains(&self, hint: WindowHint) -> bool {
        self.0 & hint.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = WindowHint> + '_ {
        WindowHint::ALL.into_iter().filter(|hint| self.contains(*hint))
    }
}

impl FromIterator<WindowHint> for WindowHints {
    fn from_iter<I: IntoIterator<Item = WindowHint>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(WindowHints::default().is_empty());
    }

    #[test]
    fn test_default_hints() {
        let hints = WindowHints::default_hints();
        assert!(hints.contains(WindowHint::Visible));
        assert!(hints.contains(WindowHint::DoubleBuffer));
        assert!(!hints.contains(WindowHint::Maximized));
        assert_eq!(hints.iter().count(), 5);
    }

    #[test]
    fn test_set_and_collect() {
        let mut hints: WindowHints = [WindowHint::Floating, WindowHint::Transparent]
            .into_iter()
            .collect();
        hints.set(WindowHint::Floating, false);
        hints.set(WindowHint::Maximized, true);
        assert_eq!(
            hints.iter().collect::<Vec<_>>(),
            vec![WindowHint::Maximized, WindowHint::Transparent]
        );
    }
}
