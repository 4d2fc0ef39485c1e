//! Activation policies for the reveal animation.

use std::str::FromStr;

use crate::types::Error;

/// Fraction of the element that must be visible before a view trigger fires.
pub const VISIBILITY_THRESHOLD: f32 = 0.1;

/// Which events start the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimateOn {
    /// First time the element scrolls into view.
    View,
    /// Every time the pointer enters the element.
    Hover,
    #[default]
    Both,
}

impl FromStr for AnimateOn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(AnimateOn::View),
            "hover" => Ok(AnimateOn::Hover),
            "both" => Ok(AnimateOn::Both),
            other => Err(Error::InvalidConfig(format!(
                "unsupported animate-on '{other}' (expected view, hover or both)"
            ))),
        }
    }
}

/// Arm / fire / disarm capability shared by the trigger strategies.
pub trait Trigger {
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
    /// Offer an activation; returns whether the animation should start.
    fn fire(&mut self) -> bool;
}

/// Fires once, then stays disarmed for the rest of its life.
#[derive(Debug, Clone, Default)]
pub struct OneShot {
    armed: bool,
    spent: bool,
}

impl OneShot {
    pub fn armed() -> Self {
        Self {
            armed: true,
            spent: false,
        }
    }
}

impl Trigger for OneShot {
    fn arm(&mut self) {
        self.armed = !self.spent;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn fire(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.spent = true;
        true
    }
}

/// Fires on every activation while armed.
#[derive(Debug, Clone, Default)]
pub struct Repeatable {
    armed: bool,
}

impl Repeatable {
    pub fn armed() -> Self {
        Self { armed: true }
    }
}

impl Trigger for Repeatable {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn fire(&mut self) -> bool {
        self.armed
    }
}

/// The view and hover triggers of one animator.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    view: OneShot,
    hover: Repeatable,
}

impl From<AnimateOn> for TriggerSet {
    fn from(on: AnimateOn) -> Self {
        let mut set = TriggerSet::default();
        if matches!(on, AnimateOn::View | AnimateOn::Both) {
            set.view.arm();
        }
        if matches!(on, AnimateOn::Hover | AnimateOn::Both) {
            set.hover.arm();
        }
        set
    }
}

impl TriggerSet {
    /// Report the visible fraction of the element.
    pub fn on_visibility(&mut self, ratio: f32) -> bool {
        ratio >= VISIBILITY_THRESHOLD && self.view.fire()
    }

    pub fn on_pointer_enter(&mut self) -> bool {
        self.hover.fire()
    }

    /// Whether pointer interaction does anything (views show a hand cursor).
    pub fn wants_hover(&self) -> bool {
        self.hover.is_armed()
    }

    pub fn disarm_all(&mut self) {
        self.view.disarm();
        self.hover.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once_and_never_rearms() {
        let mut t = OneShot::armed();
        assert!(t.fire());
        assert!(!t.fire());
        t.arm();
        assert!(!t.is_armed());
        assert!(!t.fire());
    }

    #[test]
    fn repeatable_fires_until_disarmed() {
        let mut t = Repeatable::armed();
        assert!(t.fire());
        assert!(t.fire());
        t.disarm();
        assert!(!t.fire());
    }

    #[test]
    fn visibility_threshold() {
        let mut set = TriggerSet::from(AnimateOn::View);
        assert!(!set.on_visibility(0.05));
        assert!(set.on_visibility(0.1));
        assert!(!set.on_visibility(1.0));
        assert!(!set.on_pointer_enter());
    }

    #[test]
    fn hover_only_ignores_visibility() {
        let mut set = TriggerSet::from(AnimateOn::Hover);
        assert!(!set.on_visibility(1.0));
        assert!(set.on_pointer_enter());
        assert!(set.on_pointer_enter());
        assert!(set.wants_hover());
    }

    #[test]
    fn parse_animate_on() {
        assert_eq!("both".parse::<AnimateOn>().unwrap(), AnimateOn::Both);
        assert!("click".parse::<AnimateOn>().is_err());
    }
}
