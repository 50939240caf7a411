use tracing::trace;

/// Effect of a ref-count change on the stack's hardware layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwLayerTransition {
    /// Count went from zero to one; turn layers on.
    Enabled,
    /// Count dropped back to zero; turn layers off.
    Disabled,
    /// Count changed without crossing zero.
    Unchanged,
}

/// Reference count of animations and gestures that want hardware layers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HwLayers {
    count: u32,
}

impl HwLayers {
    /// Current count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Whether layers are currently requested.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.count > 0
    }

    /// Take a reference.
    pub fn acquire(&mut self) -> HwLayerTransition {
        trace!(from = self.count, to = self.count + 1, "hw layer ref");
        self.count += 1;
        if self.count == 1 {
            HwLayerTransition::Enabled
        } else {
            HwLayerTransition::Unchanged
        }
    }

    /// Drop a reference.
    ///
    /// # Panics
    /// When the count is already zero. A negative count means an animation or
    /// gesture released a reference it never took.
    pub fn release(&mut self) -> HwLayerTransition {
        assert!(self.count > 0, "invalid hw layers ref count: release without acquire");
        trace!(from = self.count, to = self.count - 1, "hw layer unref");
        self.count -= 1;
        if self.count == 0 {
            HwLayerTransition::Disabled
        } else {
            HwLayerTransition::Unchanged
        }
    }
}
