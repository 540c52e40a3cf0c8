//! Programmable interrupt controller (component E, §4.5).
//!
//! Maintains two 32-bit bitmaps — `pending` (lines raised and not yet
//! delivered) and `served` (lines currently being handled) — against a
//! configured mask mirrored from `PICMR`. The CPU polls [`InterruptController::poll`]
//! once per cycle, before fetch, and is responsible for mirroring the result
//! back into the SPR file's `PICSR` and for routing `SprEffect::InterruptMaskChanged`/
//! `InterruptStatusCleared` back into [`InterruptController::set_mask`]/
//! [`InterruptController::clear`].

use crate::config::PicConfig;

/// Line treated as non-maskable when `use_nmi` is configured. Bypasses the
/// mask but not the global enable (§4.5).
const NMI_LINE: u32 = 0;

/// The interrupt controller.
pub struct InterruptController {
    enabled: bool,
    edge_triggered: bool,
    use_nmi: bool,
    mask: u32,
    pending: u32,
    served: u32,
}

impl InterruptController {
    /// Builds a controller from the `pic` configuration section.
    #[must_use]
    pub fn new(config: &PicConfig) -> Self {
        Self {
            enabled: config.enabled,
            edge_triggered: config.edge_triggered,
            use_nmi: config.use_nmi,
            mask: 0,
            pending: 0,
            served: 0,
        }
    }

    /// Sets the interrupt mask (`PICMR`). Takes effect immediately.
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Raises `line`, subject to the configured mask unless it is the NMI
    /// line. On an edge-triggered line already being served, this is a
    /// no-op: asserting twice before the handler completes delivers exactly
    /// one exception.
    pub fn raise(&mut self, line: u32) {
        if !self.enabled || line >= 32 {
            return;
        }
        let bit = 1u32 << line;
        if self.edge_triggered && self.served & bit != 0 {
            return;
        }
        let is_nmi = self.use_nmi && line == NMI_LINE;
        if is_nmi || self.mask & bit != 0 {
            self.pending |= bit;
        }
    }

    /// Synchronous assertion from within the executor's context, between
    /// instructions. Identical semantics to [`InterruptController::raise`].
    pub fn report(&mut self, line: u32) {
        self.raise(line);
    }

    /// Deasserts `line`. Only meaningful for level-triggered mode (where it
    /// is how the source says its condition is gone) but also ends the
    /// "being served" window for an edge-triggered line, letting it be
    /// raised again.
    pub fn clear(&mut self, line: u32) {
        if line >= 32 {
            return;
        }
        let bit = 1u32 << line;
        self.pending &= !bit;
        self.served &= !bit;
    }

    /// Returns the raw pending bitmap, for mirroring into `PICSR`.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Whether this controller's lines are configured edge-triggered.
    /// Used by the embedding API (§6A) to log and ignore an assertion kind
    /// that doesn't match the configured trigger mode, rather than
    /// propagating a mismatch (§7).
    #[must_use]
    pub fn is_edge_triggered(&self) -> bool {
        self.edge_triggered
    }

    /// Picks the lowest-numbered deliverable line and marks it served. Edge-
    /// triggered lines are auto-cleared from `pending` at delivery; level-
    /// triggered lines remain pending and will be picked again next cycle
    /// unless the handler calls [`InterruptController::clear`].
    ///
    /// `global_enable` is the CPU's interrupt-enable bit (`SR[IEE]`); when
    /// false, nothing is delivered even if lines are pending.
    pub fn poll(&mut self, global_enable: bool) -> Option<u32> {
        if !self.enabled || !global_enable {
            return None;
        }
        for line in 0..32u32 {
            let bit = 1u32 << line;
            if self.pending & bit == 0 {
                continue;
            }
            let is_nmi = self.use_nmi && line == NMI_LINE;
            if !is_nmi && self.mask & bit == 0 {
                continue;
            }
            self.served |= bit;
            if self.edge_triggered {
                self.pending &= !bit;
            }
            return Some(line);
        }
        None
    }
}
