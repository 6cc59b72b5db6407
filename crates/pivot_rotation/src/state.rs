//! # Rotation State
//!
//! Recomputed once per tick from the active request.
//!
//! | View | Consumer | Follows |
//! |------|----------|---------|
//! | `network` | outbound movement messages | target, bounded by turn speed |
//! | `render` | head/body drawing | `network`, per render smoothing |
//! | `interaction` | aim, line of sight | `render` or `network` per request |
//!
//! `server` and `previous_server` hold the last two rotations actually sent;
//! the network view always steps from `server`.

use pivot_shared::Rotation;

/// Which derived value to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotationView {
    /// Reported to the peer.
    Network,
    /// Drawn locally.
    Render,
    /// Used by aim math.
    Interaction,
}

/// Snapshot of every derived value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    /// Value for outbound movement state.
    pub network: Rotation,
    /// Value for local head/body rendering.
    pub render: Rotation,
    /// Render value of the previous tick, for frame interpolation.
    pub previous_render: Rotation,
    /// Value for aim and line-of-sight math.
    pub interaction: Rotation,
    /// Last rotation sent to the peer.
    pub server: Rotation,
    /// The one sent before that.
    pub previous_server: Rotation,
}

impl RotationState {
    /// Every view set to `rotation`.
    #[must_use]
    pub fn uniform(rotation: Rotation) -> Self {
        Self {
            network: rotation,
            render: rotation,
            previous_render: rotation,
            interaction: rotation,
            server: rotation,
            previous_server: rotation,
        }
    }

    /// Reads one view.
    #[must_use]
    pub fn view(&self, view: RotationView) -> Rotation {
        match view {
            RotationView::Network => self.network,
            RotationView::Render => self.render,
            RotationView::Interaction => self.interaction,
        }
    }
}
