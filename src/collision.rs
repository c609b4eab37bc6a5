use crate::components::{Pos, PowerupKind};
use crate::powerup::ActiveEffect;
use crate::shadow::ShadowClone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Clear,
    /// A clone shares the player's tile but cloak is up.
    Shielded,
    Caught,
}

/// Checks live clones against the player's tile. Frozen clones are harmless
/// until thawed; exhausted ones keep standing guard on their last tile.
pub fn resolve(
    player: Pos,
    clones: &[ShadowClone],
    effect: Option<ActiveEffect>,
    now_ms: u64,
) -> Collision {
    let hit = clones
        .iter()
        .any(|c| !c.is_frozen() && c.position() == player);
    if !hit {
        return Collision::Clear;
    }
    let cloaked = effect.is_some_and(|e| e.kind == PowerupKind::Cloak && e.is_active(now_ms));
    if cloaked {
        Collision::Shielded
    } else {
        Collision::Caught
    }
}
