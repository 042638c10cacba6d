//! Back-reference bookkeeping for the User → Project → Task tree.
//!
//! `User::projects` and `Project::tasks` are denormalized copies of the children's forward
//! reference (`Project::owner`, `Task::project`). Stores keep them in lockstep by routing
//! every create/delete through [`attach`] / [`detach`] inside the same atomic unit as the
//! child write. [`divergences`] reports any mismatch.

use uuid::Uuid;

/// Appends `child` unless it is already present. Returns whether the collection changed.
pub fn attach(refs: &mut Vec<Uuid>, child: Uuid) -> bool {
    if refs.contains(&child) {
        return false;
    }
    refs.push(child);
    true
}

/// Removes `child`. Removing an absent id is a no-op.
pub fn detach(refs: &mut Vec<Uuid>, child: Uuid) -> bool {
    let before = refs.len();
    refs.retain(|id| *id != child);
    refs.len() != before
}

/// Whether a collection of this size may take one more child.
pub fn has_room(refs: &[Uuid], limit: usize) -> bool {
    refs.len() < limit
}

/// A mismatch between a parent's back-reference collection and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// Listed in the parent's collection but no child points back at the parent.
    Dangling { parent: Uuid, child: Uuid },
    /// Points at the parent but is missing from the parent's collection.
    Unlisted { parent: Uuid, child: Uuid },
}

/// Compares one parent's collection against `(child_id, child_parent_id)` pairs.
pub fn divergences<I>(parent: Uuid, refs: &[Uuid], children: I) -> Vec<Divergence>
where
    I: IntoIterator<Item = (Uuid, Uuid)>,
{
    let pointing_back: Vec<Uuid> = children
        .into_iter()
        .filter(|(_, child_parent)| *child_parent == parent)
        .map(|(child, _)| child)
        .collect();

    let dangling = refs
        .iter()
        .filter(|id| !pointing_back.contains(id))
        .map(|&child| Divergence::Dangling { parent, child });
    let unlisted = pointing_back
        .iter()
        .filter(|id| !refs.contains(id))
        .map(|&child| Divergence::Unlisted { parent, child });

    dangling.chain(unlisted).collect()
}
