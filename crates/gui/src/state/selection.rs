//! Canonical selection model and the bridge that fans it out.
//!
//! Both renderers and the tree panel consume one [`SelectionBridge`]:
//! renderers poll the version counter for cache invalidation, the tree
//! panel drains change notifications. A KAD vertex selection carries
//! the owning entity and the vertex ID in a single variant, so the
//! half-null pair that used to break highlight drawing cannot be
//! represented at all.

use shared::{Drawing, EntityName, HoleRef, KadEntity, KadVertex};
use std::collections::HashSet;

/// What is currently selected
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    /// One or more holes, in selection order
    Holes(Vec<HoleRef>),
    /// A whole KAD entity
    KadEntity(EntityName),
    /// A single KAD vertex: both halves of the pair, always
    KadVertex { entity: EntityName, point_id: u64 },
    /// Mixed selection across kinds
    Multiple {
        holes: Vec<HoleRef>,
        entities: Vec<EntityName>,
    },
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// Selected hole references, regardless of variant
    pub fn holes(&self) -> &[HoleRef] {
        match self {
            Selection::Holes(holes) => holes,
            Selection::Multiple { holes, .. } => holes,
            _ => &[],
        }
    }

    /// Selected KAD entity names, regardless of variant
    pub fn kad_entities(&self) -> Vec<&str> {
        match self {
            Selection::KadEntity(name) => vec![name.as_str()],
            Selection::KadVertex { entity, .. } => vec![entity.as_str()],
            Selection::Multiple { entities, .. } => entities.iter().map(|e| e.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Notification kind mirrored to the tree panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionKind {
    Hole,
    KadEntity,
    KadVertex,
    Multiple,
    Cleared,
}

/// One change notification: `(kind, entityName, id)`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNotice {
    pub kind: SelectionKind,
    pub entity_name: EntityName,
    pub id: String,
}

/// Owner of the canonical selection, single writer per session
#[derive(Default)]
pub struct SelectionBridge {
    current: Selection,
    version: u64,
    pending: Vec<SelectionNotice>,
}

impl SelectionBridge {
    pub fn selection(&self) -> &Selection {
        &self.current
    }

    /// Version counter for renderer cache invalidation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the selection and queue notifications
    pub fn set(&mut self, selection: Selection) {
        if self.current == selection {
            return;
        }
        self.current = selection;
        self.version += 1;
        self.queue_notices();
    }

    pub fn clear(&mut self) {
        self.set(Selection::None);
    }

    /// Select a single hole (clears previous selection)
    pub fn select_hole(&mut self, reference: HoleRef) {
        self.set(Selection::Holes(vec![reference]));
    }

    /// Toggle a hole in/out of the selection (ctrl-click behavior)
    pub fn toggle_hole(&mut self, reference: HoleRef) {
        let mut holes = self.current.holes().to_vec();
        if let Some(pos) = holes.iter().position(|h| h == &reference) {
            holes.remove(pos);
        } else {
            holes.push(reference);
        }
        if holes.is_empty() {
            self.set(Selection::None);
        } else {
            self.set(Selection::Holes(holes));
        }
    }

    pub fn select_kad_entity(&mut self, name: impl Into<EntityName>) {
        self.set(Selection::KadEntity(name.into()));
    }

    /// Select a KAD vertex. Both halves are required up front.
    pub fn select_kad_vertex(&mut self, entity: impl Into<EntityName>, point_id: u64) {
        self.set(Selection::KadVertex {
            entity: entity.into(),
            point_id,
        });
    }

    /// Take all queued notifications (tree panel consumes these)
    pub fn drain_notifications(&mut self) -> Vec<SelectionNotice> {
        std::mem::take(&mut self.pending)
    }

    /// Combined keys of all selected holes, for renderer highlight sets
    pub fn selected_hole_keys(&self) -> HashSet<String> {
        self.current.holes().iter().map(|h| h.combined()).collect()
    }

    /// First selected KAD entity name, for renderer highlight
    pub fn selected_kad_name(&self) -> Option<&str> {
        self.current.kad_entities().first().copied()
    }

    /// Resolve a vertex selection against the drawing. Returns None —
    /// and highlight drawing is skipped — unless the entity AND the
    /// vertex both still exist.
    pub fn resolve_vertex<'a>(&self, drawing: &'a Drawing) -> Option<(&'a KadEntity, &'a KadVertex)> {
        let Selection::KadVertex { entity, point_id } = &self.current else {
            return None;
        };
        let entity = drawing.kad.get(entity)?;
        let vertex = entity.geometry.vertex(*point_id)?;
        Some((entity, vertex))
    }

    /// Drop references that no longer resolve against the drawing.
    /// Deletion paths call this so stale selections never linger.
    pub fn prune(&mut self, drawing: &Drawing) {
        let pruned = match &self.current {
            Selection::None => return,
            Selection::Holes(holes) => {
                let kept: Vec<HoleRef> = holes
                    .iter()
                    .filter(|r| drawing.hole(&r.entity_name, &r.hole_id).is_some())
                    .cloned()
                    .collect();
                if kept.len() == holes.len() {
                    return;
                }
                if kept.is_empty() {
                    Selection::None
                } else {
                    Selection::Holes(kept)
                }
            }
            Selection::KadEntity(name) => {
                if drawing.kad.contains_key(name) {
                    return;
                }
                Selection::None
            }
            Selection::KadVertex { .. } => {
                if self.resolve_vertex(drawing).is_some() {
                    return;
                }
                Selection::None
            }
            Selection::Multiple { holes, entities } => {
                let holes: Vec<HoleRef> = holes
                    .iter()
                    .filter(|r| drawing.hole(&r.entity_name, &r.hole_id).is_some())
                    .cloned()
                    .collect();
                let entities: Vec<EntityName> = entities
                    .iter()
                    .filter(|e| drawing.kad.contains_key(*e))
                    .cloned()
                    .collect();
                match (holes.is_empty(), entities.is_empty()) {
                    (true, true) => Selection::None,
                    (false, true) => Selection::Holes(holes),
                    (true, false) if entities.len() == 1 => Selection::KadEntity(entities[0].clone()),
                    _ => Selection::Multiple { holes, entities },
                }
            }
        };
        self.set(pruned);
    }

    fn queue_notices(&mut self) {
        match &self.current {
            Selection::None => self.pending.push(SelectionNotice {
                kind: SelectionKind::Cleared,
                entity_name: String::new(),
                id: String::new(),
            }),
            Selection::Holes(holes) => {
                let kind = if holes.len() > 1 {
                    SelectionKind::Multiple
                } else {
                    SelectionKind::Hole
                };
                for hole in holes {
                    self.pending.push(SelectionNotice {
                        kind,
                        entity_name: hole.entity_name.clone(),
                        id: hole.hole_id.clone(),
                    });
                }
            }
            Selection::KadEntity(name) => self.pending.push(SelectionNotice {
                kind: SelectionKind::KadEntity,
                entity_name: name.clone(),
                id: String::new(),
            }),
            Selection::KadVertex { entity, point_id } => self.pending.push(SelectionNotice {
                kind: SelectionKind::KadVertex,
                entity_name: entity.clone(),
                id: point_id.to_string(),
            }),
            Selection::Multiple { holes, entities } => {
                for hole in holes {
                    self.pending.push(SelectionNotice {
                        kind: SelectionKind::Multiple,
                        entity_name: hole.entity_name.clone(),
                        id: hole.hole_id.clone(),
                    });
                }
                for entity in entities {
                    self.pending.push(SelectionNotice {
                        kind: SelectionKind::Multiple,
                        entity_name: entity.clone(),
                        id: String::new(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{KadGeometry, KadVertex as SharedVertex};

    fn drawing_with_line() -> Drawing {
        let mut drawing = Drawing::default();
        drawing.kad.insert(
            "crest".into(),
            KadEntity::new(
                "crest",
                KadGeometry::Line {
                    vertices: vec![
                        SharedVertex::new(10, [0.0, 0.0, 0.0]),
                        SharedVertex::new(11, [5.0, 0.0, 0.0]),
                    ],
                },
            ),
        );
        drawing
    }

    #[test]
    fn initial_state_is_empty() {
        let bridge = SelectionBridge::default();
        assert!(bridge.selection().is_none());
        assert_eq!(bridge.version(), 0);
    }

    #[test]
    fn select_hole_bumps_version_once() {
        let mut bridge = SelectionBridge::default();
        bridge.select_hole(HoleRef::new("a", "1"));
        assert_eq!(bridge.version(), 1);
        // Re-selecting the same thing is a no-op
        bridge.select_hole(HoleRef::new("a", "1"));
        assert_eq!(bridge.version(), 1);
    }

    #[test]
    fn toggle_hole_adds_and_removes() {
        let mut bridge = SelectionBridge::default();
        bridge.select_hole(HoleRef::new("a", "1"));
        bridge.toggle_hole(HoleRef::new("a", "2"));
        assert_eq!(bridge.selection().holes().len(), 2);

        bridge.toggle_hole(HoleRef::new("a", "1"));
        assert_eq!(bridge.selection().holes(), &[HoleRef::new("a", "2")]);

        bridge.toggle_hole(HoleRef::new("a", "2"));
        assert!(bridge.selection().is_none());
    }

    #[test]
    fn notifications_carry_identity_tuples() {
        let mut bridge = SelectionBridge::default();
        bridge.select_hole(HoleRef::new("north", "42"));
        bridge.select_kad_vertex("crest", 11);

        let notices = bridge.drain_notifications();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, SelectionKind::Hole);
        assert_eq!(notices[0].entity_name, "north");
        assert_eq!(notices[0].id, "42");
        assert_eq!(notices[1].kind, SelectionKind::KadVertex);
        assert_eq!(notices[1].id, "11");

        // Drained means drained
        assert!(bridge.drain_notifications().is_empty());
    }

    #[test]
    fn vertex_resolution_requires_both_halves() {
        let drawing = drawing_with_line();
        let mut bridge = SelectionBridge::default();

        bridge.select_kad_vertex("crest", 11);
        assert!(bridge.resolve_vertex(&drawing).is_some());

        // Entity exists, vertex does not: no highlight, no panic
        bridge.select_kad_vertex("crest", 999);
        assert!(bridge.resolve_vertex(&drawing).is_none());

        // Vertex ID valid elsewhere, entity missing: same
        bridge.select_kad_vertex("ghost", 11);
        assert!(bridge.resolve_vertex(&drawing).is_none());
    }

    #[test]
    fn prune_drops_stale_refs() {
        let mut drawing = drawing_with_line();
        let mut bridge = SelectionBridge::default();
        bridge.set(Selection::Multiple {
            holes: vec![HoleRef::new("a", "1")],
            entities: vec!["crest".into(), "ghost".into()],
        });

        // Hole a/1 does not exist; ghost does not exist
        bridge.prune(&drawing);
        assert_eq!(bridge.selection(), &Selection::KadEntity("crest".into()));

        drawing.kad.clear();
        bridge.prune(&drawing);
        assert!(bridge.selection().is_none());
    }

    #[test]
    fn prune_keeps_live_vertex_selection() {
        let drawing = drawing_with_line();
        let mut bridge = SelectionBridge::default();
        bridge.select_kad_vertex("crest", 10);
        let version = bridge.version();
        bridge.prune(&drawing);
        assert_eq!(bridge.version(), version);
        assert!(matches!(
            bridge.selection(),
            Selection::KadVertex { point_id: 10, .. }
        ));
    }
}
