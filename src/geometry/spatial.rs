//! Spatial indexing for clearance queries
//!
//! Shapes live in a [`ShapeArena`] owned by the caller. A [`ShapeIndex`]
//! borrows the arena and stores only entry handles plus cached bounding
//! boxes in an R-tree, so it can never outlive the shapes it refers to.
//!
//! Queries run in two phases: the broad phase walks the R-tree and keeps
//! entries whose cached box lies within `min_distance` of the query box
//! (squared integer comparison); the optional narrow phase runs the exact
//! [`Shape::collide`] test on the survivors.

use rstar::{RTree, RTreeObject, SelectionFunction, AABB};
use std::ops::ControlFlow;

use super::shapes::Shape;
use super::types::{BoundingBox, Coord, ECoord, Point};

/// Stable handle of an entry inside a [`ShapeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

/// A shape plus its opaque owner and cached zero-clearance bounding box
#[derive(Debug, Clone)]
pub struct ShapeEntry<O> {
    pub shape: Shape,
    pub owner: O,
    bbox: BoundingBox,
}

impl<O> ShapeEntry<O> {
    pub fn new(shape: Shape, owner: O) -> Self {
        let bbox = shape.bounding_box(0);
        Self { shape, owner, bbox }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

/// Owning storage for shape entries
#[derive(Debug, Clone)]
pub struct ShapeArena<O> {
    entries: Vec<ShapeEntry<O>>,
}

impl<O> ShapeArena<O> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: ShapeEntry<O>) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() - 1)
    }

    /// Panics on a handle from another arena, which is a caller bug
    pub fn get(&self, id: EntryId) -> &ShapeEntry<O> {
        &self.entries[id.0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &ShapeEntry<O>)> {
        self.entries.iter().enumerate().map(|(i, e)| (EntryId(i), e))
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> {
        (0..self.entries.len()).map(EntryId)
    }
}

impl<O> Default for ShapeArena<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// R-tree element: handle plus cached envelope
#[derive(Clone, Debug, PartialEq)]
struct IndexedEntry {
    id: EntryId,
    envelope: AABB<[Coord; 2]>,
}

impl RTreeObject for IndexedEntry {
    type Envelope = AABB<[Coord; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_to_box(envelope: &AABB<[Coord; 2]>) -> BoundingBox {
    let lo = envelope.lower();
    let hi = envelope.upper();
    BoundingBox::new(Point::new(lo[0], lo[1]), Point::new(hi[0], hi[1]))
}

/// Broad phase: unpack any node whose envelope is within the query distance
struct WithinDistance {
    bbox: BoundingBox,
    min_distance_sq: ECoord,
}

impl SelectionFunction<IndexedEntry> for WithinDistance {
    fn should_unpack_parent(&self, envelope: &AABB<[Coord; 2]>) -> bool {
        envelope_to_box(envelope).squared_distance(&self.bbox) <= self.min_distance_sq
    }

    fn should_unpack_leaf(&self, leaf: &IndexedEntry) -> bool {
        envelope_to_box(&leaf.envelope).squared_distance(&self.bbox) <= self.min_distance_sq
    }
}

/// One query result
#[derive(Debug)]
pub struct ShapeMatch<'a, O> {
    pub id: EntryId,
    pub entry: &'a ShapeEntry<O>,
    /// Exact copper distance, present when the narrow phase ran
    pub distance: Option<f64>,
}

impl<O> Clone for ShapeMatch<'_, O> {
    fn clone(&self) -> Self {
        Self { id: self.id, entry: self.entry, distance: self.distance }
    }
}

/// Spatial index over the entries of one arena
pub struct ShapeIndex<'a, O> {
    arena: &'a ShapeArena<O>,
    tree: RTree<IndexedEntry>,
}

impl<'a, O> ShapeIndex<'a, O> {
    pub fn new(arena: &'a ShapeArena<O>) -> Self {
        Self { arena, tree: RTree::new() }
    }

    /// Index every entry of the arena at once (bulk-loaded R-tree)
    pub fn with_all(arena: &'a ShapeArena<O>) -> Self {
        let elements = arena
            .iter()
            .map(|(id, entry)| IndexedEntry { id, envelope: entry.bbox().envelope() })
            .collect();
        Self { arena, tree: RTree::bulk_load(elements) }
    }

    pub fn arena(&self) -> &'a ShapeArena<O> {
        self.arena
    }

    /// Insert one arena entry, caching its zero-clearance box. Returns
    /// false and leaves the index unchanged if the entry is already indexed.
    pub fn add(&mut self, id: EntryId) -> bool {
        let item = IndexedEntry { id, envelope: self.arena.get(id).bbox().envelope() };
        if self.tree.contains(&item) {
            return false;
        }
        self.tree.insert(item);
        true
    }

    /// Remove by identity; returns false if the entry was not indexed
    pub fn remove(&mut self, id: EntryId) -> bool {
        let envelope = self.arena.get(id).bbox().envelope();
        self.tree.remove(&IndexedEntry { id, envelope }).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Lazy query: every indexed entry within `min_distance` of `shape`.
    /// With `exact` set, survivors of the box filter must also pass
    /// `Shape::collide(shape, min_distance)`. Order is unspecified.
    pub fn query<'s>(
        &'s self,
        shape: &'s Shape,
        min_distance: Coord,
        exact: bool,
    ) -> impl Iterator<Item = ShapeMatch<'a, O>> + 's {
        let arena = self.arena;
        let selection = WithinDistance {
            bbox: shape.bounding_box(0),
            min_distance_sq: (min_distance as ECoord) * (min_distance as ECoord),
        };
        self.tree
            .locate_with_selection_function(selection)
            .filter_map(move |item| {
                let entry = arena.get(item.id);
                if !exact {
                    return Some(ShapeMatch { id: item.id, entry, distance: None });
                }
                let distance = shape.distance(&entry.shape);
                (distance < min_distance as f64)
                    .then_some(ShapeMatch { id: item.id, entry, distance: Some(distance) })
            })
    }

    /// Visitor form of [`ShapeIndex::query`]. The visitor may stop the
    /// query early by returning `ControlFlow::Break`. Returns the number of
    /// matches visited.
    pub fn query_with<F>(&self, shape: &Shape, min_distance: Coord, exact: bool, mut visitor: F) -> usize
    where
        F: FnMut(ShapeMatch<'a, O>) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for m in self.query(shape, min_distance, exact) {
            visited += 1;
            if visitor(m).is_break() {
                break;
            }
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::{Circle, Segment};

    fn circle(x: i64, y: i64, r: i64) -> Shape {
        Circle::new(Point::new(x, y), r).into()
    }

    #[test]
    fn test_adding_twice_lists_entry_once() {
        let mut arena = ShapeArena::new();
        let id = arena.push(ShapeEntry::new(circle(0, 0, 10), 7u32));
        let mut index = ShapeIndex::new(&arena);
        assert!(index.add(id));
        assert!(!index.add(id));
        assert_eq!(index.len(), 1);
        assert_eq!(index.query(&circle(0, 0, 10), 100, true).count(), 1);
        assert!(index.remove(id));
        assert!(index.is_empty());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let arena: ShapeArena<u32> = ShapeArena::new();
        let index = ShapeIndex::new(&arena);
        assert_eq!(index.query(&circle(0, 0, 10), 100, true).count(), 0);
    }

    #[test]
    fn test_broad_and_narrow_phase() {
        let mut arena = ShapeArena::new();
        // Diagonal neighbor: boxes are close but the discs are not
        let near = arena.push(ShapeEntry::new(circle(140, 0, 10), "near"));
        let diagonal = arena.push(ShapeEntry::new(circle(125, 125, 10), "diagonal"));
        let far = arena.push(ShapeEntry::new(circle(10_000, 0, 10), "far"));

        let mut index = ShapeIndex::new(&arena);
        for id in [near, diagonal, far] {
            index.add(id);
        }

        let query = circle(0, 0, 100);
        let mut broad: Vec<EntryId> = index.query(&query, 30, false).map(|m| m.id).collect();
        broad.sort();
        assert_eq!(broad, vec![near, diagonal]);

        let exact: Vec<&str> = index.query(&query, 31, true).map(|m| m.entry.owner).collect();
        assert_eq!(exact, vec!["near"]);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut arena = ShapeArena::new();
        let a = arena.push(ShapeEntry::new(circle(0, 0, 10), 1));
        let b = arena.push(ShapeEntry::new(circle(0, 0, 10), 2));
        let mut index = ShapeIndex::new(&arena);
        index.add(a);
        index.add(b);
        assert!(index.remove(a));
        assert!(!index.remove(a));
        let owners: Vec<i32> = index.query(&circle(0, 0, 1), 0, false).map(|m| m.entry.owner).collect();
        assert_eq!(owners, vec![2]);
    }

    #[test]
    fn test_visitor_stops_early() {
        let mut arena = ShapeArena::new();
        for i in 0..10 {
            arena.push(ShapeEntry::new(
                Segment::new(Point::new(i * 10, 0), Point::new(i * 10, 100), 2).into(),
                i,
            ));
        }
        let index = ShapeIndex::with_all(&arena);
        let visited = index.query_with(&circle(50, 50, 1000), 1, true, |_| ControlFlow::Break(()));
        assert_eq!(visited, 1);
    }
}
