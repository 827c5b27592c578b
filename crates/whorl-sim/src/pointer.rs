use std::collections::HashMap;

use glam::{Vec2, Vec3};

/// Platform identifier of an input contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub i64);

/// The non-touch primary pointer (the mouse).
pub const PRIMARY_POINTER: PointerId = PointerId(-1);

/// One active or released input contact. Positions are in device pixels, y down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub id: PointerId,
    pub down: bool,
    pub position: Vec2,
    pub previous: Vec2,
    pub delta: Vec2,
    /// Dye color picked when the contact went down.
    pub color: Vec3,
}

impl Pointer {
    fn pressed(id: PointerId, position: Vec2, color: Vec3) -> Self {
        Self {
            id,
            down: true,
            position,
            previous: position,
            delta: Vec2::ZERO,
            color,
        }
    }
}

/// A touch contact as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Touch {
    pub id: i64,
    pub position: Vec2,
}

/// Pointer state keyed by identifier. Released pointers stay until their id goes down again.
#[derive(Debug, Default)]
pub struct PointerTable {
    pointers: HashMap<PointerId, Pointer>,
}

impl PointerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    /// Registers `id` as pressed at `position`, reusing its slot if it has one.
    pub fn down(&mut self, id: PointerId, position: Vec2, color: Vec3) -> &Pointer {
        let pointer = Pointer::pressed(id, position, color);

        let slot = self.pointers.entry(id).or_insert(pointer);
        *slot = pointer;
        slot
    }

    /// Moves a pressed pointer. Unknown or released ids are ignored.
    pub fn move_to(&mut self, id: PointerId, position: Vec2) -> Option<&Pointer> {
        let pointer = self.pointers.get_mut(&id).filter(|p| p.down)?;

        pointer.previous = pointer.position;
        pointer.position = position;
        pointer.delta = pointer.position - pointer.previous;

        Some(&*pointer)
    }

    /// Releases `id`. Returns whether a pointer was known under it.
    pub fn up(&mut self, id: PointerId) -> bool {
        match self.pointers.get_mut(&id) {
            Some(pointer) => {
                pointer.down = false;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pointer> {
        self.pointers.values()
    }

    /// Number of pointers currently pressed.
    pub fn active(&self) -> usize {
        self.pointers.values().filter(|p| p.down).count()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}
