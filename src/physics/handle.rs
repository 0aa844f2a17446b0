use super::error::{PhysicsError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a single world instance; embedded in every handle it issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(Uuid);

impl WorldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque, generation-checked reference to a body owned by a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle {
    world: WorldId,
    index: u32,
    generation: u32,
}

impl BodyHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn world(self) -> WorldId {
        self.world
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense storage with free-list reuse and generation counters.
///
/// Removing a value bumps the slot generation, so every handle issued for the
/// old occupant resolves to [`PhysicsError::StaleHandle`] from then on.
/// Iteration follows insertion order, independent of slot reuse.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    world: WorldId,
    slots: Vec<Slot<T>>,
    free_indices: Vec<u32>,
    order: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new(world: WorldId) -> Self {
        Self {
            world,
            slots: Vec::new(),
            free_indices: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> BodyHandle {
        let index = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            index
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            index
        };

        self.order.push(index);
        self.handle_for(index)
    }

    /// Removes and returns the value. Any handle that does not refer to a
    /// live value of this arena is reported as unknown.
    pub fn remove(&mut self, handle: BodyHandle) -> Result<T> {
        let index = match self.resolve(handle) {
            Ok(index) => index,
            Err(_) => return Err(PhysicsError::UnknownHandle(handle)),
        };

        let slot = &mut self.slots[index];
        let value = slot.value.take().ok_or(PhysicsError::UnknownHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(index as u32);
        self.order.retain(|&i| i as usize != index);
        Ok(value)
    }

    /// Maps a handle to its slot index.
    ///
    /// Foreign handles and handles that were never issued are unknown;
    /// handles whose value has since been removed are stale.
    pub fn resolve(&self, handle: BodyHandle) -> Result<usize> {
        if handle.world != self.world {
            return Err(PhysicsError::UnknownHandle(handle));
        }
        let slot = self
            .slots
            .get(handle.index())
            .ok_or(PhysicsError::UnknownHandle(handle))?;

        if handle.generation > slot.generation {
            return Err(PhysicsError::UnknownHandle(handle));
        }
        if handle.generation < slot.generation || slot.value.is_none() {
            return Err(PhysicsError::StaleHandle(handle));
        }
        Ok(handle.index())
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&T> {
        let index = self.resolve(handle)?;
        self.slots[index]
            .value
            .as_ref()
            .ok_or(PhysicsError::StaleHandle(handle))
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        let index = self.resolve(handle)?;
        self.slots[index]
            .value
            .as_mut()
            .ok_or(PhysicsError::StaleHandle(handle))
    }

    #[inline]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Drops every value and invalidates all outstanding handles.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_indices.push(index as u32);
            }
        }
        self.order.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // Number of slots ever allocated, live or free
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live handles in insertion order.
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.order.iter().map(|&i| self.handle_for(i)).collect()
    }

    /// Live values with their handles, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &T)> + '_ {
        self.order.iter().filter_map(move |&i| {
            self.slots[i as usize]
                .value
                .as_ref()
                .map(|value| (self.handle_for(i), value))
        })
    }

    /// Slot indices of live values, in insertion order.
    pub(crate) fn order(&self) -> &[u32] {
        &self.order
    }

    pub(crate) fn handle_for(&self, index: u32) -> BodyHandle {
        BodyHandle {
            world: self.world,
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub(crate) fn by_index(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn by_index_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(|slot| slot.value.as_mut())
    }

    /// Mutable access to two distinct live slots at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head[lo].value.as_mut()?;
        let second = tail[0].value.as_mut()?;
        if a < b {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }
}

impl<T: Send> Arena<T> {
    /// Parallel mutable iteration over live values, in no particular order.
    pub(crate) fn par_values_mut(&mut self) -> impl ParallelIterator<Item = &mut T> + '_ {
        self.slots
            .par_iter_mut()
            .filter_map(|slot| slot.value.as_mut())
    }
}
