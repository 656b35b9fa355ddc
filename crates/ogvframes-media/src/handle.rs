//! Caller-owned registry of open containers.
//!
//! Handles are generation-checked indices: a slot reused after `close` gets
//! a new generation, so a stale [`ContainerId`] is reported as unknown rather
//! than silently addressing a different container.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::codec::{Codec, FrameRate};
use crate::container::Container;
use crate::demux::NextFrame;
use crate::options::ContainerOptions;
use crate::{Error, Result};

/// Identifies one open container within a [`HandleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerId {
    index: u32,
    generation: u32,
}

impl ContainerId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ogv{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-checked arena.
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> ContainerId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return ContainerId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        ContainerId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: ContainerId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, id: ContainerId) -> Option<&T> {
        self.slot(id)?.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .value
            .as_mut()
    }

    /// Remove a value; its slot is reused under a new generation.
    pub fn remove(&mut self, id: ContainerId) -> Option<T> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|_| ContainerId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// File-backed containers opened through a [`Session`].
pub type FileContainer<C> = Container<BufReader<File>, C>;

/// Opens containers by path and drives them by [`ContainerId`].
///
/// Every container gets its own clone of the codec, so no two containers
/// share mutable state.
pub struct Session<C: Codec + Clone> {
    codec: C,
    options: ContainerOptions,
    handles: HandleTable<FileContainer<C>>,
}

impl<C: Codec + Clone> Session<C> {
    pub fn new(codec: C, options: ContainerOptions) -> Self {
        Self {
            codec,
            options,
            handles: HandleTable::new(),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<ContainerId> {
        let container = Container::open_path(path, self.codec.clone(), self.options)?;
        let id = self.handles.insert(container);
        tracing::debug!(%id, "container registered");
        Ok(id)
    }

    fn container(&mut self, id: ContainerId) -> Result<&mut FileContainer<C>> {
        self.handles.get_mut(id).ok_or(Error::UnknownHandle(id))
    }

    pub fn next_frame(&mut self, id: ContainerId) -> Result<NextFrame> {
        self.container(id)?.next_frame()
    }

    pub fn frame_rate(&self, id: ContainerId) -> Result<FrameRate> {
        self.handles
            .get(id)
            .ok_or(Error::UnknownHandle(id))?
            .frame_rate()
    }

    pub fn rewind(&mut self, id: ContainerId) -> Result<()> {
        self.container(id)?.rewind()
    }

    /// Close and forget a container; `id` becomes unknown.
    pub fn close(&mut self, id: ContainerId) -> Result<()> {
        let mut container = self.handles.remove(id).ok_or(Error::UnknownHandle(id))?;
        container.close();
        Ok(())
    }

    pub fn get(&self, id: ContainerId) -> Option<&FileContainer<C>> {
        self.handles.get(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<C: Codec + Clone> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("open", &self.handles.len())
            .finish()
    }
}
