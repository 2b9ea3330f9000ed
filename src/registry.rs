use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, TexError};
use crate::texture::Texture;

/// Shared texture store. Handles are opaque non-zero ids handed out in
/// allocation order; an id is never reused within the lifetime of the
/// registry, so a stale handle always misses instead of aliasing a newer
/// texture.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: u32,
    textures: HashMap<u32, Texture>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Stores a texture and returns its handle.
    pub fn insert(&self, texture: Texture) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.textures.insert(id, texture);
        id
    }

    pub fn contains(&self, id: u32) -> bool {
        self.inner.lock().unwrap().textures.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a texture; the id is retired either way.
    pub fn remove(&self, id: u32) -> Result<()> {
        self.take(id).map(drop)
    }

    /// Removes a texture and hands it back to the caller.
    pub fn take(&self, id: u32) -> Result<Texture> {
        self.inner
            .lock()
            .unwrap()
            .textures
            .remove(&id)
            .ok_or_else(|| TexError::NotFound(format!("texture {id}")))
    }

    /// Runs `f` against the texture under the registry lock.
    pub fn with<R>(&self, id: u32, f: impl FnOnce(&Texture) -> R) -> Result<R> {
        let inner = self.inner.lock().unwrap();
        let tex = inner
            .textures
            .get(&id)
            .ok_or_else(|| TexError::NotFound(format!("texture {id}")))?;
        Ok(f(tex))
    }

    /// Runs `f` against the texture mutably under the registry lock.
    pub fn with_mut<R>(&self, id: u32, f: impl FnOnce(&mut Texture) -> R) -> Result<R> {
        let mut inner = self.inner.lock().unwrap();
        let tex = inner
            .textures
            .get_mut(&id)
            .ok_or_else(|| TexError::NotFound(format!("texture {id}")))?;
        Ok(f(tex))
    }

    /// Swaps the stored texture for a new one, keeping the id.
    pub fn replace(&self, id: u32, texture: Texture) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.textures.get_mut(&id) {
            Some(slot) => {
                *slot = texture;
                Ok(())
            }
            None => Err(TexError::NotFound(format!("texture {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn tex() -> Texture {
        Texture::new(Format::Rgba8Unorm, 2, 2, 1, 1, 1).unwrap()
    }

    #[test]
    fn ids_start_at_one_and_never_repeat() {
        let reg = Registry::new();
        let a = reg.insert(tex());
        let b = reg.insert(tex());
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        reg.remove(a).unwrap();
        let c = reg.insert(tex());
        assert_eq!(c, 3);
        assert!(!reg.contains(a));
    }

    #[test]
    fn missing_ids_report_not_found() {
        let reg = Registry::new();
        assert!(matches!(reg.remove(7), Err(TexError::NotFound(_))));
        assert!(matches!(
            reg.with(0, |_| ()),
            Err(TexError::NotFound(_))
        ));
    }

    #[test]
    fn with_mut_mutates_in_place() {
        let reg = Registry::new();
        let id = reg.insert(tex());
        reg.with_mut(id, |t| t.data_mut(0, 0).unwrap()[0] = 42)
            .unwrap();
        let first = reg.with(id, |t| t.data(0, 0).unwrap()[0]).unwrap();
        assert_eq!(first, 42);
    }

    #[test]
    fn replace_keeps_the_id() {
        let reg = Registry::new();
        let id = reg.insert(tex());
        let other = Texture::new(Format::Rgba32Float, 4, 4, 1, 1, 1).unwrap();
        reg.replace(id, other).unwrap();
        let fmt = reg.with(id, |t| t.format()).unwrap();
        assert_eq!(fmt, Format::Rgba32Float);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn concurrent_inserts_get_distinct_ids() {
        use std::sync::Arc;
        let reg = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let reg = Arc::clone(&reg);
            handles.push(std::thread::spawn(move || {
                (0..50).map(|_| reg.insert(tex())).collect::<Vec<_>>()
            }));
        }
        let mut ids: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(reg.len(), 200);
    }
}
