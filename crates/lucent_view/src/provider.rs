//! Zero-copy backdrop fast path
//!
//! Some platforms can hand out a texture the system compositor keeps filled
//! with the live backdrop. When a [`BackdropProvider`] is installed on an
//! [`EffectSurface`](crate::EffectSurface) and yields a texture, capture and
//! upload are skipped for that frame.

use lucent_core::{CaptureRegion, PixelSize};
use smallvec::SmallVec;

/// Capability: supplies a live backdrop texture for a region
pub trait BackdropProvider {
    type Texture;

    /// Texture holding the current backdrop of `region`, or `None` to fall
    /// back to manual capture this frame
    fn backdrop(&mut self, region: &CaptureRegion) -> Option<Self::Texture>;
}

/// Textures kept per pixel size, most recently used first
///
/// Shared textures are only recreated when the region changes size; a view
/// that toggles between two sizes (a knob growing on activation) keeps both.
pub struct TextureCache<T> {
    entries: SmallVec<[(PixelSize, T); 2]>,
    capacity: usize,
}

impl<T> TextureCache<T> {
    pub const DEFAULT_CAPACITY: usize = 2;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: SmallVec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, size: PixelSize) -> bool {
        self.entries.iter().any(|(s, _)| *s == size)
    }

    /// Texture for `size`, created with `create` on a miss.
    ///
    /// A failed creation leaves the cache untouched. Inserting beyond
    /// capacity evicts the least recently used size.
    pub fn get_or_create(
        &mut self,
        size: PixelSize,
        create: impl FnOnce(PixelSize) -> Option<T>,
    ) -> Option<&T> {
        if let Some(index) = self.entries.iter().position(|(s, _)| *s == size) {
            let entry = self.entries.remove(index);
            self.entries.insert(0, entry);
        } else {
            let texture = create(size)?;
            tracing::debug!("backdrop cache: new texture {}", size);
            self.entries.insert(0, (size, texture));
            self.entries.truncate(self.capacity);
        }
        self.entries.first().map(|(_, texture)| texture)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// A [`BackdropProvider`] over a per-size texture factory
///
/// `create` binds a compositor-backed texture of the given size (returning
/// `None` when the platform refuses); the texture is then reused for every
/// frame at that size.
pub struct CachingProvider<T, F> {
    cache: TextureCache<T>,
    create: F,
}

impl<T, F> CachingProvider<T, F>
where
    T: Clone,
    F: FnMut(PixelSize) -> Option<T>,
{
    pub fn new(create: F) -> Self {
        Self {
            cache: TextureCache::default(),
            create,
        }
    }

    pub fn cache(&self) -> &TextureCache<T> {
        &self.cache
    }
}

impl<T, F> BackdropProvider for CachingProvider<T, F>
where
    T: Clone,
    F: FnMut(PixelSize) -> Option<T>,
{
    type Texture = T;

    fn backdrop(&mut self, region: &CaptureRegion) -> Option<T> {
        if region.pixel_size.is_empty() {
            return None;
        }
        let create = &mut self.create;
        self.cache
            .get_or_create(region.pixel_size, |size| create(size))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::Rect;

    fn region(width: u32, height: u32) -> CaptureRegion {
        CaptureRegion {
            global_rect: Rect::new(0.0, 0.0, width as f32, height as f32),
            pixel_size: PixelSize::new(width, height),
            pixels_per_point: 1.0,
        }
    }

    #[test]
    fn test_cache_reuses_per_size() {
        let mut created = 0;
        let mut cache = TextureCache::default();
        for _ in 0..3 {
            cache.get_or_create(PixelSize::new(4, 4), |size| {
                created += 1;
                Some(size.width)
            });
        }
        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_evicts_least_recent() {
        let mut cache = TextureCache::new(2);
        cache.get_or_create(PixelSize::new(1, 1), |_| Some(1));
        cache.get_or_create(PixelSize::new(2, 2), |_| Some(2));
        // Touch 1x1 so 2x2 becomes the oldest
        cache.get_or_create(PixelSize::new(1, 1), |_| Some(10));
        cache.get_or_create(PixelSize::new(3, 3), |_| Some(3));

        assert!(cache.contains(PixelSize::new(1, 1)));
        assert!(!cache.contains(PixelSize::new(2, 2)));
        assert!(cache.contains(PixelSize::new(3, 3)));
    }

    #[test]
    fn test_failed_create_is_not_cached() {
        let mut cache: TextureCache<u32> = TextureCache::default();
        assert!(cache.get_or_create(PixelSize::new(1, 1), |_| None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_provider_skips_empty_regions() {
        let mut provider = CachingProvider::new(|size: PixelSize| Some(size));
        assert_eq!(provider.backdrop(&region(0, 10)), None);
        assert_eq!(
            provider.backdrop(&region(8, 6)),
            Some(PixelSize::new(8, 6))
        );
        assert_eq!(provider.cache().len(), 1);
    }
}
