//! Ordered effect list owned by a signal.

use super::Effect;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies an effect inside the chain it was added to.
///
/// Ids are unique for the whole process, so an id from one chain never
/// matches an effect in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

/// Effects applied to every frame, in insertion order.
#[derive(Default)]
pub struct EffectChain {
    entries: Vec<(EffectId, Box<dyn Effect>)>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an effect and returns the id that removes it again.
    pub fn push(&mut self, effect: Box<dyn Effect>) -> EffectId {
        let id = EffectId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!("effect {} added as {:?}", effect.name(), id);
        self.entries.push((id, effect));
        id
    }

    /// Removes the effect with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: EffectId) -> Option<Box<dyn Effect>> {
        let position = self.entries.iter().position(|(entry, _)| *entry == id)?;
        let (_, effect) = self.entries.remove(position);
        log::debug!("effect {} removed ({:?})", effect.name(), id);
        Some(effect)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in application order.
    pub fn ids(&self) -> Vec<EffectId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Runs every effect over every frame of the buffers.
    ///
    /// Frames are visited in order; for each frame the effects run in chain
    /// order. Only the common length of both buffers is processed.
    pub fn apply(&mut self, left: &mut [f64], right: &mut [f64], frame_rate: u32) {
        if self.entries.is_empty() {
            return;
        }
        let frames = left.len().min(right.len());
        for index in 0..frames {
            for (_, effect) in self.entries.iter_mut() {
                effect.apply(index, left, right, frame_rate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Amplifier, Overdriver};

    /// Records the order frames and effects are visited in.
    struct Probe {
        tag: u8,
        log: std::sync::Arc<parking_lot::Mutex<Vec<(u8, usize)>>>,
    }

    impl Effect for Probe {
        fn apply(&mut self, index: usize, _: &mut [f64], _: &mut [f64], _: u32) {
            self.log.lock().push((self.tag, index));
        }
    }

    #[test]
    fn test_frame_major_order() {
        let log = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut chain = EffectChain::new();
        chain.push(Box::new(Probe {
            tag: 1,
            log: log.clone(),
        }));
        chain.push(Box::new(Probe {
            tag: 2,
            log: log.clone(),
        }));
        chain.apply(&mut [0.0; 2], &mut [0.0; 2], 8000);
        assert_eq!(*log.lock(), vec![(1, 0), (2, 0), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_order_changes_result() {
        // Clip then amplify differs from amplify then clip
        let mut chain = EffectChain::new();
        chain.push(Box::new(Overdriver::new(1.0, 100.0).unwrap()));
        chain.push(Box::new(Amplifier::new(2.0)));
        let mut left = [500.0];
        let mut right = [-500.0];
        chain.apply(&mut left, &mut right, 8000);
        assert_eq!((left[0], right[0]), (200.0, -200.0));
    }

    #[test]
    fn test_remove_and_unknown_id() {
        let mut chain = EffectChain::new();
        let a = chain.push(Box::new(Amplifier::new(2.0)));
        let b = chain.push(Box::new(Amplifier::new(3.0)));
        assert_eq!(chain.ids(), vec![a, b]);

        assert!(chain.remove(a).is_some());
        assert!(chain.remove(a).is_none());
        assert_eq!(chain.len(), 1);

        let mut left = [1.0];
        let mut right = [1.0];
        chain.apply(&mut left, &mut right, 8000);
        assert_eq!(left[0], 3.0);
    }

    #[test]
    fn test_ids_unique_across_chains() {
        let mut first = EffectChain::new();
        let mut second = EffectChain::new();
        let id = first.push(Box::new(Amplifier::new(1.0)));
        second.push(Box::new(Amplifier::new(1.0)));
        assert!(second.remove(id).is_none());
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = EffectChain::new();
        assert!(chain.is_empty());
        let mut left = [7.0, 8.0];
        let mut right = [9.0, 10.0];
        chain.apply(&mut left, &mut right, 8000);
        assert_eq!(left, [7.0, 8.0]);
        assert_eq!(right, [9.0, 10.0]);
    }
}
