use std::collections::BTreeMap;

use log::trace;

use crate::{
    geometry::distance,
    types::{ContactId, Point, RawTouchFrame, TouchSample},
};

const NORMALIZER_MAX_CONTACTS: usize = 32;

/// Maps host contact identifiers onto stable [`ContactId`]s and filters
/// malformed samples.
pub struct TouchNormalizer {
    live: BTreeMap<i64, ContactId>,
    last_emitted: BTreeMap<ContactId, Point>,
    next_id: u32,
    dejitter_radius_px: f32,
}

impl Default for TouchNormalizer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TouchNormalizer {
    pub fn new(dejitter_radius_px: f32) -> Self {
        Self {
            live: BTreeMap::new(),
            last_emitted: BTreeMap::new(),
            next_id: 0,
            dejitter_radius_px: dejitter_radius_px.max(0.0),
        }
    }

    pub fn live_contacts(&self) -> usize {
        self.live.len()
    }

    /// Canonical samples for one frame, ordered by contact id.
    ///
    /// Contacts missing from the frame are released. A contact whose sample
    /// is dropped as non-finite keeps its id while it stays in the frame.
    pub fn normalize(&mut self, frame: &RawTouchFrame) -> Vec<TouchSample> {
        let mut seen: heapless::Vec<i64, NORMALIZER_MAX_CONTACTS> = heapless::Vec::new();
        let mut out = Vec::with_capacity(frame.contacts.len());

        for contact in &frame.contacts {
            if seen.contains(&contact.id) {
                trace!("gesture: duplicate contact id={} dropped", contact.id);
                continue;
            }
            if seen.push(contact.id).is_err() {
                trace!("gesture: contact id={} over capacity dropped", contact.id);
                continue;
            }

            let id = self.canonical_id(contact.id);
            let point = Point::new(contact.x, contact.y);
            if !point.is_finite() {
                trace!("gesture: non-finite sample id={} dropped", contact.id);
                continue;
            }

            let point = self.dejitter(id, point);
            out.push(TouchSample {
                id,
                x: point.x,
                y: point.y,
                t_ms: frame.t_ms,
            });
        }

        self.release_missing(&seen);
        out.sort_by_key(|sample| sample.id);
        out
    }

    pub fn reset(&mut self) {
        self.live.clear();
        self.last_emitted.clear();
    }

    fn canonical_id(&mut self, raw_id: i64) -> ContactId {
        if let Some(id) = self.live.get(&raw_id) {
            return *id;
        }
        let id = ContactId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.live.insert(raw_id, id);
        id
    }

    fn dejitter(&mut self, id: ContactId, point: Point) -> Point {
        if self.dejitter_radius_px > 0.0 {
            if let Some(prev) = self.last_emitted.get(&id) {
                if distance(*prev, point) <= self.dejitter_radius_px {
                    return *prev;
                }
            }
        }
        self.last_emitted.insert(id, point);
        point
    }

    fn release_missing(&mut self, seen: &[i64]) {
        let last_emitted = &mut self.last_emitted;
        self.live.retain(|raw_id, id| {
            let keep = seen.contains(raw_id);
            if !keep {
                last_emitted.remove(id);
            }
            keep
        });
    }
}
