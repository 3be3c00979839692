//! Point-to-zone assignment.
//!
//! The first zone whose rectangle contains the point (edges inclusive)
//! wins. Otherwise the zone nearest to the point wins, measured from the
//! point to the closest point of the rectangle; ties go to the earlier zone.

/// A zone rectangle in the same units as the points being assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRect {
    pub id: u8,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ZoneRect {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Squared distance to the nearest point of the rectangle, 0 inside.
    pub fn distance_sq(&self, x: i64, y: i64) -> i64 {
        let dx = axis_gap(x, self.x, self.x + self.width);
        let dy = axis_gap(y, self.y, self.y + self.height);
        dx * dx + dy * dy
    }
}

fn axis_gap(v: i64, lo: i64, hi: i64) -> i64 {
    if v < lo {
        lo - v
    } else if v > hi {
        v - hi
    } else {
        0
    }
}

/// Zone id owning `(x, y)`, or `None` when there are no zones at all.
pub fn assign_zone(zones: &[ZoneRect], x: i64, y: i64) -> Option<u8> {
    if let Some(zone) = zones.iter().find(|z| z.contains(x, y)) {
        return Some(zone.id);
    }

    let mut best: Option<(i64, u8)> = None;
    for zone in zones {
        let d = zone.distance_sq(x, y);
        if best.map_or(true, |(best_d, _)| d < best_d) {
            best = Some((d, zone.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Stable sort by owning zone; items in the same zone keep their order.
pub fn sort_by_zone<T>(items: &mut [T], zone_of: impl Fn(&T) -> Option<u8>) {
    items.sort_by_key(zone_of);
}
