use serde::{Deserialize, Serialize};

/// Axis aligned box in world block coordinates, inclusive on both ends.
///
/// The empty box has every minimum above its maximum, so it is the identity
/// of [`Aabb::union`] and never widens anything it is merged into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aabb {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min_x: i32::MAX,
        max_x: i32::MIN,
        min_y: i32::MAX,
        max_y: i32::MIN,
        min_z: i32::MAX,
        max_z: i32::MIN,
    };

    /// The box holding exactly one block.
    pub fn point(x: i32, y: i32, z: i32) -> Aabb {
        Aabb {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            min_z: z,
            max_z: z,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    /// Widens the box to cover the block at `(x, y, z)`.
    pub fn include(&mut self, x: i32, y: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Axis-wise union. Each of the six bounds is widened independently.
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// `max - min` per axis, or `None` for the empty box.
    pub fn extent(&self) -> Option<[i64; 3]> {
        if self.is_empty() {
            return None;
        }
        Some([
            self.max_x as i64 - self.min_x as i64,
            self.max_y as i64 - self.min_y as i64,
            self.max_z as i64 - self.min_z as i64,
        ])
    }

    /// Midpoint of each axis, or `None` for the empty box.
    pub fn center(&self) -> Option<[f64; 3]> {
        if self.is_empty() {
            return None;
        }
        let mid = |lo: i32, hi: i32| (lo as f64 + hi as f64) / 2.0;
        Some([
            mid(self.min_x, self.max_x),
            mid(self.min_y, self.max_y),
            mid(self.min_z, self.max_z),
        ])
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x)
            && (self.min_y..=self.max_y).contains(&y)
            && (self.min_z..=self.max_z).contains(&z)
    }
}

impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::EMPTY
    }
}
