//! Finite shapes cut out of the infinite lattice.

use crate::ident::SpecId;
use crate::lattice::Lattice;

#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// A block of unit cells, starting at the origin. `Primitive::default()`
    /// is the single unbounded primitive cell substituted when no shape is
    /// set.
    Primitive { cells: [usize; 3] },
    /// Axis-aligned rectangle centered on the origin (x/y extent).
    Rectangle { width: f64, height: f64 },
    /// Circle centered on the origin (x/y plane).
    Circle { radius: f64 },
}

/// Immutable shape spec with stable identity.
#[derive(Debug, Clone)]
pub struct Shape {
    id: SpecId,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn primitive(cells: [usize; 3]) -> Self {
        Self {
            id: SpecId::allocate(),
            kind: ShapeKind::Primitive {
                cells: [cells[0].max(1), cells[1].max(1), cells[2].max(1)],
            },
        }
    }

    /// The default shape: one primitive cell.
    pub fn primitive_cell() -> Self {
        Self::primitive([1, 1, 1])
    }

    pub fn rectangle(width: f64, height: f64) -> Self {
        Self {
            id: SpecId::allocate(),
            kind: ShapeKind::Rectangle { width, height },
        }
    }

    pub fn circle(radius: f64) -> Self {
        Self {
            id: SpecId::allocate(),
            kind: ShapeKind::Circle { radius },
        }
    }

    pub fn id(&self) -> SpecId {
        self.id
    }

    pub fn contains(&self, point: [f64; 3]) -> bool {
        match &self.kind {
            ShapeKind::Primitive { .. } => true,
            ShapeKind::Rectangle { width, height } => {
                point[0].abs() <= width * 0.5 + 1e-9 && point[1].abs() <= height * 0.5 + 1e-9
            }
            ShapeKind::Circle { radius } => {
                point[0] * point[0] + point[1] * point[1] <= radius * radius + 1e-9
            }
        }
    }

    /// Inclusive cell index range to enumerate per lattice axis.
    ///
    /// Geometric shapes are centered on the origin, so their ranges are
    /// symmetric; a primitive block starts at cell zero.
    pub fn cell_bounds(&self, lattice: &Lattice) -> Vec<(i32, i32)> {
        match &self.kind {
            ShapeKind::Primitive { cells } => (0..lattice.ndim())
                .map(|axis| (0, cells[axis] as i32 - 1))
                .collect(),
            ShapeKind::Rectangle { width, height } => {
                let half = 0.5 * width.abs().max(height.abs());
                symmetric_bounds(lattice, half)
            }
            ShapeKind::Circle { radius } => symmetric_bounds(lattice, radius.abs()),
        }
    }
}

fn symmetric_bounds(lattice: &Lattice, half_extent: f64) -> Vec<(i32, i32)> {
    lattice
        .vectors
        .iter()
        .map(|v| {
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            let n = if norm > 0.0 {
                (half_extent / norm).ceil() as i32 + 1
            } else {
                0
            };
            (-n, n)
        })
        .collect()
}
