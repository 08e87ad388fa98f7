use super::decomp::TileInfo;

pub const NUM_FIELDS: usize = 14;

// The nine distribution channels plus the three macroscopic moments are
// synchronized across ranks; vorticity and speed stay rank-local.
pub const SYNCED_FIELDS: [Field; 12] = [
    Field::F0,
    Field::FN,
    Field::FE,
    Field::FS,
    Field::FW,
    Field::FNE,
    Field::FNW,
    Field::FSE,
    Field::FSW,
    Field::Density,
    Field::VelocityX,
    Field::VelocityY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    F0,
    FN,
    FE,
    FS,
    FW,
    FNE,
    FNW,
    FSE,
    FSW,
    Density,
    VelocityX,
    VelocityY,
    Vorticity,
    Speed,
}

impl Field {
    pub fn index(self) -> usize {
        match self {
            Field::F0 => 0,
            Field::FN => 1,
            Field::FE => 2,
            Field::FS => 3,
            Field::FW => 4,
            Field::FNE => 5,
            Field::FNW => 6,
            Field::FSE => 7,
            Field::FSW => 8,
            Field::Density => 9,
            Field::VelocityX => 10,
            Field::VelocityY => 11,
            Field::Vorticity => 12,
            Field::Speed => 13,
        }
    }
}

// All fourteen scalar fields live in one allocation, sliced into
// cell_count-sized views.
pub struct TileStore {
    tile: TileInfo,
    data: Vec<f64>,
    barrier: Vec<bool>,
}

impl TileStore {
    pub fn new(tile: TileInfo) -> Self {
        let cell_count = tile.cell_count();
        Self {
            tile,
            data: vec![0.0; NUM_FIELDS * cell_count],
            barrier: vec![false; cell_count],
        }
    }

    pub fn tile(&self) -> &TileInfo {
        &self.tile
    }

    pub fn cell_count(&self) -> usize {
        self.tile.cell_count()
    }

    pub fn field(&self, field: Field) -> &[f64] {
        let size = self.cell_count();
        let base = field.index() * size;
        &self.data[base..base + size]
    }

    pub fn field_mut(&mut self, field: Field) -> &mut [f64] {
        let size = self.cell_count();
        let base = field.index() * size;
        &mut self.data[base..base + size]
    }

    pub fn barrier(&self) -> &[bool] {
        &self.barrier
    }

    pub fn barrier_mut(&mut self) -> &mut [bool] {
        &mut self.barrier
    }

    pub fn fields_mut(&mut self) -> FieldsMut<'_> {
        let (fields, _) = self.split_mut();
        fields
    }

    // Disjoint mutable views of every field plus the barrier mask, for the
    // bounce-back kernel which reads the mask while rewriting channels.
    pub fn split_mut(&mut self) -> (FieldsMut<'_>, &[bool]) {
        let size = self.tile.cell_count();
        let mut chunks = self.data.chunks_exact_mut(size);
        let mut next = || chunks.next().unwrap();
        let fields = FieldsMut {
            f_0: next(),
            f_n: next(),
            f_e: next(),
            f_s: next(),
            f_w: next(),
            f_ne: next(),
            f_nw: next(),
            f_se: next(),
            f_sw: next(),
            density: next(),
            velocity_x: next(),
            velocity_y: next(),
            vorticity: next(),
            speed: next(),
        };
        (fields, &self.barrier)
    }
}

pub struct FieldsMut<'a> {
    pub f_0: &'a mut [f64],
    pub f_n: &'a mut [f64],
    pub f_e: &'a mut [f64],
    pub f_s: &'a mut [f64],
    pub f_w: &'a mut [f64],
    pub f_ne: &'a mut [f64],
    pub f_nw: &'a mut [f64],
    pub f_se: &'a mut [f64],
    pub f_sw: &'a mut [f64],
    pub density: &'a mut [f64],
    pub velocity_x: &'a mut [f64],
    pub velocity_y: &'a mut [f64],
    pub vorticity: &'a mut [f64],
    pub speed: &'a mut [f64],
}
