//! Perceptual gamma correction

/// 256-entry lookup from linear to perceptually corrected intensity
#[derive(Clone)]
pub struct GammaTable {
    table: [u8; 256],
}

impl GammaTable {
    /// Build the table for `out = in^gamma`, rounded to nearest
    pub fn new(gamma: f32) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let linear = i as f32 / 255.0;
            let corrected = libm::powf(linear, gamma) * 255.0 + 0.5;
            // `as` saturates, so a NaN or out-of-range value cannot wrap
            *slot = corrected as u8;
        }
        Self { table }
    }

    /// Pass-through table
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { table }
    }

    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.table[usize::from(value)]
    }
}

impl core::fmt::Debug for GammaTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GammaTable")
            .field("mid", &self.table[128])
            .finish()
    }
}
