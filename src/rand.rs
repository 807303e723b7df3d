#[derive(Debug, Clone)]
pub(crate) struct Rand {
    state: u64,
}

impl Rand {
    pub(crate) const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn rand_u32(&mut self) -> u32 {
        // sPCG32 from https://www.pcg-random.org/paper.html
        // see also https://nullprogram.com/blog/2017/09/21/
        const M: u64 = 0xbb2efcec3c39611d;
        const A: u64 = 0x7590ef39;

        let s = self.state.wrapping_mul(M).wrapping_add(A);
        self.state = s;

        let shift = 29 - (s >> 61);
        (s >> shift) as u32
    }

    pub(crate) fn rand_u64(&mut self) -> u64 {
        ((self.rand_u32() as u64) << 32) | self.rand_u32() as u64
    }

    /// Draw uniformly from the closed interval `[low, high]`.
    ///
    /// The modulo bias is below 2^-32 for every span a retransmission
    /// interval can take.
    pub(crate) fn rand_range_inclusive(&mut self, low: u64, high: u64) -> u64 {
        debug_assert!(low <= high);
        match (high - low).checked_add(1) {
            Some(span) => low + self.rand_u64() % span,
            None => self.rand_u64(),
        }
    }
}
