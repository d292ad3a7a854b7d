use core::fmt;

/// Execution-instance index: simulation Number, model Set, Time window,
/// Iteration.
///
/// The joined form `"{n}_{s}_{t}_{i}"` is embedded in folder and file names
/// across every tool, so it is the universal disambiguator for one run of
/// one model. `t == 0` is the pre-cosim stage; `t == window_count + 1` is
/// the post-cosim stage; values in between are co-simulation windows.
///
/// Immutable once constructed; the orchestrator replaces the whole value
/// when it advances, it never mutates fields in place.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Nsti {
    pub n: u32,
    pub s: u32,
    pub t: u32,
    pub i: u32,
}

impl Nsti {
    pub fn new(n: u32, s: u32, t: u32, i: u32) -> Self {
        Self { n, s, t, i }
    }

    /// Canonical joined string, e.g. `55_1_2_3`.
    pub fn joined(&self) -> String {
        format!("{}_{}_{}_{}", self.n, self.s, self.t, self.i)
    }

    /// Insert the joined index between a file's base name and extension:
    /// `out.csv` becomes `out_55_1_2_3.csv`.
    pub fn suffix_file_name(&self, file_name: &str) -> String {
        match file_name.rsplit_once('.') {
            Some((base, ext)) => format!("{}_{}.{}", base, self.joined(), ext),
            None => format!("{}_{}", file_name, self.joined()),
        }
    }
}

impl fmt::Display for Nsti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}
