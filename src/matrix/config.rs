//! Configuration and system parameters for the transforms

/// How a transform schedules its work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Single-threaded reference schedule
    Sequential,
    /// Always use the rayon thread pool
    Parallel,
    /// Parallel once nnz reaches `parallel_threshold`
    Auto,
}

impl Execution {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Some(Execution::Sequential),
            "parallel" | "par" => Some(Execution::Parallel),
            "auto" => Some(Execution::Auto),
            _ => None,
        }
    }
}

/// System parameters for scheduling
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Number of threads to split work across
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Configuration for CSR→CSC conversion and row sorting
///
/// The schedule never changes the output: parallel and sequential runs
/// produce identical arrays.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// System parameters for scheduling
    pub system_params: SystemParameters,

    /// nnz at which `Execution::Auto` switches to the parallel schedule
    pub parallel_threshold: usize,

    /// Scheduling policy
    pub execution: Execution,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            system_params: SystemParameters::default(),
            parallel_threshold: 1 << 16,
            execution: Execution::Auto,
        }
    }
}

impl TransformConfig {
    /// A config that always runs the single-threaded schedule
    pub fn sequential() -> Self {
        Self {
            execution: Execution::Sequential,
            ..Self::default()
        }
    }

    /// A config that always runs the parallel schedule
    pub fn parallel() -> Self {
        Self {
            execution: Execution::Parallel,
            ..Self::default()
        }
    }

    /// Reads `CSRKIT_EXECUTION` and `CSRKIT_PARALLEL_THRESHOLD`, falling
    /// back to the defaults for unset or unparsable values
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("CSRKIT_EXECUTION") {
            match Execution::parse(&value) {
                Some(execution) => config.execution = execution,
                None => tracing::warn!(%value, "ignoring unknown CSRKIT_EXECUTION"),
            }
        }
        if let Ok(value) = std::env::var("CSRKIT_PARALLEL_THRESHOLD") {
            match value.parse() {
                Ok(threshold) => config.parallel_threshold = threshold,
                Err(_) => tracing::warn!(%value, "ignoring unparsable CSRKIT_PARALLEL_THRESHOLD"),
            }
        }

        config
    }

    /// Whether a transform over `nnz` entries should run in parallel
    pub fn use_parallel(&self, nnz: usize) -> bool {
        match self.execution {
            Execution::Sequential => false,
            Execution::Parallel => true,
            Execution::Auto => self.system_params.n_threads > 1 && nnz >= self.parallel_threshold,
        }
    }

    /// Number of contiguous blocks to split `n` work items into
    pub fn n_blocks(&self, n: usize) -> usize {
        self.system_params.n_threads.max(1).min(n.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_parse() {
        assert_eq!(Execution::parse("Parallel"), Some(Execution::Parallel));
        assert_eq!(Execution::parse("seq"), Some(Execution::Sequential));
        assert_eq!(Execution::parse("sometimes"), None);
    }

    #[test]
    fn test_use_parallel() {
        assert!(!TransformConfig::sequential().use_parallel(1_000_000));
        assert!(TransformConfig::parallel().use_parallel(10));

        let mut auto = TransformConfig::default();
        auto.system_params.n_threads = 4;
        auto.parallel_threshold = 100;
        assert!(!auto.use_parallel(99));
        assert!(auto.use_parallel(100));

        auto.system_params.n_threads = 1;
        assert!(!auto.use_parallel(100));
    }

    #[test]
    fn test_n_blocks() {
        let mut config = TransformConfig::default();
        config.system_params.n_threads = 8;
        assert_eq!(config.n_blocks(3), 3);
        assert_eq!(config.n_blocks(100), 8);
        assert_eq!(config.n_blocks(0), 1);
    }
}
