//! Build a Jupyter Lab job script from CLI options and submit it to SLURM

/// Resolve CLI options, user identity, and date into a submission configuration
pub mod config;

/// Render the job script template, write it to disk, and run sbatch
pub mod job;
